//! Repository queries: predicates, orderings, cursor and paging

use std::fmt;

/// Default number of results per page when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size the repository API accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// A document path a predicate can match on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    DocumentType,
    DocumentId,
    /// The `uid` field of a given custom type
    Uid(String),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::DocumentType => write!(f, "document.type"),
            Field::DocumentId => write!(f, "document.id"),
            Field::Uid(doc_type) => write!(f, "my.{}.uid", doc_type),
        }
    }
}

/// Equality predicate, `at(field, "value")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: Field,
    pub value: String,
}

impl Predicate {
    pub fn at(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "[at({}, \"{}\")]", self.field, escaped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    FirstPublicationDate,
    LastPublicationDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub direction: Direction,
}

impl Ordering {
    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            OrderField::FirstPublicationDate => "document.first_publication_date",
            OrderField::LastPublicationDate => "document.last_publication_date",
        };
        match self.direction {
            Direction::Asc => write!(f, "{}", field),
            Direction::Desc => write!(f, "{} desc", field),
        }
    }
}

/// A search against the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub orderings: Vec<Ordering>,
    /// Return only results positioned after this document id
    pub after: Option<String>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Content reference to query; the published revision when `None`
    pub reference: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            orderings: Vec::new(),
            after: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            reference: None,
        }
    }
}

impl Query {
    /// All documents of a custom type
    pub fn of_type(doc_type: &str) -> Self {
        Self::default().predicate(Predicate::at(Field::DocumentType, doc_type))
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    /// The `q` parameter, e.g. `[[at(document.type, "posts")]]`
    pub fn predicate_string(&self) -> String {
        let inner: String = self.predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", inner)
    }

    /// The `orderings` parameter, `None` when unordered
    pub fn orderings_string(&self) -> Option<String> {
        if self.orderings.is_empty() {
            return None;
        }
        let inner: Vec<String> = self.orderings.iter().map(|o| o.to_string()).collect();
        Some(format!("[{}]", inner.join(",")))
    }
}
