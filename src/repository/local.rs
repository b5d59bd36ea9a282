//! Local repository backed by a directory of JSON documents
//!
//! Each `*.json` file holds one raw document, an array of documents, or a
//! saved search response with a `results` array. Queries are evaluated in
//! memory with the same cursor semantics as the remote API.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::cmp;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{
    ContentRepository, Direction, Field, OrderField, Predicate, Query, RepositoryError, SearchPage,
};
use crate::content::RawDocument;

/// In-memory repository
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    documents: Vec<RawDocument>,
}

impl LocalRepository {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        let mut seen = HashSet::new();
        let documents = documents
            .into_iter()
            .filter(|doc| {
                let fresh = seen.insert(doc.id.clone());
                if !fresh {
                    tracing::warn!("Skipping duplicate document id {}", doc.id);
                }
                fresh
            })
            .collect();
        Self { documents }
    }

    /// Load every JSON file below `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, RepositoryError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(RepositoryError::Config(format!(
                "local content directory {:?} does not exist",
                dir
            )));
        }

        let mut paths: Vec<_> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let content = fs::read_to_string(&path).map_err(|source| RepositoryError::Io {
                path: path.clone(),
                source,
            })?;
            let value: serde_json::Value =
                serde_json::from_str(&content).map_err(|source| RepositoryError::Decode {
                    path: path.clone(),
                    source,
                })?;

            let parsed = if value.is_array() {
                serde_json::from_value::<Vec<RawDocument>>(value)
            } else if value.get("results").is_some() {
                serde_json::from_value::<SearchPage>(value).map(|page| page.results)
            } else {
                serde_json::from_value::<RawDocument>(value).map(|doc| vec![doc])
            };
            let parsed = parsed.map_err(|source| RepositoryError::Decode {
                path: path.clone(),
                source,
            })?;

            tracing::debug!("Loaded {} document(s) from {:?}", parsed.len(), path);
            documents.extend(parsed);
        }

        Ok(Self::new(documents))
    }

    pub fn documents(&self) -> &[RawDocument] {
        &self.documents
    }

    fn evaluate(&self, query: &Query) -> SearchPage {
        if query.reference.is_some() {
            tracing::debug!("Local repository ignores content references");
        }

        let mut matches: Vec<&RawDocument> = self
            .documents
            .iter()
            .filter(|doc| query.predicates.iter().all(|p| matches_predicate(doc, p)))
            .collect();

        matches.sort_by(|a, b| compare(a, b, query));

        if let Some(cursor) = &query.after {
            matches = match matches.iter().position(|doc| &doc.id == cursor) {
                Some(pos) => matches.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let page_size = query.page_size.max(1) as usize;
        let page = query.page.max(1) as usize;
        let total = matches.len();
        let total_pages = total.div_ceil(page_size);

        let results: Vec<RawDocument> = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        SearchPage {
            page: page as u32,
            results_per_page: page_size as u32,
            results_size: results.len() as u32,
            total_results_size: total as u32,
            total_pages: total_pages as u32,
            next_page: (page < total_pages).then(|| format!("?page={}", page + 1)),
            prev_page: (page > 1).then(|| format!("?page={}", page - 1)),
            results,
        }
    }
}

#[async_trait]
impl ContentRepository for LocalRepository {
    async fn query(&self, query: &Query) -> Result<SearchPage, RepositoryError> {
        Ok(self.evaluate(query))
    }
}

fn matches_predicate(doc: &RawDocument, predicate: &Predicate) -> bool {
    match &predicate.field {
        Field::DocumentType => doc.doc_type == predicate.value,
        Field::DocumentId => doc.id == predicate.value,
        Field::Uid(doc_type) => {
            &doc.doc_type == doc_type && doc.uid.as_deref() == Some(predicate.value.as_str())
        }
    }
}

/// Sort key for a publication date. Unpublished documents (drafts seen
/// through a preview ref) have no date and sort as the newest.
fn order_key(doc: &RawDocument, field: OrderField) -> (bool, Option<DateTime<FixedOffset>>) {
    let parsed = match field {
        OrderField::FirstPublicationDate => doc.first_published(),
        OrderField::LastPublicationDate => doc.last_published(),
    };
    let date = parsed.ok().flatten();
    (date.is_none(), date)
}

/// Total order over documents: the requested orderings, then the id in the
/// direction of the last ordering so ascending and descending are mirrors.
fn compare(a: &RawDocument, b: &RawDocument, query: &Query) -> cmp::Ordering {
    for ordering in &query.orderings {
        let ord = order_key(a, ordering.field).cmp(&order_key(b, ordering.field));
        let ord = match ordering.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != cmp::Ordering::Equal {
            return ord;
        }
    }

    let ord = a.id.cmp(&b.id);
    match query.orderings.last().map(|o| o.direction) {
        Some(Direction::Desc) => ord.reverse(),
        _ => ord,
    }
}
