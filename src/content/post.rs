//! Post model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{json_kind, text_value};
use super::{reading, ContentError, RawDocument, RichText};

/// A blog post, validated from a [`RawDocument`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Internal repository identifier
    pub id: String,

    /// Slug used in URLs
    pub uid: String,

    /// First publication time, absent for never-published revisions
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    /// Last publication time
    pub last_publication_date: Option<DateTime<FixedOffset>>,

    pub data: PostData,
}

/// Post fields from the document's data bag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<Banner>,
    pub content: Vec<ContentSection>,
}

/// Post banner image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

/// One section of post content: a heading followed by a rich-text body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: RichText,
}

impl Post {
    /// Validate a raw document. `uid` and `title` are required; the other
    /// fields fall back to empty values.
    pub fn from_raw(raw: RawDocument) -> Result<Self, ContentError> {
        let uid = raw.required_uid()?;
        let title = raw.required_title()?;

        let first_publication_date = raw.first_published()?;
        let last_publication_date = raw.last_published()?;

        let data = PostData {
            title,
            subtitle: raw.text_field("subtitle")?,
            author: raw.text_field("author")?,
            banner: parse_banner(raw.data.get("banner"))?,
            content: parse_content(raw.data.get("content"))?,
        };

        Ok(Self {
            id: raw.id,
            uid,
            first_publication_date,
            last_publication_date,
            data,
        })
    }

    /// Whether the post was republished after its first publication
    pub fn edited(&self) -> bool {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) => first != last,
            _ => false,
        }
    }

    /// Estimated reading time in minutes, never below one
    pub fn reading_time(&self) -> u32 {
        reading::reading_time(&self.data.content)
    }
}

fn parse_banner(value: Option<&Value>) -> Result<Option<Banner>, ContentError> {
    let map = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ContentError::InvalidField {
                field: "banner".to_string(),
                reason: format!("expected object, found {}", json_kind(other)),
            })
        }
    };

    // An unset image field arrives as `{}`
    let url = match map.get("url").and_then(Value::as_str) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return Ok(None),
    };
    let alt = map
        .get("alt")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Some(Banner { url, alt }))
}

fn parse_content(value: Option<&Value>) -> Result<Vec<ContentSection>, ContentError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ContentError::InvalidField {
                field: "content".to_string(),
                reason: format!("expected array, found {}", json_kind(other)),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let heading = match item.get("heading") {
                Some(value) => text_value(&format!("content[{}].heading", i), value)?,
                None => None,
            };
            let body = match item.get("body") {
                None | Some(Value::Null) => RichText::default(),
                Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                    ContentError::InvalidField {
                        field: format!("content[{}].body", i),
                        reason: e.to_string(),
                    }
                })?,
            };
            Ok(ContentSection {
                heading: heading.unwrap_or_default(),
                body,
            })
        })
        .collect()
}
