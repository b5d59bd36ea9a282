//! Raw documents as returned by the content repository

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::RichText;

/// Validation errors raised while turning a raw document into a typed one
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid timestamp {value:?}")]
    InvalidDate { value: String },
}

/// A document exactly as the repository delivers it. The `data` bag is
/// free-form until it passes through [`crate::content::Post::from_raw`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub last_publication_date: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
}

impl RawDocument {
    /// Parsed first publication time
    pub fn first_published(&self) -> Result<Option<DateTime<FixedOffset>>, ContentError> {
        parse_optional_timestamp(self.first_publication_date.as_deref())
    }

    /// Parsed last publication time
    pub fn last_published(&self) -> Result<Option<DateTime<FixedOffset>>, ContentError> {
        parse_optional_timestamp(self.last_publication_date.as_deref())
    }

    /// The slug; a missing or empty uid is an error
    pub fn required_uid(&self) -> Result<String, ContentError> {
        self.uid
            .clone()
            .filter(|uid| !uid.trim().is_empty())
            .ok_or(ContentError::MissingField("uid"))
    }

    /// The title; a missing or blank title is an error
    pub fn required_title(&self) -> Result<String, ContentError> {
        self.text_field("title")?
            .filter(|t| !t.trim().is_empty())
            .ok_or(ContentError::MissingField("title"))
    }

    /// Read a text field that may be stored as a plain string or as rich text
    pub fn text_field(&self, name: &str) -> Result<Option<String>, ContentError> {
        match self.data.get(name) {
            None => Ok(None),
            Some(value) => text_value(name, value),
        }
    }
}

/// Interpret `value` as text: strings pass through, rich text is flattened
pub(crate) fn text_value(field: &str, value: &Value) -> Result<Option<String>, ContentError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Array(_) => {
            let rich: RichText =
                serde_json::from_value(value.clone()).map_err(|e| ContentError::InvalidField {
                    field: field.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Some(rich.as_text()))
        }
        other => Err(ContentError::InvalidField {
            field: field.to_string(),
            reason: format!("expected text, found {}", json_kind(other)),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<DateTime<FixedOffset>>, ContentError> {
    value.map(parse_timestamp).transpose()
}

/// Parse a repository timestamp. The API emits offsets without a colon
/// (`2021-03-25T19:25:28+0000`), so RFC 3339 alone is not enough.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ContentError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|_| ContentError::InvalidDate {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_without_colon() {
        let date = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(date.to_rfc3339(), "2021-03-25T19:25:28+00:00");
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let date = parse_timestamp("2021-03-25T19:25:28-03:00").unwrap();
        assert_eq!(date.offset().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ContentError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_text_field_accepts_string_and_rich_text() {
        let raw: RawDocument = serde_json::from_str(
            r#"{
                "id": "X1",
                "type": "posts",
                "data": {
                    "title": "Plain",
                    "subtitle": [{"type": "heading1", "text": "Rich", "spans": []}],
                    "author": 42
                }
            }"#,
        )
        .unwrap();

        assert_eq!(raw.text_field("title").unwrap().as_deref(), Some("Plain"));
        assert_eq!(raw.text_field("subtitle").unwrap().as_deref(), Some("Rich"));
        assert_eq!(raw.text_field("missing").unwrap(), None);
        assert!(raw.text_field("author").is_err());
    }

    #[test]
    fn test_blank_title_and_uid_are_missing() {
        let raw: RawDocument = serde_json::from_str(
            r#"{"id": "X1", "uid": " ", "type": "posts", "data": {"title": "   "}}"#,
        )
        .unwrap();
        assert!(matches!(
            raw.required_uid(),
            Err(ContentError::MissingField("uid"))
        ));
        assert!(matches!(
            raw.required_title(),
            Err(ContentError::MissingField("title"))
        ));
    }
}
