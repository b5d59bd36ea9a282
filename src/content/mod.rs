//! Content module - documents, posts, rich text and reading metrics

mod document;
mod post;
pub mod reading;
mod rich_text;

pub use document::{parse_timestamp, ContentError, RawDocument};
pub use post::{Banner, ContentSection, Post, PostData};
pub use rich_text::{escape_html, Block, RichText, Span, SpanKind, TextKind};
