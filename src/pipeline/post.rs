//! Post detail assembly

use serde::Serialize;

use super::PipelineError;
use crate::content::{ContentError, Post, RawDocument};
use crate::repository::{ContentRepository, Direction, OrderField, Ordering, Query};

/// Link target for the previous/next navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborRef {
    pub uid: String,
    pub title: String,
}

impl NeighborRef {
    fn from_raw(raw: &RawDocument) -> Result<Self, ContentError> {
        Ok(Self {
            uid: raw.required_uid()?,
            title: raw.required_title()?,
        })
    }
}

/// Everything the post page renders
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub reading_time_minutes: u32,
    pub edited: bool,
    /// Chronologically earlier post
    pub previous_post: Option<NeighborRef>,
    /// Chronologically later post
    pub next_post: Option<NeighborRef>,
    pub preview_ref: Option<String>,
    pub preview: bool,
}

/// Assemble the view-model for the post with `slug`.
///
/// Returns `Ok(None)` when no document has that slug. The neighbor queries
/// run concurrently once the current document id is known, and use the same
/// reference so the cursor document exists in the queried revision.
pub async fn assemble_post(
    repo: &dyn ContentRepository,
    doc_type: &str,
    slug: &str,
    preview_ref: Option<&str>,
) -> Result<Option<PostView>, PipelineError> {
    let raw = match repo.get_by_uid(doc_type, slug, preview_ref).await? {
        Some(raw) => raw,
        None => {
            tracing::debug!("No {} document with uid {:?}", doc_type, slug);
            return Ok(None);
        }
    };

    let post = Post::from_raw(raw.clone()).map_err(|e| PipelineError::malformed(&raw, e))?;

    let (previous_post, next_post) = tokio::try_join!(
        neighbor(repo, doc_type, &post.id, Direction::Desc, preview_ref),
        neighbor(repo, doc_type, &post.id, Direction::Asc, preview_ref),
    )?;

    Ok(Some(PostView {
        reading_time_minutes: post.reading_time(),
        edited: post.edited(),
        previous_post,
        next_post,
        preview_ref: preview_ref.map(str::to_string),
        preview: preview_ref.is_some(),
        post,
    }))
}

/// First document after `current_id` in the given publication order
async fn neighbor(
    repo: &dyn ContentRepository,
    doc_type: &str,
    current_id: &str,
    direction: Direction,
    reference: Option<&str>,
) -> Result<Option<NeighborRef>, PipelineError> {
    let query = Query::of_type(doc_type)
        .order_by(Ordering {
            field: OrderField::FirstPublicationDate,
            direction,
        })
        .after(current_id)
        .page_size(2)
        .reference(reference);

    let page = repo.query(&query).await?;
    match page.results.iter().find(|doc| doc.id != current_id) {
        Some(raw) => NeighborRef::from_raw(raw)
            .map(Some)
            .map_err(|e| PipelineError::malformed(raw, e)),
        None => Ok(None),
    }
}
