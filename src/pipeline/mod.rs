//! Assembly of render-ready view-models from repository documents

mod home;
mod post;
mod preview;

use thiserror::Error;

use crate::content::{ContentError, RawDocument};
use crate::repository::RepositoryError;

pub use home::{assemble_home, list_uids, HomeView, PostSummary};
pub use post::{assemble_post, NeighborRef, PostView};
pub use preview::{link_resolver, resolve_preview};

/// Failures while assembling a view-model. A missing document is not an
/// error; operations return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Upstream(#[from] RepositoryError),

    #[error("document {document} is malformed: {source}")]
    Malformed {
        document: String,
        #[source]
        source: ContentError,
    },
}

impl PipelineError {
    pub(crate) fn malformed(raw: &RawDocument, source: ContentError) -> Self {
        PipelineError::Malformed {
            document: raw.uid.clone().unwrap_or_else(|| raw.id.clone()),
            source,
        }
    }
}
