//! Content repository client
//!
//! The repository is the headless CMS holding every document. Callers get an
//! explicitly constructed client (`Arc<dyn ContentRepository>`) and pass the
//! preview reference per call; nothing here is process-global.

mod local;
mod prismic;
pub mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{RepositoryConfig, RepositoryKind};
use crate::content::RawDocument;

pub use local::LocalRepository;
pub use prismic::PrismicRepository;
pub use query::{Direction, Field, OrderField, Ordering, Predicate, Query};

/// Failures talking to the repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("repository has no master ref")]
    NoMasterRef,

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid repository configuration: {0}")]
    Config(String),
}

impl RepositoryError {
    /// Whether the repository rejected the request itself (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, RepositoryError::Status { status, .. } if (400..500).contains(status))
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: u32,
    pub results_per_page: u32,
    pub results_size: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    pub results: Vec<RawDocument>,
}

/// Read-only access to the content repository
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Run a search and return one page of results
    async fn query(&self, query: &Query) -> Result<SearchPage, RepositoryError>;

    /// Fetch a document of `doc_type` by its uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<RawDocument>, RepositoryError> {
        let query = Query::of_type(doc_type)
            .predicate(Predicate::at(Field::Uid(doc_type.to_string()), uid))
            .page_size(1)
            .reference(reference);
        Ok(self.query(&query).await?.results.into_iter().next())
    }

    /// Fetch any document by its internal id
    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<&str>,
    ) -> Result<Option<RawDocument>, RepositoryError> {
        let query = Query::default()
            .predicate(Predicate::at(Field::DocumentId, id))
            .page_size(1)
            .reference(reference);
        Ok(self.query(&query).await?.results.into_iter().next())
    }
}

/// Build the repository client described by the configuration
pub fn from_config(
    config: &RepositoryConfig,
    base_dir: &Path,
) -> Result<Arc<dyn ContentRepository>, RepositoryError> {
    match config.kind {
        RepositoryKind::Prismic => {
            let repo = PrismicRepository::new(
                &config.endpoint,
                config.access_token.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            tracing::debug!("Using Prismic repository at {}", config.endpoint);
            Ok(Arc::new(repo))
        }
        RepositoryKind::Local => {
            let dir = base_dir.join(&config.local_dir);
            let repo = LocalRepository::load(&dir)?;
            tracing::debug!(
                "Using local repository at {:?} ({} documents)",
                dir,
                repo.documents().len()
            );
            Ok(Arc::new(repo))
        }
    }
}
