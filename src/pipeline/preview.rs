//! Preview resolution

use super::PipelineError;
use crate::content::RawDocument;
use crate::repository::ContentRepository;

/// Site path of a document: posts of `post_type` live under `/post/<uid>`,
/// everything else resolves to the home page
pub fn link_resolver(doc: &RawDocument, post_type: &str) -> String {
    match doc.uid.as_deref() {
        Some(uid) if doc.doc_type == post_type && !uid.is_empty() => format!("/post/{}", uid),
        _ => "/".to_string(),
    }
}

/// Resolve the page to open for a preview session.
///
/// Returns `Ok(None)` when the token or document is not recognised by the
/// repository, which callers report as an invalid token.
pub async fn resolve_preview(
    repo: &dyn ContentRepository,
    post_type: &str,
    token: &str,
    document_id: &str,
) -> Result<Option<String>, PipelineError> {
    if token.is_empty() || document_id.is_empty() {
        return Ok(None);
    }

    match repo.get_by_id(document_id, Some(token)).await {
        Ok(Some(doc)) => Ok(Some(link_resolver(&doc, post_type))),
        Ok(None) => {
            tracing::debug!("Preview document {} not found", document_id);
            Ok(None)
        }
        Err(e) if e.is_client_error() => {
            tracing::warn!("Repository rejected preview token: {}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
