//! Home listing assembly and static path enumeration

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::PipelineError;
use crate::content::Post;
use crate::repository::query::MAX_PAGE_SIZE;
use crate::repository::{ContentRepository, OrderField, Ordering, Query};

/// A post as shown in the home listing
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            uid: post.uid.clone(),
            first_publication_date: post.first_publication_date,
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
        }
    }
}

/// One page of the home listing, newest first
#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub posts: Vec<PostSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total_posts: u32,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

/// Assemble page `page` (1-based) of the home listing
pub async fn assemble_home(
    repo: &dyn ContentRepository,
    doc_type: &str,
    page: u32,
    page_size: u32,
) -> Result<HomeView, PipelineError> {
    let query = Query::of_type(doc_type)
        .order_by(Ordering::desc(OrderField::FirstPublicationDate))
        .page(page)
        .page_size(page_size);
    let result = repo.query(&query).await?;

    let posts = result
        .results
        .into_iter()
        .map(|raw| {
            Post::from_raw(raw.clone())
                .map(|post| PostSummary::from(&post))
                .map_err(|e| PipelineError::malformed(&raw, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let page = query.page;
    let total_pages = result.total_pages;

    Ok(HomeView {
        posts,
        page,
        total_pages,
        total_posts: result.total_results_size,
        next_page: (page < total_pages).then_some(page + 1),
        prev_page: (page > 1).then(|| page - 1),
    })
}

/// Every uid of `doc_type`, newest first. Documents without a uid cannot be
/// routed and are skipped.
pub async fn list_uids(
    repo: &dyn ContentRepository,
    doc_type: &str,
) -> Result<Vec<String>, PipelineError> {
    let mut uids = Vec::new();
    let mut page = 1;

    loop {
        let query = Query::of_type(doc_type)
            .order_by(Ordering::desc(OrderField::FirstPublicationDate))
            .page(page)
            .page_size(MAX_PAGE_SIZE);
        let result = repo.query(&query).await?;

        for doc in result.results {
            match doc.uid {
                Some(uid) if !uid.is_empty() => uids.push(uid),
                _ => tracing::warn!("Skipping {} document {} without uid", doc_type, doc.id),
            }
        }

        if page >= result.total_pages {
            break;
        }
        page += 1;
    }

    Ok(uids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RawDocument;
    use crate::repository::LocalRepository;

    fn doc(id: &str, uid: Option<&str>, day: u32) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "uid": uid,
            "type": "posts",
            "first_publication_date": format!("2021-03-{:02}T12:00:00+0000", day),
            "data": {
                "title": format!("Title {}", id),
                "subtitle": "Sub",
                "author": "Author"
            }
        }))
        .unwrap()
    }

    fn repo() -> LocalRepository {
        LocalRepository::new(vec![
            doc("A", Some("a"), 1),
            doc("B", Some("b"), 2),
            doc("C", Some("c"), 3),
            doc("D", None, 4),
        ])
    }

    #[tokio::test]
    async fn test_first_page_is_newest() {
        let repo = LocalRepository::new(vec![
            doc("A", Some("a"), 1),
            doc("B", Some("b"), 2),
            doc("C", Some("c"), 3),
        ]);
        let home = assemble_home(&repo, "posts", 1, 2).await.unwrap();
        let uids: Vec<_> = home.posts.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, ["c", "b"]);
        assert_eq!(home.total_pages, 2);
        assert_eq!(home.total_posts, 3);
        assert_eq!(home.next_page, Some(2));
        assert_eq!(home.prev_page, None);
    }

    #[tokio::test]
    async fn test_last_page() {
        let repo = LocalRepository::new(vec![
            doc("A", Some("a"), 1),
            doc("B", Some("b"), 2),
            doc("C", Some("c"), 3),
        ]);
        let home = assemble_home(&repo, "posts", 2, 2).await.unwrap();
        assert_eq!(home.posts.len(), 1);
        assert_eq!(home.posts[0].title, "Title A");
        assert_eq!(home.next_page, None);
        assert_eq!(home.prev_page, Some(1));
    }

    #[tokio::test]
    async fn test_home_rejects_malformed_documents() {
        let err = assemble_home(&repo(), "posts", 1, 10).await.unwrap_err();
        assert!(matches!(err, PipelineError::Malformed { ref document, .. } if document == "D"));
    }

    #[tokio::test]
    async fn test_list_uids_skips_documents_without_uid() {
        let uids = list_uids(&repo(), "posts").await.unwrap();
        assert_eq!(uids, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_list_uids_empty_repository() {
        let uids = list_uids(&LocalRepository::default(), "posts").await.unwrap();
        assert!(uids.is_empty());
    }
}
