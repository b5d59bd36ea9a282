//! Development server rendering pages on request
//!
//! Unlike the static build, every request goes to the repository, so
//! preview references (`?ref=`) show unpublished revisions.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::helpers::{url_for, with_preview_ref};
use crate::pipeline::{assemble_home, assemble_post, resolve_preview, PipelineError};
use crate::repository::ContentRepository;
use crate::templates::SiteRenderer;
use crate::Site;

/// Server state
struct ServerState {
    site: Site,
    repo: Arc<dyn ContentRepository>,
    renderer: SiteRenderer,
}

#[derive(Debug, Default, Deserialize)]
struct PostParams {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Start the development server
pub async fn start(
    site: &Site,
    repo: Arc<dyn ContentRepository>,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let app = router(site, repo)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, url_for(&site.config, ""));
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router, mounted under the configured root
fn router(site: &Site, repo: Arc<dyn ContentRepository>) -> Result<Router> {
    let i18n = site.i18n()?;
    let state = Arc::new(ServerState {
        site: site.clone(),
        repo,
        renderer: SiteRenderer::new(&site.config, &i18n)?,
    });

    let routes = Router::new()
        .route("/", get(home_handler))
        .route("/page/:page", get(home_page_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback_service(
            ServeDir::new(&site.public_dir).fallback(ServeDir::new(site.base_dir.join("static"))),
        )
        .with_state(state);

    let root = site.config.root.trim_end_matches('/');
    let app = if root.is_empty() {
        routes
    } else {
        Router::new().nest(root, routes)
    };

    Ok(app.layer(TraceLayer::new_for_http()))
}

async fn home_handler(State(state): State<Arc<ServerState>>) -> Response {
    render_home(&state, 1).await
}

async fn home_page_handler(
    State(state): State<Arc<ServerState>>,
    Path(page): Path<u32>,
) -> Response {
    if page <= 1 {
        return Redirect::permanent(&url_for(&state.site.config, "")).into_response();
    }
    render_home(&state, page).await
}

async fn render_home(state: &ServerState, page: u32) -> Response {
    let config = &state.site.config;
    let home = match assemble_home(
        state.repo.as_ref(),
        &config.repository.document_type,
        page,
        config.per_page,
    )
    .await
    {
        Ok(home) => home,
        Err(e) => return failure(state, e),
    };

    if page > 1 && home.posts.is_empty() {
        return not_found(state);
    }

    html(StatusCode::OK, state.renderer.render_home(&home))
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    Query(params): Query<PostParams>,
) -> Response {
    let config = &state.site.config;
    let reference = params
        .reference
        .as_deref()
        .filter(|r| config.preview.enable && !r.is_empty());

    match assemble_post(
        state.repo.as_ref(),
        &config.repository.document_type,
        &slug,
        reference,
    )
    .await
    {
        Ok(Some(view)) => html(StatusCode::OK, state.renderer.render_post(&view)),
        Ok(None) => not_found(&state),
        Err(e) => failure(&state, e),
    }
}

async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let config = &state.site.config;
    if !config.preview.enable {
        return not_found(&state);
    }

    let token = params.token.unwrap_or_default();
    let document_id = params.document_id.unwrap_or_default();

    match resolve_preview(
        state.repo.as_ref(),
        &config.repository.document_type,
        &token,
        &document_id,
    )
    .await
    {
        Ok(Some(path)) => {
            let location = with_preview_ref(&url_for(config, &path), &token);
            tracing::debug!("Preview of {} resolved to {}", document_id, location);
            found(&location)
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Invalid token" })),
        )
            .into_response(),
        Err(e) => failure(&state, e),
    }
}

async fn exit_preview_handler(State(state): State<Arc<ServerState>>) -> Response {
    found(&url_for(&state.site.config, ""))
}

/// 302 redirect, matching what preview links from the CMS expect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn not_found(state: &ServerState) -> Response {
    html(StatusCode::NOT_FOUND, state.renderer.render_not_found())
}

/// Map a pipeline failure to an error page
fn failure(state: &ServerState, error: PipelineError) -> Response {
    tracing::error!("{}", error);
    html(failure_status(&error), state.renderer.render_error())
}

fn failure_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Upstream(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Malformed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn html(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!("Render failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Render error").into_response()
        }
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::RawDocument;
    use crate::repository::{LocalRepository, RepositoryError};

    fn doc(id: &str, uid: &str, day: u32) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "uid": uid,
            "type": "posts",
            "first_publication_date": format!("2021-03-{:02}T12:00:00+0000", day),
            "data": { "title": format!("Post {}", uid) }
        }))
        .unwrap()
    }

    fn state(config: SiteConfig) -> State<Arc<ServerState>> {
        let site = Site::with_config(std::env::temp_dir(), config);
        let i18n = site.i18n().unwrap();
        let renderer = SiteRenderer::new(&site.config, &i18n).unwrap();
        let repo = Arc::new(LocalRepository::new(vec![doc("A", "a", 1), doc("B", "b", 5)]));
        State(Arc::new(ServerState {
            site,
            repo,
            renderer,
        }))
    }

    fn location(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_post_found_and_missing() {
        let response = post_handler(
            state(SiteConfig::default()),
            Path("b".to_string()),
            Query(PostParams::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = post_handler(
            state(SiteConfig::default()),
            Path("zzz".to_string()),
            Query(PostParams::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_home_pages() {
        let response = home_handler(state(SiteConfig::default())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = home_page_handler(state(SiteConfig::default()), Path(9)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = home_page_handler(state(SiteConfig::default()), Path(1)).await;
        assert_eq!(location(&response), Some("/"));
    }

    #[tokio::test]
    async fn test_preview_redirects_with_ref() {
        let response = preview_handler(
            state(SiteConfig::default()),
            Query(PreviewParams {
                token: Some("tok".to_string()),
                document_id: Some("A".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), Some("/post/a?ref=tok"));
    }

    #[tokio::test]
    async fn test_preview_with_unknown_document_is_unauthorized() {
        let response = preview_handler(
            state(SiteConfig::default()),
            Query(PreviewParams {
                token: Some("tok".to_string()),
                document_id: Some("nope".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preview_disabled() {
        let mut config = SiteConfig::default();
        config.preview.enable = false;
        let response = preview_handler(state(config), Query(PreviewParams::default())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_exit_preview_goes_home() {
        let mut config = SiteConfig::default();
        config.root = "/blog/".to_string();
        let response = exit_preview_handler(state(config)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), Some("/blog/"));
    }

    #[test]
    fn test_failure_status() {
        let upstream = PipelineError::Upstream(RepositoryError::NoMasterRef);
        assert_eq!(failure_status(&upstream), StatusCode::BAD_GATEWAY);
    }
}
