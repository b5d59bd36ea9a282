//! Generator module - writes the static site from repository content

use anyhow::{Context as _, Result};
use futures::StreamExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::pipeline::{assemble_home, assemble_post, list_uids};
use crate::repository::ContentRepository;
use crate::templates::SiteRenderer;
use crate::Site;

/// Counts reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub home_pages: usize,
    pub posts: usize,
    pub skipped: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator {
    site: Site,
    repo: Arc<dyn ContentRepository>,
    renderer: SiteRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site, repo: Arc<dyn ContentRepository>) -> Result<Self> {
        let i18n = site.i18n()?;
        let renderer = SiteRenderer::new(&site.config, &i18n)?;

        Ok(Self {
            site: site.clone(),
            repo,
            renderer,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.site.public_dir)?;

        let mut stats = GenerateStats {
            assets: self.copy_static_assets()?,
            ..GenerateStats::default()
        };

        let doc_type = &self.site.config.repository.document_type;
        let uids = list_uids(self.repo.as_ref(), doc_type).await?;
        tracing::info!("Found {} {} documents", uids.len(), doc_type);

        stats.home_pages = self.generate_index_pages().await?;

        let (posts, skipped) = self.generate_post_pages(&uids).await?;
        stats.posts = posts;
        stats.skipped = skipped;

        self.generate_not_found_page()?;

        Ok(stats)
    }

    /// Generate index pages with pagination
    async fn generate_index_pages(&self) -> Result<usize> {
        let config = &self.site.config;
        let mut page = 1;

        loop {
            let home = assemble_home(
                self.repo.as_ref(),
                &config.repository.document_type,
                page,
                config.per_page,
            )
            .await?;

            let html = self.renderer.render_home(&home)?;
            let output_path = if page == 1 {
                self.site.public_dir.join("index.html")
            } else {
                self.site
                    .public_dir
                    .join(format!("page/{}/index.html", page))
            };
            write_page(&output_path, &html)?;

            match home.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(page as usize)
    }

    /// Generate individual post pages, a bounded number at a time
    async fn generate_post_pages(&self, uids: &[String]) -> Result<(usize, usize)> {
        let repo = self.repo.as_ref();
        let doc_type = self.site.config.repository.document_type.as_str();
        let concurrency = self.site.config.build.concurrency.max(1);

        let mut results = futures::stream::iter(uids)
            .map(|uid| async move { (uid, assemble_post(repo, doc_type, uid, None).await) })
            .buffer_unordered(concurrency);

        let mut written = 0;
        let mut skipped = 0;

        while let Some((uid, result)) = results.next().await {
            let view = match result.with_context(|| format!("Failed to assemble post {:?}", uid))? {
                Some(view) => view,
                None => {
                    tracing::warn!("Post {:?} disappeared during the build, skipping", uid);
                    skipped += 1;
                    continue;
                }
            };

            if !is_safe_segment(uid) {
                tracing::warn!("Post uid {:?} is not a valid path segment, skipping", uid);
                skipped += 1;
                continue;
            }

            let html = self.renderer.render_post(&view)?;
            let output_path = self
                .site
                .public_dir
                .join("post")
                .join(uid)
                .join("index.html");
            write_page(&output_path, &html)?;
            written += 1;
        }

        Ok((written, skipped))
    }

    fn generate_not_found_page(&self) -> Result<()> {
        let html = self.renderer.render_not_found()?;
        write_page(&self.site.public_dir.join("404.html"), &html)
    }

    /// Copy files from the site's `static/` directory (logo, styles)
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = self.site.base_dir.join("static");
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(&static_dir)?;
            let dest = self.site.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        tracing::debug!("Copied {} static assets", copied);
        Ok(copied)
    }
}

fn write_page(output_path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(output_path, html)
        .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
    tracing::debug!("Generated: {:?}", output_path);
    Ok(())
}

/// A uid can become a directory name only if it cannot escape `post/`
fn is_safe_segment(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\'])
        && PathBuf::from(uid).components().count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::RawDocument;
    use crate::repository::LocalRepository;

    fn doc(id: &str, uid: &str, day: u32) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "uid": uid,
            "type": "posts",
            "first_publication_date": format!("2021-03-{:02}T12:00:00+0000", day),
            "last_publication_date": format!("2021-03-{:02}T12:00:00+0000", day),
            "data": {
                "title": format!("Post {}", uid),
                "content": [{"heading": "Intro", "body": []}]
            }
        }))
        .unwrap()
    }

    fn site(dir: &Path) -> Site {
        let config = SiteConfig {
            per_page: 2,
            ..SiteConfig::default()
        };
        Site::with_config(dir.to_path_buf(), config)
    }

    #[tokio::test]
    async fn test_generate_writes_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static/images")).unwrap();
        fs::write(dir.path().join("static/images/logo.svg"), "<svg/>").unwrap();

        let repo = Arc::new(LocalRepository::new(vec![
            doc("A", "a", 1),
            doc("B", "b", 5),
            doc("C", "c", 10),
        ]));
        let site = site(dir.path());
        let stats = Generator::new(&site, repo)
            .unwrap()
            .generate()
            .await
            .unwrap();

        assert_eq!(
            stats,
            GenerateStats {
                home_pages: 2,
                posts: 3,
                skipped: 0,
                assets: 1,
            }
        );

        let public = &site.public_dir;
        assert!(public.join("index.html").exists());
        assert!(public.join("page/2/index.html").exists());
        assert!(public.join("404.html").exists());
        assert!(public.join("images/logo.svg").exists());

        let b = fs::read_to_string(public.join("post/b/index.html")).unwrap();
        assert!(b.contains("<h1>Post b</h1>"));
        assert!(b.contains(r#"<a href="/post/a">"#));
        assert!(b.contains(r#"<a href="/post/c">"#));
    }

    #[tokio::test]
    async fn test_generate_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path());
        let stats = Generator::new(&site, Arc::new(LocalRepository::default()))
            .unwrap()
            .generate()
            .await
            .unwrap();

        assert_eq!(stats.home_pages, 1);
        assert_eq!(stats.posts, 0);
        assert!(site.public_dir.join("index.html").exists());
    }

    #[tokio::test]
    async fn test_generate_fails_on_malformed_post() {
        let dir = tempfile::tempdir().unwrap();
        let mut broken = doc("A", "a", 1);
        broken.data.remove("title");
        let site = site(dir.path());
        let result = Generator::new(&site, Arc::new(LocalRepository::new(vec![broken])))
            .unwrap()
            .generate()
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_is_safe_segment() {
        assert!(is_safe_segment("como-utilizar-hooks"));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment(""));
    }
}
