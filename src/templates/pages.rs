//! Page rendering from assembled view-models

use anyhow::Result;
use chrono_tz::Tz;
use std::collections::HashMap;
use tera::Context;

use super::{
    BannerData, CommentsData, NavPost, PaginationData, PostPageData, SectionData, SiteData,
    SummaryData, TemplateRenderer,
};
use crate::config::SiteConfig;
use crate::content::escape_html;
use crate::helpers::{
    date_xml, format_day, format_day_time, full_url_for, home_page_path, parse_timezone,
    post_path, url_for, with_preview_ref,
};
use crate::i18n::I18n;
use crate::pipeline::{HomeView, NeighborRef, PostView};

/// Renders every page of the site
pub struct SiteRenderer {
    renderer: TemplateRenderer,
    config: SiteConfig,
    labels: HashMap<String, String>,
    tz: Tz,
}

impl SiteRenderer {
    pub fn new(config: &SiteConfig, i18n: &I18n) -> Result<Self> {
        // Nested keys become `not_found_title` so templates can use dot access
        let labels = i18n
            .get_all_translations()
            .into_iter()
            .map(|(k, v)| (k.replace('.', "_"), escape_html(&v)))
            .collect();

        Ok(Self {
            renderer: TemplateRenderer::new()?,
            config: config.clone(),
            labels,
            tz: parse_timezone(&config.timezone),
        })
    }

    /// Render one page of the home listing
    pub fn render_home(&self, home: &HomeView) -> Result<String> {
        let posts: Vec<SummaryData> = home
            .posts
            .iter()
            .map(|p| SummaryData {
                title: escape_html(&p.title),
                subtitle: p.subtitle.as_deref().map(escape_html),
                author: p.author.as_deref().map(escape_html),
                date: p
                    .first_publication_date
                    .map(|d| format_day(&d, self.tz, &self.config.language)),
                date_xml: p.first_publication_date.map(|d| date_xml(&d)),
                path: escape_html(&url_for(&self.config, &post_path(&p.uid))),
            })
            .collect();

        let link = |page: Option<u32>| {
            page.map(|n| escape_html(&url_for(&self.config, &home_page_path(n))))
                .unwrap_or_default()
        };
        let pagination = PaginationData {
            current: home.page,
            total: home.total_pages,
            prev_link: link(home.prev_page),
            next_link: link(home.next_page),
        };

        let mut context = self.base_context();
        context.insert(
            "canonical_url",
            &escape_html(&full_url_for(&self.config, &home_page_path(home.page))),
        );
        context.insert("posts", &posts);
        context.insert("pagination", &pagination);
        self.renderer.render("index.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, view: &PostView) -> Result<String> {
        let post = &view.post;
        let lang = &self.config.language;

        let page = PostPageData {
            title: escape_html(&post.data.title),
            author: post.data.author.as_deref().map(escape_html),
            banner: post.data.banner.as_ref().map(|b| BannerData {
                url: escape_html(&b.url),
                alt: escape_html(b.alt.as_deref().unwrap_or("")),
            }),
            date: post
                .first_publication_date
                .map(|d| format_day(&d, self.tz, lang)),
            date_xml: post.first_publication_date.map(|d| date_xml(&d)),
            edited_at: if view.edited {
                post.last_publication_date
                    .map(|d| format_day_time(&d, self.tz, lang))
            } else {
                None
            },
            reading_time: view.reading_time_minutes,
            sections: post
                .data
                .content
                .iter()
                .map(|s| SectionData {
                    heading: escape_html(&s.heading),
                    html: s.body.as_html(),
                })
                .collect(),
        };

        let mut context = self.base_context();
        context.insert(
            "canonical_url",
            &escape_html(&full_url_for(&self.config, &post_path(&post.uid))),
        );
        context.insert("post", &page);
        context.insert(
            "previous_post",
            &view.previous_post.as_ref().map(|n| self.nav(n, view)),
        );
        context.insert(
            "next_post",
            &view.next_post.as_ref().map(|n| self.nav(n, view)),
        );
        context.insert("preview", &(view.preview && self.config.preview.enable));
        context.insert(
            "exit_preview_url",
            &escape_html(&url_for(&self.config, "api/exit-preview")),
        );

        let comments = &self.config.comments;
        let comments = comments.is_active().then(|| CommentsData {
            script: escape_html(&comments.script),
            repo: escape_html(&comments.repo),
            issue_term: escape_html(&comments.issue_term),
            theme: escape_html(&comments.theme),
        });
        context.insert("comments", &comments);

        self.renderer.render("post.html", &context)
    }

    /// Render the page shown for unknown slugs
    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("404.html", &self.base_context())
    }

    /// Render the page shown when content cannot be loaded
    pub fn render_error(&self) -> Result<String> {
        self.renderer.render("error.html", &self.base_context())
    }

    fn nav(&self, neighbor: &NeighborRef, view: &PostView) -> NavPost {
        let mut path = url_for(&self.config, &post_path(&neighbor.uid));
        if let Some(reference) = view.preview_ref.as_deref() {
            path = with_preview_ref(&path, reference);
        }
        NavPost {
            title: escape_html(&neighbor.title),
            path: escape_html(&path),
        }
    }

    /// Create a base context with common variables
    fn base_context(&self) -> Context {
        let site = SiteData {
            title: escape_html(&self.config.title),
            description: escape_html(&self.config.description),
            language: escape_html(&self.config.language),
            home_url: escape_html(&url_for(&self.config, "")),
            logo_url: escape_html(&url_for(&self.config, "images/logo.svg")),
            toolbar_repo: if self.config.preview.enable {
                escape_html(&self.config.preview.toolbar_repo)
            } else {
                String::new()
            },
        };

        let mut context = Context::new();
        context.insert("canonical_url", "");
        context.insert("site", &site);
        context.insert("t", &self.labels);
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Post, RawDocument};
    use crate::pipeline::PostSummary;

    fn post(last: &str) -> Post {
        let raw: RawDocument = serde_json::from_value(serde_json::json!({
            "id": "B",
            "uid": "b",
            "type": "posts",
            "first_publication_date": "2021-03-25T19:25:28+0000",
            "last_publication_date": last,
            "data": {
                "title": "Rust & <friends>",
                "author": "Leandro",
                "banner": {"url": "https://images.test/banner.png", "alt": "Banner"},
                "content": [{
                    "heading": "Ownership",
                    "body": [{"type": "paragraph", "text": "Borrow it", "spans": [
                        {"start": 0, "end": 6, "type": "strong"}
                    ]}]
                }]
            }
        }))
        .unwrap();
        Post::from_raw(raw).unwrap()
    }

    fn view(post: Post, preview_ref: Option<&str>) -> PostView {
        PostView {
            reading_time_minutes: post.reading_time(),
            edited: post.edited(),
            previous_post: Some(NeighborRef {
                uid: "a".to_string(),
                title: "Post A".to_string(),
            }),
            next_post: None,
            preview_ref: preview_ref.map(str::to_string),
            preview: preview_ref.is_some(),
            post,
        }
    }

    fn renderer(config: SiteConfig) -> SiteRenderer {
        let i18n = I18n::new(&config.language);
        SiteRenderer::new(&config, &i18n).unwrap()
    }

    fn utc_config() -> SiteConfig {
        SiteConfig {
            timezone: "UTC".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_render_post_page() {
        let html = renderer(utc_config())
            .render_post(&view(post("2021-03-25T19:25:28+0000"), None))
            .unwrap();

        assert!(html.contains("<h1>Rust &amp; &lt;friends&gt;</h1>"));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("1 min"));
        assert!(html.contains("<h2>Ownership</h2>"));
        assert!(html.contains("<p><strong>Borrow</strong> it</p>"));
        assert!(html.contains(r#"<a href="/post/a">Post anterior</a>"#));
        assert!(html.contains(r#"<link rel="canonical" href="http://localhost:3000/post/b" />"#));
        assert!(!html.contains("Próximo post"));
        assert!(!html.contains("editado em"));
        assert!(!html.contains("Sair do modo Preview"));
        assert!(!html.contains("utteranc.es"));
    }

    #[test]
    fn test_render_edited_post_shows_last_publication() {
        let html = renderer(utc_config())
            .render_post(&view(post("2021-04-02T08:05:00+0000"), None))
            .unwrap();
        assert!(html.contains("* editado em 02 abr 2021, às 08:05"));
    }

    #[test]
    fn test_render_preview_post() {
        let html = renderer(utc_config())
            .render_post(&view(post("2021-03-25T19:25:28+0000"), Some("tok")))
            .unwrap();
        assert!(html.contains("Sair do modo Preview"));
        assert!(html.contains(r#"href="/api/exit-preview""#));
        assert!(html.contains(r#"href="/post/a?ref=tok""#));
    }

    #[test]
    fn test_render_comments_when_configured() {
        let mut config = utc_config();
        config.comments.repo = "owner/comments".to_string();
        let html = renderer(config)
            .render_post(&view(post("2021-03-25T19:25:28+0000"), None))
            .unwrap();
        assert!(html.contains(r#"src="https://utteranc.es/client.js""#));
        assert!(html.contains(r#"repo="owner/comments""#));
        assert!(html.contains(r#"theme="photon-dark""#));
    }

    #[test]
    fn test_render_home() {
        let post = post("2021-03-25T19:25:28+0000");
        let home = HomeView {
            posts: vec![PostSummary::from(&post)],
            page: 1,
            total_pages: 2,
            total_posts: 2,
            next_page: Some(2),
            prev_page: None,
        };
        let html = renderer(utc_config()).render_home(&home).unwrap();
        assert!(html.contains(r#"<a href="/post/b">"#));
        assert!(html.contains("<strong>Rust &amp; &lt;friends&gt;</strong>"));
        assert!(html.contains(r#"href="/page/2">Carregar mais posts"#));
        assert!(!html.contains("Posts mais recentes"));
    }

    #[test]
    fn test_render_not_found_in_english() {
        let config = SiteConfig {
            language: "en".to_string(),
            ..SiteConfig::default()
        };
        let html = renderer(config).render_not_found().unwrap();
        assert!(html.contains("Page not found"));
        assert!(html.contains(r#"<html lang="en">"#));
    }
}
