//! Built-in spacetraveling templates using the Tera template engine
//!
//! Templates are embedded in the binary. Values are escaped in Rust before
//! they reach the context, so template autoescaping stays off.

mod pages;

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

pub use pages::SiteRenderer;

/// Template renderer with the embedded templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Context values are escaped when the page data is built
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("404.html", include_str!("spacetraveling/404.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/comments.html",
                include_str!("spacetraveling/partials/comments.html"),
            ),
            (
                "partials/preview.html",
                include_str!("spacetraveling/partials/preview.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub home_url: String,
    pub logo_url: String,
    pub toolbar_repo: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub date_xml: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub current: u32,
    pub total: u32,
    pub prev_link: String,
    pub next_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub title: String,
    pub author: Option<String>,
    pub banner: Option<BannerData>,
    pub date: Option<String>,
    pub date_xml: Option<String>,
    pub edited_at: Option<String>,
    pub reading_time: u32,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerData {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    /// Rendered rich-text body
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsData {
    pub script: String,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}
