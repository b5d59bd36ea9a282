//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `repository.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable overriding `repository.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Home page
    pub per_page: u32,

    pub repository: RepositoryConfig,
    pub comments: CommentsConfig,
    pub preview: PreviewConfig,
    pub build: BuildConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            per_page: 5,

            repository: RepositoryConfig::default(),
            comments: CommentsConfig::default(),
            preview: PreviewConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.is_empty()) {
            tracing::debug!("Repository endpoint overridden by {}", ENDPOINT_ENV);
            self.repository.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|v| !v.is_empty()) {
            tracing::debug!("Repository access token taken from {}", ACCESS_TOKEN_ENV);
            self.repository.access_token = Some(token);
        }
    }
}

/// Where documents come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// Remote Prismic-compatible REST API
    Prismic,
    /// Directory of exported JSON documents
    Local,
}

/// Content repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub kind: RepositoryKind,
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
    /// Directory for `kind: local`, relative to the site root
    pub local_dir: String,
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            kind: RepositoryKind::Prismic,
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            local_dir: "content".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Comment widget (utterances) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub script: String,
    /// GitHub repository holding the comment issues, `owner/name`
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            script: "https://utteranc.es/client.js".to_string(),
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "photon-dark".to_string(),
        }
    }
}

impl CommentsConfig {
    /// The widget is only emitted when enabled and pointed at a repository
    pub fn is_active(&self) -> bool {
        self.enable && !self.repo.is_empty()
    }
}

/// Preview mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enable: bool,
    /// Repository name for the preview toolbar script, empty to omit it
    pub toolbar_repo: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enable: true,
            toolbar_repo: String::new(),
        }
    }
}

/// Static build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Post pages assembled at the same time
    pub concurrency: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}
