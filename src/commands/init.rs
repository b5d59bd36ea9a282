//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public

# Home page
per_page: 5

# Content repository
## kind: prismic | local
repository:
  kind: local
  endpoint: https://your-repo.cdn.prismic.io/api/v2
  document_type: posts
  local_dir: content
  timeout_secs: 30

# Comments (utterances)
comments:
  enable: false
  repo: ''
  issue_term: pathname
  theme: photon-dark

# Preview
preview:
  enable: true
  toolbar_repo: ''

# Build
build:
  concurrency: 4
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26"><text x="0" y="20" fill="#F8F8F8" font-family="sans-serif" font-size="22">spacetraveling<tspan fill="#FF57B2">.</tspan></text></svg>
"##;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("content"))?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists, refusing to overwrite", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;
    fs::write(target_dir.join("static/images/logo.svg"), LOGO)?;

    // Create a sample post in the repository's document format
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string();
    let sample_post = serde_json::json!({
        "id": "hello-world",
        "uid": "hello-world",
        "type": "posts",
        "first_publication_date": now,
        "last_publication_date": now,
        "lang": "pt-br",
        "data": {
            "title": "Hello World",
            "subtitle": "Your very first post",
            "author": "spacetraveling",
            "banner": {},
            "content": [{
                "heading": "Quick start",
                "body": [
                    {
                        "type": "paragraph",
                        "text": "Edit the JSON files under content/ or point the repository at Prismic.",
                        "spans": [{"start": 26, "end": 34, "type": "strong"}]
                    },
                    {"type": "list-item", "text": "spacetraveling generate", "spans": []},
                    {"type": "list-item", "text": "spacetraveling server", "spans": []}
                ]
            }]
        }
    });
    fs::write(
        target_dir.join("content/hello-world.json"),
        serde_json::to_string_pretty(&sample_post)?,
    )?;

    Ok(())
}
