//! List site content

use anyhow::Result;

use crate::helpers::{format_day, parse_timezone};
use crate::pipeline::{assemble_home, list_uids};
use crate::repository::query::MAX_PAGE_SIZE;
use crate::Site;

/// List site content by type
pub async fn run(site: &Site, content_type: &str) -> Result<()> {
    let repo = site.repository()?;
    let doc_type = &site.config.repository.document_type;

    match content_type {
        "post" | "posts" => {
            let tz = parse_timezone(&site.config.timezone);
            let mut page = 1;
            let mut lines = Vec::new();

            loop {
                let home = assemble_home(repo.as_ref(), doc_type, page, MAX_PAGE_SIZE).await?;
                for post in &home.posts {
                    let date = post
                        .first_publication_date
                        .map(|d| format_day(&d, tz, &site.config.language))
                        .unwrap_or_else(|| "unpublished".to_string());
                    lines.push(format!("  {} - {} [{}]", date, post.title, post.uid));
                }
                match home.next_page {
                    Some(next) => page = next,
                    None => break,
                }
            }

            println!("Posts ({}):", lines.len());
            for line in lines {
                println!("{}", line);
            }
        }
        "route" | "routes" => {
            let uids = list_uids(repo.as_ref(), doc_type).await?;
            println!("Routes ({}):", uids.len() + 1);
            println!("  /");
            for uid in uids {
                println!("  /post/{}", uid);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(())
}
