//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Generate the static site from the configured repository
pub async fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let repo = site.repository()?;
    let generator = Generator::new(site, repo)?;
    let stats = generator.generate().await?;

    tracing::info!(
        "Wrote {} home pages and {} posts ({} skipped), copied {} assets",
        stats.home_pages,
        stats.posts,
        stats.skipped,
        stats.assets
    );

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
