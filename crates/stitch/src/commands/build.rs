//! Static site build command.

use std::path::Path;

use anyhow::{Context, Result};
use stitch_static::{BuildConfig, BuildPipeline, BuildReport};

use crate::config::{site_dir, SiteConfig};

/// Run one build pass off the async threads.
pub async fn execute(config: BuildConfig) -> Result<BuildReport> {
    let pipeline = BuildPipeline::new(config);
    let report = tokio::task::spawn_blocking(move || pipeline.build())
        .await
        .context("Build task failed")??;

    for issue in &report.issues {
        tracing::warn!("{}", issue);
    }

    Ok(report)
}

/// Run the build command.
pub async fn run(folder: &Path) -> Result<()> {
    let site = site_dir(folder)?;
    let config = SiteConfig::load(&site)?;

    let report = execute(config.build_config(&site)).await?;

    tracing::info!("Output: {}", report.output_dir.display());

    Ok(())
}
