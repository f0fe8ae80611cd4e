//! Build-then-upload command.

use std::path::Path;

use anyhow::{bail, Context, Result};
use stitch_publish::{FtpTransport, PublishReport, PublishSession};

use crate::commands::build;
use crate::config::{site_dir, SiteConfig};

/// Run the publish command.
pub async fn run(folder: &Path) -> Result<()> {
    let site = site_dir(folder)?;
    let config = SiteConfig::load(&site)?;

    // Credentials are checked before anything is built or uploaded
    let publish = config.publish_config()?;
    let report = build::execute(config.build_config(&site)).await?;
    let output_dir = report.output_dir;

    let report = tokio::task::spawn_blocking(move || {
        let transport = FtpTransport::connect(&publish.host, publish.port)?;
        PublishSession::new(transport, publish)
            .publish(&output_dir)
            .map_err(anyhow::Error::from)
    })
    .await
    .context("Publish task failed")??;

    summarize(&report)
}

/// Log the session outcome; any failed upload makes the command fail.
fn summarize(report: &PublishReport) -> Result<()> {
    let failed: Vec<&str> = report
        .failures()
        .map(|f| f.relative_path.as_str())
        .collect();

    if failed.is_empty() {
        tracing::info!("Published {} files", report.uploaded());
        return Ok(());
    }

    bail!(
        "{} of {} files failed to upload: {}",
        failed.len(),
        report.files.len(),
        failed.join(", ")
    );
}
