//! Development server command.

use std::path::Path;

use anyhow::Result;
use stitch_server::{DevServer, DevServerConfig};

use crate::config::{site_dir, SiteConfig};

/// Run the dev server.
pub async fn run(folder: &Path, port: u16, open: bool) -> Result<()> {
    let site = site_dir(folder)?;
    let config = SiteConfig::load(&site)?;

    tracing::info!("Starting development server on port {}", port);

    let config = DevServerConfig {
        build: config.build_config(&site),
        port,
        open,
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}
