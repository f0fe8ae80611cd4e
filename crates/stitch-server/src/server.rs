//! Preview server and development mode.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

use stitch_static::{BuildConfig, BuildPipeline};

use crate::rebuild::RebuildQueue;
use crate::watcher::{FileWatcher, WatchError};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Build settings for the site being served
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 8008,
            host: "127.0.0.1".to_string(),
            open: false,
        }
    }
}

impl DevServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ServerError::InvalidAddress(raw))
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Serves the output tree over HTTP.
pub struct PreviewServer {
    root: PathBuf,
    addr: SocketAddr,
}

impl PreviewServer {
    pub fn new(root: impl Into<PathBuf>, addr: SocketAddr) -> Self {
        Self {
            root: root.into(),
            addr,
        }
    }

    /// Router serving files from `root`; `/` maps to `index.html`.
    pub fn router(root: impl Into<PathBuf>) -> Router {
        Router::new()
            .fallback_service(ServeDir::new(root.into()))
            .layer(middleware::from_fn(log_request))
    }

    /// Bind and serve until the process exits.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::BindError(self.addr, e.to_string()))?;

        tracing::info!("Server running at 'http://{}'", self.addr);

        axum::serve(listener, Self::router(self.root))
            .await
            .map_err(|e| ServerError::BindError(self.addr, e.to_string()))
    }
}

async fn log_request(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    tracing::info!("Client request: '{}' ({})", path, response.status().as_u16());
    response
}

/// Development server: build, serve, and rebuild on change.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr = self.config.addr()?;
        let build = self.config.build.clone();
        let pipeline = Arc::new(BuildPipeline::new(build.clone()));

        run_pass(Arc::clone(&pipeline)).await;

        let rebuilds = watch_and_rebuild(pipeline)?;

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let served = PreviewServer::new(build.output_dir(), addr).serve().await;
        rebuilds.abort();
        served
    }
}

/// Watch the content and template trees and rebuild on every change.
///
/// Passes run one at a time; changes made during a pass schedule a single
/// follow-up. Aborting the returned task stops watching.
pub fn watch_and_rebuild(pipeline: Arc<BuildPipeline>) -> Result<JoinHandle<()>, ServerError> {
    let build = pipeline.config();
    let watch_paths = vec![build.content_dir(), build.templates_dir()];
    let (watcher, mut rx) = FileWatcher::new(&watch_paths)?;

    let queue = RebuildQueue::new();
    let changes = queue.clone();

    Ok(tokio::spawn(async move {
        // Keep watcher alive
        let _watcher = watcher;

        let forward = async {
            while let Some(batch) = rx.recv().await {
                tracing::debug!("{} change(s), scheduling rebuild", batch.events.len());
                changes.request();
            }
        };
        let rebuild = queue.run(|| run_pass(Arc::clone(&pipeline)));

        tokio::join!(forward, rebuild);
    }))
}

/// Run one build pass off the async threads and log its outcome.
async fn run_pass(pipeline: Arc<BuildPipeline>) {
    match tokio::task::spawn_blocking(move || pipeline.build()).await {
        Ok(Ok(report)) => {
            for issue in &report.issues {
                tracing::warn!("{}", issue);
            }
        }
        Ok(Err(e)) => tracing::error!("Build failed: {}", e),
        Err(e) => tracing::error!("Build task failed: {}", e),
    }
}
