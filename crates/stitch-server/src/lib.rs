//! Development mode for stitch sites.
//!
//! Serves the output tree for preview, watches the content and template
//! trees, and reruns the build pipeline one pass at a time.

pub mod rebuild;
pub mod server;
pub mod watcher;

pub use rebuild::RebuildQueue;
pub use server::{watch_and_rebuild, DevServer, DevServerConfig, PreviewServer, ServerError};
pub use watcher::{ChangeBatch, FileWatcher, WatchError, WatchEvent};
