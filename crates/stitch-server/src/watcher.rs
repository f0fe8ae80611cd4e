//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// A single change reported by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was created
    Created(PathBuf),

    /// File was modified
    Modified(PathBuf),

    /// File was deleted
    Deleted(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Modified(p) | WatchEvent::Deleted(p) => p,
        }
    }
}

/// Changes delivered together by one filesystem notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub events: Vec<WatchEvent>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Errors that can occur while setting up a watch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel of change batches. Batches without
    /// a create, modify or delete are never sent. Dropping the watcher stops
    /// delivery.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<ChangeBatch>), WatchError> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            match res {
                Ok(event) => {
                    let _ = sync_tx.send(event);
                }
                Err(e) => tracing::warn!("File watch error: {}", e),
            }
        })
        .map_err(WatchError::Create)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(|e| WatchError::Watch {
                        path: path.clone(),
                        source: e,
                    })?;
            } else {
                tracing::warn!("Not watching missing path {}", path.display());
            }
        }

        // Forward notify's callback thread into the async world
        std::thread::spawn(move || {
            while let Ok(event) = sync_rx.recv() {
                let batch = classify_event(&event);
                if batch.is_empty() {
                    continue;
                }
                if async_tx.blocking_send(batch).is_err() {
                    break;
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Turn a notify event into a batch of changes.
fn classify_event(event: &notify::Event) -> ChangeBatch {
    use notify::EventKind;

    let make: fn(PathBuf) -> WatchEvent = match event.kind {
        EventKind::Create(_) => WatchEvent::Created,
        EventKind::Modify(_) => WatchEvent::Modified,
        EventKind::Remove(_) => WatchEvent::Deleted,
        _ => return ChangeBatch::default(),
    };

    ChangeBatch {
        events: event.paths.iter().cloned().map(make).collect(),
    }
}
