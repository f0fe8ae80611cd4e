//! Publish session: authenticate, mirror directories, upload one file at a time.

use std::path::{Path, PathBuf};

use stitch_content::{scan, ExcludeRules, ReadMode, ScanError};

use crate::transport::{RemoteTransport, TransportError};

/// Site-relative name of the tree being published.
const OUTPUT_PREFIX: &str = "output";

/// Where and as whom to publish.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Outcome of one file's upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploaded,
    Failed(String),
}

/// One entry of the publish report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Path under the output root
    pub relative_path: String,
    pub status: UploadStatus,
}

/// Per-file results of a publish session, in upload order.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub files: Vec<FileUpload>,
}

impl PublishReport {
    /// Files that failed to upload.
    pub fn failures(&self) -> impl Iterator<Item = &FileUpload> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, UploadStatus::Failed(_)))
    }

    /// Number of files uploaded successfully.
    pub fn uploaded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == UploadStatus::Uploaded)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Errors that abort a publish session.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Authentication failed for '{user}' at '{host}': {source}")]
    Auth {
        user: String,
        host: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to enumerate {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: ScanError,
    },
}

/// One authenticate, upload, disconnect run against a remote target.
pub struct PublishSession<T: RemoteTransport> {
    transport: T,
    config: PublishConfig,
}

impl<T: RemoteTransport> PublishSession<T> {
    pub fn new(transport: T, config: PublishConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Upload every file under `output_root`, strictly one after another.
    ///
    /// Authentication failure stops the session before any upload. Per-file
    /// failures are recorded and the session moves on to the next file.
    pub fn publish(&mut self, output_root: &Path) -> Result<PublishReport, PublishError> {
        tracing::info!("Connecting to '{}'...", self.config.host);

        if let Err(source) = self
            .transport
            .login(&self.config.user, &self.config.password)
        {
            self.disconnect();
            return Err(PublishError::Auth {
                user: self.config.user.clone(),
                host: self.config.host.clone(),
                source,
            });
        }

        // Exclusion only affects rendering; every output file is uploaded
        let rules = ExcludeRules::default();
        let files = match scan(output_root, OUTPUT_PREFIX, &rules, ReadMode::MetadataOnly) {
            Ok(files) => files,
            Err(source) => {
                self.disconnect();
                return Err(PublishError::Enumerate {
                    path: output_root.to_path_buf(),
                    source,
                });
            }
        };

        tracing::info!("Uploading {} files to '{}'...", files.len(), self.config.host);

        let mut report = PublishReport::default();
        for file in files {
            let status = match self.upload(output_root, &file.relative_path) {
                Ok(()) => {
                    tracing::debug!("Uploaded {}", file.relative_path);
                    UploadStatus::Uploaded
                }
                Err(e) => {
                    tracing::warn!("Failed to upload {}: {}", file.relative_path, e);
                    UploadStatus::Failed(e.to_string())
                }
            };
            report.files.push(FileUpload {
                relative_path: file.relative_path,
                status,
            });
        }

        self.disconnect();

        Ok(report)
    }

    fn upload(&mut self, output_root: &Path, relative_path: &str) -> Result<(), TransportError> {
        self.ensure_remote_dirs(relative_path)?;
        self.transport.cwd("/")?;
        self.transport
            .put(&output_root.join(relative_path), relative_path)
    }

    /// Create each parent directory of `relative_path`, one segment at a time.
    fn ensure_remote_dirs(&mut self, relative_path: &str) -> Result<(), TransportError> {
        let Some((dirs, _)) = relative_path.rsplit_once('/') else {
            return Ok(());
        };

        self.transport.cwd("/")?;
        for dir in dirs.split('/') {
            // Usually fails only because the directory exists; cwd tells.
            if let Err(e) = self.transport.mkdir(dir) {
                tracing::debug!("mkdir {}: {}", dir, e);
            }
            self.transport.cwd(dir)?;
        }

        Ok(())
    }

    fn disconnect(&mut self) {
        tracing::info!("Disconnecting from '{}'...", self.config.host);
        if let Err(e) = self.transport.quit() {
            tracing::warn!("Failed to disconnect cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Login(String),
        Cwd(String),
        Mkdir(String),
        Put(String),
        Quit,
    }

    /// In-memory remote that records every call.
    #[derive(Default)]
    struct RecordingTransport {
        calls: Vec<Call>,
        reject_login: bool,
        fail_puts: HashSet<String>,
        /// Directories that already exist remotely, by name
        existing: HashSet<String>,
        /// Directories cwd cannot enter, by name
        unreachable: HashSet<String>,
    }

    impl RemoteTransport for RecordingTransport {
        fn login(&mut self, user: &str, _password: &str) -> Result<(), TransportError> {
            self.calls.push(Call::Login(user.to_string()));
            if self.reject_login {
                return Err(TransportError::Remote("530 Login incorrect".to_string()));
            }
            Ok(())
        }

        fn cwd(&mut self, path: &str) -> Result<(), TransportError> {
            self.calls.push(Call::Cwd(path.to_string()));
            if self.unreachable.contains(path) {
                return Err(TransportError::Remote(format!("550 {}", path)));
            }
            Ok(())
        }

        fn mkdir(&mut self, name: &str) -> Result<(), TransportError> {
            self.calls.push(Call::Mkdir(name.to_string()));
            if self.existing.contains(name) {
                return Err(TransportError::Remote("550 File exists".to_string()));
            }
            Ok(())
        }

        fn put(&mut self, local: &Path, remote: &str) -> Result<(), TransportError> {
            assert!(local.is_file(), "local file should exist: {}", local.display());
            self.calls.push(Call::Put(remote.to_string()));
            if self.fail_puts.contains(remote) {
                return Err(TransportError::Remote("451 Aborted".to_string()));
            }
            Ok(())
        }

        fn quit(&mut self) -> Result<(), TransportError> {
            self.calls.push(Call::Quit);
            Ok(())
        }
    }

    fn config() -> PublishConfig {
        PublishConfig {
            host: "ftp.example.com".to_string(),
            port: 21,
            user: "site".to_string(),
            password: "secret".to_string(),
        }
    }

    fn output_tree(files: &[&str]) -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        for rel in files {
            let path = temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, rel.as_bytes()).unwrap();
        }
        temp
    }

    fn cwd(p: &str) -> Call {
        Call::Cwd(p.to_string())
    }

    fn mkdir(p: &str) -> Call {
        Call::Mkdir(p.to_string())
    }

    fn put(p: &str) -> Call {
        Call::Put(p.to_string())
    }

    #[test]
    fn uploads_in_order_creating_directories_first() {
        let out = output_tree(&["a.html", "sub/b.html"]);
        let mut session = PublishSession::new(RecordingTransport::default(), config());

        let report = session.publish(out.path()).unwrap();

        assert!(report.is_success());
        assert_eq!(report.uploaded(), 2);
        assert_eq!(
            session.transport().calls,
            vec![
                Call::Login("site".to_string()),
                cwd("/"),
                put("a.html"),
                cwd("/"),
                mkdir("sub"),
                cwd("sub"),
                cwd("/"),
                put("sub/b.html"),
                Call::Quit,
            ]
        );
    }

    #[test]
    fn creates_nested_directories_segment_by_segment() {
        let out = output_tree(&["x/y/c.css"]);
        let mut session = PublishSession::new(RecordingTransport::default(), config());

        session.publish(out.path()).unwrap();

        assert_eq!(
            session.transport().calls[1..7],
            [
                cwd("/"),
                mkdir("x"),
                cwd("x"),
                mkdir("y"),
                cwd("y"),
                cwd("/"),
            ]
        );
    }

    #[test]
    fn uploads_every_output_file() {
        let out = output_tree(&["index.html", "img/logo.png", "vendor/lib.js"]);
        let mut session = PublishSession::new(RecordingTransport::default(), config());

        let report = session.publish(out.path()).unwrap();

        let paths: Vec<_> = report.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["img/logo.png", "index.html", "vendor/lib.js"]);
        assert_eq!(report.uploaded(), 3);
    }

    #[test]
    fn existing_remote_directories_are_fine() {
        let out = output_tree(&["sub/b.html"]);
        let transport = RecordingTransport {
            existing: HashSet::from(["sub".to_string()]),
            ..Default::default()
        };
        let mut session = PublishSession::new(transport, config());

        let report = session.publish(out.path()).unwrap();

        assert!(report.is_success());
    }

    #[test]
    fn auth_failure_stops_before_uploads() {
        let out = output_tree(&["a.html"]);
        let transport = RecordingTransport {
            reject_login: true,
            ..Default::default()
        };
        let mut session = PublishSession::new(transport, config());

        let err = session.publish(out.path()).unwrap_err();

        assert!(matches!(err, PublishError::Auth { .. }));
        assert!(!session
            .transport()
            .calls
            .iter()
            .any(|c| matches!(c, Call::Put(_) | Call::Mkdir(_))));
    }

    #[test]
    fn records_failures_and_continues() {
        let out = output_tree(&["a.html", "b.html", "c.html"]);
        let transport = RecordingTransport {
            fail_puts: HashSet::from(["b.html".to_string()]),
            ..Default::default()
        };
        let mut session = PublishSession::new(transport, config());

        let report = session.publish(out.path()).unwrap();

        assert_eq!(report.uploaded(), 2);
        let failed: Vec<_> = report.failures().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(failed, vec!["b.html"]);
        assert_eq!(report.files[2].status, UploadStatus::Uploaded);
        assert_eq!(session.transport().calls.last(), Some(&Call::Quit));
    }

    #[test]
    fn unreachable_directory_fails_only_that_file() {
        let out = output_tree(&["locked/a.html", "z.html"]);
        let transport = RecordingTransport {
            unreachable: HashSet::from(["locked".to_string()]),
            ..Default::default()
        };
        let mut session = PublishSession::new(transport, config());

        let report = session.publish(out.path()).unwrap();

        assert!(matches!(report.files[0].status, UploadStatus::Failed(_)));
        assert_eq!(report.files[1].status, UploadStatus::Uploaded);
        assert!(!session.transport().calls.contains(&put("locked/a.html")));
    }

    #[test]
    fn missing_output_tree_is_an_error() {
        let temp = tempdir().unwrap();
        let mut session = PublishSession::new(RecordingTransport::default(), config());

        let err = session.publish(&temp.path().join("output")).unwrap_err();

        assert!(matches!(err, PublishError::Enumerate { .. }));
        assert_eq!(session.transport().calls.last(), Some(&Call::Quit));
    }
}
