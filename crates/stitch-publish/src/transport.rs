//! Remote transport abstraction and its FTP implementation.

use std::fs::File;
use std::path::{Path, PathBuf};

use suppaftp::types::FileType;
use suppaftp::FtpStream;

/// Errors reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Failed to read {path}: {source}")]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The operations a publish session needs from a remote target.
pub trait RemoteTransport {
    /// Authenticate the session.
    fn login(&mut self, user: &str, password: &str) -> Result<(), TransportError>;

    /// Change the remote working directory.
    fn cwd(&mut self, path: &str) -> Result<(), TransportError>;

    /// Create one directory inside the working directory.
    fn mkdir(&mut self, name: &str) -> Result<(), TransportError>;

    /// Upload a local file to `remote`, relative to the working directory.
    fn put(&mut self, local: &Path, remote: &str) -> Result<(), TransportError>;

    /// End the session.
    fn quit(&mut self) -> Result<(), TransportError>;
}

/// Plain FTP transport.
pub struct FtpTransport {
    stream: FtpStream,
}

impl FtpTransport {
    /// Open a control connection to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = FtpStream::connect((host, port))
            .map_err(|e| TransportError::Connect(format!("{}:{}: {}", host, port, e)))?;
        Ok(Self { stream })
    }
}

fn remote_err(e: suppaftp::FtpError) -> TransportError {
    TransportError::Remote(e.to_string())
}

impl RemoteTransport for FtpTransport {
    fn login(&mut self, user: &str, password: &str) -> Result<(), TransportError> {
        self.stream.login(user, password).map_err(remote_err)?;
        self.stream
            .transfer_type(FileType::Binary)
            .map_err(remote_err)
    }

    fn cwd(&mut self, path: &str) -> Result<(), TransportError> {
        self.stream.cwd(path).map_err(remote_err)
    }

    fn mkdir(&mut self, name: &str) -> Result<(), TransportError> {
        self.stream.mkdir(name).map_err(remote_err)
    }

    fn put(&mut self, local: &Path, remote: &str) -> Result<(), TransportError> {
        let mut file = File::open(local).map_err(|e| TransportError::Local {
            path: local.to_path_buf(),
            source: e,
        })?;
        self.stream
            .put_file(remote, &mut file)
            .map(|_| ())
            .map_err(remote_err)
    }

    fn quit(&mut self) -> Result<(), TransportError> {
        self.stream.quit().map_err(remote_err)
    }
}
