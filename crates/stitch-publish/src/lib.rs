//! Publishing for stitch sites.
//!
//! Uploads a built output tree to a remote host, one directory segment and
//! one file at a time, reporting the outcome of every file.

pub mod session;
pub mod transport;

pub use session::{
    FileUpload, PublishConfig, PublishError, PublishReport, PublishSession, UploadStatus,
};
pub use transport::{FtpTransport, RemoteTransport, TransportError};
