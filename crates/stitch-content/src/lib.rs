//! Content model for stitch sites.
//!
//! Scans content and template trees, parses content files into fragments,
//! and aggregates fragments into the context templates are rendered against.

pub mod aggregate;
pub mod parse;
pub mod scan;

pub use aggregate::{aggregate, objectify, strip_ordering_prefix, Context, Entry};
pub use parse::{derive_key, markdown_to_html, parse, Fragment, ParseError};
pub use scan::{scan, ExcludeRules, FileKind, Payload, ReadMode, ScannedFile, ScanError};
