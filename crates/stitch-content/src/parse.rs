//! Turning one content file into a fragment.

use pulldown_cmark::{html, Options, Parser};
use serde_json::Value;

use crate::aggregate::strip_ordering_prefix;
use crate::scan::{FileKind, Payload, ScannedFile};

/// Flat key to value mapping produced by one content file.
pub type Fragment = serde_json::Map<String, Value>;

/// Errors that can occur when parsing content.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid data in {path}: {message}")]
    InvalidData { path: String, message: String },

    #[error("Top level of {path} must be a mapping")]
    NotAMapping { path: String },

    #[error("{path} is not valid UTF-8")]
    NotText { path: String },

    #[error("{path} was scanned without its contents")]
    MissingPayload { path: String },
}

/// Parse a scanned content file, dispatching on its extension.
///
/// Data files yield their top-level mapping, prose files yield a single
/// `{derived_key: html}` entry, everything else yields `None`.
pub fn parse(file: &ScannedFile) -> Result<Option<Fragment>, ParseError> {
    let kind = file.kind();
    if !matches!(kind, FileKind::Data | FileKind::Prose) {
        return Ok(None);
    }

    let text = payload_text(file)?;

    match kind {
        FileKind::Data => parse_data(&file.relative_path, &file.extension, text).map(Some),
        FileKind::Prose => {
            let mut fragment = Fragment::new();
            fragment.insert(
                derive_key(&file.relative_path),
                Value::String(markdown_to_html(text)),
            );
            Ok(Some(fragment))
        }
        _ => Ok(None),
    }
}

fn payload_text(file: &ScannedFile) -> Result<&str, ParseError> {
    match &file.payload {
        Payload::Text(text) => Ok(text),
        Payload::Bytes(bytes) => std::str::from_utf8(bytes).map_err(|_| ParseError::NotText {
            path: file.relative_path.clone(),
        }),
        Payload::Absent => Err(ParseError::MissingPayload {
            path: file.relative_path.clone(),
        }),
    }
}

fn parse_data(path: &str, extension: &str, text: &str) -> Result<Fragment, ParseError> {
    let value: Value = if extension == "json" {
        serde_json::from_str(text).map_err(|e| ParseError::InvalidData {
            path: path.to_string(),
            message: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(text).map_err(|e| ParseError::InvalidData {
            path: path.to_string(),
            message: e.to_string(),
        })?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAMapping {
            path: path.to_string(),
        }),
    }
}

/// Derive a fragment key from a content-relative path.
///
/// `01-posts/03-hello.md` becomes `01-posts/hello`: the extension is dropped
/// and the ordering prefix is removed from the file name only.
pub fn derive_key(relative_path: &str) -> String {
    let (dir, file) = match relative_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, relative_path),
    };

    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    let stem = strip_ordering_prefix(stem);

    match dir {
        Some(dir) => format!("{}/{}", dir, stem),
        None => stem.to_string(),
    }
}

/// Convert markdown to HTML, keeping authored markup verbatim.
pub fn markdown_to_html(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(source, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
}
