//! Directory scanning with extension classification and exclusion rules.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Files the scanner never reports.
const HOUSEKEEPING_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// What a file is, judged by its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Structured data (json, yaml)
    Data,
    /// Prose converted to HTML (markdown)
    Prose,
    /// HTML markup
    Markup,
    /// Plain stylesheet
    Stylesheet,
    /// Script
    Script,
    /// Stylesheet source that compiles to a stylesheet (scss)
    StylesheetSource,
    /// Anything else, copied through untouched
    Opaque,
}

impl FileKind {
    /// Classify an extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "json" | "yaml" | "yml" => Self::Data,
            "md" | "markdown" => Self::Prose,
            "html" | "htm" => Self::Markup,
            "css" => Self::Stylesheet,
            "js" => Self::Script,
            "scss" => Self::StylesheetSource,
            _ => Self::Opaque,
        }
    }

    /// Whether files of this kind are text the pipeline parses and renders.
    pub fn is_parsable(self) -> bool {
        self != Self::Opaque
    }
}

/// How much of each file to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Load the file contents
    Full,
    /// Only enumerate; used to plan uploads
    MetadataOnly,
}

/// Loaded contents of a scanned file.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// UTF-8 text (parsable files)
    Text(String),
    /// Raw bytes (opaque or excluded files)
    Bytes(Vec<u8>),
    /// Not loaded
    Absent,
}

impl Payload {
    /// View the payload as bytes, if loaded.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Text(text) => Some(text.as_bytes()),
            Payload::Bytes(bytes) => Some(bytes),
            Payload::Absent => None,
        }
    }
}

/// A file found under a scanned root.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to the scanned root, `/`-separated
    pub relative_path: String,

    /// Extension without the dot (empty when there is none)
    pub extension: String,

    /// Recognized extension and not excluded
    pub parsable: bool,

    /// File contents
    pub payload: Payload,
}

impl ScannedFile {
    /// Classification of this file's extension.
    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension)
    }
}

/// Site-relative exclusion patterns.
///
/// A file is excluded when `dir/name` equals a pattern, or when its
/// containing directory starts with one.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    patterns: Vec<String>,
}

impl ExcludeRules {
    /// Build rules from configured patterns. Empty patterns are dropped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Whether a file in `dir` with site-relative path `file` is excluded.
    pub fn is_excluded(&self, dir: &str, file: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern == file || dir.starts_with(pattern.as_str()))
    }
}

/// Errors that can occur while scanning.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recursively scan `root`, depth-first, in file-name order per directory.
///
/// `site_prefix` is the root's path relative to the site folder (e.g.
/// `templates`); exclusion patterns are matched against paths carrying it.
pub fn scan(
    root: &Path,
    site_prefix: &str,
    rules: &ExcludeRules,
    mode: ReadMode,
) -> Result<Vec<ScannedFile>, ScanError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if HOUSEKEEPING_FILES.contains(&name.as_ref()) {
            continue;
        }

        let path = entry.path();
        let relative_path = relative_slash_path(root, path);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();

        let dir = match relative_path.rsplit_once('/') {
            Some((parent, _)) => join_site_path(site_prefix, parent),
            None => site_prefix.to_string(),
        };
        let site_path = join_site_path(site_prefix, &relative_path);

        let parsable = FileKind::from_extension(&extension).is_parsable()
            && !rules.is_excluded(&dir, &site_path);

        let payload = match mode {
            ReadMode::MetadataOnly => Payload::Absent,
            ReadMode::Full => {
                let bytes = fs::read(path).map_err(|e| ScanError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                if parsable {
                    Payload::Text(decode_text(&site_path, bytes))
                } else {
                    Payload::Bytes(bytes)
                }
            }
        };

        tracing::debug!("Scanned {} (parsable: {})", site_path, parsable);

        files.push(ScannedFile {
            relative_path,
            extension,
            parsable,
            payload,
        });
    }

    Ok(files)
}

/// Decode a parsable file, replacing invalid UTF-8 sequences.
fn decode_text(site_path: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{} is not valid UTF-8, decoding lossily", site_path);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Path of `path` under `root`, with `/` separators on every platform.
fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_site_path(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn classifies_extensions() {
        assert_eq!(FileKind::from_extension("json"), FileKind::Data);
        assert_eq!(FileKind::from_extension("md"), FileKind::Prose);
        assert_eq!(FileKind::from_extension("scss"), FileKind::StylesheetSource);
        assert_eq!(FileKind::from_extension("png"), FileKind::Opaque);
        assert!(!FileKind::from_extension("").is_parsable());
    }

    #[test]
    fn walks_depth_first_in_name_order() {
        let temp = tempdir().unwrap();
        write(temp.path(), "b.html", b"b");
        write(temp.path(), "a/z.html", b"z");
        write(temp.path(), "a/nested/y.html", b"y");
        write(temp.path(), "c.png", &[0x89, 0x50]);

        let files = scan(temp.path(), "templates", &ExcludeRules::default(), ReadMode::Full).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["a/nested/y.html", "a/z.html", "b.html", "c.png"]);
    }

    #[test]
    fn loads_text_and_bytes() {
        let temp = tempdir().unwrap();
        write(temp.path(), "index.html", b"<h1>Hi</h1>");
        write(temp.path(), "logo.png", &[0, 159, 146, 150]);

        let files = scan(temp.path(), "templates", &ExcludeRules::default(), ReadMode::Full).unwrap();

        assert_eq!(files[0].payload, Payload::Text("<h1>Hi</h1>".to_string()));
        assert!(files[0].parsable);
        assert_eq!(files[1].payload, Payload::Bytes(vec![0, 159, 146, 150]));
        assert!(!files[1].parsable);
        assert_eq!(files[1].extension, "png");
    }

    #[test]
    fn decodes_invalid_utf8_lossily() {
        let temp = tempdir().unwrap();
        write(temp.path(), "legacy.html", b"caf\xe9 {{title}}");

        let files = scan(temp.path(), "templates", &ExcludeRules::default(), ReadMode::Full).unwrap();

        assert!(files[0].parsable);
        assert_eq!(
            files[0].payload,
            Payload::Text("caf\u{FFFD} {{title}}".to_string())
        );
    }

    #[test]
    fn skips_housekeeping_files() {
        let temp = tempdir().unwrap();
        write(temp.path(), ".DS_Store", b"junk");
        write(temp.path(), "sub/Thumbs.db", b"junk");
        write(temp.path(), "index.html", b"ok");

        let files = scan(temp.path(), "", &ExcludeRules::default(), ReadMode::Full).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "index.html");
    }

    #[test]
    fn excludes_exact_files_and_subtrees() {
        let temp = tempdir().unwrap();
        write(temp.path(), "css/app.css", b"body{}");
        write(temp.path(), "css/raw.css", b"body{}");
        write(temp.path(), "vendor/lib/x.js", b"var x;");
        write(temp.path(), "index.html", b"ok");

        let rules = ExcludeRules::new(["templates/css/raw.css", "templates/vendor"]);
        let files = scan(temp.path(), "templates", &rules, ReadMode::Full).unwrap();

        let parsable: Vec<_> = files
            .iter()
            .map(|f| (f.relative_path.as_str(), f.parsable))
            .collect();
        assert_eq!(
            parsable,
            vec![
                ("css/app.css", true),
                ("css/raw.css", false),
                ("index.html", true),
                ("vendor/lib/x.js", false),
            ]
        );

        // Excluded files are still loaded, just as raw bytes
        assert_eq!(files[1].payload, Payload::Bytes(b"body{}".to_vec()));
    }

    #[test]
    fn exclusion_matches_root_directory_prefix() {
        let rules = ExcludeRules::new(["templates"]);
        assert!(rules.is_excluded("templates", "templates/index.html"));
        assert!(!rules.is_excluded("content", "content/index.json"));
    }

    #[test]
    fn metadata_only_leaves_payload_absent() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.html", b"a");
        write(temp.path(), "sub/b.html", b"b");

        let files = scan(temp.path(), "output", &ExcludeRules::default(), ReadMode::MetadataOnly).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.payload == Payload::Absent));
        assert_eq!(files[1].relative_path, "sub/b.html");
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let result = scan(
            &temp.path().join("nope"),
            "content",
            &ExcludeRules::default(),
            ReadMode::Full,
        );

        assert!(matches!(result, Err(ScanError::Walk { .. })));
    }
}
