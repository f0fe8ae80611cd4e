//! Mirroring the rendered tree onto disk.

use std::fs;
use std::path::{Path, PathBuf};

/// One file of the output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    /// Path under the output root, `/`-separated
    pub relative_path: String,

    /// Final contents
    pub data: Vec<u8>,
}

/// Errors that can occur while writing output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to clear {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Remove everything inside `root`, keeping `root` itself.
pub fn clear_dir(root: &Path) -> Result<(), OutputError> {
    if !root.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(root).map_err(clear_error(root))? {
        let entry = entry.map_err(clear_error(root))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(clear_error(&path))?;

        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(clear_error(&path))?;
        } else {
            fs::remove_file(&path).map_err(clear_error(&path))?;
        }
    }

    Ok(())
}

fn clear_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError {
    let path = path.to_path_buf();
    move |source| OutputError::Clear { path, source }
}

/// Write every file under `root`, creating directories as needed.
pub fn write_tree(root: &Path, files: &[OutputFile]) -> Result<usize, OutputError> {
    for file in files {
        let path = root.join(&file.relative_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OutputError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(&path, &file.data).map_err(|e| OutputError::Write {
            path: path.clone(),
            source: e,
        })?;
    }

    Ok(files.len())
}
