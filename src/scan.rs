//! Discovery of original images.
//!
//! Stage 1 of the build pipeline. Lists the originals directory (flat, no
//! recursion) and keeps the files whose extension is on the allow-list:
//!
//! ```text
//! public/img/originals/
//! ├── 2024-05-01_Anna-Muster_spendenlauf-teamfoto.jpg   # image
//! ├── 2024-05-01_Anna-Muster_spendenlauf-teamfoto.json  # sidecar, not an image
//! ├── 2023-09-10_135-jahre-feier.PNG                    # extension match is case-insensitive
//! ├── .hidden.jpg                                       # skipped
//! └── archiv/                                           # subdirectories are ignored
//! ```
//!
//! The result is sorted by identifier (the filename stem), so the manifest
//! order does not depend on the filesystem. Two files sharing a stem
//! (`a.jpg` and `a.png`) would produce the same identifier, sidecar and
//! thumbnail names; that is reported as an error.
//!
//! A missing originals directory is created and yields an empty list.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Duplicate identifier '{identifier}': {first} and {second}")]
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },
}

/// An original image found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Filename without its extension, e.g. `2024-05-01_Anna-Muster`.
    pub identifier: String,
    /// Full filename including extension, e.g. `2024-05-01_Anna-Muster.jpg`.
    pub file_name: String,
    pub path: PathBuf,
}

/// Whether a filename's extension is on the allow-list (case-insensitive).
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Dotfiles, including macOS `._` resource forks, are never images.
fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Discover the original images in `dir`, sorted by identifier.
pub fn discover(dir: &Path, extensions: &[String]) -> Result<Vec<SourceImage>, ScanError> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "creating missing originals directory");
        fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_allowed_extension(entry.path(), extensions) {
            continue;
        }
        let (Some(file_name), Some(identifier)) = (
            entry.file_name().to_str(),
            entry.path().file_stem().and_then(|s| s.to_str()),
        ) else {
            warn!(path = %entry.path().display(), "skipping file with non UTF-8 name");
            continue;
        };
        if is_hidden(file_name) {
            debug!(path = %entry.path().display(), "skipping hidden file");
            continue;
        }
        images.push(SourceImage {
            identifier: identifier.to_string(),
            file_name: file_name.to_string(),
            path: entry.path().to_path_buf(),
        });
    }

    images.sort_by(|a, b| {
        a.identifier
            .cmp(&b.identifier)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    if let Some(pair) = images.windows(2).find(|w| w[0].identifier == w[1].identifier) {
        return Err(ScanError::DuplicateIdentifier {
            identifier: pair[0].identifier.clone(),
            first: pair[0].file_name.clone(),
            second: pair[1].file_name.clone(),
        });
    }

    debug!(count = images.len(), dir = %dir.display(), "discovered images");
    Ok(images)
}
