//! The JSON manifest consumed by the static-site generator.
//!
//! One [`ImageRecord`] per original, in discovery order:
//!
//! ```json
//! [
//!   {
//!     "id": "2024-05-01_Anna-Muster_spendenlauf-teamfoto",
//!     "src": "/img/originals/2024-05-01_Anna-Muster_spendenlauf-teamfoto.jpg",
//!     "thumb": "/img/thumbs/2024-05-01_Anna-Muster_spendenlauf-teamfoto-640.webp",
//!     "w": 1200,
//!     "h": 800,
//!     "title": "Inhalt wird nachgetragen.",
//!     "caption": "Inhalt wird nachgetragen.",
//!     "credit": "Foto: SPD Langenselbold",
//!     "year": 2024,
//!     "event": "Inhalt wird nachgetragen.",
//!     "location": "Inhalt wird nachgetragen.",
//!     "people": ["Anna Muster"],
//!     "tags": ["spendenlauf teamfoto"],
//!     "hashtags": ["#SPDLangenselbold", "#2024", "#spendenlaufteamfoto"],
//!     "alt": "Anna Muster spendenlauf teamfoto"
//!   }
//! ]
//! ```
//!
//! The manifest is written once, after every image was processed, through a
//! temporary file that is renamed over the previous manifest. A failed run
//! leaves the old manifest in place.

use crate::metadata::ResolvedMetadata;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One manifest entry. Field names are part of the site's data contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub src: String,
    pub thumb: String,
    pub w: u32,
    pub h: u32,
    pub title: String,
    pub caption: String,
    pub credit: String,
    pub year: Option<i32>,
    pub event: Option<String>,
    pub location: String,
    pub people: Vec<String>,
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,
    pub alt: String,
}

/// Join a URL prefix and a file name with exactly one `/`.
pub fn url_join(prefix: &str, file_name: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), file_name)
}

/// Build the record for one image from its resolved metadata.
pub fn assemble(
    identifier: &str,
    src: String,
    thumb: String,
    dimensions: (u32, u32),
    metadata: ResolvedMetadata,
) -> ImageRecord {
    let ResolvedMetadata {
        title,
        caption,
        credit,
        year,
        event,
        location,
        people,
        tags,
        hashtags,
        alt,
    } = metadata;
    ImageRecord {
        id: identifier.to_string(),
        src,
        thumb,
        w: dimensions.0,
        h: dimensions.1,
        title,
        caption,
        credit,
        year,
        event,
        location,
        people,
        tags,
        hashtags,
        alt,
    }
}

/// Serialize records as pretty JSON (2-space indent, trailing newline).
pub fn to_json(records: &[ImageRecord]) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');
    Ok(json)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the file at `path` with `contents`, creating parent directories.
///
/// Readers see either the old or the new file, never a partial write.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Read a manifest back, e.g. to inspect a previous build.
pub fn read_manifest(path: &Path) -> io::Result<Vec<ImageRecord>> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(io::Error::other)
}
