//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{ThumbnailSize, calculate_thumbnail_sizes};
use super::params::{Quality, ResizeParams, ThumbnailFormat};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Target widths, e.g. `[320, 640]`.
    pub widths: Vec<u32>,
    pub quality: Quality,
    pub format: ThumbnailFormat,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            widths: vec![320, 640],
            quality: Quality::default(),
            format: ThumbnailFormat::default(),
        }
    }
}

/// A thumbnail written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedThumbnail {
    pub target_width: u32,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub path: PathBuf,
}

/// File name of a thumbnail: `<stem>-<width>.<ext>`.
pub fn thumbnail_file_name(stem: &str, width: u32, format: ThumbnailFormat) -> String {
    format!("{}-{}.{}", stem, width, format.extension())
}

/// Create one thumbnail per configured width.
///
/// Existing files with the same name are overwritten; nothing is skipped.
pub fn create_thumbnails(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    filename_stem: &str,
    original_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> Result<Vec<GeneratedThumbnail>> {
    let sizes = calculate_thumbnail_sizes(original_dims, &config.widths);
    let mut generated = Vec::with_capacity(sizes.len());

    for ThumbnailSize {
        target,
        width,
        height,
    } in sizes
    {
        let file_name = thumbnail_file_name(filename_stem, target, config.format);
        let path = output_dir.join(&file_name);

        backend.resize(&ResizeParams {
            source: source.to_path_buf(),
            output: path.clone(),
            width,
            height,
            quality: config.quality,
        })?;

        generated.push(GeneratedThumbnail {
            target_width: target,
            width,
            height,
            file_name,
            path,
        });
    }

    Ok(generated)
}
