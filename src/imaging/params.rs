//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides which
//! thumbnails to create, and the [`backend`](super::backend), which does the
//! pixel work. Keeping them separate lets the pipeline run against a mock
//! backend in tests.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 72). Clamped on construction.
//! - [`ThumbnailFormat`]: output encoding for thumbnails (`webp` or `avif`).
//! - [`ResizeParams`]: one resize, from source file to output file at an exact size.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(72)
    }
}

/// Encoding used for generated thumbnails. Both are lossy and take
/// [`Quality`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    #[default]
    Webp,
    Avif,
}

impl ThumbnailFormat {
    /// File extension written for this format (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            ThumbnailFormat::Webp => "webp",
            ThumbnailFormat::Avif => "avif",
        }
    }
}

/// Parameters for a single resize-and-encode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
