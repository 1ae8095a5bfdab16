//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the builder needs:
//! identify (pixel dimensions) and resize (decode, scale, re-encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure-Rust
//! `image` crate ecosystem.

use super::params::ResizeParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("No decoder available for {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// The pipeline is written against this trait so tests can swap in a
/// recording mock and never touch pixels.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the source, resize it to exactly `width`×`height`, and encode
    /// to the output path. The output extension selects the encoder.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
