//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, `avif-parse` for AVIF |
//! | **Thumbnail** | Lanczos3 `resize_exact` to a fixed width → WebP or AVIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{ThumbnailSize, calculate_thumbnail_sizes, fit_width};
pub use operations::{
    GeneratedThumbnail, ThumbnailConfig, create_thumbnails, get_dimensions, thumbnail_file_name,
};
pub use params::{Quality, ResizeParams, ThumbnailFormat};
pub use rust_backend::RustBackend;
