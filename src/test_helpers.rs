//! Shared test utilities for the galerie test suite.
//!
//! Fixture writers for originals and sidecars, plus lookups over build
//! results that panic with a readable message on a miss.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! touch_image(&config.originals_dir, "2024_fest.jpg");
//! write_json(&config.originals_dir.join("2024_fest.json"), r#"{"title": "Fest"}"#);
//!
//! let result = run_with_backend(&backend, &config).unwrap();
//! let record = find_record(&result.records, "2024_fest");
//! assert_eq!(record.title, "Fest");
//! ```

use image::{ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};
use std::fs;
use std::path::Path;

use crate::manifest::ImageRecord;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a placeholder file with an image name. Only for backends that do
/// not read pixels (the mock).
pub fn touch_image(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), "fake image").unwrap();
}

/// Write raw sidecar text, creating the parent directory.
pub fn write_json(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// Encode a real JPEG with a gradient so resizing has something to do.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = fs::File::create(path).unwrap();
    JpegEncoder::new_with_quality(file, 90)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Result lookups (panic with a clear message on miss)
// =========================================================================

/// Find a manifest record by id. Panics if not found.
pub fn find_record<'a>(records: &'a [ImageRecord], id: &str) -> &'a ImageRecord {
    records.iter().find(|r| r.id == id).unwrap_or_else(|| {
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        panic!("record '{id}' not found. Available: {ids:?}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_test_jpeg_is_decodable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/x.jpg");
        create_test_jpeg(&path, 30, 20);

        let dims = image::image_dimensions(&path).unwrap();
        assert_eq!(dims, (30, 20));
    }

    #[test]
    #[should_panic(expected = "record 'b' not found")]
    fn find_record_panics_on_miss() {
        find_record(&[], "b");
    }
}
