//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale an image to an exact target width, preserving aspect ratio.
///
/// The height is rounded to the nearest pixel and never drops below 1, so
/// extreme panoramas still produce a valid raster. Images narrower than the
/// target are enlarged: thumbnails always have the configured width.
///
/// # Examples
/// ```
/// # use galerie::imaging::fit_width;
/// assert_eq!(fit_width((1200, 800), 320), (320, 213));
/// assert_eq!(fit_width((800, 1200), 640), (640, 960));
/// ```
pub fn fit_width(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return (target_width, orig_h.max(1));
    }
    let ratio = target_width as f64 / orig_w as f64;
    let height = (orig_h as f64 * ratio).round() as u32;
    (target_width, height.max(1))
}

/// A single thumbnail rendition to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSize {
    /// Configured width; also the filename suffix (`<id>-<target>.<ext>`).
    pub target: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate the renditions for every configured width, in configured order.
///
/// Unlike responsive sizes, widths larger than the original are kept: the
/// gallery layout expects every thumbnail width to exist.
pub fn calculate_thumbnail_sizes(original: (u32, u32), widths: &[u32]) -> Vec<ThumbnailSize> {
    widths
        .iter()
        .map(|&target| {
            let (width, height) = fit_width(original, target);
            ThumbnailSize {
                target,
                width,
                height,
            }
        })
        .collect()
}
