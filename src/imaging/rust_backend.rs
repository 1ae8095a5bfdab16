//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders, format sniffed from content) |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 decode) + BT.601 YUV→RGB |
//! | Decode (HEIC/HEIF) | not available: reported as [`BackendError::UnsupportedFormat`] |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Extensions that pass discovery but have no pure-Rust decoder.
const UNDECODABLE_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn reject_undecodable(path: &Path) -> Result<(), BackendError> {
    match lowercase_extension(path) {
        Some(ext) if UNDECODABLE_EXTENSIONS.contains(&ext.as_str()) => {
            Err(BackendError::UnsupportedFormat(path.to_path_buf()))
        }
        _ => Ok(()),
    }
}

fn is_avif(path: &Path) -> bool {
    lowercase_extension(path).as_deref() == Some("avif")
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    reject_undecodable(path)?;
    if is_avif(path) {
        return decode_avif(path);
    }
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn parse_avif(path: &Path, bytes: &[u8]) -> Result<avif_parse::AvifData, BackendError> {
    avif_parse::read_avif(&mut std::io::Cursor::new(bytes)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })
}

/// Read dimensions from the AVIF container without decoding pixels.
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let file_data = std::fs::read(path)?;
    let avif = parse_avif(path, &file_data)?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

fn rav1d_failed(step: &str, code: i32) -> BackendError {
    BackendError::ProcessingFailed(format!("rav1d {step} failed ({code})"))
}

/// Decode the primary item of an AVIF file with rav1d.
///
/// The decoder context is closed on every path, including errors raised
/// while feeding data or converting the picture.
fn decode_avif(path: &Path) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib as dav1d;
    use std::ptr::NonNull;

    let file_data = std::fs::read(path)?;
    let avif = parse_avif(path, &file_data)?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    let settings_ptr = NonNull::new(settings.as_mut_ptr())
        .ok_or_else(|| BackendError::ProcessingFailed("rav1d settings allocation".into()))?;
    unsafe { dav1d::dav1d_default_settings(settings_ptr) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(rav1d_failed("open", rc.0));
    }

    let decoded = (|| -> Result<DynamicImage, BackendError> {
        let mut data = Dav1dData::default();
        let buf_ptr = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
        if buf_ptr.is_null() {
            return Err(BackendError::ProcessingFailed(
                "rav1d data_create failed".into(),
            ));
        }
        unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

        let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut data)) };
        if rc.0 != 0 {
            unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut data)) };
            return Err(rav1d_failed("send_data", rc.0));
        }

        let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
        let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
        if rc.0 != 0 {
            return Err(rav1d_failed("get_picture", rc.0));
        }

        let converted = picture_to_rgb(&pic);
        unsafe { dav1d::dav1d_picture_unref(NonNull::new(&mut pic)) };
        let (width, height, rgb) = converted?;

        image::RgbImage::from_raw(width, height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| {
                BackendError::ProcessingFailed(
                    "Failed to create image from decoded AVIF data".into(),
                )
            })
    })();

    unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };
    decoded
}

/// One plane of a decoded picture.
///
/// `ptr` must stay valid for `stride * height` bytes while the plane is
/// sampled; callers hold the picture reference until conversion finishes.
struct Plane {
    ptr: *const u8,
    stride: isize,
    bpc: u32,
}

impl Plane {
    /// Sample value at (x, y). 10/12-bit content is stored as u16.
    #[inline]
    fn sample(&self, x: u32, y: u32) -> f32 {
        let row = y as isize * self.stride;
        if self.bpc <= 8 {
            (unsafe { *self.ptr.offset(row + x as isize) }) as f32
        } else {
            let offset = row + x as isize * 2;
            (unsafe { (self.ptr.offset(offset) as *const u16).read_unaligned() }) as f32
        }
    }
}

struct Chroma {
    cb: Plane,
    cr: Plane,
    subsample_x: bool,
    subsample_y: bool,
}

fn plane_ptr(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
    index: usize,
) -> Result<*const u8, BackendError> {
    pic.data[index]
        .map(|p| p.as_ptr() as *const u8)
        .ok_or_else(|| BackendError::ProcessingFailed(format!("AVIF plane {index} missing")))
}

/// Convert a decoded picture to interleaved RGB8 (BT.601).
fn picture_to_rgb(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
) -> Result<(u32, u32, Vec<u8>), BackendError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let bpc = pic.p.bpc as u32;

    let luma = Plane {
        ptr: plane_ptr(pic, 0)?,
        stride: pic.stride[0],
        bpc,
    };

    let subsampling = match pic.p.layout {
        DAV1D_PIXEL_LAYOUT_I400 => None,
        DAV1D_PIXEL_LAYOUT_I420 => Some((true, true)),
        DAV1D_PIXEL_LAYOUT_I422 => Some((true, false)),
        DAV1D_PIXEL_LAYOUT_I444 => Some((false, false)),
        other => {
            return Err(BackendError::ProcessingFailed(format!(
                "Unsupported AVIF pixel layout: {other}"
            )));
        }
    };
    let chroma = match subsampling {
        None => None,
        Some((subsample_x, subsample_y)) => Some(Chroma {
            cb: Plane {
                ptr: plane_ptr(pic, 1)?,
                stride: pic.stride[1],
                bpc,
            },
            cr: Plane {
                ptr: plane_ptr(pic, 2)?,
                stride: pic.stride[1],
                bpc,
            },
            subsample_x,
            subsample_y,
        }),
    };

    let scale = 255.0 / ((1u32 << bpc) - 1) as f32;
    let center = (1u32 << (bpc - 1)) as f32;
    let to_u8 = |v: f32| (v * scale).clamp(0.0, 255.0) as u8;

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let luma_value = luma.sample(x, y);
            match &chroma {
                None => {
                    let v = to_u8(luma_value);
                    rgb.extend_from_slice(&[v, v, v]);
                }
                Some(c) => {
                    let cx = if c.subsample_x { x / 2 } else { x };
                    let cy = if c.subsample_y { y / 2 } else { y };
                    let cb = c.cb.sample(cx, cy) - center;
                    let cr = c.cr.sample(cx, cy) - center;
                    rgb.extend_from_slice(&[
                        to_u8(luma_value + 1.402 * cr),
                        to_u8(luma_value - 0.344136 * cb - 0.714136 * cr),
                        to_u8(luma_value + 1.772 * cb),
                    ]);
                }
            }
        }
    }

    Ok((width, height, rgb))
}

/// Drop 16-bit and exotic channel layouts down to 8-bit RGB(A), which every
/// encoder we ship accepts.
fn to_encodable(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = lowercase_extension(path).unwrap_or_default();
    match ext.as_str() {
        "webp" => save_webp(img, path, quality),
        "avif" => save_avif(img, path, quality),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

/// Encode and save as lossy WebP at the given quality.
fn save_webp(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let img = to_encodable(img);
    let encoder = webp::Encoder::from_image(&img)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
    let data = encoder.encode(quality as f32);
    std::fs::write(path, &*data)?;
    Ok(())
}

/// Encode and save as AVIF using rav1e (speed 6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let writer = BufWriter::new(File::create(path)?);
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality as u8);
    to_encodable(img)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        reject_undecodable(path)?;
        if is_avif(path) {
            return identify_avif(path);
        }
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to read dimensions of {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::create_test_jpeg;
    use image::RgbaImage;

    fn resize_params(source: &Path, output: &Path, width: u32, height: u32) -> ResizeParams {
        ResizeParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            width,
            height,
            quality: Quality::new(72),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_sniffs_content_over_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually-a-jpeg.png");
        create_test_jpeg(&path, 64, 32);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (64, 32));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn heic_is_reported_as_unsupported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("phone.HEIC");
        std::fs::write(&path, b"ftypheic").unwrap();

        let result = RustBackend::new().identify(&path);
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(_))));
    }

    #[test]
    fn resize_synthetic_to_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("source-320.webp");
        RustBackend::new()
            .resize(&resize_params(&source, &output, 320, 240))
            .unwrap();

        let dims = RustBackend::new().identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (320, 240));
    }

    #[test]
    fn webp_quality_changes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 1200, 800);

        let encode = |quality: u32| {
            let output = tmp.path().join(format!("q{quality}.webp"));
            RustBackend::new()
                .resize(&ResizeParams {
                    quality: Quality::new(quality),
                    ..resize_params(&source, &output, 640, 427)
                })
                .unwrap();
            std::fs::read(&output).unwrap()
        };
        let low = encode(10);
        let high = encode(100);

        assert_ne!(low, high);
        assert!(low.len() < high.len());
        let dims = RustBackend::new().identify(&tmp.path().join("q10.webp")).unwrap();
        assert_eq!((dims.width, dims.height), (640, 427));
    }

    #[test]
    fn resize_png_with_alpha_to_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("logo.png");
        RgbaImage::from_fn(80, 40, |x, _| image::Rgba([x as u8, 0, 0, 128]))
            .save(&source)
            .unwrap();

        let output = tmp.path().join("logo-320.webp");
        RustBackend::new()
            .resize(&resize_params(&source, &output, 320, 160))
            .unwrap();
        assert!(output.exists());
    }

    #[test]
    fn resize_synthetic_to_avif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("resized.avif");
        RustBackend::new()
            .resize(&resize_params(&source, &output, 200, 150))
            .unwrap();

        assert!(output.exists());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn resize_unsupported_output_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100);

        let output = tmp.path().join("output.gif");
        let result = RustBackend::new().resize(&resize_params(&source, &output, 50, 50));
        assert!(result.is_err());
    }

    /// Create a small valid AVIF file through our own encoder.
    fn create_test_avif(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        super::save_avif(&DynamicImage::ImageRgb8(img), path, 85).unwrap();
    }

    #[test]
    fn decode_avif_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let avif_path = tmp.path().join("test.avif");
        create_test_avif(&avif_path, 64, 48);

        let decoded = super::decode_avif(&avif_path).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn identify_avif_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let avif_path = tmp.path().join("test.avif");
        create_test_avif(&avif_path, 120, 80);

        let dims = RustBackend::new().identify(&avif_path).unwrap();
        assert_eq!((dims.width, dims.height), (120, 80));
    }

    #[test]
    fn resize_avif_input_to_webp_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.avif");
        create_test_avif(&source, 200, 150);

        let output = tmp.path().join("source-320.webp");
        RustBackend::new()
            .resize(&resize_params(&source, &output, 320, 240))
            .unwrap();
        assert!(output.exists());
    }
}
