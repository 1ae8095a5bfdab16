//! The manifest build pipeline.
//!
//! One sequential pass over the originals directory:
//!
//! ```text
//! discover ──► for each image (sorted by identifier):
//!                identify ─► sidecar (read or synthesize) ─► thumbnails ─► record
//!          ──► write manifest
//! ```
//!
//! ## Failure policy
//!
//! | Situation | Outcome |
//! |---|---|
//! | Originals directory missing | created; empty manifest |
//! | Two originals share a stem (`foto.jpg`, `foto.png`) | run aborts before any write |
//! | Image cannot be decoded | run aborts, manifest untouched |
//! | Sidecar is not valid JSON | warning, empty metadata, file untouched |
//! | Placeholder sidecar cannot be written | run aborts, manifest untouched |
//!
//! Thumbnails are regenerated on every run. Placeholder sidecars written
//! before an abort stay on disk; the next run finds and reuses them.
//!
//! ## Output Structure
//!
//! ```text
//! public/img/originals/
//! ├── 2024-05-01_Anna-Muster_spendenlauf-teamfoto.jpg
//! └── 2024-05-01_Anna-Muster_spendenlauf-teamfoto.json   # placeholder, written once
//! public/img/thumbs/
//! ├── 2024-05-01_Anna-Muster_spendenlauf-teamfoto-320.webp
//! └── 2024-05-01_Anna-Muster_spendenlauf-teamfoto-640.webp
//! src/data/images.json                                    # replaced every run
//! ```

use crate::config::{self, ConfigError, EditorialConfig, GalleryConfig, UrlsConfig};
use crate::imaging::{
    BackendError, ImageBackend, RustBackend, ThumbnailConfig, create_thumbnails, get_dimensions,
};
use crate::manifest::{self, ImageRecord};
use crate::metadata::{self, Sidecar, SidecarLookup};
use crate::scan::{self, ScanError, SourceImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image processing failed for {path}: {source}")]
    Imaging {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Failed to write sidecar {path}: {source}")]
    SidecarWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything one build needs, with paths resolved against the project root.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub originals_dir: PathBuf,
    pub thumbs_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub extensions: Vec<String>,
    pub thumbnails: ThumbnailConfig,
    pub urls: UrlsConfig,
    pub editorial: EditorialConfig,
}

impl BuildConfig {
    /// Build a BuildConfig from GalleryConfig values.
    pub fn from_config(root: &Path, config: &GalleryConfig) -> Self {
        Self {
            originals_dir: root.join(&config.paths.originals),
            thumbs_dir: root.join(&config.paths.thumbs),
            manifest_path: root.join(&config.paths.manifest),
            extensions: config.discovery.extensions.clone(),
            thumbnails: config.thumbnail_config(),
            urls: config.urls.clone(),
            editorial: config.editorial.clone(),
        }
    }

    /// Load `config.toml` from `root` and resolve it.
    pub fn load(root: &Path) -> Result<Self, ProcessError> {
        let config = config::load_config(root)?;
        Ok(Self::from_config(root, &config))
    }
}

/// Where an image's metadata came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarState {
    /// An existing sidecar was parsed.
    Found,
    /// No sidecar existed; a placeholder was written (or, in a dry run,
    /// would be written).
    Synthesized,
    /// The sidecar exists but is unreadable; empty metadata was used.
    Malformed(String),
}

/// Per-image outcome of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    pub identifier: String,
    pub file_name: String,
    pub dimensions: (u32, u32),
    pub sidecar: SidecarState,
    pub thumbnails: Vec<PathBuf>,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildResult {
    pub records: Vec<ImageRecord>,
    pub reports: Vec<ImageReport>,
    pub manifest_path: PathBuf,
}

/// Run the pipeline with the pure-Rust imaging backend.
pub fn run(config: &BuildConfig) -> Result<BuildResult, ProcessError> {
    let backend = RustBackend::new();
    run_with_backend(&backend, config)
}

/// Run the pipeline using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    config: &BuildConfig,
) -> Result<BuildResult, ProcessError> {
    let images = scan::discover(&config.originals_dir, &config.extensions)?;
    info!(
        count = images.len(),
        dir = %config.originals_dir.display(),
        "building manifest"
    );

    std::fs::create_dir_all(&config.thumbs_dir)?;

    let mut records = Vec::with_capacity(images.len());
    let mut reports = Vec::with_capacity(images.len());
    for image in &images {
        let (record, report) = process_image(backend, image, config)?;
        records.push(record);
        reports.push(report);
    }

    let json = manifest::to_json(&records)?;
    manifest::write_atomic(&config.manifest_path, &json)?;
    info!(
        records = records.len(),
        path = %config.manifest_path.display(),
        "manifest written"
    );

    Ok(BuildResult {
        records,
        reports,
        manifest_path: config.manifest_path.clone(),
    })
}

fn process_image(
    backend: &impl ImageBackend,
    image: &SourceImage,
    config: &BuildConfig,
) -> Result<(ImageRecord, ImageReport), ProcessError> {
    debug!(file = %image.file_name, "processing");
    let imaging_error = |source| ProcessError::Imaging {
        path: image.path.clone(),
        source,
    };

    let dimensions = get_dimensions(backend, &image.path).map_err(imaging_error)?;
    let (sidecar, state) = load_or_create_sidecar(&config.originals_dir, image, &config.editorial)?;

    let thumbnails = create_thumbnails(
        backend,
        &image.path,
        &config.thumbs_dir,
        &image.identifier,
        dimensions,
        &config.thumbnails,
    )
    .map_err(imaging_error)?;

    let thumb = thumbnails
        .iter()
        .max_by_key(|t| t.target_width)
        .map(|t| manifest::url_join(&config.urls.thumbs, &t.file_name))
        .unwrap_or_default();
    let src = manifest::url_join(&config.urls.originals, &image.file_name);

    let resolved = metadata::resolve_fields(&image.identifier, &sidecar, &config.editorial);
    let record = manifest::assemble(&image.identifier, src, thumb, dimensions, resolved);

    let report = ImageReport {
        identifier: image.identifier.clone(),
        file_name: image.file_name.clone(),
        dimensions,
        sidecar: state,
        thumbnails: thumbnails.into_iter().map(|t| t.path).collect(),
    };
    Ok((record, report))
}

/// Read the image's sidecar, writing a placeholder first if there is none.
fn load_or_create_sidecar(
    dir: &Path,
    image: &SourceImage,
    editorial: &EditorialConfig,
) -> Result<(Sidecar, SidecarState), ProcessError> {
    let path = metadata::sidecar_path(dir, &image.identifier);
    match metadata::read_sidecar(&path) {
        SidecarLookup::Parsed(sidecar) => Ok((sidecar, SidecarState::Found)),
        SidecarLookup::Malformed(reason) => {
            warn!(path = %path.display(), %reason, "ignoring malformed sidecar");
            Ok((Sidecar::default(), SidecarState::Malformed(reason)))
        }
        SidecarLookup::Missing => {
            let placeholder = metadata::synthesize_placeholder(&image.identifier, editorial);
            metadata::write_sidecar(&path, &placeholder).map_err(|source| {
                ProcessError::SidecarWrite {
                    path: path.clone(),
                    source,
                }
            })?;
            info!(path = %path.display(), "created placeholder sidecar");
            Ok((placeholder, SidecarState::Synthesized))
        }
    }
}

/// One line of a dry run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckEntry {
    pub identifier: String,
    pub file_name: String,
    pub sidecar: SidecarState,
}

/// Dry run: list discovered images and their sidecar state.
///
/// Writes nothing and decodes nothing. A missing originals directory is
/// reported as empty instead of being created.
pub fn check(config: &BuildConfig) -> Result<Vec<CheckEntry>, ProcessError> {
    if !config.originals_dir.is_dir() {
        return Ok(Vec::new());
    }
    let images = scan::discover(&config.originals_dir, &config.extensions)?;
    Ok(images
        .into_iter()
        .map(|image| {
            let path = metadata::sidecar_path(&config.originals_dir, &image.identifier);
            let sidecar = match metadata::read_sidecar(&path) {
                SidecarLookup::Parsed(_) => SidecarState::Found,
                SidecarLookup::Missing => SidecarState::Synthesized,
                SidecarLookup::Malformed(reason) => SidecarState::Malformed(reason),
            };
            CheckEntry {
                identifier: image.identifier,
                file_name: image.file_name,
                sidecar,
            }
        })
        .collect())
}
