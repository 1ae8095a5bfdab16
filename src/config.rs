//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are overridden by an optional user file in the project root.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── public/img/originals/    # paths.originals
//! ├── public/img/thumbs/       # paths.thumbs
//! └── src/data/images.json     # paths.manifest
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! originals = "public/img/originals"
//! thumbs = "public/img/thumbs"
//! manifest = "src/data/images.json"
//!
//! [thumbnails]
//! widths = [320, 640]       # One thumbnail per width, height keeps aspect
//! quality = 72              # Lossy encoding quality (1-100)
//! format = "webp"           # "webp" or "avif"
//!
//! [discovery]
//! extensions = ["jpg", "jpeg", "png", "webp", "avif", "heic"]
//!
//! [urls]
//! originals = "/img/originals"
//! thumbs = "/img/thumbs"
//!
//! [editorial]
//! credit = "Foto: SPD Langenselbold"
//! hashtag = "#SPDLangenselbold"
//! placeholder = "Inhalt wird nachgetragen."
//! anniversary_token = "135"
//! anniversary_event = "135 Jahre"
//!
//! [embed]
//! iframe_id = "spd-gallery"
//! message_type = "spd-gallery-height"
//! url_fragment = "spd-gallery"
//! min_height = 400
//! max_height = 10000
//! transition = "height 0.3s ease"
//! gallery_url = "https://YOUR-USERNAME.github.io/spd-gallery/"
//! output_dir = "public"
//! # allowed_origin = "https://YOUR-USERNAME.github.io"
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{Quality, ThumbnailConfig, ThumbnailFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Filesystem locations, relative to the project root.
    pub paths: PathsConfig,
    /// Thumbnail widths, quality and output format.
    pub thumbnails: ThumbnailsConfig,
    /// Which files in the originals directory count as images.
    pub discovery: DiscoveryConfig,
    /// Public URL prefixes written into the manifest.
    pub urls: UrlsConfig,
    /// Fixed strings used for defaults and placeholder sidecars.
    pub editorial: EditorialConfig,
    /// iframe embedding and the height-message protocol.
    pub embed: EmbedConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.widths.is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.widths must not be empty".into(),
            ));
        }
        if self.thumbnails.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "thumbnails.widths values must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.discovery.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "discovery.extensions must not be empty".into(),
            ));
        }
        let hashtag = &self.editorial.hashtag;
        if !hashtag.starts_with('#') || hashtag.len() < 2 || hashtag.contains(char::is_whitespace)
        {
            return Err(ConfigError::Validation(
                "editorial.hashtag must be '#' followed by a word without whitespace".into(),
            ));
        }
        if self.embed.message_type.is_empty() {
            return Err(ConfigError::Validation(
                "embed.message_type must not be empty".into(),
            ));
        }
        if self.embed.min_height == 0 || self.embed.min_height >= self.embed.max_height {
            return Err(ConfigError::Validation(
                "embed.min_height must be non-zero and below embed.max_height".into(),
            ));
        }
        Ok(())
    }

    /// Thumbnail settings in the form the imaging layer takes.
    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            widths: self.thumbnails.widths.clone(),
            quality: Quality::new(self.thumbnails.quality),
            format: self.thumbnails.format,
        }
    }
}

/// Filesystem locations. Relative paths resolve against the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Original images and their `.json` sidecars.
    pub originals: String,
    /// Generated thumbnails.
    pub thumbs: String,
    /// The consolidated JSON manifest.
    pub manifest: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            originals: "public/img/originals".to_string(),
            thumbs: "public/img/thumbs".to_string(),
            manifest: "src/data/images.json".to_string(),
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Output widths in pixels. The largest one is referenced as `thumb`.
    pub widths: Vec<u32>,
    /// Encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Output encoding.
    pub format: ThumbnailFormat,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            widths: vec![320, 640],
            quality: 72,
            format: ThumbnailFormat::Webp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Accepted extensions, compared case-insensitively, without the dot.
    pub extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "webp", "avif", "heic"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// URL prefixes the static site serves originals and thumbnails under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlsConfig {
    pub originals: String,
    pub thumbs: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            originals: "/img/originals".to_string(),
            thumbs: "/img/thumbs".to_string(),
        }
    }
}

/// Organisation-specific strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorialConfig {
    /// Photo credit used when a sidecar has none.
    pub credit: String,
    /// Organisational hashtag, always first in derived hashtag lists.
    pub hashtag: String,
    /// Marker text written into placeholder sidecars for fields awaiting input.
    pub placeholder: String,
    /// Substring of an identifier that marks an anniversary photo. Empty disables it.
    pub anniversary_token: String,
    /// Event name assigned to identifiers containing `anniversary_token`.
    pub anniversary_event: String,
}

impl Default for EditorialConfig {
    fn default() -> Self {
        Self {
            credit: "Foto: SPD Langenselbold".to_string(),
            hashtag: "#SPDLangenselbold".to_string(),
            placeholder: "Inhalt wird nachgetragen.".to_string(),
            anniversary_token: "135".to_string(),
            anniversary_event: "135 Jahre".to_string(),
        }
    }
}

/// iframe embedding settings shared by the listener, reporter and snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedConfig {
    /// `id` attribute of the embedding iframe.
    pub iframe_id: String,
    /// `type` tag of height messages.
    pub message_type: String,
    /// Fallback lookup: first iframe whose `src` contains this substring.
    pub url_fragment: String,
    /// Smallest accepted height in pixels; also the iframe's initial min-height.
    pub min_height: u32,
    /// Largest accepted height in pixels.
    pub max_height: u32,
    /// CSS transition applied with each height change.
    pub transition: String,
    /// When set, messages from any other origin are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origin: Option<String>,
    /// Public URL of the deployed gallery (iframe `src`, script base).
    pub gallery_url: String,
    /// Directory the `embed` command writes its assets to.
    pub output_dir: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            iframe_id: "spd-gallery".to_string(),
            message_type: "spd-gallery-height".to_string(),
            url_fragment: "spd-gallery".to_string(),
            min_height: 400,
            max_height: 10000,
            transition: "height 0.3s ease".to_string(),
            allowed_origin: None,
            gallery_url: "https://YOUR-USERNAME.github.io/spd-gallery/".to_string(),
            output_dir: "public".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# galerie configuration
# =====================
# Every key is optional. Delete what you do not change.

[paths]
# Original images and their <name>.json sidecars.
originals = "public/img/originals"
# Generated thumbnails (<name>-<width>.<format>).
thumbs = "public/img/thumbs"
# Consolidated manifest read by the static site.
manifest = "src/data/images.json"

[thumbnails]
# One thumbnail per width; height follows the original aspect ratio.
# The largest width is referenced as "thumb" in the manifest.
widths = [320, 640]
# Encoding quality, 1-100, for both WebP and AVIF.
quality = 72
# "webp" or "avif"
format = "webp"

[discovery]
# File extensions treated as images (case-insensitive).
# HEIC files are accepted but cannot be decoded and abort the build.
extensions = ["jpg", "jpeg", "png", "webp", "avif", "heic"]

[urls]
# URL prefixes for the "src" and "thumb" manifest fields.
originals = "/img/originals"
thumbs = "/img/thumbs"

[editorial]
credit = "Foto: SPD Langenselbold"
# Always the first hashtag of a derived list.
hashtag = "#SPDLangenselbold"
# Written into new placeholder sidecars for fields awaiting input.
placeholder = "Inhalt wird nachgetragen."
# Filenames containing the token get the event name below. "" disables it.
anniversary_token = "135"
anniversary_event = "135 Jahre"

[embed]
iframe_id = "spd-gallery"
message_type = "spd-gallery-height"
# Fallback iframe lookup: iframe[src*="<url_fragment>"]
url_fragment = "spd-gallery"
# Heights outside [min_height, max_height] are dropped with a warning.
min_height = 400
max_height = 10000
transition = "height 0.3s ease"
gallery_url = "https://YOUR-USERNAME.github.io/spd-gallery/"
# Where `galerie embed` writes resize-iframe.js, report-height.js, embed.html.
output_dir = "public"
# Only accept height messages from this exact origin. Unset = accept all.
# allowed_origin = "https://YOUR-USERNAME.github.io"
"##
}
