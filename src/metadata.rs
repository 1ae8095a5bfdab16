//! Sidecar metadata: reading, placeholder synthesis, and field resolution.
//!
//! Each image `<id>.<ext>` may have a JSON sidecar `<id>.json` in the same
//! directory, owned by the content author:
//!
//! ```json
//! {
//!   "title": "Spendenlauf 2024",
//!   "caption": "Das Team vor dem Start",
//!   "credit": "Foto: Anna Muster",
//!   "year": 2024,
//!   "event": "Spendenlauf",
//!   "location": "Langenselbold",
//!   "people": ["Anna Muster"],
//!   "tags": ["spendenlauf"],
//!   "hashtags": ["#SPDLangenselbold", "#2024"],
//!   "alt": "Fünf Läuferinnen an der Startlinie"
//! }
//! ```
//!
//! ## Lenient reading
//!
//! There is no schema. Every field is optional, unknown fields are ignored,
//! and a field with the wrong JSON type is treated as absent instead of
//! rejecting the file. Only text that is not JSON at all (or cannot be read)
//! counts as malformed; the builder then uses empty metadata for this run
//! and leaves the file alone.
//!
//! ## Placeholders
//!
//! Images without a sidecar get one synthesized from the identifier (see
//! [`synthesize_placeholder`]) and written once. Free-text fields carry the
//! configured placeholder marker so editors can tell "not filled in yet"
//! from "deliberately empty". An existing sidecar is never overwritten.
//!
//! ## Resolution priority
//!
//! Each manifest field is resolved independently: a present, non-empty
//! sidecar value wins, otherwise a computed default applies
//! ([`resolve_fields`]).

use crate::config::EditorialConfig;
use crate::naming::{self, Segment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Author-supplied metadata for one image. `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub credit: Option<String>,
    pub year: Option<i32>,
    pub event: Option<String>,
    pub location: Option<String>,
    pub people: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
    pub alt: Option<String>,
}

impl Sidecar {
    /// Parse sidecar text leniently.
    ///
    /// Fails only on invalid JSON. Valid JSON that is not an object yields an
    /// empty sidecar; fields of the wrong type are dropped individually.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(match value {
            Value::Object(map) => Self::from_map(&map),
            _ => Self::default(),
        })
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            title: string_field(map, "title"),
            caption: string_field(map, "caption"),
            credit: string_field(map, "credit"),
            year: year_field(map),
            event: string_field(map, "event"),
            location: string_field(map, "location"),
            people: list_field(map, "people"),
            tags: list_field(map, "tags"),
            hashtags: list_field(map, "hashtags"),
            alt: string_field(map, "alt"),
        }
    }

    /// Pretty JSON with 2-space indentation, all keys present.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

/// Years may be written as a number (`2024`) or a numeric string (`"2024"`).
fn year_field(map: &Map<String, Value>) -> Option<i32> {
    match map.get("year")? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Arrays keep their string entries; a bare string becomes a one-item list.
fn list_field(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match map.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}

/// Path of the sidecar for an identifier: `<dir>/<identifier>.json`.
///
/// Built by string concatenation, not `with_extension`, so identifiers that
/// contain dots (`fest.2024`) keep their full name.
pub fn sidecar_path(dir: &Path, identifier: &str) -> PathBuf {
    dir.join(format!("{identifier}.json"))
}

/// What was found at a sidecar path.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarLookup {
    Missing,
    Parsed(Sidecar),
    /// The file exists but could not be read or is not JSON.
    Malformed(String),
}

/// Look up and parse a sidecar without modifying anything.
pub fn read_sidecar(path: &Path) -> SidecarLookup {
    if !path.exists() {
        return SidecarLookup::Missing;
    }
    match fs::read_to_string(path) {
        Ok(text) => match Sidecar::from_json(&text) {
            Ok(sidecar) => SidecarLookup::Parsed(sidecar),
            Err(e) => SidecarLookup::Malformed(e.to_string()),
        },
        Err(e) => SidecarLookup::Malformed(e.to_string()),
    }
}

/// Write a sidecar as pretty JSON.
pub fn write_sidecar(path: &Path, sidecar: &Sidecar) -> io::Result<()> {
    let json = sidecar.to_json().map_err(io::Error::other)?;
    fs::write(path, json)
}

/// Build the placeholder sidecar for an image without one.
///
/// - The first `_` segment (a date by convention) is dropped; the rest are
///   classified by [`naming::classify_segment`] into people and tags.
/// - Year and event are inferred from the identifier; event falls back to
///   the placeholder marker.
/// - Hashtags: organisation, year, event, then one per tag, without repeats.
/// - Title, caption and location carry the placeholder marker.
/// - Alt text is the dehyphenated segments, or the identifier itself.
pub fn synthesize_placeholder(identifier: &str, editorial: &EditorialConfig) -> Sidecar {
    let year = naming::infer_year(identifier);
    let event = naming::infer_event(
        identifier,
        &editorial.anniversary_token,
        &editorial.anniversary_event,
    );

    let segments = naming::content_segments(identifier);
    let mut people = Vec::new();
    let mut tags = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        match naming::classify_segment(segment, index) {
            Segment::Person(name) => people.push(name),
            Segment::Tag(tag) => tags.push(tag),
            Segment::Unclassified => {}
        }
    }

    let mut hashtags = naming::derive_hashtags(&editorial.hashtag, year, event.as_deref(), None);
    for tag in &tags {
        hashtags.insert_text(tag);
    }

    let alt = naming::dehyphenate(&segments.join(" "));
    let alt = if alt.is_empty() {
        identifier.to_string()
    } else {
        alt
    };

    let pending = || Some(editorial.placeholder.clone());
    Sidecar {
        title: pending(),
        caption: pending(),
        credit: Some(editorial.credit.clone()),
        year,
        event: event.or_else(pending),
        location: pending(),
        people: Some(people),
        tags: Some(tags),
        hashtags: Some(hashtags.into_vec()),
        alt: Some(alt),
    }
}

/// Fully resolved metadata fields of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetadata {
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

/// The value if it is present and non-empty.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// A non-empty value that is not the placeholder marker.
fn authored<'a>(value: &'a Option<String>, placeholder: &str) -> Option<&'a str> {
    non_empty(value).filter(|s| *s != placeholder)
}

fn non_empty_list(value: &Option<Vec<String>>) -> Option<&Vec<String>> {
    value.as_ref().filter(|v| !v.is_empty())
}

/// Merge sidecar values with computed defaults.
///
/// | Field | Default |
/// |---|---|
/// | title | identifier with `-`/`_` as spaces |
/// | caption, location | `""` |
/// | credit | configured credit |
/// | year | [`naming::infer_year`] |
/// | event | [`naming::infer_event`] |
/// | people, tags | `[]` |
/// | hashtags | [`naming::derive_hashtags`] from year, sidecar event, sidecar location |
/// | alt | `"Foto <identifier>"` |
///
/// Derived hashtags only use event and location values the author actually
/// entered: the placeholder marker is not a fact and never becomes a hashtag.
pub fn resolve_fields(
    identifier: &str,
    sidecar: &Sidecar,
    editorial: &EditorialConfig,
) -> ResolvedMetadata {
    let year = sidecar.year.or_else(|| naming::infer_year(identifier));
    let event = non_empty(&sidecar.event).map(String::from).or_else(|| {
        naming::infer_event(
            identifier,
            &editorial.anniversary_token,
            &editorial.anniversary_event,
        )
    });

    let hashtags = match non_empty_list(&sidecar.hashtags) {
        Some(list) => list.clone(),
        None => naming::derive_hashtags(
            &editorial.hashtag,
            year,
            authored(&sidecar.event, &editorial.placeholder),
            authored(&sidecar.location, &editorial.placeholder),
        )
        .into_vec(),
    };

    ResolvedMetadata {
        title: non_empty(&sidecar.title)
            .map(String::from)
            .unwrap_or_else(|| naming::display_title(identifier)),
        caption: non_empty(&sidecar.caption).unwrap_or_default().to_string(),
        credit: non_empty(&sidecar.credit)
            .unwrap_or(&editorial.credit)
            .to_string(),
        year,
        event,
        location: non_empty(&sidecar.location).unwrap_or_default().to_string(),
        people: non_empty_list(&sidecar.people).cloned().unwrap_or_default(),
        tags: non_empty_list(&sidecar.tags).cloned().unwrap_or_default(),
        hashtags,
        alt: non_empty(&sidecar.alt)
            .map(String::from)
            .unwrap_or_else(|| format!("Foto {identifier}")),
    }
}
