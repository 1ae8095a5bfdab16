//! # galerie
//!
//! Manifest builder for a static photo gallery. A directory of original
//! images, each with an optional JSON sidecar, becomes a set of fixed-width
//! thumbnails and one JSON manifest that a static-site generator renders.
//!
//! # Pipeline
//!
//! ```text
//! public/img/originals/*.{jpg,png,...}  ──►  public/img/thumbs/<id>-320.webp
//!                  + <id>.json sidecars      public/img/thumbs/<id>-640.webp
//!                                            src/data/images.json
//! ```
//!
//! Every run reprocesses every image: no caching, no incremental rebuilds.
//! Images without a sidecar get a placeholder sidecar, seeded from the
//! filename, that editors fill in afterwards. Existing sidecars are never
//! modified.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading, validation, merging, and the stock config |
//! | [`scan`] | Discovers originals by extension, sorted by identifier |
//! | [`naming`] | Filename heuristics: title, year, event, people, tags, hashtags |
//! | [`metadata`] | Sidecar parsing, placeholder synthesis, field fallback resolution |
//! | [`imaging`] | Pure-Rust identify and resize, behind the [`imaging::ImageBackend`] trait |
//! | [`process`] | The build pipeline and its dry-run counterpart |
//! | [`manifest`] | Manifest records and the all-or-nothing manifest write |
//! | [`embed`] | iframe height protocol and the generated browser assets |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## All-or-Nothing Manifest
//!
//! The manifest is written only after every image succeeded, through a
//! temporary file renamed into place. A broken original leaves the site's
//! previous data intact instead of publishing a partial gallery.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling, WebP
//! and AVIF encoders) and `rav1d` for AVIF decoding. No system libraries, no
//! external commands.
//!
//! ## Heuristics as Pure Functions
//!
//! Guessing people and tags from filenames is inherently fuzzy. Keeping
//! every guess in [`naming`] as a pure function keeps the misclassifications
//! visible in unit tests and the `placeholder` command.

pub mod config;
pub mod embed;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
