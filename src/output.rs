//! CLI output formatting for all commands.
//!
//! Output is **information-centric, not file-centric**: each image is listed
//! by its positional index and identifier, with the source file, sidecar
//! state and generated files as indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Images
//! 001 2024-05-01_Anna-Muster_spendenlauf-teamfoto (1200x800)
//!     Source: 2024-05-01_Anna-Muster_spendenlauf-teamfoto.jpg
//!     Sidecar: placeholder created
//!     Thumbs: 2024-05-01_Anna-Muster_spendenlauf-teamfoto-320.webp, ...-640.webp
//!
//! Wrote 1 image to src/data/images.json (1 placeholder created)
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 2024-05-01_fest
//!     Source: 2024-05-01_fest.jpg
//!     Sidecar: missing, placeholder will be created
//!
//! 1 image, 1 placeholder pending
//! ```
//!
//! ## Embed
//!
//! ```text
//! Embed assets → public
//!     resize-iframe.js
//!     report-height.js
//!     embed.html
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::process::{BuildResult, CheckEntry, SidecarState};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Format an image header line with optional pixel dimensions.
///
/// ```text
/// 001 2024-05-01_fest (1200x800)
/// 002 2024-05-02_abend
/// ```
fn image_line(index: usize, identifier: &str, dimensions: Option<(u32, u32)>) -> String {
    match dimensions {
        Some((w, h)) => format!("{} {} ({}x{})", format_index(index), identifier, w, h),
        None => format!("{} {}", format_index(index), identifier),
    }
}

fn sidecar_line(state: &SidecarState, dry_run: bool) -> String {
    let text = match state {
        SidecarState::Found => "present".to_string(),
        SidecarState::Synthesized if dry_run => "missing, placeholder will be created".to_string(),
        SidecarState::Synthesized => "placeholder created".to_string(),
        SidecarState::Malformed(reason) => format!("malformed, ignored ({reason})"),
    };
    format!("{}Sidecar: {}", indent(1), text)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Display a path relative to the project root when it lies inside it.
fn relative(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Count of synthesized and malformed sidecars.
fn sidecar_counts<'a>(states: impl Iterator<Item = &'a SidecarState>) -> (usize, usize) {
    states.fold((0, 0), |(created, malformed), state| match state {
        SidecarState::Synthesized => (created + 1, malformed),
        SidecarState::Malformed(_) => (created, malformed + 1),
        SidecarState::Found => (created, malformed),
    })
}

fn sidecar_summary(created: usize, malformed: usize, dry_run: bool) -> Vec<String> {
    let mut parts = Vec::new();
    if created > 0 {
        let noun = if dry_run {
            plural(created, "placeholder pending", "placeholders pending")
        } else {
            plural(created, "placeholder created", "placeholders created")
        };
        parts.push(noun);
    }
    if malformed > 0 {
        parts.push(plural(malformed, "malformed sidecar", "malformed sidecars"));
    }
    parts
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of `galerie build`.
pub fn format_build_output(result: &BuildResult, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !result.reports.is_empty() {
        lines.push("Images".to_string());
    }
    for (i, report) in result.reports.iter().enumerate() {
        lines.push(image_line(i + 1, &report.identifier, Some(report.dimensions)));
        lines.push(format!("{}Source: {}", indent(1), report.file_name));
        lines.push(sidecar_line(&report.sidecar, false));
        if !report.thumbnails.is_empty() {
            let names: Vec<String> = report.thumbnails.iter().map(|p| file_name(p)).collect();
            lines.push(format!("{}Thumbs: {}", indent(1), names.join(", ")));
        }
    }
    if !result.reports.is_empty() {
        lines.push(String::new());
    }

    let (created, malformed) = sidecar_counts(result.reports.iter().map(|r| &r.sidecar));
    let details = sidecar_summary(created, malformed, false);
    let mut summary = format!(
        "Wrote {} to {}",
        plural(result.records.len(), "image", "images"),
        relative(&result.manifest_path, root).display()
    );
    if !details.is_empty() {
        summary.push_str(&format!(" ({})", details.join(", ")));
    }
    lines.push(summary);
    lines
}

pub fn print_build_output(result: &BuildResult, root: &Path) {
    for line in format_build_output(result, root) {
        println!("{line}");
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of `galerie check`.
pub fn format_check_output(entries: &[CheckEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No images found".to_string()];
    }

    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        lines.push(image_line(i + 1, &entry.identifier, None));
        lines.push(format!("{}Source: {}", indent(1), entry.file_name));
        lines.push(sidecar_line(&entry.sidecar, true));
    }
    lines.push(String::new());

    let (pending, malformed) = sidecar_counts(entries.iter().map(|e| &e.sidecar));
    let mut parts = vec![plural(entries.len(), "image", "images")];
    parts.extend(sidecar_summary(pending, malformed, true));
    lines.push(parts.join(", "));
    lines
}

pub fn print_check_output(entries: &[CheckEntry]) {
    for line in format_check_output(entries) {
        println!("{line}");
    }
}

// ============================================================================
// Embed
// ============================================================================

/// Format the list of files written by `galerie embed`.
pub fn format_embed_output(dir: &Path, written: &[PathBuf], root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Embed assets → {}", relative(dir, root).display())];
    for path in written {
        lines.push(format!("{}{}", indent(1), file_name(path)));
    }
    lines
}

pub fn print_embed_output(dir: &Path, written: &[PathBuf], root: &Path) {
    for line in format_embed_output(dir, written, root) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorialConfig;
    use crate::manifest::{ImageRecord, assemble};
    use crate::metadata::{Sidecar, resolve_fields};
    use crate::process::ImageReport;

    fn record(id: &str) -> ImageRecord {
        let metadata = resolve_fields(id, &Sidecar::default(), &EditorialConfig::default());
        assemble(id, String::new(), String::new(), (1200, 800), metadata)
    }

    fn report(id: &str, sidecar: SidecarState) -> ImageReport {
        ImageReport {
            identifier: id.to_string(),
            file_name: format!("{id}.jpg"),
            dimensions: (1200, 800),
            sidecar,
            thumbnails: vec![
                PathBuf::from(format!("/site/public/img/thumbs/{id}-320.webp")),
                PathBuf::from(format!("/site/public/img/thumbs/{id}-640.webp")),
            ],
        }
    }

    fn build_result(reports: Vec<ImageReport>) -> BuildResult {
        BuildResult {
            records: reports.iter().map(|r| record(&r.identifier)).collect(),
            reports,
            manifest_path: PathBuf::from("/site/src/data/images.json"),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn image_line_with_and_without_dimensions() {
        assert_eq!(image_line(1, "fest", Some((1200, 800))), "001 fest (1200x800)");
        assert_eq!(image_line(2, "fest", None), "002 fest");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "image", "images"), "1 image");
        assert_eq!(plural(0, "image", "images"), "0 images");
    }

    #[test]
    fn relative_strips_root_only_when_inside() {
        let root = Path::new("/site");
        assert_eq!(
            relative(Path::new("/site/src/data/images.json"), root),
            PathBuf::from("src/data/images.json")
        );
        assert_eq!(
            relative(Path::new("/elsewhere/x.json"), root),
            PathBuf::from("/elsewhere/x.json")
        );
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_output_lists_images_and_summary() {
        let result = build_result(vec![
            report("a", SidecarState::Synthesized),
            report("b", SidecarState::Found),
        ]);

        let lines = format_build_output(&result, Path::new("/site"));

        assert_eq!(
            lines,
            vec![
                "Images",
                "001 a (1200x800)",
                "    Source: a.jpg",
                "    Sidecar: placeholder created",
                "    Thumbs: a-320.webp, a-640.webp",
                "002 b (1200x800)",
                "    Source: b.jpg",
                "    Sidecar: present",
                "    Thumbs: b-320.webp, b-640.webp",
                "",
                "Wrote 2 images to src/data/images.json (1 placeholder created)",
            ]
        );
    }

    #[test]
    fn build_output_reports_malformed_sidecars() {
        let result = build_result(vec![report(
            "x",
            SidecarState::Malformed("EOF while parsing".into()),
        )]);

        let lines = format_build_output(&result, Path::new("/site"));

        assert!(lines.contains(&"    Sidecar: malformed, ignored (EOF while parsing)".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Wrote 1 image to src/data/images.json (1 malformed sidecar)"
        );
    }

    #[test]
    fn build_output_empty() {
        let result = build_result(vec![]);
        assert_eq!(
            format_build_output(&result, Path::new("/site")),
            vec!["Wrote 0 images to src/data/images.json"]
        );
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_lists_states() {
        let entries = vec![
            CheckEntry {
                identifier: "a".into(),
                file_name: "a.jpg".into(),
                sidecar: SidecarState::Found,
            },
            CheckEntry {
                identifier: "b".into(),
                file_name: "b.png".into(),
                sidecar: SidecarState::Synthesized,
            },
            CheckEntry {
                identifier: "c".into(),
                file_name: "c.webp".into(),
                sidecar: SidecarState::Synthesized,
            },
        ];

        let lines = format_check_output(&entries);

        assert_eq!(lines[0], "001 a");
        assert_eq!(lines[2], "    Sidecar: present");
        assert_eq!(lines[5], "    Sidecar: missing, placeholder will be created");
        assert_eq!(lines.last().unwrap(), "3 images, 2 placeholders pending");
    }

    #[test]
    fn check_output_empty() {
        assert_eq!(format_check_output(&[]), vec!["No images found"]);
    }

    // =========================================================================
    // Embed
    // =========================================================================

    #[test]
    fn embed_output_lists_files() {
        let dir = Path::new("/site/public");
        let written = vec![dir.join("resize-iframe.js"), dir.join("embed.html")];

        let lines = format_embed_output(dir, &written, Path::new("/site"));

        assert_eq!(
            lines,
            vec!["Embed assets → public", "    resize-iframe.js", "    embed.html"]
        );
    }
}
