//! Embedding the gallery in another page through an iframe.
//!
//! The gallery cannot know how tall it renders inside a foreign page, so it
//! reports its height and the embedding page resizes the iframe:
//!
//! ```text
//! gallery (report-height.js)                 embedding page (resize-iframe.js)
//!   postMessage({type, value: 1834}) ──────►  validate ─► iframe.style.height = "1834px"
//! ```
//!
//! ## Protocol
//!
//! One message shape: `{ "type": "spd-gallery-height", "value": <number> }`.
//! The receiver:
//!
//! 1. drops the message if `allowed_origin` is configured and the sender's
//!    origin differs (no origin check otherwise),
//! 2. ignores data without the configured `type`,
//! 3. parses `value` like JavaScript's `parseInt(value, 10)`,
//! 4. warns about and drops non-numbers and values outside
//!    `min_height..=max_height`,
//! 5. otherwise sets the height with the configured CSS transition.
//!
//! [`decide`] implements these rules in Rust; the generated listener script
//! implements the same rules in the browser.
//!
//! ## Generated assets
//!
//! | File | Used by |
//! |---|---|
//! | `resize-iframe.js` | embedding page |
//! | `report-height.js` | gallery pages |
//! | `embed.html` | copy-paste snippet: iframe + listener |

use crate::config::EmbedConfig;
use crate::manifest::url_join;
use maud::{Markup, PreEscaped, html};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LISTENER_TEMPLATE: &str = include_str!("../static/resize-iframe.js");
const REPORTER_TEMPLATE: &str = include_str!("../static/report-height.js");

pub const LISTENER_FILE: &str = "resize-iframe.js";
pub const REPORTER_FILE: &str = "report-height.js";
pub const SNIPPET_FILE: &str = "embed.html";

/// What the listener does with one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeightDecision {
    /// Not a height message of this gallery. Dropped silently.
    Ignored,
    /// Sent from an origin other than the allowed one. Dropped silently.
    ForeignOrigin,
    /// A height message with an unusable value. Dropped with a warning.
    /// `parsed` is the integer read from the value, if any.
    Invalid { parsed: Option<i64> },
    /// Resize the iframe to this many pixels.
    Apply { height: u32 },
}

impl HeightDecision {
    /// CSS height value to set, e.g. `"550px"`.
    pub fn css_height(&self) -> Option<String> {
        match self {
            HeightDecision::Apply { height } => Some(format!("{height}px")),
            _ => None,
        }
    }
}

/// Integer value of a JSON value under `parseInt(value, 10)` rules.
///
/// Numbers are truncated toward zero. Strings may have leading whitespace
/// and a sign; parsing stops at the first non-digit and fails if there is
/// no digit at all. Arrays convert like their first element. Everything
/// else is not a number.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        Value::Array(items) => items.first().and_then(parse_int),
        _ => None,
    }
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits: &str = &digits[..digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len())];
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, d| {
        acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Decide how the listener treats message `data` sent from `origin`.
pub fn decide(data: &Value, origin: Option<&str>, config: &EmbedConfig) -> HeightDecision {
    if config
        .allowed_origin
        .as_deref()
        .is_some_and(|allowed| origin != Some(allowed))
    {
        return HeightDecision::ForeignOrigin;
    }

    let message_type = data.get("type").and_then(Value::as_str);
    if message_type != Some(config.message_type.as_str()) {
        return HeightDecision::Ignored;
    }

    let parsed = data.get("value").and_then(parse_int);
    let bounds = i64::from(config.min_height)..=i64::from(config.max_height);
    match parsed.filter(|h| bounds.contains(h)).map(u32::try_from) {
        Some(Ok(height)) => HeightDecision::Apply { height },
        _ => HeightDecision::Invalid { parsed },
    }
}

/// A JavaScript string literal that is also safe inside an inline `<script>`.
fn js_string(text: &str) -> String {
    Value::String(text.to_string())
        .to_string()
        .replace("</", "<\\/")
}

/// The listener for the embedding page, with the configuration baked in.
pub fn listener_script(config: &EmbedConfig) -> String {
    let allowed_origin = config
        .allowed_origin
        .as_deref()
        .map(js_string)
        .unwrap_or_else(|| "null".to_string());
    LISTENER_TEMPLATE
        .replace("__IFRAME_ID__", &js_string(&config.iframe_id))
        .replace("__URL_FRAGMENT__", &js_string(&config.url_fragment))
        .replace("__MESSAGE_TYPE__", &js_string(&config.message_type))
        .replace("__MIN_HEIGHT__", &config.min_height.to_string())
        .replace("__MAX_HEIGHT__", &config.max_height.to_string())
        .replace("__TRANSITION__", &js_string(&config.transition))
        .replace("__ALLOWED_ORIGIN__", &allowed_origin)
}

/// The height reporter for the gallery's own pages.
pub fn reporter_script(config: &EmbedConfig) -> String {
    REPORTER_TEMPLATE.replace("__MESSAGE_TYPE__", &js_string(&config.message_type))
}

/// Public URL of the hosted listener script.
pub fn listener_url(config: &EmbedConfig) -> String {
    url_join(&config.gallery_url, LISTENER_FILE)
}

/// HTML to paste into the embedding page: the iframe plus the listener,
/// either inline or loaded from the gallery host.
pub fn embed_snippet(config: &EmbedConfig, inline: bool) -> Markup {
    html! {
        iframe
            id=(config.iframe_id)
            src=(config.gallery_url)
            style=(format!("width:100%;border:0;min-height:{}px", config.min_height))
            loading="lazy"
            title="Galerie" {}
        "\n"
        @if inline {
            script { (PreEscaped(listener_script(config))) }
        } @else {
            script src=(listener_url(config)) {}
        }
    }
}

/// Write the listener, the reporter and the snippet into `dir`.
pub fn write_assets(dir: &Path, config: &EmbedConfig, inline: bool) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let assets = [
        (LISTENER_FILE, listener_script(config)),
        (REPORTER_FILE, reporter_script(config)),
        (SNIPPET_FILE, embed_snippet(config, inline).into_string() + "\n"),
    ];
    let mut written = Vec::with_capacity(assets.len());
    for (name, contents) in assets {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn config() -> EmbedConfig {
        EmbedConfig::default()
    }

    fn height_message(value: Value) -> Value {
        json!({ "type": "spd-gallery-height", "value": value })
    }

    fn decide_value(value: Value) -> HeightDecision {
        decide(&height_message(value), None, &config())
    }

    // =========================================================================
    // decide
    // =========================================================================

    #[test]
    fn valid_height_is_applied() {
        let decision = decide_value(json!(550));
        assert_eq!(decision, HeightDecision::Apply { height: 550 });
        assert_eq!(decision.css_height().as_deref(), Some("550px"));
    }

    #[test]
    fn too_small_height_is_dropped() {
        let decision = decide_value(json!(50));
        assert_eq!(decision, HeightDecision::Invalid { parsed: Some(50) });
        assert_eq!(decision.css_height(), None);
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(
            decide_value(json!(400)),
            HeightDecision::Apply { height: 400 }
        );
        assert_eq!(
            decide_value(json!(10000)),
            HeightDecision::Apply { height: 10000 }
        );
        assert_eq!(
            decide_value(json!(10001)),
            HeightDecision::Invalid {
                parsed: Some(10001)
            }
        );
        assert_eq!(
            decide_value(json!(-600)),
            HeightDecision::Invalid { parsed: Some(-600) }
        );
    }

    #[test]
    fn other_message_types_are_ignored() {
        let cfg = config();
        let other = json!({ "type": "other-widget-height", "value": 550 });
        assert_eq!(decide(&other, None, &cfg), HeightDecision::Ignored);
        assert_eq!(
            decide(&json!({ "value": 550 }), None, &cfg),
            HeightDecision::Ignored
        );
        assert_eq!(
            decide(&json!({ "type": ["spd-gallery-height"] }), None, &cfg),
            HeightDecision::Ignored
        );
    }

    #[test]
    fn non_object_data_is_ignored() {
        let cfg = config();
        for data in [json!(null), json!("spd-gallery-height"), json!(550), json!([1])] {
            assert_eq!(decide(&data, None, &cfg), HeightDecision::Ignored);
        }
    }

    #[test]
    fn string_values_parse_like_parse_int() {
        assert_eq!(
            decide_value(json!("600")),
            HeightDecision::Apply { height: 600 }
        );
        assert_eq!(
            decide_value(json!("600px")),
            HeightDecision::Apply { height: 600 }
        );
        assert_eq!(
            decide_value(json!("  700")),
            HeightDecision::Apply { height: 700 }
        );
        assert_eq!(
            decide_value(json!("+800")),
            HeightDecision::Apply { height: 800 }
        );
        assert_eq!(
            decide_value(json!("px600")),
            HeightDecision::Invalid { parsed: None }
        );
    }

    #[test]
    fn fractional_values_are_truncated() {
        assert_eq!(
            decide_value(json!(550.9)),
            HeightDecision::Apply { height: 550 }
        );
        assert_eq!(
            decide_value(json!("550.9")),
            HeightDecision::Apply { height: 550 }
        );
        assert_eq!(
            decide_value(json!(399.99)),
            HeightDecision::Invalid { parsed: Some(399) }
        );
    }

    #[test]
    fn non_numeric_values_are_dropped() {
        for value in [json!(null), json!(true), json!({"h": 500}), json!([]), json!("")] {
            assert_eq!(
                decide_value(value),
                HeightDecision::Invalid { parsed: None }
            );
        }
        let missing = json!({ "type": "spd-gallery-height" });
        assert_eq!(
            decide(&missing, None, &config()),
            HeightDecision::Invalid { parsed: None }
        );
    }

    #[test]
    fn single_item_array_converts_like_its_element() {
        assert_eq!(
            decide_value(json!([550])),
            HeightDecision::Apply { height: 550 }
        );
        assert_eq!(
            decide_value(json!(["700", 1])),
            HeightDecision::Apply { height: 700 }
        );
    }

    #[test]
    fn any_origin_accepted_without_allowed_origin() {
        let msg = height_message(json!(550));
        assert_eq!(
            decide(&msg, Some("https://evil.example"), &config()),
            HeightDecision::Apply { height: 550 }
        );
    }

    #[test]
    fn allowed_origin_is_exact_match() {
        let cfg = EmbedConfig {
            allowed_origin: Some("https://spd.github.io".into()),
            ..config()
        };
        let msg = height_message(json!(550));

        assert_eq!(
            decide(&msg, Some("https://spd.github.io"), &cfg),
            HeightDecision::Apply { height: 550 }
        );
        assert_eq!(
            decide(&msg, Some("https://spd.github.io.evil.example"), &cfg),
            HeightDecision::ForeignOrigin
        );
        assert_eq!(decide(&msg, None, &cfg), HeightDecision::ForeignOrigin);
    }

    #[test]
    fn custom_bounds_and_type() {
        let cfg = EmbedConfig {
            message_type: "hoehe".into(),
            min_height: 100,
            max_height: 200,
            ..config()
        };
        let msg = json!({ "type": "hoehe", "value": 150 });
        assert_eq!(
            decide(&msg, None, &cfg),
            HeightDecision::Apply { height: 150 }
        );
        assert_eq!(
            decide(&height_message(json!(150)), None, &cfg),
            HeightDecision::Ignored
        );
    }

    #[test]
    fn parse_int_saturates_on_long_digit_runs() {
        assert_eq!(
            parse_int(&json!("99999999999999999999999")),
            Some(i64::MAX)
        );
        assert_eq!(parse_int(&json!("-")), None);
        assert_eq!(parse_int(&json!("-12x")), Some(-12));
    }

    // =========================================================================
    // Scripts and snippet
    // =========================================================================

    #[test]
    fn listener_script_bakes_in_config() {
        let js = listener_script(&config());
        assert!(js.contains(r#"var IFRAME_ID = "spd-gallery";"#));
        assert!(js.contains(r#"var MESSAGE_TYPE = "spd-gallery-height";"#));
        assert!(js.contains("var MIN_HEIGHT = 400;"));
        assert!(js.contains("var MAX_HEIGHT = 10000;"));
        assert!(js.contains(r#"var TRANSITION = "height 0.3s ease";"#));
        assert!(js.contains("var ALLOWED_ORIGIN = null;"));
        assert!(!js.contains("__"));
    }

    #[test]
    fn listener_script_with_allowed_origin() {
        let cfg = EmbedConfig {
            allowed_origin: Some("https://www.example.org".into()),
            ..config()
        };
        let js = listener_script(&cfg);
        assert!(js.contains(r#"var ALLOWED_ORIGIN = "https://www.example.org";"#));
    }

    #[test]
    fn script_strings_cannot_close_script_tag() {
        let cfg = EmbedConfig {
            iframe_id: "a</script><b>\"".into(),
            ..config()
        };
        let js = listener_script(&cfg);
        assert!(js.contains(r#"var IFRAME_ID = "a<\/script><b>\"";"#));
        assert!(!js.contains("</script>"));
    }

    #[test]
    fn reporter_script_uses_message_type() {
        let js = reporter_script(&config());
        assert!(js.contains(r#"var MESSAGE_TYPE = "spd-gallery-height";"#));
        assert!(js.contains("window.parent.postMessage"));
        assert!(!js.contains("__"));
    }

    #[test]
    fn snippet_loads_hosted_listener() {
        let html = embed_snippet(&config(), false).into_string();
        assert!(html.starts_with(r#"<iframe id="spd-gallery" src="https://YOUR-USERNAME.github.io/spd-gallery/""#));
        assert!(html.contains("min-height:400px"));
        assert!(html.contains(
            r#"<script src="https://YOUR-USERNAME.github.io/spd-gallery/resize-iframe.js"></script>"#
        ));
    }

    #[test]
    fn snippet_inline_embeds_listener() {
        let html = embed_snippet(&config(), true).into_string();
        assert!(html.contains("<script>/*"));
        assert!(html.contains(r#"var MESSAGE_TYPE = "spd-gallery-height";"#));
        assert!(!html.contains("resize-iframe.js\"></script>"));
    }

    #[test]
    fn snippet_escapes_attributes() {
        let cfg = EmbedConfig {
            gallery_url: "https://x.example/?a=1&b=\"2\"".into(),
            ..config()
        };
        let html = embed_snippet(&cfg, false).into_string();
        assert!(html.contains(r#"src="https://x.example/?a=1&amp;b=&quot;2&quot;""#));
    }

    #[test]
    fn write_assets_writes_three_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("public");

        let written = write_assets(&dir, &config(), false).unwrap();

        assert_eq!(
            written,
            vec![
                dir.join("resize-iframe.js"),
                dir.join("report-height.js"),
                dir.join("embed.html"),
            ]
        );
        let listener = fs::read_to_string(dir.join("resize-iframe.js")).unwrap();
        assert_eq!(listener, listener_script(&config()));
        let snippet = fs::read_to_string(dir.join("embed.html")).unwrap();
        assert!(snippet.ends_with("</script>\n"));
    }
}
