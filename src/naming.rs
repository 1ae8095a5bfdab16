//! Identifier heuristics.
//!
//! Every image is identified by its filename stem, e.g.
//! `2024-05-01_Anna-Muster_spendenlauf-teamfoto`. Authors encode a date,
//! people and topics in that stem by convention:
//!
//! ```text
//! <date>_<segment>_<segment>...
//!         │          └ lowercase with dashes → tag ("spendenlauf teamfoto")
//!         └ Capitalised words with dashes → person ("Anna Muster")
//! ```
//!
//! Nothing is validated. The functions here are best-effort guesses used to
//! seed metadata that a human corrects afterwards, and they are all pure.
//!
//! ## Known misclassifications
//!
//! - A capitalised topic (`Sommerfest`) is classified as a person.
//! - Names with particles (`Anna-von-Muster`) or apostrophes do not match
//!   the name shape and may become tags.
//! - Only the German umlauts and `ß` are accepted beyond ASCII letters;
//!   `Zoë` or `José` are not recognised as names.

use regex::Regex;
use std::sync::LazyLock;

// ASCII word boundaries: an umlaut next to the digits still separates them.
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)(?:19|20)[0-9]{2}(?-u:\b)").expect("valid year regex")
});

static PROPER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-ZÄÖÜ][a-zäöüß]+(?:\s[A-ZÄÖÜ][a-zäöüß]+)*$").expect("valid name regex")
});

/// Display title derived from an identifier: `-` and `_` become spaces.
///
/// `2024-05-01_Anna-Muster` → `"2024 05 01 Anna Muster"`
pub fn display_title(identifier: &str) -> String {
    identifier.replace(['-', '_'], " ")
}

/// Replace dashes with spaces.
pub fn dehyphenate(segment: &str) -> String {
    segment.replace('-', " ")
}

/// First standalone `19xx`/`20xx` token in the identifier.
///
/// Word boundaries are ASCII-only, so `_` counts as part of a word while
/// `ü` does not: `fest_2024_abend` has no standalone year, `fest-2024-abend`
/// and `Feier-ü2024` do.
pub fn infer_year(identifier: &str) -> Option<i32> {
    YEAR_PATTERN
        .find(identifier)
        .and_then(|m| m.as_str().parse().ok())
}

/// Event name for identifiers that carry the anniversary token.
///
/// An empty token disables the inference.
pub fn infer_event(identifier: &str, token: &str, event: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    identifier
        .to_lowercase()
        .contains(&token.to_lowercase())
        .then(|| event.to_string())
}

/// Whether a dehyphenated segment looks like a person's name.
///
/// Each whitespace-separated word must be one uppercase letter followed by
/// at least one lowercase letter, from ASCII plus `ÄÖÜ`/`äöüß`.
pub fn is_proper_name(segment: &str) -> bool {
    PROPER_NAME.is_match(segment)
}

/// Remove all whitespace: `"135 Jahre"` → `"135Jahre"`.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// How a filename segment was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Person(String),
    Tag(String),
    Unclassified,
}

/// Classify one `_`-separated segment (date segment already removed).
///
/// `index` is the position among the remaining segments. The first one is
/// never a tag: it is usually the main subject, not a topic.
pub fn classify_segment(raw: &str, index: usize) -> Segment {
    let cleaned = dehyphenate(raw);
    if is_proper_name(&cleaned) {
        Segment::Person(cleaned)
    } else if raw.contains('-') && index > 0 {
        Segment::Tag(cleaned)
    } else {
        Segment::Unclassified
    }
}

/// Segments after the leading date token: `a_b_c` → `["b", "c"]`.
pub fn content_segments(identifier: &str) -> Vec<&str> {
    identifier.split('_').skip(1).collect()
}

/// Insertion-ordered, duplicate-free hashtag list.
///
/// The organisational tag passed to [`HashtagSet::new`] always comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagSet(Vec<String>);

impl HashtagSet {
    pub fn new(organisation: &str) -> Self {
        Self(vec![organisation.to_string()])
    }

    /// Add a ready-made hashtag. Returns false if it was already present.
    pub fn insert(&mut self, hashtag: String) -> bool {
        if self.0.contains(&hashtag) {
            return false;
        }
        self.0.push(hashtag);
        true
    }

    /// Add `#` + `text` with whitespace removed. Blank text is ignored.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let word = strip_whitespace(text);
        if word.is_empty() {
            return false;
        }
        self.insert(format!("#{word}"))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Derive hashtags from the known facts about an image.
///
/// Organisation first, then `#<year>`, event and location (whitespace
/// stripped), each only when known. Repeats collapse to one entry.
pub fn derive_hashtags(
    organisation: &str,
    year: Option<i32>,
    event: Option<&str>,
    location: Option<&str>,
) -> HashtagSet {
    let mut set = HashtagSet::new(organisation);
    if let Some(year) = year {
        set.insert(format!("#{year}"));
    }
    if let Some(event) = event {
        set.insert_text(event);
    }
    if let Some(location) = location {
        set.insert_text(location);
    }
    set
}
