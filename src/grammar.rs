//! Marker vocabulary and line patterns.
//!
//! Every sentinel literal and regular pattern the pipeline recognizes is
//! declared here once. The segmenter, the block parsers and the correctness
//! resolver all match through these helpers.

use crate::model::{MediaKind, MediaRef};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Answer option letters, in order. Fixed at A-D.
pub const ANSWER_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// A line consisting only of this text separates questions.
pub const ALT_SEPARATOR: &str = "===";

/// Structural sentinel markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Ends a question
    Separator,
    /// Opens a shared-stem group
    GroupStart,
    /// Ends the shared stem of a group
    GroupContentEnd,
    /// Closes a group
    GroupEnd,
    /// Text-convention group terminator
    GroupClose,
    /// Leading type tag of a single question
    SingleType,
    /// Leading type tag of a group
    GroupType,
    /// Leading type tag of a fill-in-blank group
    FillBlankType,
}

/// Marker literals. A marker may have more than one spelling.
pub const MARKERS: &[(Marker, &str)] = &[
    (Marker::Separator, "[<br>]"),
    (Marker::GroupStart, "[<sg>]"),
    (Marker::GroupContentEnd, "[<egc>]"),
    (Marker::GroupEnd, "[</sg>]"),
    (Marker::GroupClose, "(KETTHUCNHOM)"),
    (Marker::GroupClose, "(KETTHUCDIENKHUYET)"),
    (Marker::SingleType, "(DON)"),
    (Marker::GroupType, "(NHOM)"),
    (Marker::FillBlankType, "(DIENKHUYET)"),
];

impl Marker {
    /// Returns every spelling of this marker.
    pub fn literals(self) -> impl Iterator<Item = &'static str> {
        MARKERS
            .iter()
            .filter(move |(marker, _)| *marker == self)
            .map(|(_, literal)| *literal)
    }

    /// Primary spelling, used when writing the marker back out.
    pub fn literal(self) -> &'static str {
        self.literals().next().unwrap_or_default()
    }

    /// Returns true if `text` contains this marker.
    pub fn is_in(self, text: &str) -> bool {
        self.literals().any(|literal| text.contains(literal))
    }

    /// Returns true for the leading question-type tags.
    pub fn is_type_tag(self) -> bool {
        matches!(
            self,
            Marker::SingleType | Marker::GroupType | Marker::FillBlankType
        )
    }

    /// Returns true for markers that terminate a group.
    pub fn closes_group(self) -> bool {
        matches!(self, Marker::GroupEnd | Marker::GroupClose)
    }

    fn from_literal(text: &str) -> Option<Marker> {
        MARKERS
            .iter()
            .find(|(_, literal)| *literal == text)
            .map(|(marker, _)| *marker)
    }
}

/// A structural token found inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Marker(Marker),
    /// Child-index marker carrying the child's number
    ChildIndex(u32),
}

/// A structural token and where it sits in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureHit {
    pub structure: Structure,
    pub range: Range<usize>,
}

// Regex patterns (compiled once using LazyLock)
static RE_STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    let literals: Vec<String> = MARKERS.iter().map(|(_, l)| regex::escape(l)).collect();
    Regex::new(&format!(
        r"{}|[(\[]\s*<\s*(?P<idx>\d+)\s*>\s*[)\]]|\(\s*(?:NHOM|DIENKHUYET)\s*[-–]\s*(?P<conv>\d+)\s*\)",
        literals.join("|")
    ))
    .unwrap()
});

static RE_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-D])[.)](?:\s+|$)").unwrap());

static RE_CLO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*(CLO\d+)\s*\)").unwrap());

static RE_LEADING_CLO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(\s*CLO\d+\s*\)").unwrap());

static RE_QUESTION_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?i:câu|question)\s*)?\d+\s*[.):](?:\s|$)").unwrap()
});

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*<\s*(\d+)\s*>\s*\}").unwrap());

static RE_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*<\s*\d+\s*>\s*\}\s*_{3,}").unwrap());

static RE_MEDIA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\s*(audio|image)\s*:\s*([^\]]+)\]").unwrap());

static RE_EMPHASIS_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<u>.+?</u>|<b>.+?</b>|<strong>.+?</strong>").unwrap()
});

static RE_EMPHASIS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:u|b|strong)>").unwrap());

// A run of underscores is a blank, not emphasis: the pair must hug its text.
static RE_DOUBLE_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^_])__([^_\s](?:[^_]*[^_\s])?)__").unwrap());

static RE_OPTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?[A-D][.)]?$").unwrap());

static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Finds structural markers and child-index markers in `text`, in order.
pub fn scan_structure(text: &str) -> Vec<StructureHit> {
    RE_STRUCTURE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let structure = match caps.name("idx").or_else(|| caps.name("conv")) {
                Some(number) => Structure::ChildIndex(number.as_str().parse().ok()?),
                None => Structure::Marker(Marker::from_literal(whole.as_str())?),
            };
            Some(StructureHit {
                structure,
                range: whole.range(),
            })
        })
        .collect()
}

/// Returns true if `text` contains any structural marker.
pub fn has_any_marker(text: &str) -> bool {
    is_alt_separator(text) || MARKERS.iter().any(|(_, literal)| text.contains(literal))
}

/// Returns true if the whole line is the alternate separator.
pub fn is_alt_separator(text: &str) -> bool {
    text.trim() == ALT_SEPARATOR
}

/// Removes every structural marker literal from `text`.
pub fn strip_markers(text: &str) -> String {
    let mut result = text.to_string();
    for (_, literal) in MARKERS {
        if result.contains(literal) {
            result = result.replace(literal, " ");
        }
    }
    result
}

/// Matches an answer-option prefix.
///
/// Returns the option letter and the byte length of the prefix, including
/// the whitespace after the separator.
pub fn answer_prefix(text: &str) -> Option<(char, usize)> {
    let caps = RE_ANSWER.captures(text)?;
    let letter = caps.get(1)?.as_str().chars().next()?;
    Some((letter, caps.get(0)?.end()))
}

/// Returns true if the line opens an answer option.
pub fn is_answer_line(text: &str) -> bool {
    RE_ANSWER.is_match(text)
}

/// Extracts the first competency tag and removes all tags from the text.
pub fn extract_clo(text: &str) -> (Option<String>, String) {
    let clo = RE_CLO.captures(text).map(|caps| caps[1].to_string());
    match clo {
        Some(tag) => (Some(tag), RE_CLO.replace_all(text, " ").into_owned()),
        None => (None, text.to_string()),
    }
}

/// Returns true if the line begins like a new question in unmarked documents.
pub fn is_question_start(text: &str) -> bool {
    RE_QUESTION_NUMBER.is_match(text) || RE_LEADING_CLO.is_match(text)
}

/// Blank placeholder indices in order of appearance.
pub fn placeholders(text: &str) -> Vec<u32> {
    RE_PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Returns true if the text holds a fill-in blank (`{<n>}_____`).
pub fn has_blank(text: &str) -> bool {
    RE_BLANK.is_match(text)
}

/// Extracts media references and removes them from the text.
pub fn extract_media(text: &str) -> (Vec<MediaRef>, String) {
    let media: Vec<MediaRef> = RE_MEDIA
        .captures_iter(text)
        .map(|caps| MediaRef {
            kind: if caps[1].eq_ignore_ascii_case("audio") {
                MediaKind::Audio
            } else {
                MediaKind::Image
            },
            path: caps[2].trim().to_string(),
        })
        .collect();

    if media.is_empty() {
        (media, text.to_string())
    } else {
        (media, RE_MEDIA.replace_all(text, " ").into_owned())
    }
}

/// Returns true if the text carries an inline emphasis pair such as
/// `<u>..</u>`, `<b>..</b>`, `<strong>..</strong>` or `__..__`.
pub fn has_emphasis_pair(text: &str) -> bool {
    RE_EMPHASIS_PAIR.is_match(text) || RE_DOUBLE_UNDERSCORE.is_match(text)
}

/// Removes inline emphasis markup, keeping the enclosed text.
pub fn strip_emphasis(text: &str) -> String {
    let without_tags = RE_EMPHASIS_TAG.replace_all(text, "");
    RE_DOUBLE_UNDERSCORE
        .replace_all(&without_tags, "${1}${2}")
        .into_owned()
}

/// Returns true if the text is a bare option label (`A.`, `(B)`, `C)`).
pub fn looks_like_option_label(text: &str) -> bool {
    RE_OPTION_LABEL.is_match(text.trim())
}

/// Collapses whitespace runs to single spaces and trims.
pub fn clean_text(text: &str) -> String {
    RE_SPACES.replace_all(text.trim(), " ").into_owned()
}
