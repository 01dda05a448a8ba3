//! Plain-text normalisation of model output.
//!
//! Models asked for plain text still emit markdown now and then. Before final-mode text is
//! returned it is reduced to plain prose: emphasis, code and link syntax are unwrapped,
//! heading/list/quote markers and rules are dropped, and whitespace is collapsed. Words are
//! kept.
//!
//! Each rule only ever shortens the text (or swaps a tab for a space), so repeating the rule
//! set until nothing changes terminates and makes the result idempotent.

use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

static LINE_ENDINGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n?").expect("valid regex"));
static FENCE_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:```|~~~)[^\n]*$").expect("valid regex"));
static RULE_LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$")
        .expect("valid regex")
});
static HEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}(?:[ \t]+|$)").expect("valid regex"));
static QUOTE_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:>[ \t]?)+").expect("valid regex"));
static LIST_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*+\u{2022}][ \t]+").expect("valid regex"));
static IMAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]\n]*)\]\([^)\s]*\)").expect("valid regex"));
static LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").expect("valid regex"));
static ASTERISK_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*{1,3}([^*\s](?:[^*\n]*[^*\s])?)\*{1,3}").expect("valid regex")
});
static UNDERSCORE_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w])_{1,2}([^_\s](?:[^_\n]*[^_\s])?)_{1,2}($|[^\w])").expect("valid regex")
});
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^~\n]+)~~").expect("valid regex"));
static BACKTICKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`+").expect("valid regex"));
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid regex"));
static LINE_EDGE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ +| +$").expect("valid regex"));
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalise any displayable value to plain text.
///
/// # Arguments
///
/// * `input` - Model output or any other value; it is rendered with `Display` first.
///
/// # Returns
///
/// Trimmed plain text. Markup-free input comes back trimmed with whitespace runs collapsed.
pub fn normalize(input: impl Display) -> String {
    let mut current = input.to_string();
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let text = LINE_ENDINGS.replace_all(text, "\n");
    let text = FENCE_LINES.replace_all(&text, "");
    let text = RULE_LINES.replace_all(&text, "");
    let text = HEADING_MARKERS.replace_all(&text, "");
    let text = QUOTE_MARKERS.replace_all(&text, "");
    let text = LIST_MARKERS.replace_all(&text, "");
    let text = IMAGES.replace_all(&text, "${1}");
    let text = LINKS.replace_all(&text, "${1} (${2})");
    let text = ASTERISK_EMPHASIS.replace_all(&text, "${1}");
    let text = UNDERSCORE_EMPHASIS.replace_all(&text, "${1}${2}${3}");
    let text = STRIKETHROUGH.replace_all(&text, "${1}");
    let text = BACKTICKS.replace_all(&text, "");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = LINE_EDGE_SPACE.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}
