//! Free-text sanitization for labels and descriptions.
//!
//! Every user-supplied string that ends up rendered inside the canvas goes
//! through [`sanitize_text`] before it is stored on a node or edge.

use std::sync::LazyLock;

use regex::Regex;

/// Elements whose content is executable or otherwise never displayed as text.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "svg", "math",
];

static DROPPED_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = DROPPED_ELEMENTS
        .iter()
        .map(|tag| format!(r"<{tag}\b.*?(?:</{tag}\s*>|\z)"))
        .collect();
    Regex::new(&format!("(?is){}", alternatives.join("|"))).expect("static pattern")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").expect("static pattern"));

// Doctypes, processing instructions and any remaining open/close tag,
// including one left unterminated at the end of the input.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z!/?][^>]*(?:>|\z)").expect("static pattern"));

/// Strip markup from `input`, keeping only its text content.
///
/// Script-like elements are removed together with their content; all other
/// tags are removed and their inner text kept. A `<` that does not open a tag
/// (as in `a < b`) is left alone.
///
/// Passes repeat until nothing changes, so removing one tag cannot splice
/// the text around it into another (`<<b>script>` becomes `<script>` after
/// one pass). Every pass only deletes, so the loop terminates.
pub fn sanitize_text(input: &str) -> String {
    let mut text = input.to_string();
    while text.contains('<') {
        let stripped = strip_markup(&text);
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text
}

fn strip_markup(input: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(input, "");
    let without_blocks = DROPPED_ELEMENT_RE.replace_all(&without_comments, "");
    TAG_RE.replace_all(&without_blocks, "").into_owned()
}

/// Sanitize an optional field. Empty input collapses to `None`.
pub fn sanitize_optional(input: Option<&str>) -> Option<String> {
    input.filter(|s| !s.is_empty()).map(sanitize_text)
}
