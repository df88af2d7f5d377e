//! Anchor directive extraction.
//!
//! Anchor directives are out-of-band instructions for the image pipeline.
//! They are recognized at line start, recorded into an [`AnchorSet`], and
//! their lines are removed from the text the tokenizer sees.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{AnchorSet, Slot};

// Keyword match is case-insensitive; the separator accepts half- and
// full-width colons; the description stops at the first closing bracket.
static COVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[(?:封面锚点|COVER)[：:]\s*([^\]]*)\]").expect("cover anchor pattern")
});
static VISUAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[(?:视觉锚点|VISUAL)([1-3])[：:]\s*([^\]]*)\]").expect("visual anchor pattern")
});

/// Result of scanning the full buffer for anchor directives.
///
/// The filtered text stays a line list: an input that was nothing but
/// anchor lines filters down to zero lines, not to one empty line.
#[derive(Debug, Clone, Default)]
pub(crate) struct Extraction {
    pub anchors: AnchorSet,
    /// Source lines with every anchor line removed, original order intact.
    pub lines: Vec<String>,
}

/// Scan `source` for anchor directives.
///
/// Non-anchor lines pass through unchanged. A duplicate directive for a
/// slot overwrites the earlier description (the buffer is rescanned whole
/// on every update); fetch dedupe happens downstream.
pub(crate) fn extract(source: &str) -> Extraction {
    let mut anchors = AnchorSet::new();
    let mut lines: Vec<String> = Vec::new();

    for line in source.split('\n') {
        if let Some(caps) = COVER.captures(line) {
            anchors.insert(Slot::Cover, caps[1].trim().to_string());
        } else if let Some(caps) = VISUAL.captures(line) {
            // The pattern guarantees a single ASCII digit in 1..=3.
            let index = caps[1].as_bytes()[0] - b'0';
            anchors.insert(Slot::Visual(index), caps[2].trim().to_string());
        } else {
            lines.push(line.to_string());
        }
    }

    Extraction { anchors, lines }
}
