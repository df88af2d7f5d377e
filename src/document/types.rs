//! Core document types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// An out-of-band image slot addressed by anchor directives.
///
/// `Visual` carries the explicit 1-based index written in the directive
/// (`1..=3`), not the order of appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// The single cover image slot
    Cover,
    /// A numbered in-article visual slot (1..=3)
    Visual(u8),
}

/// Highest visual slot index addressable by the tag grammar.
pub const MAX_VISUALS: u8 = 3;

impl Slot {
    /// Slot for an explicit 1-based visual index, if in range.
    pub fn visual(index: u8) -> Option<Self> {
        (1..=MAX_VISUALS).contains(&index).then_some(Self::Visual(index))
    }

    /// Slot backing a zero-based `ImagePlaceholder` index.
    pub fn for_placeholder(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .and_then(|i| Self::visual(i.checked_add(1)?))
    }

    /// All slots a run can populate, in stable order.
    pub fn all() -> impl Iterator<Item = Self> {
        std::iter::once(Self::Cover).chain((1..=MAX_VISUALS).map(Self::Visual))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cover => write!(f, "cover"),
            Self::Visual(n) => write!(f, "visual-{n}"),
        }
    }
}

/// Anchor descriptions keyed by slot.
///
/// Rescanning the whole growing buffer means a duplicate directive for a
/// slot overwrites the earlier description (last-wins). Fetch dispatch
/// dedupe is the engine's concern, not this set's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorSet {
    entries: BTreeMap<Slot, String>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a description for a slot, replacing any earlier one.
    pub fn insert(&mut self, slot: Slot, description: String) {
        self.entries.insert(slot, description);
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.entries.get(&slot).map(String::as_str)
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.entries.contains_key(&slot)
    }

    /// Iterate `(slot, description)` in stable slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.entries.iter().map(|(slot, desc)| (*slot, desc.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One typed, ordered unit of parsed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Section title
    Title { text: String },
    /// Pull quote
    Quote { text: String },
    /// Highlight callout
    Highlight { text: String },
    /// Data table; rows may be ragged relative to the header
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Placeholder for visual slot `index + 1`; resolved by the binder,
    /// never eagerly, so the same sequence renders before and after the
    /// image exists
    ImagePlaceholder { index: usize },
    /// One or more consecutive list lines collapsed into a single group
    ListGroup { items: Vec<String> },
    /// Blank line preserving vertical rhythm
    Spacer,
    /// Fallback for any line matching no tag
    Paragraph { text: String },
}

/// A parsed document: the typed block sequence plus the anchors extracted
/// out of band.
///
/// Parsing is infallible — malformed input degrades per-line, it never
/// fails the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Original source text
    source: String,
    /// Typed blocks in original line order
    blocks: Vec<Block>,
    /// Anchor directives stripped from the rendered output
    anchors: AnchorSet,
}

impl Document {
    /// Create an empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(source: String, blocks: Vec<Block>, anchors: AnchorSet) -> Self {
        Self {
            source,
            blocks,
            anchors,
        }
    }

    /// The typed block sequence, in original line order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Anchor directives found anywhere in the source.
    pub const fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
