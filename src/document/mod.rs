//! Tagged-article document model and parsing.
//!
//! Parsing runs a three-stage pipeline over the whole accumulated source on
//! every update: anchor extraction, line classification, block building.
//! The whole-buffer re-parse is quadratic over a stream but deliberately so;
//! buffers are a few thousand characters and chunk counts are small.

mod anchors;
mod builder;
mod line;
mod types;

pub use types::{AnchorSet, Block, Document, MAX_VISUALS, Slot};

impl Document {
    /// Parse tagged article source into a document.
    ///
    /// Never fails: malformed directives degrade to paragraphs, anchor
    /// lines are stripped, and an empty source yields an empty sequence.
    ///
    /// # Example
    ///
    /// ```
    /// use inkstream::document::{Block, Document};
    ///
    /// let doc = Document::parse("[TITLE:Intro]\nHello");
    /// assert_eq!(doc.block_count(), 2);
    /// assert!(matches!(doc.blocks()[0], Block::Title { .. }));
    /// ```
    pub fn parse(source: &str) -> Self {
        let extraction = anchors::extract(source);
        let tokens = line::tokenize(&extraction.lines);
        let blocks = builder::build(tokens);
        Self::from_parts(source.to_string(), blocks, extraction.anchors)
    }
}
