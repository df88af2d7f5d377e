//! Pure binding of fetched images onto the parsed block sequence.
//!
//! Fetches complete out of order and at different times than text chunks
//! arrive, so resolution lives in this cheap idempotent layer instead of
//! the tokenizer: every table mutation re-runs `bind`, never the parser.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::document::{Block, Slot};
use crate::image::{ImageData, ImageTable};

/// Resolution state of one image placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Visual {
    /// Image data has arrived for this slot.
    Ready {
        #[serde(serialize_with = "as_data_uri")]
        image: Arc<ImageData>,
    },
    /// No data yet (or the fetch failed — downstream can't tell).
    Pending,
}

fn as_data_uri<S: Serializer>(image: &Arc<ImageData>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&image.to_data_uri())
}

/// One presentation-ready entry: the block plus, for image placeholders,
/// its current resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderBlock {
    #[serde(flatten)]
    pub block: Block,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<Visual>,
}

impl RenderBlock {
    pub const fn is_resolved(&self) -> bool {
        matches!(self.visual, Some(Visual::Ready { .. }))
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self.visual, Some(Visual::Pending))
    }
}

/// Bind the current image table onto a block sequence.
///
/// Pure and idempotent: same inputs, same output. Order is preserved
/// exactly; non-image blocks pass through untouched; a placeholder whose
/// slot is unpopulated renders as pending rather than failing.
pub fn bind(blocks: &[Block], images: &ImageTable) -> Vec<RenderBlock> {
    blocks
        .iter()
        .map(|block| {
            let visual = match block {
                Block::ImagePlaceholder { index } => Some(
                    Slot::for_placeholder(*index)
                        .and_then(|slot| images.get(slot).cloned())
                        .map_or(Visual::Pending, |image| Visual::Ready { image }),
                ),
                _ => None,
            };
            RenderBlock {
                block: block.clone(),
                visual,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::image::test_support::tiny_image;

    fn placeholder_blocks() -> Vec<Block> {
        Document::parse("[IMAGE:1]\n[IMAGE:2]\n[IMAGE:3]")
            .blocks()
            .to_vec()
    }

    #[test]
    fn test_bind_empty_table_leaves_all_pending() {
        let bound = bind(&placeholder_blocks(), &ImageTable::new());
        assert_eq!(bound.len(), 3);
        assert!(bound.iter().all(RenderBlock::is_pending));
    }

    #[test]
    fn test_bind_resolves_only_populated_slot() {
        let mut table = ImageTable::new();
        table.insert(Slot::Visual(2), Arc::new(tiny_image()));

        let bound = bind(&placeholder_blocks(), &table);
        assert!(bound[0].is_pending());
        assert!(bound[1].is_resolved());
        assert!(bound[2].is_pending());
    }

    #[test]
    fn test_rebind_updates_only_the_new_slot() {
        let blocks = placeholder_blocks();
        let mut table = ImageTable::new();
        table.insert(Slot::Visual(2), Arc::new(tiny_image()));
        let before = bind(&blocks, &table);

        table.insert(Slot::Visual(1), Arc::new(tiny_image()));
        let after = bind(&blocks, &table);

        assert!(after[0].is_resolved());
        // The other two entries are untouched and order is unchanged.
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2], before[2]);
        assert_eq!(
            after.iter().map(|b| &b.block).collect::<Vec<_>>(),
            before.iter().map(|b| &b.block).collect::<Vec<_>>(),
        );
    }

    #[test]
    fn test_bind_is_idempotent() {
        let blocks = placeholder_blocks();
        let mut table = ImageTable::new();
        table.insert(Slot::Visual(3), Arc::new(tiny_image()));
        assert_eq!(bind(&blocks, &table), bind(&blocks, &table));
    }

    #[test]
    fn test_non_image_blocks_have_no_visual() {
        let blocks = Document::parse("[TITLE:T]\ntext").blocks().to_vec();
        let bound = bind(&blocks, &ImageTable::new());
        assert!(bound.iter().all(|b| b.visual.is_none()));
    }

    #[test]
    fn test_cover_slot_does_not_resolve_placeholders() {
        let mut table = ImageTable::new();
        table.insert(Slot::Cover, Arc::new(tiny_image()));
        let bound = bind(&placeholder_blocks(), &table);
        assert!(bound.iter().all(RenderBlock::is_pending));
    }

    #[test]
    fn test_serialized_ready_entry_carries_data_uri() {
        let mut table = ImageTable::new();
        table.insert(Slot::Visual(1), Arc::new(tiny_image()));
        let bound = bind(&placeholder_blocks(), &table);

        let json = serde_json::to_value(&bound[0]).unwrap();
        assert_eq!(json["kind"], "image_placeholder");
        assert_eq!(json["visual"]["state"], "ready");
        let uri = json["visual"]["image"].as_str().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let json = serde_json::to_value(&bound[1]).unwrap();
        assert_eq!(json["visual"]["state"], "pending");
    }
}
