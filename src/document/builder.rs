//! Block building and list aggregation.
//!
//! A fold over the classified line sequence. The only state carried across
//! lines is the pending list accumulator; the flush rule is lookahead-by-one:
//! a run of list lines becomes one `ListGroup` positioned at the run's end.

use super::line::{LineToken, ROW_BREAK};
use super::types::Block;

/// Build the block sequence from classified lines. Infallible; empty input
/// yields an empty sequence.
pub(crate) fn build(tokens: Vec<LineToken>) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(tokens.len());
    let mut pending: Vec<String> = Vec::new();

    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        match token {
            LineToken::List(item) => {
                pending.push(item);
                if !matches!(iter.peek(), Some(LineToken::List(_))) {
                    blocks.push(Block::ListGroup {
                        items: std::mem::take(&mut pending),
                    });
                }
            }
            LineToken::Title(text) => blocks.push(Block::Title { text }),
            LineToken::Quote(text) => blocks.push(Block::Quote { text }),
            LineToken::Highlight(text) => blocks.push(Block::Highlight { text }),
            LineToken::Table(payload) => blocks.push(parse_table(&payload)),
            LineToken::Image(index) => blocks.push(Block::ImagePlaceholder { index }),
            LineToken::Blank => blocks.push(Block::Spacer),
            LineToken::Paragraph(text) => blocks.push(Block::Paragraph { text }),
        }
    }

    blocks
}

/// Split a table payload into header and data rows.
///
/// Rows separate on the escaped-newline token, cells on `|`, each cell
/// trimmed. Ragged rows are kept as-is — cell count mismatches are a
/// rendering concern, not a parse failure.
fn parse_table(payload: &str) -> Block {
    let mut rows = payload.split(ROW_BREAK).map(|row| {
        row.split('|')
            .map(|cell| cell.trim().to_string())
            .collect::<Vec<_>>()
    });
    let header = rows.next().unwrap_or_default();
    Block::Table {
        header,
        rows: rows.collect(),
    }
}
