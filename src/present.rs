//! Presentation seam.
//!
//! The core emits abstract blocks; pixel-level styling belongs to whatever
//! consumes them. The adapters here are the thin ones the binary ships: a
//! plain-text writer and a JSON emitter for downstream exporters.

use std::io::Write;

use anyhow::Result;
use unicode_width::UnicodeWidthStr;

use crate::binder::{RenderBlock, Visual};
use crate::document::Block;

/// Receives a fresh bound snapshot after every text increment and every
/// visual arrival. Implementations render whole-sequence snapshots, not
/// diffs.
pub trait Presenter {
    /// # Errors
    /// A failing sink aborts the run.
    fn present(&mut self, blocks: &[RenderBlock]) -> Result<()>;
}

/// Discards every snapshot; embedders that read the run report use this.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _blocks: &[RenderBlock]) -> Result<()> {
        Ok(())
    }
}

/// Writes each snapshot as plain text, separated by a rule.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, blocks: &[RenderBlock]) -> Result<()> {
        render_text(blocks, &mut self.out)?;
        writeln!(self.out, "{}", "─".repeat(8))?;
        Ok(())
    }
}

/// Writes each snapshot as one JSON line (images as data URIs).
pub struct JsonPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, blocks: &[RenderBlock]) -> Result<()> {
        serde_json::to_writer(&mut self.out, blocks)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Render one bound snapshot as plain text.
///
/// # Errors
/// Returns any error from the writer.
pub fn render_text(blocks: &[RenderBlock], out: &mut impl Write) -> std::io::Result<()> {
    for entry in blocks {
        match &entry.block {
            Block::Title { text } => writeln!(out, "▌ {text}")?,
            Block::Quote { text } => writeln!(out, "│ {text}")?,
            Block::Highlight { text } => render_highlight(text, out)?,
            Block::Table { header, rows } => render_table(header, rows, out)?,
            Block::ImagePlaceholder { index } => {
                match &entry.visual {
                    Some(Visual::Ready { image }) => {
                        writeln!(out, "[image {}: {}]", index + 1, image.describe())?;
                    }
                    _ => writeln!(out, "[image {}: pending]", index + 1)?,
                }
            }
            Block::ListGroup { items } => {
                for (i, item) in items.iter().enumerate() {
                    writeln!(out, " {}. {item}", i + 1)?;
                }
            }
            Block::Spacer => writeln!(out)?,
            Block::Paragraph { text } => writeln!(out, "{text}")?,
        }
    }
    Ok(())
}

fn render_highlight(text: &str, out: &mut impl Write) -> std::io::Result<()> {
    let width = text.width();
    writeln!(out, "┌{}┐", "─".repeat(width + 2))?;
    writeln!(out, "│ {text} │")?;
    writeln!(out, "└{}┘", "─".repeat(width + 2))
}

fn render_table(
    header: &[String],
    rows: &[Vec<String>],
    out: &mut impl Write,
) -> std::io::Result<()> {
    // Column widths over header and data; ragged rows just contribute the
    // cells they have.
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let render_row = |row: &[String], out: &mut dyn Write| -> std::io::Result<()> {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        writeln!(out, "{}", cells.join("  ").trim_end())
    };

    render_row(header, out)?;
    writeln!(out, "{}", "─".repeat(widths.iter().sum::<usize>() + columns.saturating_sub(1) * 2))?;
    for row in rows {
        render_row(row, out)?;
    }
    Ok(())
}
