//! Fetched image payloads and the per-run slot table.

mod fetcher;

pub use fetcher::{FetchOutcome, FetchPool};

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use image::ImageFormat;

use crate::document::{MAX_VISUALS, Slot};

/// Raw image bytes plus metadata sniffed from them.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Vec<u8>,
    format: Option<ImageFormat>,
    dimensions: Option<(u32, u32)>,
}

impl ImageData {
    /// Wrap fetched bytes, sniffing format and pixel dimensions.
    ///
    /// Undecodable bytes are kept as-is — the payload is opaque to the
    /// engine, metadata is best-effort.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let format = image::guess_format(&bytes).ok();
        let dimensions = image::load_from_memory(&bytes)
            .ok()
            .map(|img| (img.width(), img.height()));
        Self {
            bytes,
            format,
            dimensions,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub const fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub const fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Encode as a `data:` URI for export surfaces.
    pub fn to_data_uri(&self) -> String {
        let mime = self
            .format
            .map_or("application/octet-stream", |f| f.to_mime_type());
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{mime};base64,{encoded}")
    }

    /// Short human description, e.g. `640x360 image/png`.
    pub fn describe(&self) -> String {
        match (self.dimensions, self.format) {
            (Some((w, h)), Some(fmt)) => format!("{w}x{h} {}", fmt.to_mime_type()),
            (Some((w, h)), None) => format!("{w}x{h}"),
            _ => format!("{} bytes", self.bytes.len()),
        }
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

/// Sparse per-run table of fetched images: one cover slot plus the numbered
/// visual slots. Missing entries are the expected pending state, not an
/// error.
#[derive(Debug, Clone, Default)]
pub struct ImageTable {
    cover: Option<Arc<ImageData>>,
    visuals: [Option<Arc<ImageData>>; MAX_VISUALS as usize],
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&Arc<ImageData>> {
        match slot {
            Slot::Cover => self.cover.as_ref(),
            Slot::Visual(n) => self
                .visuals
                .get(usize::from(n).checked_sub(1)?)?
                .as_ref(),
        }
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Populate a slot. Out-of-range visual indices are ignored.
    pub fn insert(&mut self, slot: Slot, image: Arc<ImageData>) {
        match slot {
            Slot::Cover => self.cover = Some(image),
            Slot::Visual(n) => {
                if let Some(entry) = usize::from(n)
                    .checked_sub(1)
                    .and_then(|i| self.visuals.get_mut(i))
                {
                    *entry = Some(image);
                }
            }
        }
    }

    /// Number of populated slots.
    pub fn resolved_count(&self) -> usize {
        Slot::all().filter(|slot| self.contains(*slot)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved_count() == 0
    }

    /// Reset to the fresh-run state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
