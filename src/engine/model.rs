use std::collections::{BTreeMap, BTreeSet};

use crate::binder::{RenderBlock, bind};
use crate::document::{Document, Slot};
use crate::image::ImageTable;

/// The complete state of one generation run.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// Monotonic run identifier; fetch completions carrying another run's
    /// id are dropped
    run: u64,
    /// Full text accumulated so far; append-only within a run
    raw: String,
    /// Result of the last whole-buffer parse
    pub(super) document: Document,
    /// Asynchronously populated image slots for this run
    pub(super) images: ImageTable,
    /// Slots dispatched this run, with the first-seen description.
    /// A slot present here is never dispatched again, even if a later
    /// rescan changes its description.
    dispatched: BTreeMap<Slot, String>,
    /// Dispatched slots whose fetch has completed or failed
    settled: BTreeSet<Slot>,
    pub(super) stream_done: bool,
    /// Terminal stream failure, if any
    failure: Option<String>,
    /// Last bound output handed to the presentation layer
    render: Vec<RenderBlock>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            run: 0,
            raw: String::new(),
            document: Document::empty(),
            images: ImageTable::new(),
            dispatched: BTreeMap::new(),
            settled: BTreeSet::new(),
            stream_done: false,
            failure: None,
            render: Vec::new(),
        }
    }

    pub const fn run(&self) -> u64 {
        self.run
    }

    /// The full accumulated stream text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn images(&self) -> &ImageTable {
        &self.images
    }

    /// The current presentation-ready block sequence.
    pub fn render(&self) -> &[RenderBlock] {
        &self.render
    }

    pub const fn stream_done(&self) -> bool {
        self.stream_done
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Dispatched fetches not yet completed or failed.
    pub fn outstanding_fetches(&self) -> usize {
        self.dispatched
            .keys()
            .filter(|slot| !self.settled.contains(slot))
            .count()
    }

    /// Dispatched slots that never produced an image (failed, or still in
    /// flight when the run was declared over).
    pub fn unresolved_slots(&self) -> Vec<Slot> {
        self.dispatched
            .keys()
            .copied()
            .filter(|slot| !self.images.contains(*slot))
            .collect()
    }

    /// Description used for a slot's fetch, if one was dispatched.
    pub fn dispatched_description(&self, slot: Slot) -> Option<&str> {
        self.dispatched.get(&slot).map(String::as_str)
    }

    /// Anchors seen in the document but not yet dispatched, in slot order.
    pub(super) fn undispatched_anchors(&self) -> Vec<(Slot, String)> {
        self.document
            .anchors()
            .iter()
            .filter(|(slot, _)| !self.dispatched.contains_key(slot))
            .map(|(slot, desc)| (slot, desc.to_string()))
            .collect()
    }

    /// Record that a slot's fetch is in flight. Returns false when the slot
    /// was already dispatched (first-seen description wins).
    pub(super) fn mark_dispatched(&mut self, slot: Slot, description: String) -> bool {
        if self.dispatched.contains_key(&slot) {
            return false;
        }
        self.dispatched.insert(slot, description);
        true
    }

    pub(super) fn settle(&mut self, slot: Slot) {
        self.settled.insert(slot);
    }

    pub(super) fn set_failure(&mut self, reason: String) {
        self.failure = Some(reason);
    }

    /// Concatenate a text fragment, re-parse the whole buffer, and rebind.
    pub(super) fn append_chunk(&mut self, chunk: &str) {
        self.raw.push_str(chunk);
        let scope = crate::perf::scope("engine.reparse");
        self.document = Document::parse(&self.raw);
        drop(scope);
        self.rebind();
    }

    /// Re-run only the binder against the last parse.
    pub(super) fn rebind(&mut self) {
        self.render = bind(self.document.blocks(), &self.images);
    }

    /// Discard all per-run state and bump the run id; in-flight fetch
    /// results from the old run no longer match and are dropped.
    pub(super) fn restart(&mut self) {
        *self = Self {
            run: self.run + 1,
            ..Self::new()
        };
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("run", &self.run)
            .field("raw_len", &self.raw.len())
            .field("blocks", &self.document.block_count())
            .field("resolved", &self.images.resolved_count())
            .field("stream_done", &self.stream_done)
            .finish_non_exhaustive()
    }
}
