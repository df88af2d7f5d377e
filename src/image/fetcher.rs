//! Background visual fetches.
//!
//! Each dispatched anchor runs on its own thread and reports back through a
//! channel so fetch latency never blocks text-chunk processing. Completions
//! carry the run id that asked for them; the engine drops stale ones.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::document::Slot;
use crate::image::ImageData;
use crate::source::{SourceError, VisualSource};

/// Completion of one background fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Run that dispatched the fetch
    pub run: u64,
    pub slot: Slot,
    pub result: Result<Arc<ImageData>, SourceError>,
}

/// Dispatches visual fetches onto background threads.
///
/// Dedup is the caller's job: the engine dispatches each slot at most once
/// per run, with the first-seen description.
pub struct FetchPool {
    source: Arc<dyn VisualSource + Send + Sync>,
    tx: Sender<FetchOutcome>,
}

impl FetchPool {
    pub fn new(source: Arc<dyn VisualSource + Send + Sync>, tx: Sender<FetchOutcome>) -> Self {
        Self { source, tx }
    }

    /// Start one fetch; the outcome arrives on the pool's channel whenever
    /// the source finishes, in no particular order.
    pub fn dispatch(&self, run: u64, slot: Slot, description: &str) {
        crate::perf::log_event("fetch.dispatch", format!("run={run} slot={slot}"));
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let description = description.to_string();
        thread::spawn(move || {
            let result = source
                .fetch_image(&description)
                .map(|bytes| Arc::new(ImageData::from_bytes(bytes)));
            if let Err(err) = &result {
                tracing::warn!(%slot, "visual fetch failed: {err}");
            }
            // The receiver hanging up just means the run is over.
            let _ = tx.send(FetchOutcome { run, slot, result });
        });
    }
}
