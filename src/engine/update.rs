use std::sync::Arc;

use crate::document::Slot;
use crate::engine::Model;
use crate::image::ImageData;

/// Events driving one generation run.
#[derive(Debug, Clone)]
pub enum Message {
    /// A text fragment arrived from the generation stream
    ChunkReceived(String),
    /// The generation stream ended cleanly
    StreamEnded,
    /// The generation stream broke; the run is failed
    StreamFailed(String),
    /// A background visual fetch produced image data
    VisualReady {
        run: u64,
        slot: Slot,
        image: Arc<ImageData>,
    },
    /// A background visual fetch failed; the slot stays pending forever
    VisualFailed { run: u64, slot: Slot },
    /// Start a fresh run, discarding all per-run state
    RestartRun,
}

/// Pure state transition: all model changes happen here.
///
/// Fetch dispatch and presentation are side effects applied by the engine
/// around each update, not in it.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::ChunkReceived(chunk) => {
            model.append_chunk(&chunk);
        }
        Message::StreamEnded => {
            model.stream_done = true;
        }
        Message::StreamFailed(reason) => {
            model.set_failure(reason);
        }
        Message::VisualReady { run, slot, image } => {
            if run == model.run() {
                model.images.insert(slot, image);
                model.settle(slot);
                model.rebind();
            } else {
                crate::perf::log_event(
                    "visual.stale",
                    format!("slot={slot} run={run} active={}", model.run()),
                );
            }
        }
        Message::VisualFailed { run, slot } => {
            if run == model.run() {
                // Unpopulated slot: the binder keeps emitting a pending
                // placeholder, same as "not yet arrived". No retry.
                model.settle(slot);
            }
        }
        Message::RestartRun => {
            model.restart();
        }
    }
    model
}
