use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Instant;

use thiserror::Error;

use crate::binder::RenderBlock;
use crate::document::Slot;
use crate::engine::{Engine, Message, Model, update};
use crate::image::{FetchOutcome, FetchPool};
use crate::source::SourceError;

/// Terminal failure of a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The generation stream broke mid-run. Distinct from an empty but
    /// healthy stream, which completes with an empty report.
    #[error("generation source failed")]
    Source(#[source] SourceError),
    /// The presentation sink rejected a snapshot.
    #[error(transparent)]
    Present(#[from] anyhow::Error),
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Final bound block sequence
    pub blocks: Vec<RenderBlock>,
    /// Text chunks consumed
    pub chunks: usize,
    /// Image slots resolved with data
    pub resolved: usize,
    /// Dispatched slots that never resolved (failed or timed out)
    pub unresolved: Vec<Slot>,
}

impl Engine {
    /// Drive one generation run to completion.
    ///
    /// Chunks are processed strictly in order - chunk N is concatenated and
    /// fully rendered before chunk N+1 is requested. Fetch completions are
    /// drained between chunks and settled (bounded) after the stream ends,
    /// so the final snapshot carries every image that arrived in time.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Source`] when the stream breaks mid-run and
    /// [`RunError::Present`] when the presentation sink fails.
    pub fn run(&mut self) -> Result<RunReport, RunError> {
        if !self.credentials.has_credential() {
            self.credentials.request_credential();
        }

        let (tx, rx) = mpsc::channel();
        let pool = FetchPool::new(Arc::clone(&self.visuals), tx);
        let mut model = Model::new();
        let mut chunks = 0usize;

        loop {
            // Queued completions first, so placeholders resolve at the
            // earliest snapshot that can show them.
            model = self.drain_fetches(&rx, model)?;

            match self.text.next_chunk() {
                Ok(Some(chunk)) => {
                    chunks += 1;
                    model = update(model, Message::ChunkReceived(chunk));
                    self.dispatch_new_anchors(&pool, &mut model);
                    self.present(&model)?;
                }
                Ok(None) => {
                    model = update(model, Message::StreamEnded);
                    break;
                }
                Err(err) => {
                    let failed = update(model, Message::StreamFailed(err.to_string()));
                    crate::perf::log_event(
                        "run.failed",
                        format!("run={} chunks={chunks} err={err}", failed.run()),
                    );
                    return Err(RunError::Source(err));
                }
            }
        }

        model = self.settle_fetches(&rx, model)?;
        self.present(&model)?;

        crate::perf::log_event(
            "run.done",
            format!(
                "chunks={chunks} blocks={} resolved={}",
                model.render().len(),
                model.images().resolved_count()
            ),
        );

        Ok(RunReport {
            resolved: model.images().resolved_count(),
            unresolved: model.unresolved_slots(),
            blocks: model.render().to_vec(),
            chunks,
        })
    }

    /// Start fetches for anchors that appeared in the latest parse.
    ///
    /// Each slot dispatches at most once per run: the first-seen
    /// description wins even if a later rescan rewrites it.
    fn dispatch_new_anchors(&self, pool: &FetchPool, model: &mut Model) {
        if !self.visuals_enabled {
            return;
        }
        for (slot, description) in model.undispatched_anchors() {
            if model.mark_dispatched(slot, description.clone()) {
                pool.dispatch(model.run(), slot, &description);
            }
        }
    }

    /// Apply already-queued fetch completions without blocking.
    fn drain_fetches(
        &mut self,
        rx: &Receiver<FetchOutcome>,
        mut model: Model,
    ) -> Result<Model, RunError> {
        let mut rebound = false;
        while let Ok(outcome) = rx.try_recv() {
            rebound |= outcome.result.is_ok();
            model = update(model, outcome_message(outcome));
        }
        if rebound {
            self.present(&model)?;
        }
        Ok(model)
    }

    /// Wait (bounded) for in-flight fetches after the stream has ended.
    fn settle_fetches(
        &mut self,
        rx: &Receiver<FetchOutcome>,
        mut model: Model,
    ) -> Result<Model, RunError> {
        let deadline = Instant::now() + self.settle_timeout;
        while model.outstanding_fetches() > 0 {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
            else {
                crate::perf::log_event(
                    "run.settle_timeout",
                    format!("outstanding={}", model.outstanding_fetches()),
                );
                break;
            };
            match rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    let arrived = outcome.result.is_ok();
                    model = update(model, outcome_message(outcome));
                    if arrived {
                        self.present(&model)?;
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(model)
    }

    fn present(&mut self, model: &Model) -> Result<(), RunError> {
        self.presenter
            .present(model.render())
            .map_err(RunError::Present)
    }
}

fn outcome_message(outcome: FetchOutcome) -> Message {
    match outcome.result {
        Ok(image) => Message::VisualReady {
            run: outcome.run,
            slot: outcome.slot,
            image,
        },
        Err(_) => Message::VisualFailed {
            run: outcome.run,
            slot: outcome.slot,
        },
    }
}
