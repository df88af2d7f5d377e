//! Engine integration tests: full runs over scripted streams with canned
//! visual sources.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::binder::RenderBlock;
use crate::document::{Block, Slot};
use crate::engine::{Engine, RunError};
use crate::image::test_support::tiny_png;
use crate::present::Presenter;
use crate::source::{
    Credentials, NullVisuals, ScriptSource, SourceError, TextSource, VisualSource,
};

/// Records every description it is asked for; fails on demand.
struct RecordingVisuals {
    fetched: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingVisuals {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                fetched: Arc::clone(&fetched),
                fail: false,
            },
            fetched,
        )
    }

    fn failing() -> Self {
        Self {
            fetched: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }
}

impl VisualSource for RecordingVisuals {
    fn fetch_image(&self, description: &str) -> Result<Vec<u8>, SourceError> {
        self.fetched.lock().unwrap().push(description.to_string());
        if self.fail {
            Err(SourceError::Fetch("down".to_string()))
        } else {
            Ok(tiny_png())
        }
    }
}

/// Breaks after yielding its chunks.
struct BrokenSource {
    chunks: Vec<String>,
}

impl TextSource for BrokenSource {
    fn next_chunk(&mut self) -> Result<Option<String>, SourceError> {
        if self.chunks.is_empty() {
            Err(SourceError::Stream("connection reset".to_string()))
        } else {
            Ok(Some(self.chunks.remove(0)))
        }
    }
}

/// Counts snapshots handed to the presentation layer.
#[derive(Clone, Default)]
struct CountingPresenter {
    snapshots: Arc<Mutex<usize>>,
}

impl Presenter for CountingPresenter {
    fn present(&mut self, _blocks: &[RenderBlock]) -> anyhow::Result<()> {
        *self.snapshots.lock().unwrap() += 1;
        Ok(())
    }
}

struct GatedCredentials {
    requested: Arc<Mutex<bool>>,
}

impl Credentials for GatedCredentials {
    fn has_credential(&self) -> bool {
        false
    }

    fn request_credential(&self) {
        *self.requested.lock().unwrap() = true;
    }
}

fn block_kinds(blocks: &[RenderBlock]) -> Vec<&'static str> {
    blocks
        .iter()
        .map(|b| match b.block {
            Block::Title { .. } => "title",
            Block::Quote { .. } => "quote",
            Block::Highlight { .. } => "highlight",
            Block::Table { .. } => "table",
            Block::ImagePlaceholder { .. } => "image",
            Block::ListGroup { .. } => "list",
            Block::Spacer => "spacer",
            Block::Paragraph { .. } => "paragraph",
        })
        .collect()
}

#[test]
fn test_full_run_resolves_placeholders() {
    let transcript = "[TITLE:Intro]\nHello\n\n[视觉锚点1: rooftop]\n[LIST:One]\n[LIST:Two]\n[IMAGE:1]";
    let (visuals, fetched) = RecordingVisuals::new();
    let mut engine = Engine::new(ScriptSource::new(transcript, 8), visuals)
        .with_settle_timeout(Duration::from_secs(10));

    let report = engine.run().expect("run");

    assert_eq!(
        block_kinds(&report.blocks),
        vec!["title", "paragraph", "spacer", "list", "image"]
    );
    assert!(report.blocks[4].is_resolved());
    assert_eq!(report.resolved, 1);
    assert!(report.unresolved.is_empty());
    assert_eq!(*fetched.lock().unwrap(), vec!["rooftop"]);
}

#[test]
fn test_duplicate_anchor_fetches_first_seen_description_once() {
    let transcript = "[封面锚点: first cover]\nbody\n[封面锚点: second cover]";
    let (visuals, fetched) = RecordingVisuals::new();
    // One character per chunk: the first directive is complete and
    // dispatched long before the second appears.
    let mut engine = Engine::new(ScriptSource::new(transcript, 1), visuals)
        .with_settle_timeout(Duration::from_secs(10));

    let report = engine.run().expect("run");

    assert_eq!(*fetched.lock().unwrap(), vec!["first cover"]);
    // Both anchor lines are stripped from the output.
    assert_eq!(block_kinds(&report.blocks), vec!["paragraph"]);
    assert_eq!(report.resolved, 1);
}

#[test]
fn test_failed_fetch_leaves_placeholder_pending() {
    let transcript = "[视觉锚点2: x]\n[IMAGE:2]";
    let mut engine = Engine::new(
        ScriptSource::new(transcript, 64),
        RecordingVisuals::failing(),
    )
    .with_settle_timeout(Duration::from_secs(10));

    let report = engine.run().expect("run");

    assert!(report.blocks[0].is_pending());
    assert_eq!(report.resolved, 0);
    assert_eq!(report.unresolved, vec![Slot::Visual(2)]);
}

#[test]
fn test_visuals_disabled_never_dispatches() {
    let transcript = "[视觉锚点1: x]\n[IMAGE:1]";
    let (visuals, fetched) = RecordingVisuals::new();
    let mut engine =
        Engine::new(ScriptSource::new(transcript, 64), visuals).with_visuals_enabled(false);

    let report = engine.run().expect("run");

    assert!(fetched.lock().unwrap().is_empty());
    assert!(report.blocks[0].is_pending());
    assert!(report.unresolved.is_empty());
}

#[test]
fn test_broken_stream_is_terminal_run_failure() {
    let source = BrokenSource {
        chunks: vec!["some text".to_string()],
    };
    let mut engine = Engine::new(source, NullVisuals);
    assert!(matches!(engine.run(), Err(RunError::Source(_))));
}

#[test]
fn test_empty_stream_completes_cleanly() {
    // Distinct from a broken stream: no content is not a failure.
    let mut engine = Engine::new(ScriptSource::new("", 16), NullVisuals);
    let report = engine.run().expect("run");
    assert!(report.blocks.is_empty());
    assert_eq!(report.chunks, 0);
}

#[test]
fn test_presenter_sees_every_chunk_snapshot() {
    let presenter = CountingPresenter::default();
    let snapshots = Arc::clone(&presenter.snapshots);
    let mut engine =
        Engine::new(ScriptSource::new("abcdefgh", 2), NullVisuals).with_presenter(presenter);

    let report = engine.run().expect("run");

    assert_eq!(report.chunks, 4);
    // One snapshot per chunk plus the final settle snapshot.
    assert_eq!(*snapshots.lock().unwrap(), 5);
}

#[test]
fn test_missing_credential_is_requested_before_run() {
    let requested = Arc::new(Mutex::new(false));
    let credentials = GatedCredentials {
        requested: Arc::clone(&requested),
    };
    let mut engine =
        Engine::new(ScriptSource::new("x", 1), NullVisuals).with_credentials(credentials);
    engine.run().expect("run");
    assert!(*requested.lock().unwrap());
}

#[test]
fn test_directive_split_across_chunks_heals() {
    // A directive torn mid-keyword degrades to a paragraph until the close
    // arrives, then classifies properly; the final parse sees it whole.
    let transcript = "[TITLE:Streaming]\n[QUOTE:patience]";
    let mut engine = Engine::new(ScriptSource::new(transcript, 3), NullVisuals);
    let report = engine.run().expect("run");
    assert_eq!(block_kinds(&report.blocks), vec!["title", "quote"]);
}
