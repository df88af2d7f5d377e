// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. image::ImageTable)
    clippy::module_name_repetitions
)]

//! # Inkstream
//!
//! A streaming article renderer.
//!
//! Inkstream ingests text fragments produced incrementally by a generation
//! service and renders them into typed content blocks (titles, quotes,
//! highlights, tables, lists, image placeholders, paragraphs). Visual
//! anchor directives embedded in the stream drive asynchronous image
//! fetches whose results bind back into already-emitted placeholders while
//! the text is still growing.
//!
//! ## Architecture
//!
//! The engine uses The Elm Architecture (TEA) pattern:
//! - **Model**: complete per-run state
//! - **Message**: stream and fetch events
//! - **Update**: pure state transitions
//! - **Engine**: event loop with side effects (fetch dispatch, presentation)
//!
//! ## Modules
//!
//! - [`document`]: tag grammar parsing into typed blocks
//! - [`binder`]: pure image-to-placeholder resolution
//! - [`image`]: fetched payloads, the slot table, background fetches
//! - [`engine`]: the render driver
//! - [`source`]: collaborator seams (generation stream, visuals, credentials)
//! - [`present`]: presentation seam with text/JSON adapters
//! - [`watcher`]: transcript following for live streams

pub mod binder;
pub mod config;
pub mod document;
pub mod engine;
pub mod image;
pub mod perf;
pub mod present;
pub mod source;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::binder::{RenderBlock, Visual, bind};
    pub use crate::document::{Block, Document, Slot};
    pub use crate::engine::{Engine, Message, Model, update};
    pub use crate::source::{TextSource, VisualSource};
}
