//! The render driver.
//!
//! The engine follows The Elm Architecture (TEA):
//! - [`Model`]: the complete per-run state
//! - [`Message`]: stream and fetch events
//! - [`update`]: pure state transitions
//! - [`Engine::run`]: the event loop with side effects (fetch dispatch,
//!   presentation)
//!
//! One full re-parse per received chunk, one cheap rebind per image
//! arrival.

mod driver;
mod model;
mod update;

pub use driver::{RunError, RunReport};
pub use model::Model;
pub use update::{Message, update};

use std::sync::Arc;
use std::time::Duration;

use crate::present::{NullPresenter, Presenter};
use crate::source::{Credentials, StaticCredentials, TextSource, VisualSource};

/// Owns the collaborator seams and runs the event loop.
pub struct Engine {
    text: Box<dyn TextSource>,
    visuals: Arc<dyn VisualSource + Send + Sync>,
    credentials: Box<dyn Credentials>,
    presenter: Box<dyn Presenter>,
    visuals_enabled: bool,
    settle_timeout: Duration,
}

impl Engine {
    /// Create an engine over a text stream and a visual source.
    pub fn new(
        text: impl TextSource + 'static,
        visuals: impl VisualSource + Send + Sync + 'static,
    ) -> Self {
        Self {
            text: Box::new(text),
            visuals: Arc::new(visuals),
            credentials: Box::new(StaticCredentials),
            presenter: Box::new(NullPresenter),
            visuals_enabled: true,
            settle_timeout: Duration::from_secs(30),
        }
    }

    /// Receive every bound snapshot as the run progresses.
    #[must_use]
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    /// Gate the run on a host credential.
    #[must_use]
    pub fn with_credentials(mut self, credentials: impl Credentials + 'static) -> Self {
        self.credentials = Box::new(credentials);
        self
    }

    /// Disable fetch dispatch entirely; placeholders stay pending.
    #[must_use]
    pub const fn with_visuals_enabled(mut self, enabled: bool) -> Self {
        self.visuals_enabled = enabled;
        self
    }

    /// How long to wait for in-flight fetches after the stream ends.
    #[must_use]
    pub const fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests;
