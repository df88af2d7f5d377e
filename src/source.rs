//! Seams to the external collaborators.
//!
//! The engine only ever talks to the generation service through
//! [`TextSource`] and [`VisualSource`], and to the host's key management
//! through [`Credentials`]. The implementations here are the local ones the
//! binary ships: transcript replay, directory-served visuals, and a null
//! visual source whose fetches always fail (placeholders stay pending).

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Failure talking to an external collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The generation stream broke mid-run.
    #[error("generation stream failed: {0}")]
    Stream(String),
    /// A visual fetch could not produce image bytes.
    #[error("visual fetch failed: {0}")]
    Fetch(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Forward-only stream of UTF-8 text fragments from the generation service.
pub trait TextSource {
    /// The next fragment, `Ok(None)` on clean end of stream.
    ///
    /// The engine requests fragment N+1 only after fragment N is fully
    /// processed, so implementations may block.
    fn next_chunk(&mut self) -> Result<Option<String>, SourceError>;
}

/// Supplies binary image data for an anchor description.
///
/// Fetches run on background threads and may complete in any order; an
/// error leaves the slot permanently pending, indistinguishable downstream
/// from "not yet arrived".
pub trait VisualSource {
    fn fetch_image(&self, description: &str) -> Result<Vec<u8>, SourceError>;
}

impl<T: TextSource + ?Sized> TextSource for Box<T> {
    fn next_chunk(&mut self) -> Result<Option<String>, SourceError> {
        self.as_mut().next_chunk()
    }
}

impl<T: VisualSource + ?Sized> VisualSource for Box<T> {
    fn fetch_image(&self, description: &str) -> Result<Vec<u8>, SourceError> {
        self.as_ref().fetch_image(description)
    }
}

/// Narrow capability gate for the generation service credential, injected
/// rather than read from ambient host state.
pub trait Credentials {
    fn has_credential(&self) -> bool;
    /// Ask the host to provision a credential (e.g. open a key dialog).
    fn request_credential(&self);
}

/// Always-present credential; local replay needs none.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCredentials;

impl Credentials for StaticCredentials {
    fn has_credential(&self) -> bool {
        true
    }

    fn request_credential(&self) {}
}

/// Replays a finished transcript as a chunked stream.
///
/// Chunks are cut on character boundaries so every fragment is valid UTF-8;
/// an optional delay paces the replay like a live service.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    text: String,
    offset: usize,
    chunk_chars: usize,
    delay: Option<Duration>,
}

impl ScriptSource {
    pub fn new(text: impl Into<String>, chunk_chars: usize) -> Self {
        Self {
            text: text.into(),
            offset: 0,
            chunk_chars: chunk_chars.max(1),
            delay: None,
        }
    }

    /// Read the whole transcript from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path, chunk_chars: usize) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(text, chunk_chars))
    }

    /// Sleep this long before yielding each chunk.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl TextSource for ScriptSource {
    fn next_chunk(&mut self) -> Result<Option<String>, SourceError> {
        if self.offset >= self.text.len() {
            return Ok(None);
        }
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let rest = &self.text[self.offset..];
        let take = rest
            .char_indices()
            .nth(self.chunk_chars)
            .map_or(rest.len(), |(i, _)| i);
        self.offset += take;
        Ok(Some(rest[..take].to_string()))
    }
}

/// Serves visuals from a local directory.
///
/// The anchor description is treated as a file name relative to the
/// directory; a bare stem also resolves against common raster extensions.
/// This stands in for the remote image service in replay and tests.
#[derive(Debug, Clone)]
pub struct DirVisuals {
    dir: PathBuf,
}

const RASTER_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

impl DirVisuals {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn resolve(&self, description: &str) -> Option<PathBuf> {
        let name = description.trim();
        if name.is_empty() || name.contains("..") {
            return None;
        }
        let direct = self.dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        RASTER_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl VisualSource for DirVisuals {
    fn fetch_image(&self, description: &str) -> Result<Vec<u8>, SourceError> {
        let path = self
            .resolve(description)
            .ok_or_else(|| SourceError::Fetch(format!("no visual for \"{}\"", description.trim())))?;
        Ok(std::fs::read(path)?)
    }
}

/// Visual source with nothing behind it; every fetch fails and every
/// placeholder stays pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVisuals;

impl VisualSource for NullVisuals {
    fn fetch_image(&self, _description: &str) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::Fetch("no visual source configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut impl TextSource) -> Vec<String> {
        let mut chunks = Vec::new();
        while let Ok(Some(chunk)) = source.next_chunk() {
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn test_script_source_chunks_reassemble_exactly() {
        let mut source = ScriptSource::new("hello world", 4);
        let chunks = drain(&mut source);
        assert_eq!(chunks, vec!["hell", "o wo", "rld"]);
        assert_eq!(chunks.concat(), "hello world");
    }

    #[test]
    fn test_script_source_respects_char_boundaries() {
        // Multi-byte characters must never be split mid-codepoint.
        let text = "封面锚点abc视觉";
        let mut source = ScriptSource::new(text, 2);
        let chunks = drain(&mut source);
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 2);
        }
    }

    #[test]
    fn test_script_source_empty_ends_immediately() {
        let mut source = ScriptSource::new("", 8);
        assert!(matches!(source.next_chunk(), Ok(None)));
    }

    #[test]
    fn test_dir_visuals_resolves_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sunrise.png"), b"fake-bytes").unwrap();

        let visuals = DirVisuals::new(dir.path());
        assert_eq!(visuals.fetch_image("sunrise").unwrap(), b"fake-bytes");
        assert_eq!(visuals.fetch_image("sunrise.png").unwrap(), b"fake-bytes");
    }

    #[test]
    fn test_dir_visuals_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let visuals = DirVisuals::new(dir.path());
        assert!(matches!(
            visuals.fetch_image("nothing-here"),
            Err(SourceError::Fetch(_))
        ));
    }

    #[test]
    fn test_dir_visuals_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let visuals = DirVisuals::new(dir.path());
        assert!(visuals.fetch_image("../etc/passwd").is_err());
    }

    #[test]
    fn test_null_visuals_always_fails() {
        assert!(NullVisuals.fetch_image("anything").is_err());
    }
}
