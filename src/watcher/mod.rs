//! Transcript following for live streams.
//!
//! Uses the notify crate for cross-platform file system events.
//!
//! A generation process that writes its stream into a transcript file is
//! followed by tailing the file: every append becomes a text chunk, in
//! order. The stream ends once the file has stopped growing for the idle
//! window (a tailed file carries no explicit end-of-stream marker).

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::source::{SourceError, TextSource};

/// Tails a growing transcript file as a [`TextSource`].
pub struct StreamWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    target_path: PathBuf,
    target_name: Option<OsString>,
    watch_root: PathBuf,
    /// Bytes already handed out as chunks
    offset: u64,
    /// Trailing bytes held back until the next read completes a UTF-8
    /// sequence (appends can land mid-codepoint)
    carry: Vec<u8>,
    idle_timeout: Duration,
    last_growth: Instant,
}

impl StreamWatcher {
    /// Watch `path` for appended text.
    ///
    /// Existing content counts as the first chunk. The stream ends after
    /// `idle_timeout` without growth.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the parent
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, idle_timeout: Duration) -> notify::Result<Self> {
        // Canonicalize so event paths from the OS (absolute and canonical)
        // match our stored paths.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            target_path,
            target_name,
            watch_root,
            offset: 0,
            carry: Vec::new(),
            idle_timeout,
            last_growth: Instant::now(),
        })
    }

    /// The canonical path of the transcript being followed.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Read any bytes appended since the last call, returning the complete
    /// UTF-8 prefix as text and carrying partial sequences forward.
    fn read_appended(&mut self) -> std::io::Result<Option<String>> {
        let len = match std::fs::metadata(&self.target_path) {
            Ok(meta) => meta.len(),
            // Not created yet (or briefly replaced): nothing to read.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        if len < self.offset {
            // Truncated: the producer restarted its transcript from the top.
            self.offset = 0;
            self.carry.clear();
        }
        if len == self.offset {
            return Ok(None);
        }

        let mut file = File::open(&self.target_path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let read = file.take(len - self.offset).read_to_end(&mut self.carry)?;
        self.offset += read as u64;

        let valid = match std::str::from_utf8(&self.carry) {
            Ok(_) => self.carry.len(),
            Err(err) => err.valid_up_to(),
        };
        if valid == 0 {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&self.carry[..valid]).into_owned();
        self.carry.drain(..valid);
        Ok(Some(text))
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

impl TextSource for StreamWatcher {
    fn next_chunk(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            if let Some(text) = self.read_appended()? {
                self.last_growth = Instant::now();
                return Ok(Some(text));
            }

            let idle = self.last_growth.elapsed();
            if idle >= self.idle_timeout {
                crate::perf::log_event(
                    "watcher.idle_end",
                    format!("path={} idle_ms={}", self.target_path.display(), idle.as_millis()),
                );
                return Ok(None);
            }

            // Wake on the next relevant event, or re-check at the idle
            // deadline. Irrelevant events just loop.
            match self.rx.recv_timeout(self.idle_timeout - idle) {
                Ok(Ok(event)) if self.is_relevant(&event) => {}
                Ok(Ok(_)) | Err(RecvTimeoutError::Timeout) => {}
                Ok(Err(err)) => {
                    tracing::warn!("transcript watch error: {err}");
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
