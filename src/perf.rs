//! Lightweight performance instrumentation.
//!
//! Timing scopes report through `tracing`; the opt-in event log writes a
//! timestamped line per engine event to a file for render debugging.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static EVENT_LOG: LazyLock<Mutex<Option<EventLog>>> = LazyLock::new(|| Mutex::new(None));

struct EventLog {
    start: Instant,
    writer: BufWriter<File>,
}

/// Times a region of work; reports on drop.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(target: "perf", "{}: {:.2} ms", self.name, elapsed_ms);
    }
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Route engine events to a log file, or disable with `None`.
///
/// # Errors
/// Returns an error if the log file cannot be created.
pub fn set_event_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = EVENT_LOG.lock().expect("event log lock poisoned");
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "inkstream event log start")?;
            writer.flush()?;
            *log = Some(EventLog {
                start: Instant::now(),
                writer,
            });
        }
        None => *log = None,
    }
    Ok(())
}

pub fn is_event_log_enabled() -> bool {
    EVENT_LOG.lock().expect("event log lock poisoned").is_some()
}

/// Record one engine event; a no-op unless the log is enabled.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut log = EVENT_LOG.lock().expect("event log lock poisoned");
    let Some(log) = log.as_mut() else { return };
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    let _ = writeln!(
        log.writer,
        "[{elapsed_ms:>10.3} ms] {name}: {}",
        detail.as_ref()
    );
    let _ = log.writer.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    // One test only: the event log is process-global state.
    #[test]
    fn test_event_log_writes_and_disables() {
        log_event("ignored", "no log configured, nothing happens");

        let temp_file = NamedTempFile::new().unwrap();
        set_event_log_path(Some(temp_file.path())).unwrap();
        assert!(is_event_log_enabled());
        log_event("test.event", "hello world");
        set_event_log_path(None).unwrap();
        assert!(!is_event_log_enabled());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("inkstream event log start"));
        assert!(content.contains("test.event: hello world"));
    }
}
