//! Inkstream - stream tagged generation output into typed blocks.
//!
//! # Usage
//!
//! ```bash
//! inkstream transcript.txt
//! inkstream --follow transcript.txt
//! inkstream --json --visuals-dir assets transcript.txt
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use inkstream::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use inkstream::engine::Engine;
use inkstream::present::{JsonPresenter, NullPresenter, Presenter, TextPresenter, render_text};
use inkstream::perf;
use inkstream::source::{DirVisuals, NullVisuals, ScriptSource, TextSource, VisualSource};
use inkstream::watcher::StreamWatcher;

const DEFAULT_CHUNK_CHARS: usize = 64;
const FOLLOW_IDLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Stream tagged generation output into typed blocks
#[derive(Parser, Debug)]
#[command(name = "inkstream", version, about, long_about = None)]
struct Cli {
    /// Transcript file holding (or receiving) the generated stream
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Follow the transcript as it grows instead of replaying it
    #[arg(short, long)]
    follow: bool,

    /// Emit the final block sequence as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Print every intermediate snapshot, not just the final one
    #[arg(long)]
    live: bool,

    /// Skip visual fetches; placeholders render as pending
    #[arg(long)]
    no_visuals: bool,

    /// Directory serving visuals by anchor description
    #[arg(long, value_name = "DIR")]
    visuals_dir: Option<PathBuf>,

    /// Characters per replayed chunk
    #[arg(long, value_name = "CHARS")]
    chunk_size: Option<usize>,

    /// Pause between replayed chunks, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Write detailed engine events to a file
    #[arg(long, value_name = "PATH")]
    event_log: Option<PathBuf>,

    /// Save current command-line flags as defaults in .inkstreamrc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .inkstreamrc
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let event_log_path = effective
        .event_log
        .clone()
        .or_else(|| std::env::var_os("INKSTREAM_EVENT_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_event_log_path(event_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize event log {}: {}",
            event_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    // A followed transcript may not exist yet; a replayed one must.
    if !effective.follow && !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let report = run_engine(&cli, &effective)?;

    // In live mode every snapshot already went to stdout as the run
    // progressed; otherwise emit the final sequence once.
    if !effective.live {
        let mut stdout = std::io::stdout().lock();
        if effective.json {
            JsonPresenter::new(&mut stdout).present(&report.blocks)?;
        } else {
            render_text(&report.blocks, &mut stdout)?;
        }
    }

    if !report.unresolved.is_empty() {
        let slots: Vec<String> = report.unresolved.iter().map(ToString::to_string).collect();
        tracing::warn!("unresolved visual slots: {}", slots.join(", "));
    }
    Ok(())
}

fn run_engine(cli: &Cli, effective: &ConfigFlags) -> Result<inkstream::engine::RunReport> {
    let chunk_chars = effective.chunk_size.unwrap_or(DEFAULT_CHUNK_CHARS);
    let text: Box<dyn TextSource> = if effective.follow {
        Box::new(
            StreamWatcher::new(&cli.file, FOLLOW_IDLE_TIMEOUT)
                .context("Failed to watch transcript")?,
        )
    } else {
        let mut source = ScriptSource::from_file(&cli.file, chunk_chars)
            .with_context(|| format!("Failed to read {}", cli.file.display()))?;
        if let Some(ms) = cli.delay_ms {
            source = source.with_delay(Duration::from_millis(ms));
        }
        Box::new(source)
    };

    let visuals: Box<dyn VisualSource + Send + Sync> = match &effective.visuals_dir {
        Some(dir) => Box::new(DirVisuals::new(dir.clone())),
        None => Box::new(NullVisuals),
    };

    let mut engine = Engine::new(text, visuals).with_visuals_enabled(!effective.no_visuals);
    engine = if effective.live {
        if effective.json {
            engine.with_presenter(JsonPresenter::new(std::io::stdout()))
        } else {
            engine.with_presenter(TextPresenter::new(std::io::stdout()))
        }
    } else {
        engine.with_presenter(NullPresenter)
    };

    engine.run().context("Run failed")
}
