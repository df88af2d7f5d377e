use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Flag defaults persisted in rc files and merged with the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub follow: bool,
    pub json: bool,
    pub live: bool,
    pub no_visuals: bool,
    pub chunk_size: Option<usize>,
    pub visuals_dir: Option<PathBuf>,
    pub event_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge, with `other` (typically the command line) taking precedence
    /// for valued options.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            follow: self.follow || other.follow,
            json: self.json || other.json,
            live: self.live || other.live,
            no_visuals: self.no_visuals || other.no_visuals,
            chunk_size: other.chunk_size.or(self.chunk_size),
            visuals_dir: other
                .visuals_dir
                .clone()
                .or_else(|| self.visuals_dir.clone()),
            event_log: other.event_log.clone().or_else(|| self.event_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("inkstream").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("inkstream")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("inkstream").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("inkstream")
                .join("config");
        }
    }

    PathBuf::from(".inkstreamrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".inkstreamrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# inkstream defaults (saved with --save)".to_string());
    if flags.follow {
        lines.push("--follow".to_string());
    }
    if flags.json {
        lines.push("--json".to_string());
    }
    if flags.live {
        lines.push("--live".to_string());
    }
    if flags.no_visuals {
        lines.push("--no-visuals".to_string());
    }
    if let Some(size) = flags.chunk_size {
        lines.push(format!("--chunk-size {size}"));
    }
    if let Some(dir) = &flags.visuals_dir {
        lines.push(format!("--visuals-dir {}", dir.display()));
    }
    if let Some(log) = &flags.event_log {
        lines.push(format!("--event-log {}", log.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--follow" {
            flags.follow = true;
        } else if token == "--json" {
            flags.json = true;
        } else if token == "--live" {
            flags.live = true;
        } else if token == "--no-visuals" {
            flags.no_visuals = true;
        } else if token == "--chunk-size" {
            if let Some(next) = tokens.get(i + 1) {
                flags.chunk_size = next.parse().ok();
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--chunk-size=") {
            flags.chunk_size = value.parse().ok();
        } else if token == "--visuals-dir" {
            if let Some(next) = tokens.get(i + 1) {
                flags.visuals_dir = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--visuals-dir=") {
            flags.visuals_dir = Some(PathBuf::from(value));
        } else if token == "--event-log" {
            if let Some(next) = tokens.get(i + 1) {
                flags.event_log = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--event-log=") {
            flags.event_log = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}
