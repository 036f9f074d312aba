//! Persisted user settings
//!
//! Stored as TOML under the platform config directory. Missing keys take
//! their defaults; an unreadable or corrupt file is logged and replaced by
//! defaults in memory rather than failing the command.

use anyhow::{bail, Context, Result};
use floattime_core::DEFAULT_SERVER_URL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// What the display shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Timer,
    Clock,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Timer => f.write_str("timer"),
            DisplayMode::Clock => f.write_str("clock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub display_mode: DisplayMode,
    pub background_visible: bool,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_position: Option<(i32, i32)>,
    /// Adding or removing time also changes the current event's duration
    pub addtime_affects_event_duration: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            display_mode: DisplayMode::Timer,
            background_visible: true,
            locked: false,
            window_size: None,
            window_position: None,
            addtime_affects_event_duration: false,
        }
    }
}

impl Settings {
    /// `<config_dir>/floattime/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("floattime")
            .join("config.toml")
    }

    /// Load settings, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                error!("Failed to read settings from {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Failed to parse settings in {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings, creating the directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let rendered = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn set_server_url(&mut self, url: &str) {
        self.server_url = url.trim().to_string();
    }

    /// Set a key from its command-line spelling
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.replace('-', "_").as_str() {
            "server_url" => self.set_server_url(value),
            "display_mode" => {
                self.display_mode = match value.trim().to_ascii_lowercase().as_str() {
                    "timer" => DisplayMode::Timer,
                    "clock" => DisplayMode::Clock,
                    other => bail!("display_mode must be 'timer' or 'clock', got '{}'", other),
                }
            }
            "background_visible" => self.background_visible = parse_flag(value)?,
            "locked" => self.locked = parse_flag(value)?,
            "addtime_affects_event_duration" => {
                self.addtime_affects_event_duration = parse_flag(value)?
            }
            "window_size" => {
                let (w, h) = value
                    .split_once(&['x', ','][..])
                    .context("window_size must look like 800x200")?;
                self.window_size = Some((
                    w.trim().parse().context("Invalid window width")?,
                    h.trim().parse().context("Invalid window height")?,
                ));
            }
            other => bail!("Unknown setting '{}'", other),
        }
        Ok(())
    }
}

/// Parse `on`/`off` style switches
pub fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("Expected on/off, got '{}'", other),
    }
}
