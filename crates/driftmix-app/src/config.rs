//! Application configuration.
//!
//! Loaded from `<config_dir>/driftmix/config.json`; command-line flags
//! override the file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use driftmix_audio::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Directory catalog file sources are resolved against.
    pub sounds_dir: PathBuf,
    pub store_path: PathBuf,
    /// Initial engine loop flag.
    pub loop_enabled: bool,
    /// Play through the simulated backend instead of the output device.
    pub headless: bool,
    pub notification_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("driftmix");
        Self {
            log_level: "info".into(),
            sounds_dir: data.join("sounds"),
            store_path: data.join("mixes.json"),
            loop_enabled: true,
            headless: false,
            notification_title: "Relaxing Sounds".into(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("driftmix").join("config.json"))
    }

    /// Read the config at `path`, writing defaults there if it is missing.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!(path = %path.display(), "Wrote default config");
            return Ok(config);
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write config {}", path.display()))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            loop_enabled: self.loop_enabled,
            ..EngineConfig::default()
        }
    }
}

/// Command-line flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub headless: bool,
    pub log: Option<String>,
}

impl Cli {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    cli.config = Some(PathBuf::from(path));
                }
                "--headless" => cli.headless = true,
                "--log" => cli.log = Some(args.next().context("--log needs a level")?),
                other => bail!("Unknown argument: {}", other),
            }
        }
        Ok(cli)
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if self.headless {
            config.headless = true;
        }
        if let Some(level) = &self.log {
            config.log_level = level.clone();
        }
    }
}
