//! Startup settings, read from an optional JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::Deserialize;

/// Names the config file to read instead of the default one.
pub const CONFIG_ENV: &str = "FLAPLINE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "flapline.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub assets_dir: PathBuf,
    pub muted: bool,
    /// Frame rate cap of the main loop.
    pub fps: u32,
    /// Fixed seed for pipe placement. Entropy when absent.
    pub seed: Option<u64>,
    /// `null` turns logging off.
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            assets_dir: PathBuf::from("assets"),
            muted: false,
            fps: 60,
            seed: None,
            log_file: Some(PathBuf::from("flapline.log")),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads `$FLAPLINE_CONFIG`, else `flapline.json` if present, else defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.level_filter()?;
        if config.fps == 0 {
            return Err(anyhow!("fps must be at least 1"));
        }
        Ok(config)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| anyhow!("unknown log level {:?}", self.log_level))
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}
