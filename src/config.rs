//! Settings for the terminal host, read from a TOML file. Every field has a
//! default, so an empty file (or no file) is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::keymap::KeyLayout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the core's random number generator. Picked from the clock
    /// when absent.
    pub seed: Option<u64>,
    /// Which host keys stand in for the hex keypad.
    pub layout: KeyLayout,
    /// Display refreshes per second; each one is a pump tick.
    pub refresh_rate: f64,
    /// On terminals that don't report key releases, how long a key counts as
    /// held after its last press or repeat.
    pub key_hold_ms: u64,
    /// Arm the render pump as soon as the program is loaded instead of
    /// waiting for Enter.
    pub autostart: bool,
    /// Filter directives for the log, e.g. `info` or `chip8_host=trace`.
    pub log_level: String,
    /// Where the log goes. The terminal belongs to the display, so without a
    /// file the log goes to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: None,
            layout: KeyLayout::default(),
            refresh_rate: 60.0,
            key_hold_ms: 150,
            autostart: true,
            log_level: "info".to_owned(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    /// read the config at `path`; with no path, the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!(?path, "reading config");
                Self::parse(&std::fs::read_to_string(path)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }
}
