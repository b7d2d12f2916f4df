//! Runtime configuration for the event bot.
//!
//! Settings come from a JSON file (`config/config.json` unless
//! `EVENTBOT_CONFIG` points elsewhere). Every field has a default, so a
//! missing file is not an error. Environment variables are applied on top:
//!
//! - `EVENTBOT_BOT_NAME` -- name the bot signs its messages with
//! - `EVENTBOT_EVENT_CHANNEL` -- channel published events are posted to
//! - `EVENTBOT_STATE_FILE` -- path of the event snapshot
//! - `EVENTBOT_LISTEN_ADDR` -- address the HTTP/websocket server binds
//! - `EVENTBOT_ANCHOR_TTL_SECS` -- age after which anchors stop accepting replies
//! - `EVENTBOT_CONTROL_TTL_SECS` -- age after which RSVP controls are retired
//!   (default one day; `off` keeps them forever, and the registry then grows
//!   with every published event)
//! - `EVENTBOT_SWEEP_INTERVAL_SECS` -- how often expired controls are swept

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid {name}: {reason}")]
    Env { name: &'static str, reason: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub const DEFAULT_CONTROL_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub bot_name: String,
    pub event_channel_id: String,
    pub state_file: PathBuf,
    pub listen_addr: String,
    /// Replies to anchors older than this are treated as not found
    pub anchor_ttl_secs: Option<u64>,
    /// Published RSVP controls older than this are retired; `null` disables it
    pub control_ttl_secs: Option<u64>,
    pub sweep_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: "Event Bot".to_string(),
            event_channel_id: "events".to_string(),
            state_file: PathBuf::from("statefiles/events.json"),
            listen_addr: "0.0.0.0:3000".to_string(),
            anchor_ttl_secs: None,
            control_ttl_secs: Some(DEFAULT_CONTROL_TTL_SECS),
            sweep_interval_secs: 60,
        }
    }
}

impl BotConfig {
    /// Loads the file named by `EVENTBOT_CONFIG` (or the default path) and
    /// applies environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("EVENTBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Reads a JSON config file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(name) = lookup("EVENTBOT_BOT_NAME") {
            self.bot_name = name;
        }
        if let Some(channel) = lookup("EVENTBOT_EVENT_CHANNEL") {
            self.event_channel_id = channel;
        }
        if let Some(path) = lookup("EVENTBOT_STATE_FILE") {
            self.state_file = PathBuf::from(path);
        }
        if let Some(addr) = lookup("EVENTBOT_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(raw) = lookup("EVENTBOT_ANCHOR_TTL_SECS") {
            self.anchor_ttl_secs = Some(parse_secs("EVENTBOT_ANCHOR_TTL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("EVENTBOT_CONTROL_TTL_SECS") {
            self.control_ttl_secs = match raw.trim() {
                "off" => None,
                _ => Some(parse_secs("EVENTBOT_CONTROL_TTL_SECS", &raw)?),
            };
        }
        if let Some(raw) = lookup("EVENTBOT_SWEEP_INTERVAL_SECS") {
            self.sweep_interval_secs = parse_secs("EVENTBOT_SWEEP_INTERVAL_SECS", &raw)?;
        }
        self.validate()
    }

    /// The bot name opens the first line of every new-event message, and the
    /// event name must stay on the second
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_name.contains(['\n', '\r']) {
            return Err(ConfigError::Invalid {
                field: "bot_name",
                reason: "must be a single line".to_string(),
            });
        }
        Ok(())
    }

    pub fn anchor_ttl(&self) -> Option<Duration> {
        self.anchor_ttl_secs.map(Duration::from_secs)
    }

    pub fn control_ttl(&self) -> Option<Duration> {
        self.control_ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn parse_secs(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::Env {
        name,
        reason: format!("{e}"),
    })
}
