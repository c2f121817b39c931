// ============================
// notes-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment overrides, e.g. `NOTES_TOKEN__SECRET`
pub const ENV_PREFIX: &str = "NOTES_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Access token settings
    pub token: TokenSettings,
}

/// Access token settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSettings {
    /// HMAC secret used to sign tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3333)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_json: false,
            token: TokenSettings::default(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: 15 * 60, // 15 minutes
        }
    }
}

impl Settings {
    /// Layered sources: defaults, then the TOML file at `path`, then `NOTES_*` variables
    pub fn figment_from<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate settings from a specific file and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment_from(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!(
                "invalid log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }
        if self.token.secret.trim().is_empty() {
            bail!("token secret must be set (NOTES_TOKEN__SECRET)");
        }
        if self.token.ttl_secs == 0 {
            bail!("token ttl must be greater than zero");
        }
        Ok(())
    }
}
