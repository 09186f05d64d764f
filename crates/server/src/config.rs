//! Deployment configuration
//!
//! Defaults, then an optional TOML file, then environment overrides.
//! The anonymization salt has no default: startup fails when it is
//! missing, empty, or still the documented placeholder.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Placeholder salt value rejected at startup
pub const SALT_PLACEHOLDER: &str = "change-me";

/// Full daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub counting: CountingConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allowed CORS origins; a `*` entry allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the counter database
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tally-data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    /// Repeat visits from one client inside this window are not counted
    pub debounce_minutes: u64,
    /// Visit ledger records older than this are purged
    pub retention_hours: u64,
    /// How often the background sweeper runs
    pub sweep_interval_secs: u64,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            debounce_minutes: 5,
            retention_hours: 24,
            sweep_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Secret salt for visitor anonymization; required, never defaulted
    pub salt: String,
}

impl Config {
    /// Load configuration: defaults, TOML file (if given), then
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("TALLY_HOST") {
            self.http.host = host.parse().context("TALLY_HOST must be an IP address")?;
        }
        if let Ok(port) = std::env::var("TALLY_PORT") {
            self.http.port = port.parse().context("TALLY_PORT must be a port number")?;
        }
        if let Ok(origins) = std::env::var("TALLY_ALLOWED_ORIGINS") {
            self.http.allowed_origins = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }
        if let Ok(dir) = std::env::var("TALLY_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(minutes) = std::env::var("TALLY_DEBOUNCE_MINUTES") {
            self.counting.debounce_minutes = minutes
                .parse()
                .context("TALLY_DEBOUNCE_MINUTES must be an integer")?;
        }
        if let Ok(hours) = std::env::var("TALLY_RETENTION_HOURS") {
            self.counting.retention_hours = hours
                .parse()
                .context("TALLY_RETENTION_HOURS must be an integer")?;
        }
        if let Ok(secs) = std::env::var("TALLY_SWEEP_INTERVAL_SECS") {
            self.counting.sweep_interval_secs = secs
                .parse()
                .context("TALLY_SWEEP_INTERVAL_SECS must be an integer")?;
        }
        if let Ok(salt) = std::env::var("TALLY_SALT") {
            self.identity.salt = salt;
        }
        Ok(())
    }

    /// Reject configurations that cannot run safely
    pub fn validate(&self) -> Result<()> {
        if self.identity.salt.trim().is_empty() {
            anyhow::bail!(
                "identity.salt is not set; refusing to start without an anonymization salt (set TALLY_SALT)"
            );
        }
        if self.identity.salt == SALT_PLACEHOLDER {
            anyhow::bail!(
                "identity.salt is still the '{SALT_PLACEHOLDER}' placeholder; pick a deployment-specific secret"
            );
        }
        if self.counting.debounce_minutes == 0 {
            anyhow::bail!("counting.debounce_minutes must be at least 1");
        }
        if self.counting.sweep_interval_secs == 0 {
            anyhow::bail!("counting.sweep_interval_secs must be at least 1");
        }
        // Sweeping inside the debounce window would forget live dedup state
        if self.retention_horizon_ms() < self.debounce_window_ms() {
            anyhow::bail!("counting.retention_hours must cover the debounce window");
        }
        Ok(())
    }

    /// Debounce window in milliseconds
    pub fn debounce_window_ms(&self) -> u64 {
        tally_core::time::minutes_to_ms(self.counting.debounce_minutes)
    }

    /// Retention horizon in milliseconds
    pub fn retention_horizon_ms(&self) -> u64 {
        tally_core::time::hours_to_ms(self.counting.retention_hours)
    }
}
