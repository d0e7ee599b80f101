//! Configuration parsing and validation.
//!
//! Settings come from an optional TOML file, then from the process
//! environment, which always wins:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `DATABASE_URL` | `[db].url`, e.g. `sqlite:data/startupmate.sqlite` |
//! | `DATABASE_NAME` | `[db].name`, the logical database the collections live in |
//! | `PORT` | `[server].bind` becomes `0.0.0.0:$PORT` |
//! | `STORE_TIMEOUT_SECS` | `[db].timeout_secs` |
//!
//! A missing database URL or name is not an error: the server starts without
//! a document store and reports it through its status endpoint.
//!
//! ```toml
//! [db]
//! url = "sqlite:data/startupmate.sqlite"
//! name = "startupmate"
//! timeout_secs = 5
//!
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [reports]
//! default_limit = 50
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Upper bound on every store call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: None,
            timeout_secs: default_timeout_secs(),
            max_connections: default_max_connections(),
        }
    }
}

impl DbConfig {
    /// Both the URL and the database name are known.
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.name.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    5
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Documents listed per kind when the request gives no `limit`.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    50
}

impl Config {
    /// Overrides settings from environment variables, read through `lookup`.
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.db.url = Some(url);
        }
        if let Some(name) = get("DATABASE_NAME") {
            self.db.name = Some(name);
        }
        if let Some(port) = get("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
            self.server.bind = format!("0.0.0.0:{}", port);
        }
        if let Some(secs) = get("STORE_TIMEOUT_SECS") {
            self.db.timeout_secs = secs.trim().parse().with_context(|| {
                format!("STORE_TIMEOUT_SECS must be a whole number, got '{}'", secs)
            })?;
        }
        Ok(())
    }
}

/// Loads the TOML file at `path` (if any), applies environment overrides and
/// validates the result.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        }
        None => Config::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.timeout_secs == 0 {
        anyhow::bail!("db.timeout_secs must be > 0");
    }
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }
    if config.reports.default_limit == 0 {
        anyhow::bail!("reports.default_limit must be >= 1");
    }
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    Ok(())
}
