//! Typed configuration.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file, then
//! environment variables. The CLI applies its flags on top. Loaded once at
//! startup; invalid values fail fast.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::PipelineConfig;
use crate::error::{Error, Result};
use crate::io::OutputFormat;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Concurrent fetch-decode-analyze workers.
    pub workers: usize,
    /// Inter-stage channel capacity. Defaults to `workers`.
    pub queue_capacity: Option<usize>,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub output_format: OutputFormat,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: None,
            fetch_timeout_secs: 30,
            user_agent: concat!("topcolors/", env!("CARGO_PKG_VERSION")).to_string(),
            output_format: OutputFormat::Csv,
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML file overridden by environment variables.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read config {}: {e}", path.display())))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad config {}: {e}", path.display())))?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = parsed_var("TOPCOLORS_WORKERS")? {
            self.workers = v;
        }
        if let Some(v) = parsed_var("TOPCOLORS_QUEUE_CAPACITY")? {
            self.queue_capacity = Some(v);
        }
        if let Some(v) = parsed_var("TOPCOLORS_FETCH_TIMEOUT_SECS")? {
            self.fetch_timeout_secs = v;
        }
        if let Some(v) = optional_var("TOPCOLORS_OUTPUT_FORMAT") {
            self.output_format = v.parse()?;
        }
        if let Some(v) = optional_var("OTEL_ENDPOINT") {
            self.otel_endpoint = Some(v);
        }
        if let Some(v) = optional_var("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == Some(0) {
            return Err(Error::Config("queue_capacity must be at least 1".to_string()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Config(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity.unwrap_or(self.workers),
            fetch_timeout: self.fetch_timeout(),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid {name}={v}: {e}")))
        })
        .transpose()
}
