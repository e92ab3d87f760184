//! Application configuration.
//!
//! Loaded from an optional JSON file; command-line flags override file
//! values. Every field has a default, so a partial file (or none) is fine:
//!
//! ```json
//! {
//!     "tick": { "tick_rate": 30.0, "max_ticks": 300 },
//!     "heartbeat_interval": 1.0,
//!     "alarm_delay": 2.5
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::tick::TickConfig;

/// Top-level configuration of the engine binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tick loop settings.
    pub tick: TickConfig,
    /// Seconds between two heartbeat events.
    pub heartbeat_interval: f32,
    /// Seconds between a heartbeat and the alarm it schedules.
    pub alarm_delay: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            heartbeat_interval: 1.0,
            alarm_delay: 0.5,
        }
    }
}

impl AppConfig {
    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON, or holds invalid
    /// values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Override the tick rate.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick.tick_rate = tick_rate;
        self
    }

    /// Override the tick limit.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.tick.max_ticks = max_ticks;
        self
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Fails on a non-positive tick rate or heartbeat interval, or a negative
    /// alarm delay.
    pub fn validate(&self) -> Result<()> {
        self.tick.validate()?;
        ensure!(
            self.heartbeat_interval > 0.0,
            "heartbeat_interval must be positive, got {}",
            self.heartbeat_interval
        );
        ensure!(
            self.alarm_delay >= 0.0,
            "alarm_delay must not be negative, got {}",
            self.alarm_delay
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.tick, TickConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"{
                "tick": { "tick_rate": 30.0, "max_ticks": 300 },
                "heartbeat_interval": 2.0,
                "alarm_delay": 0.25
            }"#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.tick.tick_rate, 30.0);
        assert_eq!(config.tick.max_ticks, 300);
        assert_eq!(config.heartbeat_interval, 2.0);
        assert_eq!(config.alarm_delay, 0.25);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let file = write_config(r#"{ "tick": { "max_ticks": 10 } }"#);
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.tick.tick_rate, 60.0);
        assert_eq!(config.tick.max_ticks, 10);
        assert_eq!(config.heartbeat_interval, 1.0);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let file = write_config(r#"{ "tick": { "tick_rate": 0.0 } }"#);
        assert!(AppConfig::load(file.path()).is_err());

        let file = write_config(r#"{ "heartbeat_interval": -1.0 }"#);
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let file = write_config("{ tick_rate: ");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config file"));
    }

    #[test]
    fn test_missing_file() {
        assert!(AppConfig::load(Path::new("/nonexistent/engine.json")).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default().with_tick_rate(120.0).with_max_ticks(7);
        assert_eq!(config.tick.tick_rate, 120.0);
        assert_eq!(config.tick.max_ticks, 7);
    }
}
