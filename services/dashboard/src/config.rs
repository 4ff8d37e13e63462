//! Service configuration
//!
//! Settings are layered: built-in defaults, then an optional `dashboard.toml`
//! in the working directory, then `DASHBOARD_*` environment variables.
//! Connection settings for the Realtime Database are read separately by
//! [`common::FirebaseConfig::from_env`].

use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::stats::{HistogramSettings, StatsSettings};

/// Where user records are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Realtime Database REST API
    Firebase,
    /// JSON export of the collection loaded into memory
    File,
}

/// Dashboard service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    pub store_backend: StoreBackend,
    /// Collection export used by the `file` backend
    pub seed_file: Option<String>,
    pub top_followers: u32,
    /// Reference date for the "joined since" figure, YYYY-MM-DD
    pub since_date: String,
    pub histogram_base_offset_days: i64,
    pub histogram_step_days: i64,
    pub histogram_points: u32,
}

impl AppConfig {
    /// Load the configuration from defaults, `dashboard.toml` and the environment
    ///
    /// # Environment Variables
    /// - `DASHBOARD_BIND_ADDRESS`: Listen address (default: "0.0.0.0:3002")
    /// - `DASHBOARD_STORE_BACKEND`: "firebase" or "file" (default: "firebase")
    /// - `DASHBOARD_SEED_FILE`: Collection export for the file backend
    /// - `DASHBOARD_TOP_FOLLOWERS`: Users listed by follower count (default: 5)
    /// - `DASHBOARD_SINCE_DATE`: Reference signup date (default: "2020-05-01")
    /// - `DASHBOARD_HISTOGRAM_BASE_OFFSET_DAYS`: (default: 430)
    /// - `DASHBOARD_HISTOGRAM_STEP_DAYS`: (default: 30)
    ///
    /// The histogram offsets must not be negative and may span at most
    /// [`crate::stats::MAX_HISTOGRAM_SPAN_DAYS`] days.
    /// - `DASHBOARD_HISTOGRAM_POINTS`: (default: 7)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3002")?
            .set_default("store_backend", "firebase")?
            .set_default("top_followers", 5_i64)?
            .set_default("since_date", "2020-05-01")?
            .set_default("histogram_base_offset_days", 430_i64)?
            .set_default("histogram_step_days", 30_i64)?
            .set_default("histogram_points", 7_i64)?
            .add_source(File::with_name("dashboard").required(false))
            .add_source(Environment::with_prefix("DASHBOARD").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Aggregation settings derived from this configuration
    pub fn stats_settings(&self) -> Result<StatsSettings, ConfigError> {
        let since = NaiveDate::parse_from_str(&self.since_date, "%Y-%m-%d").map_err(|e| {
            ConfigError::Message(format!("Invalid since_date {:?}: {}", self.since_date, e))
        })?;

        let histogram = HistogramSettings {
            base_offset_days: self.histogram_base_offset_days,
            step_days: self.histogram_step_days,
            points: self.histogram_points,
        };
        histogram
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid histogram settings: {}", e)))?;

        Ok(StatsSettings {
            top_followers: self.top_followers,
            since,
            histogram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_app_config_defaults() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3002");
        assert_eq!(config.store_backend, StoreBackend::Firebase);
        assert_eq!(config.seed_file, None);

        let settings = config.stats_settings().unwrap();
        assert_eq!(settings, StatsSettings::default());
    }

    #[test]
    #[serial]
    fn test_app_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("DASHBOARD_STORE_BACKEND", "file");
            std::env::set_var("DASHBOARD_SEED_FILE", "users.json");
            std::env::set_var("DASHBOARD_TOP_FOLLOWERS", "10");
            std::env::set_var("DASHBOARD_SINCE_DATE", "2021-01-15");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.store_backend, StoreBackend::File);
        assert_eq!(config.seed_file.as_deref(), Some("users.json"));

        let settings = config.stats_settings().unwrap();
        assert_eq!(settings.top_followers, 10);
        assert_eq!(settings.since, NaiveDate::from_ymd_opt(2021, 1, 15).unwrap());
        assert_eq!(settings.histogram, HistogramSettings::default());

        unsafe {
            std::env::remove_var("DASHBOARD_STORE_BACKEND");
            std::env::remove_var("DASHBOARD_SEED_FILE");
            std::env::remove_var("DASHBOARD_TOP_FOLLOWERS");
            std::env::remove_var("DASHBOARD_SINCE_DATE");
        }
    }

    #[test]
    #[serial]
    fn test_invalid_histogram_settings() {
        unsafe {
            std::env::set_var("DASHBOARD_HISTOGRAM_BASE_OFFSET_DAYS", "200000000");
        }

        let config = AppConfig::load().unwrap();
        let err = config.stats_settings().unwrap_err();
        assert!(matches!(err, ConfigError::Message(_)));

        unsafe {
            std::env::remove_var("DASHBOARD_HISTOGRAM_BASE_OFFSET_DAYS");
            std::env::set_var("DASHBOARD_HISTOGRAM_STEP_DAYS", "-30");
        }

        let config = AppConfig::load().unwrap();
        assert!(config.stats_settings().is_err());

        unsafe {
            std::env::remove_var("DASHBOARD_HISTOGRAM_STEP_DAYS");
        }
    }

    #[test]
    #[serial]
    fn test_invalid_since_date() {
        unsafe {
            std::env::set_var("DASHBOARD_SINCE_DATE", "May 2020");
        }

        let config = AppConfig::load().unwrap();
        assert!(config.stats_settings().is_err());

        unsafe {
            std::env::remove_var("DASHBOARD_SINCE_DATE");
        }
    }
}
