//! Dashboard configuration from TOML.
//!
//! Pages usually hardcode sensible policies, but deployments tune poll
//! intervals and retry budgets per section without code changes:
//!
//! ```toml
//! [dashboard]
//! poll_interval_secs = 30
//! max_retries = 3
//! backoff = "exponential:500ms:30s"
//!
//! [sections.stats]
//! interval_secs = 15
//!
//! [sections.finance]
//! max_retries = 1
//! backoff = "fixed:5s"
//!
//! [logging]
//! level_filter = "info,dash_aggregator=debug"
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::logging::{LogRotation, LoggingConfig};
use crate::scheduler::{BackoffCurve, PollPolicy};

/// Defaults applied to every section unless overridden.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff curve string, e.g. "fixed:5s" or "exponential:500ms:30s".
    pub backoff: Option<String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_interval_secs(),
            max_retries: default_max_retries(),
            backoff: None,
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Per-section overrides; unset fields fall back to [`DashboardSettings`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SectionPolicyConfig {
    pub interval_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub backoff: Option<String>,
}

/// Logging options as they appear in TOML.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSettings {
    pub log_dir: Option<String>,
    pub level_filter: Option<String>,
    /// "daily" or "hourly".
    pub rotation: Option<String>,
    pub console_timestamps: Option<bool>,
    pub file_json_format: Option<bool>,
}

impl LoggingSettings {
    pub fn to_logging_config(&self) -> LoggingConfig {
        let defaults = LoggingConfig::default();
        LoggingConfig {
            log_dir: self.log_dir.clone().unwrap_or(defaults.log_dir),
            level_filter: self.level_filter.clone().unwrap_or(defaults.level_filter),
            rotation: match self.rotation.as_deref() {
                Some("hourly") => LogRotation::Hourly,
                _ => LogRotation::Daily,
            },
            console_timestamps: self.console_timestamps.unwrap_or(defaults.console_timestamps),
            file_json_format: self.file_json_format.unwrap_or(defaults.file_json_format),
        }
    }
}

/// Full configuration document.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub sections: HashMap<String, SectionPolicyConfig>,
    pub logging: Option<LoggingSettings>,
}

impl DashboardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Effective poll policy for one section: overrides layered on the
    /// dashboard-wide defaults.
    pub fn policy_for(&self, section_id: &str) -> PollPolicy {
        let overrides = self.sections.get(section_id);

        let interval_secs = overrides
            .and_then(|o| o.interval_secs)
            .unwrap_or(self.dashboard.poll_interval_secs);
        let max_retries = overrides
            .and_then(|o| o.max_retries)
            .unwrap_or(self.dashboard.max_retries);
        let backoff = overrides
            .and_then(|o| o.backoff.as_deref())
            .or(self.dashboard.backoff.as_deref())
            .and_then(BackoffCurve::parse)
            .unwrap_or_default();

        PollPolicy {
            interval: Duration::from_secs(interval_secs),
            max_retries,
            backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [dashboard]
        poll_interval_secs = 20
        max_retries = 2
        backoff = "fixed:1s"

        [sections.stats]
        interval_secs = 5

        [sections.finance]
        max_retries = 1
        backoff = "exponential:250ms:10s"

        [logging]
        level_filter = "info,dash_aggregator=debug"
        rotation = "hourly"
    "#;

    #[test]
    fn test_policy_layering() {
        let config = DashboardConfig::from_toml_str(SAMPLE).unwrap();

        let stats = config.policy_for("stats");
        assert_eq!(stats.interval, Duration::from_secs(5));
        assert_eq!(stats.max_retries, 2);
        assert_eq!(stats.backoff, BackoffCurve::Fixed(Duration::from_secs(1)));

        let finance = config.policy_for("finance");
        assert_eq!(finance.interval, Duration::from_secs(20));
        assert_eq!(finance.max_retries, 1);

        let unknown = config.policy_for("activities");
        assert_eq!(unknown.interval, Duration::from_secs(20));
        assert_eq!(unknown.max_retries, 2);
    }

    #[test]
    fn test_defaults_on_empty_document() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        let policy = config.policy_for("anything");
        assert_eq!(policy.interval, Duration::from_secs(30));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff, BackoffCurve::default());
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_bad_backoff_string_falls_back_to_default() {
        let config =
            DashboardConfig::from_toml_str("[dashboard]\nbackoff = \"random:1s\"\n").unwrap();
        assert_eq!(config.policy_for("x").backoff, BackoffCurve::default());
    }

    #[test]
    fn test_logging_settings_conversion() {
        let config = DashboardConfig::from_toml_str(SAMPLE).unwrap();
        let logging = config.logging.unwrap().to_logging_config();
        assert_eq!(logging.level_filter, "info,dash_aggregator=debug");
        assert!(matches!(logging.rotation, LogRotation::Hourly));
    }
}
