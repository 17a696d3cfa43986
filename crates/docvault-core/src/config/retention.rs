//! Version retention configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for `keep_days`, roughly a century.
pub const MAX_KEEP_DAYS: i64 = 36_500;

/// Default keep-rules applied by the retention engine.
///
/// A superseded version survives cleanup if *any* rule matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Number of most recent superseded versions to keep.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Versions created within this many days are kept.
    #[serde(default = "default_keep_days")]
    pub keep_days: i64,
    /// Versions whose number is a multiple of this are kept (0 disables).
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval: i32,
    /// Cron expression for the scheduled sweep over all documents.
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep_recent: default_keep_recent(),
            keep_days: default_keep_days(),
            milestone_interval: default_milestone_interval(),
            sweep_schedule: default_sweep_schedule(),
        }
    }
}

impl RetentionConfig {
    /// Reject values the retention engine cannot apply.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=MAX_KEEP_DAYS).contains(&self.keep_days) {
            return Err(AppError::configuration(format!(
                "retention.keep_days must be between 0 and {MAX_KEEP_DAYS}, got {}",
                self.keep_days
            )));
        }
        if self.milestone_interval < 0 {
            return Err(AppError::configuration(format!(
                "retention.milestone_interval must not be negative, got {}",
                self.milestone_interval
            )));
        }
        Ok(())
    }
}

fn default_keep_recent() -> usize {
    5
}

fn default_keep_days() -> i64 {
    30
}

fn default_milestone_interval() -> i32 {
    10
}

fn default_sweep_schedule() -> String {
    "0 0 4 * * *".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_keep_days_is_bounded() {
        assert!(RetentionConfig::default().validate().is_ok());

        let config = RetentionConfig {
            keep_days: i64::MAX,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().kind, ErrorKind::Configuration);

        let config = RetentionConfig {
            keep_days: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_milestone_interval_is_rejected() {
        let config = RetentionConfig {
            milestone_interval: -5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
