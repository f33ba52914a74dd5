//! Watch policy: which loops run, how often, and how they back off

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing for one background loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopPolicy {
    /// Whether the supervisor starts this loop
    pub enabled: bool,

    /// Pause between successful polls (seconds)
    pub interval_s: u64,

    /// Pause after a failed poll (seconds)
    pub backoff_s: u64,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self::new(true, 5, 10)
    }
}

impl LoopPolicy {
    pub const fn new(enabled: bool, interval_s: u64, backoff_s: u64) -> Self {
        Self {
            enabled,
            interval_s,
            backoff_s,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_s)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_s)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.interval_s == 0 {
            return Err(WatchError::Policy(format!(
                "{name}.interval_s must be greater than 0"
            )));
        }
        if self.backoff_s == 0 {
            return Err(WatchError::Policy(format!(
                "{name}.backoff_s must be greater than 0"
            )));
        }
        Ok(())
    }
}

/// Background loop configuration
///
/// **Defaults:**
/// - dispatch every 5s (back-off 10s) for severity above 3
/// - extinguish every 10s (back-off 30s) with a 60% chance per fire
/// - generate one occurrence every 5s (back-off 10s)
/// - auto-conclude attendances every 6s, disabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchPolicy {
    pub dispatch: LoopPolicy,

    /// Only occurrences strictly above this severity are auto-dispatched
    pub dispatch_severity_threshold: u8,

    pub extinguish: LoopPolicy,

    /// Chance per sweep that an active fire is put out
    pub extinguish_probability: f64,

    pub generator: LoopPolicy,

    /// Occurrences created per generator poll
    pub generator_batch: usize,

    /// Regions the generator draws from; empty means the engine's seed regions
    pub generator_regions: Vec<String>,

    pub attendance: LoopPolicy,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            dispatch: LoopPolicy::new(true, 5, 10),
            dispatch_severity_threshold: 3,
            extinguish: LoopPolicy::new(true, 10, 30),
            extinguish_probability: 0.6,
            generator: LoopPolicy::new(true, 5, 10),
            generator_batch: 1,
            generator_regions: Vec::new(),
            attendance: LoopPolicy::new(false, 6, 30),
        }
    }
}

impl WatchPolicy {
    /// Policy with every loop switched off
    pub fn disabled() -> Self {
        let mut policy = Self::default();
        policy.dispatch.enabled = false;
        policy.extinguish.enabled = false;
        policy.generator.enabled = false;
        policy.attendance.enabled = false;
        policy
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate("dispatch")?;
        self.extinguish.validate("extinguish")?;
        self.generator.validate("generator")?;
        self.attendance.validate("attendance")?;

        if !(1..=5).contains(&self.dispatch_severity_threshold) {
            return Err(WatchError::Policy(
                "dispatch_severity_threshold must be within 1..=5".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extinguish_probability) {
            return Err(WatchError::Policy(format!(
                "extinguish_probability must be within [0, 1], got {}",
                self.extinguish_probability
            )));
        }
        if self.generator_batch == 0 {
            return Err(WatchError::Policy(
                "generator_batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = WatchPolicy::default();

        assert_eq!(policy.dispatch.interval(), Duration::from_secs(5));
        assert_eq!(policy.dispatch.backoff(), Duration::from_secs(10));
        assert_eq!(policy.extinguish.backoff_s, 30);
        assert_eq!(policy.extinguish_probability, 0.6);
        assert!(!policy.attendance.enabled);

        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut policy = WatchPolicy::default();

        policy.dispatch.interval_s = 0;
        assert!(policy.validate().is_err());
        policy.dispatch.interval_s = 5;

        policy.extinguish_probability = 1.2;
        assert!(policy.validate().is_err());
        policy.extinguish_probability = 0.6;

        policy.dispatch_severity_threshold = 0;
        assert!(policy.validate().is_err());
        policy.dispatch_severity_threshold = 3;

        policy.generator_batch = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_disabled() {
        let policy = WatchPolicy::disabled();
        assert!(!policy.dispatch.enabled);
        assert!(!policy.generator.enabled);
        assert!(policy.validate().is_ok());
    }
}
