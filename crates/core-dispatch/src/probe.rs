//! Verification probe: what a drone reports when it reaches a fire

use crate::occurrence::OccurrenceSnapshot;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// Mission-level failure while verifying
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("sensor failure: {0}")]
    Sensor(String),

    #[error("drone lost contact")]
    LostContact,
}

/// Flies to an occurrence and reports whether a fire is present
#[async_trait]
pub trait VerificationProbe: Send + Sync {
    async fn verify(&self, target: &OccurrenceSnapshot) -> Result<bool, ProbeError>;
}

/// Fixed flight delay followed by a weighted coin toss
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    flight_delay: Duration,
    p_confirm: f64,
}

impl SimulatedProbe {
    pub fn new(flight_delay: Duration, p_confirm: f64) -> Self {
        Self {
            flight_delay,
            p_confirm: p_confirm.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl VerificationProbe for SimulatedProbe {
    async fn verify(&self, _target: &OccurrenceSnapshot) -> Result<bool, ProbeError> {
        tokio::time::sleep(self.flight_delay).await;
        let confirmed = rand::rng().random_bool(self.p_confirm);
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::{Location, OccurrenceId, OccurrenceStatus, Severity};
    use chrono::Utc;

    fn target() -> OccurrenceSnapshot {
        OccurrenceSnapshot {
            id: OccurrenceId(1),
            location: Location::named("Chapada").unwrap(),
            severity: Severity::MAX,
            region: "Cerrado".to_string(),
            status: OccurrenceStatus::InVerification,
            fire_confirmed: false,
            fire_extinguished: false,
            priority_key: -5,
            reported_at: Utc::now(),
            fire_start_time: None,
            fire_end_time: None,
            active_secs: None,
            team: None,
            drone: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_certain_outcomes_after_delay() {
        let start = tokio::time::Instant::now();
        let always = SimulatedProbe::new(Duration::from_secs(3), 1.0);
        assert_eq!(always.verify(&target()).await, Ok(true));
        assert!(start.elapsed() >= Duration::from_secs(3));

        let never = SimulatedProbe::new(Duration::from_secs(3), 0.0);
        assert_eq!(never.verify(&target()).await, Ok(false));
    }

    #[test]
    fn test_probability_clamped() {
        let probe = SimulatedProbe::new(Duration::ZERO, 7.0);
        assert_eq!(probe.p_confirm, 1.0);
    }
}
