//! Engine configuration

use crate::contacts::{default_contacts, Contact};
use crate::error::{DispatchError, Result};
use crate::occurrence::Severity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Regions weighted double in the priority key
pub const DEFAULT_CRITICAL_REGIONS: [&str; 2] = ["Amazônia", "Pantanal"];

/// Regions known before any report arrives
pub const DEFAULT_SEED_REGIONS: [&str; 6] = [
    "Amazônia",
    "Cerrado",
    "Mata Atlântica",
    "Caatinga",
    "Pantanal",
    "Pampa",
];

/// Pool sizes, mission behaviour and alert thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Response teams available for attendance
    pub team_count: usize,

    /// Verification drones in the fleet
    pub drone_count: usize,

    /// Missions allowed in flight at once, fleet-wide
    pub max_concurrent_missions: usize,

    /// Simulated flight time per mission (milliseconds)
    pub flight_delay_ms: u64,

    /// Probability a mission confirms a fire
    pub p_confirm: f64,

    /// Minimum severity of a confirmed fire
    pub confirmed_severity_floor: u8,

    /// Dispatches at or above this severity send a preliminary alert
    pub preliminary_alert_threshold: u8,

    /// Alerts at or above this severity also go out by SMS
    pub sms_severity_threshold: u8,

    pub critical_regions: Vec<String>,

    pub seed_regions: Vec<String>,

    /// Contacts registered at start-up
    pub contacts: Vec<Contact>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            team_count: 5,
            drone_count: 3,
            max_concurrent_missions: 1,
            flight_delay_ms: 3000,
            p_confirm: 0.8,
            confirmed_severity_floor: 4,
            preliminary_alert_threshold: 4,
            sms_severity_threshold: 4,
            critical_regions: DEFAULT_CRITICAL_REGIONS.map(String::from).to_vec(),
            seed_regions: DEFAULT_SEED_REGIONS.map(String::from).to_vec(),
            contacts: default_contacts(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.team_count == 0 {
            return Err(DispatchError::Config("team_count must be > 0".to_string()));
        }
        if self.drone_count == 0 {
            return Err(DispatchError::Config("drone_count must be > 0".to_string()));
        }
        if self.max_concurrent_missions == 0 {
            return Err(DispatchError::Config(
                "max_concurrent_missions must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.p_confirm) {
            return Err(DispatchError::Config(format!(
                "p_confirm must be within [0, 1], got {}",
                self.p_confirm
            )));
        }
        for (name, value) in [
            ("confirmed_severity_floor", self.confirmed_severity_floor),
            ("preliminary_alert_threshold", self.preliminary_alert_threshold),
            ("sms_severity_threshold", self.sms_severity_threshold),
        ] {
            Severity::new(value)
                .map_err(|_| DispatchError::Config(format!("{name} must be within 1..=5")))?;
        }
        if self.seed_regions.iter().any(|r| r.trim().is_empty()) {
            return Err(DispatchError::Config("seed_regions contains a blank name".to_string()));
        }
        for contact in &self.contacts {
            contact
                .validate()
                .map_err(|e| DispatchError::Config(e.to_string()))?;
        }
        Ok(())
    }

    pub fn flight_delay(&self) -> Duration {
        Duration::from_millis(self.flight_delay_ms)
    }

    pub(crate) fn severity(value: u8) -> Severity {
        Severity::new(value).unwrap_or(Severity::MAX)
    }
}
