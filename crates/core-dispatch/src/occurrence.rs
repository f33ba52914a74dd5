//! Occurrence model: identifiers, severity, location and the status machine

use crate::error::{DispatchError, Result};
use crate::units::{DroneId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique occurrence identifier, assigned from a monotonic counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceId(pub u64);

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fire severity, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: Severity = Severity(1);
    pub const MAX: Severity = Severity(5);

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Severity(value))
        } else {
            Err(DispatchError::InvalidSeverity(i64::from(value)))
        }
    }

    /// Parse from any integer, rejecting values that do not fit
    pub fn from_i64(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| DispatchError::InvalidSeverity(value))
            .and_then(Severity::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Severity {
    type Error = DispatchError;

    fn try_from(value: u8) -> Result<Self> {
        Severity::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a fire was reported
///
/// Coordinates are validated at construction; a free-text descriptor is
/// accepted for reports that carry only a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Coordinates { lat: f64, lon: f64 },
    Named(String),
}

impl Location {
    pub fn coordinates(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(DispatchError::InvalidLocation(format!(
                "non-finite coordinates ({lat}, {lon})"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(DispatchError::InvalidLocation(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(DispatchError::InvalidLocation(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Location::Coordinates { lat, lon })
    }

    pub fn named(descriptor: impl Into<String>) -> Result<Self> {
        let descriptor = descriptor.into();
        let trimmed = descriptor.trim();
        if trimmed.is_empty() {
            return Err(DispatchError::InvalidLocation(
                "empty location descriptor".to_string(),
            ));
        }
        Ok(Location::Named(trimmed.to_string()))
    }

    /// Latitude and longitude, if this location has them
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        match self {
            Location::Coordinates { lat, lon } => Some((*lat, *lon)),
            Location::Named(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates { lat, lon } => write!(f, "[{lat}, {lon}]"),
            Location::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Parses `"lat,lon"` (optionally bracketed) as coordinates and anything
/// else as a named location.
impl FromStr for Location {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
        if let Some((lat, lon)) = inner.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                return Location::coordinates(lat, lon);
            }
        }
        Location::named(s)
    }
}

/// Occurrence lifecycle
///
/// ```text
/// Pending ──> InVerification ──> FireActive ──> FireExtinguished
///    │             │   ▲            │   │
///    │             ▼   └────────────┘   │
///    │          Verified                │
///    └──────────────> Attending <───────┘
///                        │
///                        ▼
///                    Concluded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    Pending,
    InVerification,
    FireActive,
    Verified,
    FireExtinguished,
    Attending,
    Concluded,
}

impl OccurrenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceStatus::Pending => "pending",
            OccurrenceStatus::InVerification => "in_verification",
            OccurrenceStatus::FireActive => "fire_active",
            OccurrenceStatus::Verified => "verified",
            OccurrenceStatus::FireExtinguished => "fire_extinguished",
            OccurrenceStatus::Attending => "attending",
            OccurrenceStatus::Concluded => "concluded",
        }
    }

    /// Statuses that sit in the priority queue
    pub fn is_queued(&self) -> bool {
        matches!(self, OccurrenceStatus::Pending | OccurrenceStatus::FireActive)
    }

    /// Statuses a drone may be sent to
    pub fn is_dispatchable(&self) -> bool {
        self.is_queued()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OccurrenceStatus::Verified
                | OccurrenceStatus::FireExtinguished
                | OccurrenceStatus::Concluded
        )
    }

    /// Whether the state machine allows moving to `next`
    ///
    /// `InVerification -> Pending` and `InVerification -> FireActive` also
    /// cover a failed mission restoring the status it started from.
    pub fn can_transition_to(&self, next: OccurrenceStatus) -> bool {
        use OccurrenceStatus::*;
        matches!(
            (self, next),
            (Pending, InVerification)
                | (Pending, Attending)
                | (InVerification, FireActive)
                | (InVerification, Verified)
                | (InVerification, Pending)
                | (FireActive, InVerification)
                | (FireActive, FireExtinguished)
                | (FireActive, Attending)
                | (Attending, Concluded)
        )
    }
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering key: lower is dispatched first
pub fn priority_key(severity: Severity, critical_region: bool) -> i32 {
    let multiplier = if critical_region { 2 } else { 1 };
    -i32::from(severity.get()) * multiplier
}

/// A fire report owned by the incident store
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub(crate) id: OccurrenceId,
    pub(crate) seq: u64,
    pub(crate) location: Location,
    pub(crate) severity: Severity,
    pub(crate) region: String,
    pub(crate) critical: bool,
    pub(crate) status: OccurrenceStatus,
    pub(crate) fire_confirmed: bool,
    pub(crate) fire_extinguished: bool,
    pub(crate) fire_start: Option<DateTime<Utc>>,
    pub(crate) fire_end: Option<DateTime<Utc>>,
    pub(crate) reported_at: DateTime<Utc>,
    pub(crate) assigned_team: Option<TeamId>,
    pub(crate) assigned_drone: Option<DroneId>,
    /// Status to restore if the running mission fails
    pub(crate) resume_status: Option<OccurrenceStatus>,
}

impl Occurrence {
    pub fn id(&self) -> OccurrenceId {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn status(&self) -> OccurrenceStatus {
        self.status
    }

    pub fn is_critical_region(&self) -> bool {
        self.critical
    }

    pub fn priority_key(&self) -> i32 {
        priority_key(self.severity, self.critical)
    }

    pub fn assigned_team(&self) -> Option<TeamId> {
        self.assigned_team
    }

    /// Time the fire has been (or was) active
    pub fn active_for(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let start = self.fire_start?;
        Some(self.fire_end.unwrap_or(now) - start)
    }

    /// Detached read-only view
    pub fn snapshot(&self, now: DateTime<Utc>) -> OccurrenceSnapshot {
        OccurrenceSnapshot {
            id: self.id,
            location: self.location.clone(),
            severity: self.severity,
            region: self.region.clone(),
            status: self.status,
            fire_confirmed: self.fire_confirmed,
            fire_extinguished: self.fire_extinguished,
            priority_key: self.priority_key(),
            reported_at: self.reported_at,
            fire_start_time: self.fire_start,
            fire_end_time: self.fire_end,
            active_secs: self
                .active_for(now)
                .map(|d| d.num_milliseconds() as f64 / 1000.0),
            team: self.assigned_team,
            drone: self.assigned_drone,
        }
    }
}

/// Serializable copy of an occurrence at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceSnapshot {
    pub id: OccurrenceId,
    pub location: Location,
    pub severity: Severity,
    pub region: String,
    pub status: OccurrenceStatus,
    pub fire_confirmed: bool,
    pub fire_extinguished: bool,
    pub priority_key: i32,
    pub reported_at: DateTime<Utc>,
    pub fire_start_time: Option<DateTime<Utc>>,
    pub fire_end_time: Option<DateTime<Utc>>,
    /// Seconds the fire has been active, if it was ever confirmed
    pub active_secs: Option<f64>,
    pub team: Option<TeamId>,
    pub drone: Option<DroneId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bounds() {
        assert!(Severity::new(0).is_err());
        assert!(Severity::new(6).is_err());
        assert_eq!(Severity::new(5).unwrap(), Severity::MAX);
        assert_eq!(
            Severity::from_i64(-1),
            Err(DispatchError::InvalidSeverity(-1))
        );
        assert_eq!(Severity::from_i64(300), Err(DispatchError::InvalidSeverity(300)));
    }

    #[test]
    fn test_severity_serde_rejects_out_of_range() {
        let ok: Severity = serde_json::from_str("3").unwrap();
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<Severity>("9").is_err());
    }

    #[test]
    fn test_priority_key_formula() {
        let five = Severity::new(5).unwrap();
        assert_eq!(priority_key(five, true), -10);
        assert_eq!(priority_key(five, false), -5);
        assert_eq!(priority_key(Severity::MIN, true), -2);
    }

    #[test]
    fn test_location_parsing() {
        let loc: Location = "-3.1,-60.0".parse().unwrap();
        assert_eq!(loc.lat_lon(), Some((-3.1, -60.0)));

        let loc: Location = "[-3.1, -60.0]".parse().unwrap();
        assert_eq!(loc.lat_lon(), Some((-3.1, -60.0)));

        let loc: Location = "Serra do Cipó".parse().unwrap();
        assert_eq!(loc, Location::Named("Serra do Cipó".to_string()));

        assert!("95.0,10.0".parse::<Location>().is_err());
        assert!("   ".parse::<Location>().is_err());
        assert!(Location::coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_location_display() {
        let loc = Location::coordinates(-3.1, -60.0).unwrap();
        assert_eq!(loc.to_string(), "[-3.1, -60]");
    }

    #[test]
    fn test_transitions() {
        use OccurrenceStatus::*;
        assert!(Pending.can_transition_to(InVerification));
        assert!(InVerification.can_transition_to(FireActive));
        assert!(InVerification.can_transition_to(Verified));
        assert!(FireActive.can_transition_to(FireExtinguished));
        assert!(FireActive.can_transition_to(Attending));
        assert!(Attending.can_transition_to(Concluded));

        assert!(!Verified.can_transition_to(InVerification));
        assert!(!Concluded.can_transition_to(Attending));
        assert!(!Pending.can_transition_to(FireActive));
        assert!(!InVerification.can_transition_to(Attending));

        for s in [Verified, FireExtinguished, Concluded] {
            assert!(s.is_terminal());
            assert!(!s.is_queued());
        }
    }
}
