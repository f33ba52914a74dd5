//! Drone mission coordination
//!
//! A dispatch either hands back a typed rejection or starts a mission that
//! owns a [`MissionLease`]: the drone on loan plus a mission gate slot.
//! The lease is dropped when the mission task ends, however it ends, and
//! that drop returns the drone and frees the gate.

use crate::occurrence::{OccurrenceId, OccurrenceSnapshot, OccurrenceStatus};
use crate::probe::VerificationProbe;
use crate::units::{DroneId, ResourceKind};
use futures::FutureExt;
use sentinel_core_ledger::{HistoryLedger, HistoryRecord, RecordKind};
use sentinel_core_resilience::{GatePermit, PoolLease};
use serde::Serialize;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info};

/// Why a dispatch did not start a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DispatchRejection {
    /// No idle unit in the pool
    ResourceUnavailable { resource: ResourceKind },
    /// Every mission gate slot is taken
    MissionInFlight,
    UnknownOccurrence,
    /// The occurrence is not `Pending` or `FireActive`
    NotDispatchable { status: OccurrenceStatus },
    /// Called outside an async runtime, so no mission could be spawned
    RuntimeUnavailable,
}

impl fmt::Display for DispatchRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchRejection::ResourceUnavailable { resource } => {
                write!(f, "no {resource} available")
            }
            DispatchRejection::MissionInFlight => write!(f, "mission gate is held"),
            DispatchRejection::UnknownOccurrence => write!(f, "unknown occurrence"),
            DispatchRejection::NotDispatchable { status } => {
                write!(f, "occurrence is {status}")
            }
            DispatchRejection::RuntimeUnavailable => write!(f, "no async runtime"),
        }
    }
}

/// Result of a dispatch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Accepted { drone: DroneId },
    Rejected(DispatchRejection),
}

impl DispatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DispatchOutcome::Accepted { .. })
    }

    pub fn drone(&self) -> Option<DroneId> {
        match self {
            DispatchOutcome::Accepted { drone } => Some(*drone),
            DispatchOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<DispatchRejection> {
        match self {
            DispatchOutcome::Accepted { .. } => None,
            DispatchOutcome::Rejected(r) => Some(*r),
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Accepted { drone } => write!(f, "accepted ({drone})"),
            DispatchOutcome::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// What a finished mission found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionOutcome {
    FireConfirmed,
    NoFire,
    /// The probe errored or panicked
    Failed(String),
}

/// Drone and gate slot held for the length of one mission
#[derive(Debug)]
pub struct MissionLease {
    drone: PoolLease<DroneId>,
    _permit: GatePermit,
    occurrence: OccurrenceId,
    drone_log: HistoryLedger,
}

impl MissionLease {
    pub(crate) fn new(
        drone: PoolLease<DroneId>,
        permit: GatePermit,
        occurrence: OccurrenceId,
        drone_log: HistoryLedger,
    ) -> Self {
        Self {
            drone,
            _permit: permit,
            occurrence,
            drone_log,
        }
    }

    pub fn drone(&self) -> DroneId {
        *self.drone.unit()
    }

    pub fn occurrence(&self) -> OccurrenceId {
        self.occurrence
    }
}

impl Drop for MissionLease {
    fn drop(&mut self) {
        let drone = self.drone();
        self.drone_log.append(
            HistoryRecord::draft(RecordKind::DroneReturned, "returned to base")
                .with_actor(drone.to_string())
                .with_occurrence(self.occurrence.0),
        );
        debug!(%drone, occurrence = %self.occurrence, "drone returned to base");
    }
}

/// Run the probe, turning errors and panics into [`MissionOutcome::Failed`]
pub async fn fly(probe: Arc<dyn VerificationProbe>, target: OccurrenceSnapshot) -> MissionOutcome {
    info!(occurrence = %target.id, region = %target.region, "🛰️  drone en route");
    let flight = async move { probe.verify(&target).await };
    match AssertUnwindSafe(flight).catch_unwind().await {
        Ok(Ok(true)) => MissionOutcome::FireConfirmed,
        Ok(Ok(false)) => MissionOutcome::NoFire,
        Ok(Err(e)) => MissionOutcome::Failed(e.to_string()),
        Err(panic) => {
            MissionOutcome::Failed(format!("probe panicked: {}", panic_message(panic.as_ref())))
        }
    }
}

/// Text carried by a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::{Location, Severity};
    use crate::probe::ProbeError;
    use async_trait::async_trait;
    use chrono::Utc;
    use sentinel_core_resilience::{MissionGate, UnitPool};

    fn target() -> OccurrenceSnapshot {
        OccurrenceSnapshot {
            id: OccurrenceId(9),
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

    struct Broken;

    #[async_trait]
    impl VerificationProbe for Broken {
        async fn verify(&self, _target: &OccurrenceSnapshot) -> Result<bool, ProbeError> {
            Err(ProbeError::LostContact)
        }
    }

    struct Exploding;

    #[async_trait]
    impl VerificationProbe for Exploding {
        async fn verify(&self, _target: &OccurrenceSnapshot) -> Result<bool, ProbeError> {
            panic!("gimbal seized")
        }
    }

    #[tokio::test]
    async fn test_probe_errors_become_failures() {
        assert_eq!(
            fly(Arc::new(Broken), target()).await,
            MissionOutcome::Failed("drone lost contact".to_string())
        );
        assert_eq!(
            fly(Arc::new(Exploding), target()).await,
            MissionOutcome::Failed("probe panicked: gimbal seized".to_string())
        );
    }

    #[test]
    fn test_lease_drop_returns_drone_and_gate() {
        let drones = UnitPool::new("drone", vec![DroneId(1), DroneId(2)]);
        let gate = MissionGate::new(1).unwrap();
        let log = HistoryLedger::new();

        let lease = MissionLease::new(
            drones.lease().unwrap(),
            gate.try_enter().unwrap(),
            OccurrenceId(9),
            log.clone(),
        );
        assert_eq!(lease.drone(), DroneId(1));
        assert!(gate.is_full());
        drop(lease);

        assert_eq!(gate.in_flight(), 0);
        assert_eq!(drones.idle_units(), vec![DroneId(2), DroneId(1)]);
        let record = log.last().unwrap();
        assert_eq!(record.kind, RecordKind::DroneReturned);
        assert_eq!(record.actor.as_deref(), Some("Drone 1"));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = DispatchOutcome::Accepted { drone: DroneId(2) };
        assert!(ok.is_accepted());
        assert_eq!(ok.drone(), Some(DroneId(2)));

        let no = DispatchOutcome::Rejected(DispatchRejection::ResourceUnavailable {
            resource: ResourceKind::Drone,
        });
        assert_eq!(no.to_string(), "rejected: no drone available");
        assert_eq!(no.drone(), None);
    }
}
