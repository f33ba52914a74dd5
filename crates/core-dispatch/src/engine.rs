//! Engine façade
//!
//! [`FireEngine`] is the single synchronized entry point for API callers,
//! watchers and missions. One mutex guards the incident store, the queue,
//! the region registry and the task stack together. Pools, the mission
//! gate and the ledgers have their own short locks and are only ever taken
//! while holding the state lock, never the other way round.

use crate::alert::{AlertDispatcher, AlertGateway, TemplateKind, TracingGateway};
use crate::config::EngineConfig;
use crate::contacts::{Contact, ContactDirectory};
use crate::error::{DispatchError, Result};
use crate::mission::{self, DispatchOutcome, DispatchRejection, MissionLease, MissionOutcome};
use crate::occurrence::{
    Location, OccurrenceId, OccurrenceSnapshot, OccurrenceStatus, Severity,
};
use crate::probe::{SimulatedProbe, VerificationProbe};
use crate::region::RegionRegistry;
use crate::report::{self, MapMarker, RegionSummary};
use crate::store::IncidentStore;
use crate::tasks::TaskStack;
use crate::units::{drone_fleet, team_roster, DroneId, ResourceKind, TeamId};
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use sentinel_core_ledger::{HistoryLedger, HistoryRecord, RecordDraft, RecordKind};
use sentinel_core_resilience::{MissionGate, PoolStats, UnitPool};
use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Latitude span used for simulated reports
pub const SIMULATION_LATITUDE: RangeInclusive<f64> = -33.75..=5.27;
/// Longitude span used for simulated reports
pub const SIMULATION_LONGITUDE: RangeInclusive<f64> = -73.99..=-34.79;

/// A team sent to an occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendance {
    pub team: TeamId,
    pub occurrence: OccurrenceSnapshot,
}

/// Result of asking for the next occurrence to be attended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttendOutcome {
    Assigned(Attendance),
    /// Queue is empty
    NoneAvailable,
    /// Queue has work but every team is out
    TeamUnavailable,
}

/// A closed attendance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusion {
    pub team: Option<TeamId>,
    pub occurrence: OccurrenceSnapshot,
    pub tasks_completed: usize,
}

struct EngineState {
    store: IncidentStore,
    regions: RegionRegistry,
    tasks: TaskStack,
}

struct EngineInner {
    config: EngineConfig,
    state: Mutex<EngineState>,
    teams: UnitPool<TeamId>,
    drones: UnitPool<DroneId>,
    gate: MissionGate,
    history: HistoryLedger,
    drone_log: HistoryLedger,
    contacts: ContactDirectory,
    alerts: AlertDispatcher,
    probe: Arc<dyn VerificationProbe>,
    confirmed_floor: Severity,
    preliminary_threshold: Severity,
}

/// Builder for [`FireEngine`]
pub struct EngineBuilder {
    config: EngineConfig,
    gateway: Option<Arc<dyn AlertGateway>>,
    probe: Option<Arc<dyn VerificationProbe>>,
}

impl EngineBuilder {
    /// Deliver alerts through `gateway` instead of logging them
    pub fn gateway(mut self, gateway: Arc<dyn AlertGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Verify with `probe` instead of the simulated one
    pub fn probe(mut self, probe: Arc<dyn VerificationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn build(self) -> Result<FireEngine> {
        let config = self.config;
        config.validate()?;

        let history = HistoryLedger::new();
        let drone_log = HistoryLedger::new();
        let contacts = ContactDirectory::new();
        let gate = MissionGate::new(config.max_concurrent_missions)?;

        let gateway = self
            .gateway
            .unwrap_or_else(|| Arc::new(TracingGateway) as Arc<dyn AlertGateway>);
        let probe = self.probe.unwrap_or_else(|| {
            Arc::new(SimulatedProbe::new(config.flight_delay(), config.p_confirm))
                as Arc<dyn VerificationProbe>
        });
        let alerts = AlertDispatcher::new(
            gateway,
            contacts.clone(),
            history.clone(),
            drone_log.clone(),
            EngineConfig::severity(config.sms_severity_threshold),
        );

        let state = EngineState {
            store: IncidentStore::new(config.critical_regions.iter().cloned()),
            regions: RegionRegistry::with_regions(config.seed_regions.iter().cloned()),
            tasks: TaskStack::new(),
        };

        let engine = FireEngine {
            inner: Arc::new(EngineInner {
                teams: UnitPool::new("team", team_roster(config.team_count)),
                drones: UnitPool::new("drone", drone_fleet(config.drone_count)),
                gate,
                history,
                drone_log,
                contacts,
                alerts,
                probe,
                confirmed_floor: EngineConfig::severity(config.confirmed_severity_floor),
                preliminary_threshold: EngineConfig::severity(config.preliminary_alert_threshold),
                state: Mutex::new(state),
                config,
            }),
        };

        for contact in engine.inner.config.contacts.clone() {
            engine.register_contact(contact)?;
        }

        info!(
            teams = engine.inner.config.team_count,
            drones = engine.inner.config.drone_count,
            max_missions = engine.inner.config.max_concurrent_missions,
            "🔥 dispatch engine ready"
        );
        Ok(engine)
    }
}

/// Shared handle to the dispatch engine; clones are cheap
#[derive(Clone)]
pub struct FireEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for FireEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FireEngine")
            .field("occurrences", &self.inner.state.lock().store.len())
            .field("teams", &self.inner.teams.stats())
            .field("drones", &self.inner.drones.stats())
            .finish()
    }
}

impl FireEngine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            gateway: None,
            probe: None,
        }
    }

    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a fire report; unknown regions are added on the fly
    pub fn report(
        &self,
        location: Location,
        severity: Severity,
        region: &str,
    ) -> Result<OccurrenceSnapshot> {
        let region = region.trim();
        if region.is_empty() {
            return Err(DispatchError::InvalidRegion(region.to_string()));
        }

        let now = Utc::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        if state.regions.insert(region) {
            info!(region, "new region registered");
            self.inner.history.append(HistoryRecord::draft(
                RecordKind::RegionRegistered,
                format!("region {region} registered"),
            ));
        }

        let snapshot = state.store.insert(location, severity, region, now).snapshot(now);
        state.tasks.push(format!("generate report for {region}"));
        self.inner.history.append(
            HistoryRecord::draft(
                RecordKind::OccurrenceRegistered,
                format!(
                    "occurrence {} registered at {} in {} with severity {}",
                    snapshot.id, snapshot.location, snapshot.region, snapshot.severity
                ),
            )
            .with_occurrence(snapshot.id.0),
        );
        drop(guard);

        info!(
            occurrence = %snapshot.id,
            region = %snapshot.region,
            severity = %snapshot.severity,
            priority = snapshot.priority_key,
            "📍 occurrence registered"
        );
        Ok(snapshot)
    }

    /// Boundary form of [`report`](Self::report): parses and validates raw input
    pub fn submit(&self, location: &str, severity: i64, region: &str) -> Result<OccurrenceSnapshot> {
        let location: Location = location.parse()?;
        let severity = Severity::from_i64(severity)?;
        self.report(location, severity, region)
    }

    /// Create `count` random reports inside Brazil
    ///
    /// Regions are drawn from `regions`, or from the seed regions when it is empty.
    pub fn simulate(&self, count: usize, regions: &[String]) -> Result<Vec<OccurrenceSnapshot>> {
        let pool = if regions.is_empty() {
            self.inner.config.seed_regions.as_slice()
        } else {
            regions
        };
        if pool.is_empty() {
            return Err(DispatchError::Config("no regions to simulate in".to_string()));
        }

        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            let (lat, lon, severity, region) = {
                let mut rng = rand::rng();
                (
                    rng.random_range(SIMULATION_LATITUDE),
                    rng.random_range(SIMULATION_LONGITUDE),
                    rng.random_range(Severity::MIN.get()..=Severity::MAX.get()),
                    &pool[rng.random_range(0..pool.len())],
                )
            };
            let location = Location::coordinates(lat, lon)?;
            created.push(self.report(location, Severity::new(severity)?, region)?);
        }
        debug!(count, "simulated occurrences created");
        Ok(created)
    }

    // ------------------------------------------------------------------
    // Attendance
    // ------------------------------------------------------------------

    /// Pop the highest-priority occurrence and assign the next free team
    ///
    /// Nothing is popped when no team is free.
    pub fn attend_next(&self) -> AttendOutcome {
        let now = Utc::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        if state.store.queue().is_empty() {
            debug!("attend requested with an empty queue");
            return AttendOutcome::NoneAvailable;
        }
        let Some(team) = self.inner.teams.try_acquire() else {
            warn!(queued = state.store.queue().len(), "no team available");
            return AttendOutcome::TeamUnavailable;
        };
        let Some(occurrence) = state.store.attend_highest(team) else {
            self.inner.teams.restore(team);
            return AttendOutcome::NoneAvailable;
        };
        let snapshot = occurrence.snapshot(now);

        state.tasks.push(format!("update status of occurrence {}", snapshot.id));
        state.tasks.push(format!("generate report for {}", snapshot.region));

        let message = format!(
            "dispatched to occurrence {} in {} (severity {})",
            snapshot.id, snapshot.region, snapshot.severity
        );
        self.record_both(
            HistoryRecord::draft(RecordKind::TeamAssigned, message)
                .with_actor(team.to_string())
                .with_occurrence(snapshot.id.0),
        );
        drop(guard);

        info!(%team, occurrence = %snapshot.id, region = %snapshot.region, "🚒 team dispatched");
        AttendOutcome::Assigned(Attendance {
            team,
            occurrence: snapshot,
        })
    }

    /// Close an attendance: release its team and drain the task stack
    pub fn conclude(&self, id: OccurrenceId) -> Result<Conclusion> {
        let now = Utc::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        let (team, occurrence) = state.store.conclude(id, now)?;
        let snapshot = occurrence.snapshot(now);
        if let Some(team) = team {
            self.inner.teams.release(team);
        }
        let tasks_completed = self.complete_tasks(&mut state.tasks, id);

        let actor = team.map_or_else(|| "system".to_string(), |t| t.to_string());
        self.inner.history.append(
            HistoryRecord::draft(
                RecordKind::AttendanceConcluded,
                format!("attendance of occurrence {id} concluded"),
            )
            .with_actor(actor)
            .with_occurrence(id.0),
        );
        drop(guard);

        info!(occurrence = %id, team = ?team, tasks_completed, "✅ attendance concluded");
        Ok(Conclusion {
            team,
            occurrence: snapshot,
            tasks_completed,
        })
    }

    /// Conclude every occurrence currently being attended
    pub fn conclude_attending(&self) -> Vec<Conclusion> {
        let ids = self
            .inner
            .state
            .lock()
            .store
            .ids_with_status(OccurrenceStatus::Attending);

        ids.into_iter()
            .filter_map(|id| match self.conclude(id) {
                Ok(conclusion) => Some(conclusion),
                Err(e) => {
                    debug!(occurrence = %id, error = %e, "attendance already closed");
                    None
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Drone missions
    // ------------------------------------------------------------------

    /// Send a drone to verify occurrence `id`
    ///
    /// The mission runs on the current tokio runtime; this call never waits
    /// for it.
    pub fn dispatch_drone(&self, id: OccurrenceId) -> DispatchOutcome {
        let Ok(runtime) = Handle::try_current() else {
            return self.reject(id, DispatchRejection::RuntimeUnavailable);
        };

        let now = Utc::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        let status = match state.store.get(id) {
            Some(occurrence) => occurrence.status(),
            None => return self.reject(id, DispatchRejection::UnknownOccurrence),
        };
        if !status.is_dispatchable() {
            return self.reject(id, DispatchRejection::NotDispatchable { status });
        }

        let Some(drone) = self.inner.drones.lease() else {
            return self.reject(
                id,
                DispatchRejection::ResourceUnavailable {
                    resource: ResourceKind::Drone,
                },
            );
        };
        let Some(permit) = self.inner.gate.try_enter() else {
            self.inner.drones.restore(drone.into_inner());
            return self.reject(id, DispatchRejection::MissionInFlight);
        };
        let drone_id = *drone.unit();

        let snapshot = match state.store.begin_verification(id, drone_id) {
            Ok(occurrence) => occurrence.snapshot(now),
            Err(e) => {
                error!(occurrence = %id, error = %e, "could not start verification");
                self.inner.drones.restore(drone.into_inner());
                return self.reject(id, DispatchRejection::NotDispatchable { status });
            }
        };

        self.record_both(
            HistoryRecord::draft(
                RecordKind::MissionStarted,
                format!("dispatched to occurrence {id} in {}", snapshot.region),
            )
            .with_actor(drone_id.to_string())
            .with_occurrence(id.0),
        );
        drop(guard);

        info!(drone = %drone_id, occurrence = %id, severity = %snapshot.severity, "🚁 drone dispatched");
        if snapshot.severity >= self.inner.preliminary_threshold {
            self.inner.alerts.notify(&snapshot, TemplateKind::Preliminary);
        }

        let lease = MissionLease::new(drone, permit, id, self.inner.drone_log.clone());
        let engine = self.clone();
        let probe = self.inner.probe.clone();
        runtime.spawn(async move {
            let outcome = mission::fly(probe, snapshot).await;
            engine.complete_mission(lease.occurrence(), lease.drone(), outcome);
            drop(lease);
        });

        DispatchOutcome::Accepted { drone: drone_id }
    }

    /// Highest-severity dispatchable occurrence strictly above `threshold`
    pub fn select_for_dispatch(&self, threshold: Severity) -> Option<OccurrenceId> {
        self.inner.state.lock().store.select_for_dispatch(threshold)
    }

    /// Select and dispatch in one step; `None` when nothing qualifies
    pub fn dispatch_highest(&self, threshold: Severity) -> Option<(OccurrenceId, DispatchOutcome)> {
        let id = self.select_for_dispatch(threshold)?;
        Some((id, self.dispatch_drone(id)))
    }

    fn reject(&self, id: OccurrenceId, reason: DispatchRejection) -> DispatchOutcome {
        warn!(occurrence = %id, %reason, "drone dispatch rejected");
        DispatchOutcome::Rejected(reason)
    }

    /// Apply a mission result to the store
    fn complete_mission(&self, id: OccurrenceId, drone: DroneId, outcome: MissionOutcome) {
        let now = Utc::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let actor = drone.to_string();

        let confirmed = match outcome {
            MissionOutcome::FireConfirmed => {
                match state.store.confirm_fire(id, self.inner.confirmed_floor, now) {
                    Ok(occurrence) => {
                        let snapshot = occurrence.snapshot(now);
                        self.record_both(
                            HistoryRecord::draft(
                                RecordKind::FireConfirmed,
                                format!(
                                    "fire confirmed at occurrence {id}, severity {}",
                                    snapshot.severity
                                ),
                            )
                            .with_actor(actor)
                            .with_occurrence(id.0),
                        );
                        self.complete_tasks(&mut state.tasks, id);
                        Some(snapshot)
                    }
                    Err(e) => {
                        self.record_mission_failure(id, &actor, &e.to_string());
                        None
                    }
                }
            }
            MissionOutcome::NoFire => {
                match state.store.mark_verified(id) {
                    Ok(_) => {
                        info!(%drone, occurrence = %id, "no fire detected");
                        self.record_both(
                            HistoryRecord::draft(
                                RecordKind::NoFireDetected,
                                format!("no fire detected at occurrence {id}"),
                            )
                            .with_actor(actor)
                            .with_occurrence(id.0),
                        );
                    }
                    Err(e) => self.record_mission_failure(id, &actor, &e.to_string()),
                }
                None
            }
            MissionOutcome::Failed(reason) => {
                let detail = match state.store.revert_verification(id) {
                    Ok(restored) => format!("{reason}; status restored to {restored}"),
                    Err(e) => format!("{reason}; {e}"),
                };
                self.record_mission_failure(id, &actor, &detail);
                None
            }
        };
        drop(guard);

        if let Some(snapshot) = confirmed {
            info!(%drone, occurrence = %id, severity = %snapshot.severity, "🔥 fire confirmed");
            self.inner.alerts.notify(&snapshot, TemplateKind::Confirmed);
        }
    }

    fn record_mission_failure(&self, id: OccurrenceId, actor: &str, detail: &str) {
        error!(occurrence = %id, drone = actor, detail, "drone mission failed");
        self.record_both(
            HistoryRecord::draft(
                RecordKind::MissionFailed,
                format!("mission to occurrence {id} failed: {detail}"),
            )
            .with_actor(actor)
            .with_occurrence(id.0),
        );
    }

    /// Wait until no mission is in flight
    pub async fn settle(&self) {
        while self.inner.gate.in_flight() > 0 || self.inner.drones.stats().in_use > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    // ------------------------------------------------------------------
    // Extinguishing
    // ------------------------------------------------------------------

    /// Resolve one active fire
    pub fn extinguish(&self, id: OccurrenceId) -> Result<OccurrenceSnapshot> {
        let snapshot = {
            let now = Utc::now();
            let mut guard = self.inner.state.lock();
            let snapshot = guard.store.extinguish(id, now)?.snapshot(now);
            self.record_extinguished(&snapshot);
            snapshot
        };
        self.inner.alerts.notify(&snapshot, TemplateKind::Controlled);
        Ok(snapshot)
    }

    /// Roll once per active fire and resolve those that come up
    pub fn extinguish_sweep(&self, probability: f64) -> Vec<OccurrenceSnapshot> {
        let probability = probability.clamp(0.0, 1.0);
        let now = Utc::now();
        let resolved: Vec<_> = {
            let mut guard = self.inner.state.lock();
            let mut rng = rand::rng();
            let candidates = guard.store.ids_with_status(OccurrenceStatus::FireActive);
            candidates
                .into_iter()
                .filter(|_| rng.random_bool(probability))
                .filter_map(|id| match guard.store.extinguish(id, now) {
                    Ok(occurrence) => {
                        let snapshot = occurrence.snapshot(now);
                        self.record_extinguished(&snapshot);
                        Some(snapshot)
                    }
                    Err(e) => {
                        warn!(occurrence = %id, error = %e, "could not extinguish");
                        None
                    }
                })
                .collect()
        };

        for snapshot in &resolved {
            self.inner.alerts.notify(snapshot, TemplateKind::Controlled);
        }
        resolved
    }

    fn record_extinguished(&self, snapshot: &OccurrenceSnapshot) {
        info!(occurrence = %snapshot.id, region = %snapshot.region, "🧯 fire extinguished");
        self.record_both(
            HistoryRecord::draft(
                RecordKind::FireExtinguished,
                format!("fire at occurrence {} in {} extinguished", snapshot.id, snapshot.region),
            )
            .with_actor("system")
            .with_occurrence(snapshot.id.0),
        );
    }

    // ------------------------------------------------------------------
    // Contacts and alerts
    // ------------------------------------------------------------------

    pub fn register_contact(&self, contact: Contact) -> Result<()> {
        let message = format!("contact {} ({}) registered", contact.name, contact.kind);
        self.inner.contacts.register(contact)?;
        self.inner
            .history
            .append(HistoryRecord::draft(RecordKind::ContactRegistered, message));
        Ok(())
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.inner.contacts.list()
    }

    /// Send a confirmed-fire alert for a severity 4 occurrence that is never stored
    pub fn test_alert(&self, location: Location, region: &str) -> Result<Vec<JoinHandle<()>>> {
        let region = region.trim();
        if region.is_empty() {
            return Err(DispatchError::InvalidRegion(region.to_string()));
        }
        let now = Utc::now();
        let severity = Severity::new(4)?;
        let target = OccurrenceSnapshot {
            id: OccurrenceId(0),
            location,
            severity,
            region: region.to_string(),
            status: OccurrenceStatus::Pending,
            fire_confirmed: false,
            fire_extinguished: false,
            priority_key: crate::occurrence::priority_key(
                severity,
                self.inner.config.critical_regions.iter().any(|r| r == region),
            ),
            reported_at: now,
            fire_start_time: None,
            fire_end_time: None,
            active_secs: None,
            team: None,
            drone: None,
        };
        Ok(self
            .inner
            .alerts
            .notify_transient(&target, TemplateKind::Confirmed))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// All occurrences in id order
    pub fn list(&self) -> Vec<OccurrenceSnapshot> {
        let now = Utc::now();
        self.inner
            .state
            .lock()
            .store
            .iter()
            .map(|o| o.snapshot(now))
            .collect()
    }

    pub fn get(&self, id: OccurrenceId) -> Option<OccurrenceSnapshot> {
        let now = Utc::now();
        self.inner.state.lock().store.get(id).map(|o| o.snapshot(now))
    }

    /// Queued occurrence ids in attend order
    pub fn queue_order(&self) -> Vec<OccurrenceId> {
        self.inner.state.lock().store.queue().ordered()
    }

    pub fn regions(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .regions
            .names()
            .map(str::to_string)
            .collect()
    }

    /// Pending secondary tasks, most recent first
    pub fn pending_tasks(&self) -> Vec<String> {
        self.inner.state.lock().tasks.pending()
    }

    /// Summaries for one region, or for every known region
    pub fn region_report(&self, region: Option<&str>) -> Vec<RegionSummary> {
        let state = self.inner.state.lock();
        match region {
            Some(name) if state.regions.exists(name) => {
                report::summarize([name], state.store.iter())
            }
            Some(_) => Vec::new(),
            None => report::summarize(state.regions.names(), state.store.iter()),
        }
    }

    /// Markers for active and extinguished fires with coordinates
    pub fn map_snapshot(&self) -> Vec<MapMarker> {
        self.inner
            .state
            .lock()
            .store
            .iter()
            .filter_map(report::marker_for)
            .collect()
    }

    pub fn history(&self) -> Vec<HistoryRecord> {
        self.inner.history.snapshot()
    }

    pub fn drone_log(&self) -> Vec<HistoryRecord> {
        self.inner.drone_log.snapshot()
    }

    /// Shared handle to the history ledger, for export
    pub fn history_ledger(&self) -> &HistoryLedger {
        &self.inner.history
    }

    /// Shared handle to the drone action log, for export
    pub fn drone_ledger(&self) -> &HistoryLedger {
        &self.inner.drone_log
    }

    pub fn team_stats(&self) -> PoolStats {
        self.inner.teams.stats()
    }

    pub fn drone_stats(&self) -> PoolStats {
        self.inner.drones.stats()
    }

    pub fn missions_in_flight(&self) -> usize {
        self.inner.gate.in_flight()
    }

    /// Check store, queue and pool invariants
    pub fn is_consistent(&self) -> bool {
        let state = self.inner.state.lock();
        let teams = self.inner.teams.stats();
        let drones = self.inner.drones.stats();
        let attending = state.store.ids_with_status(OccurrenceStatus::Attending).len();
        state.store.is_consistent()
            && teams.is_conserved()
            && drones.is_conserved()
            && teams.in_use == attending
            && drones.in_use <= self.inner.gate.capacity()
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Pop every task, one history record each
    fn complete_tasks(&self, tasks: &mut TaskStack, id: OccurrenceId) -> usize {
        let drained = tasks.drain();
        for task in &drained {
            debug!(occurrence = %id, task = %task, "secondary task completed");
            self.inner.history.append(
                HistoryRecord::draft(RecordKind::TaskCompleted, format!("task completed: {task}"))
                    .with_occurrence(id.0),
            );
        }
        drained.len()
    }

    /// Unit actions go to the drone log as well as the history
    fn record_both(&self, draft: RecordDraft) {
        self.inner.drone_log.append(draft.clone());
        self.inner.history.append(draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FireEngine {
        FireEngine::new(EngineConfig::default()).unwrap()
    }

    fn sev(n: u8) -> Severity {
        Severity::new(n).unwrap()
    }

    #[test]
    fn test_report_registers_region_once() {
        let engine = engine();
        let before = engine.history().len();
        for _ in 0..3 {
            engine
                .report(Location::named("Campo").unwrap(), sev(2), "Pampa Sul")
                .unwrap();
        }
        let region_records = engine
            .history()
            .iter()
            .skip(before)
            .filter(|r| r.kind == RecordKind::RegionRegistered)
            .count();
        assert_eq!(region_records, 1);
        assert!(engine.regions().contains(&"Pampa Sul".to_string()));
        assert_eq!(engine.pending_tasks().len(), 3);
    }

    #[test]
    fn test_seed_regions_are_not_logged() {
        let engine = engine();
        assert_eq!(engine.regions().len(), 6);
        assert!(engine
            .history()
            .iter()
            .all(|r| r.kind == RecordKind::ContactRegistered));
        assert_eq!(engine.contacts().len(), 2);
    }

    #[test]
    fn test_submit_validates_input() {
        let engine = engine();
        assert!(matches!(
            engine.submit("-3.1,-60.0", 9, "Amazônia"),
            Err(DispatchError::InvalidSeverity(9))
        ));
        assert!(matches!(
            engine.submit("-93.1,-60.0", 3, "Amazônia"),
            Err(DispatchError::InvalidLocation(_))
        ));
        assert!(matches!(
            engine.submit("-3.1,-60.0", 3, "  "),
            Err(DispatchError::InvalidRegion(_))
        ));
        let snap = engine.submit("-3.1,-60.0", 5, "Amazônia").unwrap();
        assert_eq!(snap.priority_key, -10);
        assert_eq!(engine.list().len(), 1);
    }

    #[test]
    fn test_attend_empty_queue_leaves_pools_unchanged() {
        let engine = engine();
        let teams = engine.team_stats();
        let drones = engine.drone_stats();
        assert_eq!(engine.attend_next(), AttendOutcome::NoneAvailable);
        assert_eq!(engine.team_stats(), teams);
        assert_eq!(engine.drone_stats(), drones);
    }

    #[test]
    fn test_attend_without_team_keeps_queue() {
        let engine = FireEngine::new(EngineConfig {
            team_count: 1,
            ..Default::default()
        })
        .unwrap();
        let a = engine.report(Location::named("A").unwrap(), sev(3), "Cerrado").unwrap();
        let b = engine.report(Location::named("B").unwrap(), sev(2), "Cerrado").unwrap();

        let AttendOutcome::Assigned(first) = engine.attend_next() else {
            panic!("expected an assignment");
        };
        assert_eq!(first.occurrence.id, a.id);
        assert_eq!(first.team, TeamId(1));

        assert_eq!(engine.attend_next(), AttendOutcome::TeamUnavailable);
        assert_eq!(engine.queue_order(), vec![b.id]);

        let conclusion = engine.conclude(a.id).unwrap();
        assert_eq!(conclusion.team, Some(TeamId(1)));
        assert_eq!(engine.team_stats().in_use, 0);
        assert!(engine.is_consistent());
    }

    #[test]
    fn test_dispatch_outside_runtime_is_rejected() {
        let engine = engine();
        let snap = engine.report(Location::named("A").unwrap(), sev(5), "Cerrado").unwrap();
        assert_eq!(
            engine.dispatch_drone(snap.id),
            DispatchOutcome::Rejected(DispatchRejection::RuntimeUnavailable)
        );
        assert_eq!(engine.drone_stats().in_use, 0);
    }

    #[test]
    fn test_region_report_and_map() {
        let engine = engine();
        engine
            .report(Location::coordinates(-15.0, -47.0).unwrap(), sev(3), "Cerrado")
            .unwrap();
        let all = engine.region_report(None);
        assert_eq!(all.len(), 6);
        let cerrado = engine.region_report(Some("Cerrado"));
        assert_eq!(cerrado.len(), 1);
        assert_eq!(cerrado[0].total, 1);
        assert!(engine.region_report(Some("Atlantis")).is_empty());
        assert!(engine.map_snapshot().is_empty());
    }

    #[test]
    fn test_simulate_stays_in_bounds() {
        let engine = engine();
        let created = engine.simulate(25, &[]).unwrap();
        assert_eq!(created.len(), 25);
        for snap in &created {
            let (lat, lon) = snap.location.lat_lon().unwrap();
            assert!(SIMULATION_LATITUDE.contains(&lat));
            assert!(SIMULATION_LONGITUDE.contains(&lon));
            assert!(engine.config().seed_regions.contains(&snap.region));
        }
        assert!(engine.is_consistent());
    }

    #[test]
    fn test_extinguish_requires_active_fire() {
        let engine = engine();
        let snap = engine.report(Location::named("A").unwrap(), sev(5), "Cerrado").unwrap();
        assert!(matches!(
            engine.extinguish(snap.id),
            Err(DispatchError::InvalidTransition { .. })
        ));
        assert!(engine.extinguish_sweep(1.0).is_empty());
    }
}
