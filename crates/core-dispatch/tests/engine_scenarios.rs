//! Engine scenarios: dispatch, verification, attendance and resolution
//!
//! Missions run on a paused tokio clock so flight delays elapse instantly
//! and in order. Outcomes are forced with probabilities of 0.0 / 1.0 or
//! with a scripted probe.

use async_trait::async_trait;
use parking_lot::Mutex;
use sentinel_core_dispatch::{
    Alert, AlertGateway, AttendOutcome, Contact, DeliveryError, DispatchOutcome,
    DispatchRejection, EngineConfig, FireEngine, Location, MarkerColor, OccurrenceSnapshot,
    OccurrenceStatus, ProbeError, ResourceKind, Severity, SimulatedProbe, TemplateKind,
    VerificationProbe,
};
use sentinel_core_ledger::RecordKind;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

fn sev(n: u8) -> Severity {
    Severity::new(n).unwrap()
}

fn amazon() -> Location {
    Location::coordinates(-3.1, -60.0).unwrap()
}

fn engine_with(config: EngineConfig, p_confirm: f64) -> FireEngine {
    let probe = Arc::new(SimulatedProbe::new(config.flight_delay(), p_confirm));
    FireEngine::builder(config).probe(probe).build().unwrap()
}

/// Replays queued results, then confirms
struct ScriptedProbe {
    delay: Duration,
    script: Mutex<VecDeque<Result<bool, ProbeError>>>,
}

impl ScriptedProbe {
    fn new(script: Vec<Result<bool, ProbeError>>) -> Self {
        Self {
            delay: Duration::from_secs(3),
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl VerificationProbe for ScriptedProbe {
    async fn verify(&self, _target: &OccurrenceSnapshot) -> Result<bool, ProbeError> {
        tokio::time::sleep(self.delay).await;
        let next = self.script.lock().pop_front();
        next.unwrap_or(Ok(true))
    }
}

struct PanickingProbe;

#[async_trait]
impl VerificationProbe for PanickingProbe {
    async fn verify(&self, _target: &OccurrenceSnapshot) -> Result<bool, ProbeError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        panic!("camera feed corrupted")
    }
}

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertGateway for RecordingGateway {
    async fn send(&self, _contact: &Contact, alert: &Alert) -> Result<(), DeliveryError> {
        self.sent.lock().push(alert.clone());
        Ok(())
    }
}

struct DownGateway;

#[async_trait]
impl AlertGateway for DownGateway {
    async fn send(&self, _contact: &Contact, _alert: &Alert) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("smtp relay unreachable".to_string()))
    }
}

struct PanickingGateway;

#[async_trait]
impl AlertGateway for PanickingGateway {
    async fn send(&self, _contact: &Contact, _alert: &Alert) -> Result<(), DeliveryError> {
        panic!("sms modem wedged")
    }
}

#[tokio::test(start_paused = true)]
async fn test_critical_region_report_and_verification() {
    let engine = FireEngine::new(EngineConfig::default()).unwrap();

    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    assert_eq!(occ.priority_key, -10);
    assert_eq!(occ.status, OccurrenceStatus::Pending);

    let outcome = engine.dispatch_drone(occ.id);
    assert!(outcome.is_accepted(), "dispatch should succeed: {outcome}");
    assert_eq!(
        engine.get(occ.id).unwrap().status,
        OccurrenceStatus::InVerification
    );

    engine.settle().await;

    let after = engine.get(occ.id).unwrap();
    assert!(matches!(
        after.status,
        OccurrenceStatus::FireActive | OccurrenceStatus::Verified
    ));
    if after.status == OccurrenceStatus::FireActive {
        assert!(after.severity >= sev(4));
        assert!(after.fire_start_time.is_some());
    }
    assert_eq!(engine.drone_stats().idle, 3);
    assert_eq!(engine.missions_in_flight(), 0);
    assert!(engine.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_fourth_dispatch_finds_no_drone() {
    let engine = engine_with(
        EngineConfig {
            max_concurrent_missions: 3,
            ..Default::default()
        },
        1.0,
    );

    let ids: Vec<_> = (0..4)
        .map(|i| {
            engine
                .report(Location::named(format!("site {i}")).unwrap(), sev(5), "Cerrado")
                .unwrap()
                .id
        })
        .collect();

    for id in &ids[..3] {
        assert!(engine.dispatch_drone(*id).is_accepted());
    }
    assert_eq!(
        engine.dispatch_drone(ids[3]),
        DispatchOutcome::Rejected(DispatchRejection::ResourceUnavailable {
            resource: ResourceKind::Drone
        })
    );
    assert_eq!(engine.drone_stats().in_use, 3);
    assert_eq!(engine.missions_in_flight(), 3);
    assert_eq!(engine.get(ids[3]).unwrap().status, OccurrenceStatus::Pending);

    engine.settle().await;
    let drones = engine.drone_stats();
    assert_eq!(drones.idle, 3);
    assert!(drones.is_conserved());
}

#[tokio::test(start_paused = true)]
async fn test_single_gate_serializes_fleet() {
    let engine = engine_with(EngineConfig::default(), 0.0);
    let a = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    let b = engine.report(amazon(), sev(5), "Amazônia").unwrap();

    assert_eq!(engine.dispatch_drone(a.id).drone().map(|d| d.0), Some(1));
    assert_eq!(
        engine.dispatch_drone(b.id),
        DispatchOutcome::Rejected(DispatchRejection::MissionInFlight)
    );
    // the drone taken for the rejected attempt went back to its place
    assert_eq!(engine.drone_stats().idle, 2);

    engine.settle().await;
    assert_eq!(engine.get(a.id).unwrap().status, OccurrenceStatus::Verified);
    assert_eq!(engine.dispatch_drone(b.id).drone().map(|d| d.0), Some(2));
    engine.settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_rejects_wrong_status() {
    let engine = engine_with(EngineConfig::default(), 0.0);
    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    engine.settle().await;

    assert_eq!(
        engine.dispatch_drone(occ.id),
        DispatchOutcome::Rejected(DispatchRejection::NotDispatchable {
            status: OccurrenceStatus::Verified
        })
    );
    assert_eq!(
        engine.dispatch_drone(sentinel_core_dispatch::OccurrenceId(404)),
        DispatchOutcome::Rejected(DispatchRejection::UnknownOccurrence)
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_mission_releases_and_restores() {
    let probe = Arc::new(ScriptedProbe::new(vec![Err(ProbeError::Sensor(
        "thermal camera offline".to_string(),
    ))]));
    let engine = FireEngine::builder(EngineConfig::default())
        .probe(probe)
        .build()
        .unwrap();

    let occ = engine.report(amazon(), sev(4), "Amazônia").unwrap();
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    assert!(!engine.queue_order().contains(&occ.id));

    engine.settle().await;

    let after = engine.get(occ.id).unwrap();
    assert_eq!(after.status, OccurrenceStatus::Pending);
    assert_eq!(engine.queue_order(), vec![occ.id]);
    assert_eq!(engine.drone_stats().idle, 3);
    assert_eq!(engine.missions_in_flight(), 0);

    let failure = engine
        .history()
        .into_iter()
        .find(|r| r.kind == RecordKind::MissionFailed)
        .expect("failure recorded");
    assert!(failure.message.contains("thermal camera offline"));
    assert_eq!(failure.occurrence, Some(occ.id.0));

    // a retry goes through the scripted default and confirms
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    engine.settle().await;
    assert_eq!(engine.get(occ.id).unwrap().status, OccurrenceStatus::FireActive);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_probe_still_returns_drone() {
    let engine = FireEngine::builder(EngineConfig::default())
        .probe(Arc::new(PanickingProbe))
        .build()
        .unwrap();

    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    engine.settle().await;

    assert_eq!(engine.get(occ.id).unwrap().status, OccurrenceStatus::Pending);
    assert!(engine.drone_stats().is_conserved());
    assert_eq!(engine.drone_stats().idle, 3);
    assert!(engine
        .drone_log()
        .iter()
        .any(|r| r.kind == RecordKind::DroneReturned));
    assert!(engine.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_raises_severity_and_drains_tasks() {
    let engine = engine_with(EngineConfig::default(), 1.0);

    let low = engine
        .report(Location::named("Chapada").unwrap(), sev(2), "Cerrado")
        .unwrap();
    let mid = engine
        .report(Location::named("Jalapão").unwrap(), sev(3), "Cerrado")
        .unwrap();
    assert_eq!(engine.queue_order(), vec![mid.id, low.id]);
    assert_eq!(engine.pending_tasks().len(), 2);

    assert!(engine.dispatch_drone(low.id).is_accepted());
    engine.settle().await;

    let confirmed = engine.get(low.id).unwrap();
    assert_eq!(confirmed.status, OccurrenceStatus::FireActive);
    assert_eq!(confirmed.severity, sev(4));
    assert_eq!(confirmed.priority_key, -4);
    assert_eq!(engine.queue_order(), vec![low.id, mid.id]);

    assert!(engine.pending_tasks().is_empty());
    let completed = engine
        .history()
        .iter()
        .filter(|r| r.kind == RecordKind::TaskCompleted)
        .count();
    assert_eq!(completed, 2);
    assert!(engine.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_extinguish_and_conclude() {
    let engine = engine_with(EngineConfig::default(), 1.0);

    let a = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    let b = engine
        .report(Location::coordinates(-19.0, -57.0).unwrap(), sev(4), "Pantanal")
        .unwrap();

    for id in [a.id, b.id] {
        assert!(engine.dispatch_drone(id).is_accepted());
        engine.settle().await;
    }

    // attend the Amazônia fire, let the Pantanal one burn out
    let AttendOutcome::Assigned(attendance) = engine.attend_next() else {
        panic!("expected an assignment");
    };
    assert_eq!(attendance.occurrence.id, a.id);

    let resolved = engine.extinguish_sweep(1.0);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, b.id);
    assert_eq!(resolved[0].severity, Severity::MIN);
    assert!(resolved[0].fire_end_time.is_some());

    let markers = engine.map_snapshot();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].color, MarkerColor::Green);

    let conclusion = engine.conclude(a.id).unwrap();
    assert_eq!(conclusion.team, Some(attendance.team));
    assert!(conclusion.occurrence.fire_extinguished);
    assert_eq!(engine.team_stats().in_use, 0);
    assert_eq!(engine.attend_next(), AttendOutcome::NoneAvailable);
    assert!(engine.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_alert_fanout_on_dispatch_and_confirmation() {
    let gateway = Arc::new(RecordingGateway::default());
    let config = EngineConfig::default();
    let engine = FireEngine::builder(config.clone())
        .probe(Arc::new(SimulatedProbe::new(config.flight_delay(), 1.0)))
        .gateway(gateway.clone())
        .build()
        .unwrap();

    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    engine.settle().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sent = gateway.sent.lock().clone();
    // two contacts monitor Amazônia, severity 5 goes out by e-mail and SMS
    let preliminary = sent
        .iter()
        .filter(|a| a.kind == TemplateKind::Preliminary)
        .count();
    let confirmed = sent
        .iter()
        .filter(|a| a.kind == TemplateKind::Confirmed)
        .count();
    assert_eq!(preliminary, 4);
    assert_eq!(confirmed, 4);

    let delivered = engine
        .drone_log()
        .iter()
        .filter(|r| r.kind == RecordKind::AlertDelivered)
        .count();
    assert_eq!(delivered, 8);
}

#[tokio::test(start_paused = true)]
async fn test_delivery_failures_never_break_missions() {
    let config = EngineConfig::default();
    let engine = FireEngine::builder(config.clone())
        .probe(Arc::new(SimulatedProbe::new(config.flight_delay(), 1.0)))
        .gateway(Arc::new(DownGateway))
        .build()
        .unwrap();

    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    engine.settle().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.get(occ.id).unwrap().status, OccurrenceStatus::FireActive);
    let failures: Vec<_> = engine
        .history()
        .into_iter()
        .filter(|r| r.kind == RecordKind::AlertFailed)
        .collect();
    assert_eq!(failures.len(), 8);
    assert!(failures[0].message.contains("smtp relay unreachable"));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_gateway_is_recorded_as_failure() {
    let config = EngineConfig::default();
    let engine = FireEngine::builder(config.clone())
        .probe(Arc::new(SimulatedProbe::new(config.flight_delay(), 1.0)))
        .gateway(Arc::new(PanickingGateway))
        .build()
        .unwrap();

    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    assert!(engine.dispatch_drone(occ.id).is_accepted());
    engine.settle().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.get(occ.id).unwrap().status, OccurrenceStatus::FireActive);
    let failures: Vec<_> = engine
        .history()
        .into_iter()
        .filter(|r| r.kind == RecordKind::AlertFailed)
        .collect();
    // 2 contacts x (e-mail, SMS) x (preliminary, confirmed)
    assert_eq!(failures.len(), 8);
    assert!(failures.iter().all(|r| r.message.contains("sms modem wedged")));
    assert!(!engine
        .drone_log()
        .iter()
        .any(|r| r.kind == RecordKind::AlertDelivered));
    assert_eq!(engine.drone_stats().idle, 3);
    assert!(engine.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_records_before_returning() {
    let config = EngineConfig::default();
    let engine = FireEngine::builder(config.clone())
        .probe(Arc::new(SimulatedProbe::new(config.flight_delay(), 1.0)))
        .build()
        .unwrap();

    let a = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    let b = engine
        .report(Location::coordinates(-19.0, -57.0).unwrap(), sev(4), "Pantanal")
        .unwrap();
    for id in [a.id, b.id] {
        assert!(engine.dispatch_drone(id).is_accepted());
        engine.settle().await;
    }

    let resolved = engine.extinguish_sweep(1.0);
    assert_eq!(resolved.len(), 2);
    for snapshot in &resolved {
        let in_history = engine
            .history()
            .iter()
            .filter(|r| r.kind == RecordKind::FireExtinguished && r.occurrence == Some(snapshot.id.0))
            .count();
        let in_drone_log = engine
            .drone_log()
            .iter()
            .filter(|r| r.kind == RecordKind::FireExtinguished && r.occurrence == Some(snapshot.id.0))
            .count();
        assert_eq!((in_history, in_drone_log), (1, 1));
    }
    assert!(engine
        .list()
        .iter()
        .all(|o| o.fire_extinguished && o.status == OccurrenceStatus::FireExtinguished));
    assert!(engine.extinguish_sweep(1.0).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_test_alert_is_transient() {
    let gateway = Arc::new(RecordingGateway::default());
    let engine = FireEngine::builder(EngineConfig::default())
        .gateway(gateway.clone())
        .build()
        .unwrap();

    for handle in engine.test_alert(amazon(), "Amazônia").unwrap() {
        handle.await.unwrap();
    }
    let sent = gateway.sent.lock();
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|a| a.occurrence.is_none()));
    assert!(engine.list().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ledger_is_append_only() {
    let engine = engine_with(EngineConfig::default(), 1.0);
    let occ = engine.report(amazon(), sev(5), "Amazônia").unwrap();
    let early = engine.history();

    engine.dispatch_drone(occ.id);
    engine.settle().await;
    engine.attend_next();
    engine.conclude(occ.id).unwrap();

    let late = engine.history();
    assert!(late.len() > early.len());
    assert_eq!(&late[..early.len()], &early[..]);
    for (i, record) in late.iter().enumerate() {
        assert_eq!(record.seq, i as u64);
    }
}
