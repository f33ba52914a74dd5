//! Alert routing and the gateway seam
//!
//! The engine never waits on delivery. [`AlertDispatcher::notify`] renders
//! one [`Alert`] per recipient and channel, spawns the sends, and records
//! each outcome in a ledger: deliveries in the drone log, failures in the
//! history ledger.

use crate::contacts::{Contact, ContactDirectory};
use crate::mission::panic_message;
use crate::occurrence::{OccurrenceId, OccurrenceSnapshot, Severity};
use async_trait::async_trait;
use futures::FutureExt;
use sentinel_core_ledger::{HistoryLedger, HistoryRecord, RecordKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "e-mail"),
            Channel::Sms => write!(f, "SMS"),
        }
    }
}

/// Which message to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// A drone is on its way to a high-severity report
    Preliminary,
    /// A drone confirmed the fire
    Confirmed,
    /// The fire is under control
    Controlled,
}

/// A rendered message for one contact on one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub channel: Channel,
    pub kind: TemplateKind,
    pub occurrence: Option<OccurrenceId>,
    pub region: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Alert {
    pub fn render(
        channel: Channel,
        kind: TemplateKind,
        contact: &Contact,
        target: &OccurrenceSnapshot,
        occurrence: Option<OccurrenceId>,
    ) -> Self {
        let region = &target.region;
        let location = &target.location;
        let severity = target.severity;

        let subject = match kind {
            TemplateKind::Preliminary => format!("Preliminary fire alert - {region}"),
            TemplateKind::Confirmed => format!("Fire confirmed - {region}"),
            TemplateKind::Controlled => format!("Fire under control - {region}"),
        };

        let body = match (channel, kind) {
            (Channel::Email, TemplateKind::Preliminary) => format!(
                "A fire was reported in {region} at {location} with severity {severity}. \
                 A drone has been dispatched to verify it. Stand by for confirmation."
            ),
            (Channel::Email, TemplateKind::Confirmed) => format!(
                "Fire confirmed in {region} at {location}. Severity: {severity}. \
                 Follow the instructions of the local authorities."
            ),
            (Channel::Email, TemplateKind::Controlled) => format!(
                "The fire in {region} at {location} has been brought under control."
            ),
            (Channel::Sms, TemplateKind::Preliminary) => {
                format!("PRELIMINARY ALERT: possible fire in {region} (severity {severity}).")
            }
            (Channel::Sms, TemplateKind::Confirmed) => {
                format!("ALERT: fire in {region} at {location}. Severity {severity}.")
            }
            (Channel::Sms, TemplateKind::Controlled) => {
                format!("UPDATE: fire in {region} under control.")
            }
        };

        let recipient = match channel {
            Channel::Email => contact.email.clone(),
            Channel::Sms => contact.phone.clone(),
        };

        Self {
            channel,
            kind,
            occurrence,
            region: region.clone(),
            recipient,
            subject,
            body,
        }
    }
}

/// Delivery failure reported by a gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("recipient rejected: {0}")]
    Rejected(String),

    #[error("gateway timed out")]
    Timeout,
}

/// Outbound notification transport (e-mail, SMS)
#[async_trait]
pub trait AlertGateway: Send + Sync {
    async fn send(&self, contact: &Contact, alert: &Alert) -> Result<(), DeliveryError>;
}

/// Gateway that logs alerts instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingGateway;

#[async_trait]
impl AlertGateway for TracingGateway {
    async fn send(&self, contact: &Contact, alert: &Alert) -> Result<(), DeliveryError> {
        info!(
            channel = %alert.channel,
            to = %alert.recipient,
            contact = %contact.name,
            subject = %alert.subject,
            "📨 {}",
            alert.body
        );
        Ok(())
    }
}

/// Fans alerts out to contacts and ledgers the results
#[derive(Clone)]
pub struct AlertDispatcher {
    gateway: Arc<dyn AlertGateway>,
    contacts: ContactDirectory,
    history: HistoryLedger,
    drone_log: HistoryLedger,
    sms_threshold: Severity,
}

impl AlertDispatcher {
    pub fn new(
        gateway: Arc<dyn AlertGateway>,
        contacts: ContactDirectory,
        history: HistoryLedger,
        drone_log: HistoryLedger,
        sms_threshold: Severity,
    ) -> Self {
        Self {
            gateway,
            contacts,
            history,
            drone_log,
            sms_threshold,
        }
    }

    /// Channels used for an occurrence of this severity
    pub fn channels_for(&self, severity: Severity) -> Vec<Channel> {
        if severity >= self.sms_threshold {
            vec![Channel::Email, Channel::Sms]
        } else {
            vec![Channel::Email]
        }
    }

    /// Spawn one send per (recipient, channel) and return the handles
    ///
    /// Callers normally drop the handles. Outside a tokio runtime nothing
    /// can be sent, so every alert is recorded as failed.
    pub fn notify(&self, target: &OccurrenceSnapshot, kind: TemplateKind) -> Vec<JoinHandle<()>> {
        self.notify_as(target, kind, Some(target.id))
    }

    /// Like [`notify`](Self::notify), but for a target that is not stored
    pub fn notify_transient(
        &self,
        target: &OccurrenceSnapshot,
        kind: TemplateKind,
    ) -> Vec<JoinHandle<()>> {
        self.notify_as(target, kind, None)
    }

    fn notify_as(
        &self,
        target: &OccurrenceSnapshot,
        kind: TemplateKind,
        occurrence: Option<OccurrenceId>,
    ) -> Vec<JoinHandle<()>> {
        let recipients = self.contacts.recipients_for(&target.region);
        if recipients.is_empty() {
            debug!(region = %target.region, "no contacts monitor region; alert skipped");
            return Vec::new();
        }

        let runtime = Handle::try_current().ok();
        let channels = self.channels_for(target.severity);
        let mut handles = Vec::with_capacity(recipients.len() * channels.len());

        for contact in recipients {
            for &channel in &channels {
                let alert = Alert::render(channel, kind, &contact, target, occurrence);
                match &runtime {
                    Some(runtime) => {
                        let delivery = Delivery {
                            gateway: self.gateway.clone(),
                            history: self.history.clone(),
                            drone_log: self.drone_log.clone(),
                        };
                        let contact = contact.clone();
                        handles.push(runtime.spawn(async move {
                            delivery.deliver(contact, alert).await;
                        }));
                    }
                    None => record_failure(
                        &self.history,
                        &contact,
                        &alert,
                        &DeliveryError::Transport("no async runtime".to_string()),
                    ),
                }
            }
        }
        handles
    }
}

struct Delivery {
    gateway: Arc<dyn AlertGateway>,
    history: HistoryLedger,
    drone_log: HistoryLedger,
}

impl Delivery {
    async fn deliver(self, contact: Contact, alert: Alert) {
        let sent = AssertUnwindSafe(self.gateway.send(&contact, &alert))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(DeliveryError::Transport(format!(
                    "gateway panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });
        match sent {
            Ok(()) => {
                let mut draft = HistoryRecord::draft(
                    RecordKind::AlertDelivered,
                    format!("{} sent to {}", alert.channel, contact.name),
                )
                .with_actor("system");
                if let Some(id) = alert.occurrence {
                    draft = draft.with_occurrence(id.0);
                }
                self.drone_log.append(draft);
            }
            Err(e) => record_failure(&self.history, &contact, &alert, &e),
        }
    }
}

fn record_failure(history: &HistoryLedger, contact: &Contact, alert: &Alert, error: &DeliveryError) {
    warn!(
        channel = %alert.channel,
        contact = %contact.name,
        error = %error,
        "alert delivery failed"
    );
    let mut draft = HistoryRecord::draft(
        RecordKind::AlertFailed,
        format!("failed to send {} to {}: {}", alert.channel, contact.name, error),
    );
    if let Some(id) = alert.occurrence {
        draft = draft.with_occurrence(id.0);
    }
    history.append(draft);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{default_contacts, ContactKind};
    use crate::occurrence::{Location, OccurrenceStatus};
    use chrono::Utc;
    use parking_lot::Mutex;

    fn target(severity: u8, region: &str) -> OccurrenceSnapshot {
        OccurrenceSnapshot {
            id: OccurrenceId(1),
            location: Location::coordinates(-3.1, -60.0).unwrap(),
            severity: Severity::new(severity).unwrap(),
            region: region.to_string(),
            status: OccurrenceStatus::FireActive,
            fire_confirmed: true,
            fire_extinguished: false,
            priority_key: -10,
            reported_at: Utc::now(),
            fire_start_time: None,
            fire_end_time: None,
            active_secs: None,
            team: None,
            drone: None,
        }
    }

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertGateway for Recording {
        async fn send(&self, _contact: &Contact, alert: &Alert) -> Result<(), DeliveryError> {
            self.sent.lock().push(alert.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl AlertGateway for Failing {
        async fn send(&self, _contact: &Contact, _alert: &Alert) -> Result<(), DeliveryError> {
            Err(DeliveryError::Timeout)
        }
    }

    fn directory() -> ContactDirectory {
        let dir = ContactDirectory::new();
        for c in default_contacts() {
            dir.register(c).unwrap();
        }
        dir
    }

    fn dispatcher(gateway: Arc<dyn AlertGateway>) -> (AlertDispatcher, HistoryLedger, HistoryLedger) {
        let history = HistoryLedger::new();
        let drone_log = HistoryLedger::new();
        let d = AlertDispatcher::new(
            gateway,
            directory(),
            history.clone(),
            drone_log.clone(),
            Severity::new(4).unwrap(),
        );
        (d, history, drone_log)
    }

    #[test]
    fn test_render_uses_channel_address() {
        let contact =
            Contact::new("Brigada", "b@x.org", "+55", ContactKind::Community, ["Pampa"]).unwrap();
        let alert = Alert::render(
            Channel::Sms,
            TemplateKind::Confirmed,
            &contact,
            &target(5, "Pampa"),
            Some(OccurrenceId(1)),
        );
        assert_eq!(alert.recipient, "+55");
        assert!(alert.body.contains("Pampa"));
        assert!(alert.body.contains('5'));
    }

    #[tokio::test]
    async fn test_sms_only_at_threshold() {
        let gateway = Arc::new(Recording::default());
        let (d, _, drone_log) = dispatcher(gateway.clone());

        for h in d.notify(&target(3, "Cerrado"), TemplateKind::Confirmed) {
            h.await.unwrap();
        }
        assert_eq!(gateway.sent.lock().len(), 1);

        for h in d.notify(&target(4, "Amazônia"), TemplateKind::Confirmed) {
            h.await.unwrap();
        }
        let sent = gateway.sent.lock();
        assert_eq!(sent.len(), 1 + 4);
        assert_eq!(sent.iter().filter(|a| a.channel == Channel::Sms).count(), 2);
        assert_eq!(drone_log.len(), 5);
    }

    #[tokio::test]
    async fn test_failures_land_in_history() {
        let (d, history, drone_log) = dispatcher(Arc::new(Failing));
        for h in d.notify(&target(5, "Cerrado"), TemplateKind::Controlled) {
            h.await.unwrap();
        }
        let records = history.snapshot();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.kind == RecordKind::AlertFailed));
        assert!(drone_log.is_empty());
    }

    #[test]
    fn test_without_runtime_records_failure() {
        let (d, history, _) = dispatcher(Arc::new(TracingGateway));
        let handles = d.notify(&target(2, "Cerrado"), TemplateKind::Preliminary);
        assert!(handles.is_empty());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_unmonitored_region_sends_nothing() {
        let (d, history, _) = dispatcher(Arc::new(TracingGateway));
        assert!(d.notify(&target(5, "Pampa"), TemplateKind::Confirmed).is_empty());
        assert!(history.is_empty());
    }
}
