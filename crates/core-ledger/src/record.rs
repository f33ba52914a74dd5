//! Ledger records
//!
//! A record is stamped with a sequence number and a UTC timestamp at the
//! moment it is appended. Callers build a [`RecordDraft`] and hand it to
//! the ledger; the stamped [`HistoryRecord`] is immutable from then on.

use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a ledger record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A previously unknown region was registered
    RegionRegistered,
    /// A new occurrence entered the incident store
    OccurrenceRegistered,
    /// A contact was added to the directory
    ContactRegistered,
    /// A drone left the base for a verification mission
    MissionStarted,
    /// A mission confirmed an active fire
    FireConfirmed,
    /// A mission found no fire
    NoFireDetected,
    /// A mission could not produce an outcome
    MissionFailed,
    /// A drone returned to the pool
    DroneReturned,
    /// A team was assigned to an occurrence
    TeamAssigned,
    /// An attendance was concluded and its team released
    AttendanceConcluded,
    /// An active fire was put out
    FireExtinguished,
    /// A secondary task was drained from the task stack
    TaskCompleted,
    /// An alert reached a contact
    AlertDelivered,
    /// An alert could not be delivered
    AlertFailed,
    /// Free-form note
    Custom,
}

impl RecordKind {
    /// Convert record kind to string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::RegionRegistered => "region_registered",
            RecordKind::OccurrenceRegistered => "occurrence_registered",
            RecordKind::ContactRegistered => "contact_registered",
            RecordKind::MissionStarted => "mission_started",
            RecordKind::FireConfirmed => "fire_confirmed",
            RecordKind::NoFireDetected => "no_fire_detected",
            RecordKind::MissionFailed => "mission_failed",
            RecordKind::DroneReturned => "drone_returned",
            RecordKind::TeamAssigned => "team_assigned",
            RecordKind::AttendanceConcluded => "attendance_concluded",
            RecordKind::FireExtinguished => "fire_extinguished",
            RecordKind::TaskCompleted => "task_completed",
            RecordKind::AlertDelivered => "alert_delivered",
            RecordKind::AlertFailed => "alert_failed",
            RecordKind::Custom => "custom",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "region_registered" => Ok(RecordKind::RegionRegistered),
            "occurrence_registered" => Ok(RecordKind::OccurrenceRegistered),
            "contact_registered" => Ok(RecordKind::ContactRegistered),
            "mission_started" => Ok(RecordKind::MissionStarted),
            "fire_confirmed" => Ok(RecordKind::FireConfirmed),
            "no_fire_detected" => Ok(RecordKind::NoFireDetected),
            "mission_failed" => Ok(RecordKind::MissionFailed),
            "drone_returned" => Ok(RecordKind::DroneReturned),
            "team_assigned" => Ok(RecordKind::TeamAssigned),
            "attendance_concluded" => Ok(RecordKind::AttendanceConcluded),
            "fire_extinguished" => Ok(RecordKind::FireExtinguished),
            "task_completed" => Ok(RecordKind::TaskCompleted),
            "alert_delivered" => Ok(RecordKind::AlertDelivered),
            "alert_failed" => Ok(RecordKind::AlertFailed),
            "custom" => Ok(RecordKind::Custom),
            _ => Err(LedgerError::invalid_kind(s)),
        }
    }
}

/// A stamped, immutable ledger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Position in the ledger, starting at 0
    pub seq: u64,

    /// Timestamp (UTC) taken when the record was appended
    pub ts: DateTime<Utc>,

    /// Record kind
    pub kind: RecordKind,

    /// Who performed the action (drone, team, "system")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Related occurrence id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u64>,

    /// Human-readable description
    pub message: String,
}

impl HistoryRecord {
    /// Start building a record of the given kind
    pub fn draft(kind: RecordKind, message: impl Into<String>) -> RecordDraft {
        RecordDraft {
            kind,
            actor: None,
            occurrence: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.ts.format("%Y-%m-%d %H:%M:%S"))?;
        if let Some(actor) = &self.actor {
            write!(f, "{}: ", actor)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(id) = self.occurrence {
            write!(f, " (occurrence {})", id)?;
        }
        Ok(())
    }
}

/// An unstamped record waiting to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub kind: RecordKind,
    pub actor: Option<String>,
    pub occurrence: Option<u64>,
    pub message: String,
}

impl RecordDraft {
    /// Set the actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the related occurrence
    pub fn with_occurrence(mut self, id: u64) -> Self {
        self.occurrence = Some(id);
        self
    }

    pub(crate) fn stamp(self, seq: u64, ts: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord {
            seq,
            ts,
            kind: self.kind,
            actor: self.actor,
            occurrence: self.occurrence,
            message: self.message,
        }
    }
}
