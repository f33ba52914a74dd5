//! Incident store: owns every occurrence and keeps the priority queue in step
//!
//! All severity and status changes go through the store so the queue never
//! disagrees with the occurrences it indexes:
//! - an occurrence is queued exactly while its status is `Pending` or
//!   `FireActive`;
//! - a queued occurrence's key is always `priority_key(severity, critical)`.

use crate::error::{DispatchError, Result};
use crate::occurrence::{
    Location, Occurrence, OccurrenceId, OccurrenceStatus, Severity,
};
use crate::queue::PriorityQueue;
use crate::units::{DroneId, TeamId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct IncidentStore {
    occurrences: BTreeMap<OccurrenceId, Occurrence>,
    queue: PriorityQueue,
    critical_regions: HashSet<String>,
    next_id: u64,
}

impl IncidentStore {
    pub fn new<I, S>(critical_regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            occurrences: BTreeMap::new(),
            queue: PriorityQueue::new(),
            critical_regions: critical_regions.into_iter().map(Into::into).collect(),
            next_id: 1,
        }
    }

    pub fn is_critical(&self, region: &str) -> bool {
        self.critical_regions.contains(region)
    }

    /// Register a new `Pending` occurrence and queue it
    pub fn insert(
        &mut self,
        location: Location,
        severity: Severity,
        region: &str,
        now: DateTime<Utc>,
    ) -> &Occurrence {
        let id = OccurrenceId(self.next_id);
        self.next_id += 1;

        let occurrence = Occurrence {
            id,
            seq: id.0,
            location,
            severity,
            region: region.to_string(),
            critical: self.is_critical(region),
            status: OccurrenceStatus::Pending,
            fire_confirmed: false,
            fire_extinguished: false,
            fire_start: None,
            fire_end: None,
            reported_at: now,
            assigned_team: None,
            assigned_drone: None,
            resume_status: None,
        };
        self.queue.push(id, occurrence.priority_key(), occurrence.seq);
        self.occurrences.entry(id).or_insert(occurrence)
    }

    pub fn get(&self, id: OccurrenceId) -> Option<&Occurrence> {
        self.occurrences.get(&id)
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// All occurrences in id order
    pub fn iter(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.values()
    }

    pub fn queue(&self) -> &PriorityQueue {
        &self.queue
    }

    pub fn peek_highest(&self) -> Option<&Occurrence> {
        self.queue.peek().and_then(|id| self.occurrences.get(&id))
    }

    /// Highest-severity dispatchable occurrence strictly above `threshold`
    ///
    /// Equal severities fall back to queue order (region weight, then age).
    pub fn select_for_dispatch(&self, threshold: Severity) -> Option<OccurrenceId> {
        self.occurrences
            .values()
            .filter(|o| o.status.is_dispatchable() && o.severity > threshold)
            .min_by_key(|o| (std::cmp::Reverse(o.severity), o.priority_key(), o.seq))
            .map(|o| o.id)
    }

    /// Change severity and re-key the queue entry
    pub fn set_severity(&mut self, id: OccurrenceId, severity: Severity) -> Result<()> {
        let occurrence = self
            .occurrences
            .get_mut(&id)
            .ok_or(DispatchError::UnknownOccurrence(id))?;
        occurrence.severity = severity;
        let key = occurrence.priority_key();
        self.queue.update(id, key);
        Ok(())
    }

    /// Move to `next` and sync queue membership
    fn transition(&mut self, id: OccurrenceId, next: OccurrenceStatus) -> Result<&mut Occurrence> {
        let occurrence = self
            .occurrences
            .get_mut(&id)
            .ok_or(DispatchError::UnknownOccurrence(id))?;
        if !occurrence.status.can_transition_to(next) {
            return Err(DispatchError::InvalidTransition {
                id,
                from: occurrence.status,
                to: next,
            });
        }
        occurrence.status = next;

        if next.is_queued() {
            self.queue.push(id, occurrence.priority_key(), occurrence.seq);
        } else {
            self.queue.remove(id);
        }
        Ok(occurrence)
    }

    /// A drone has been sent; withdraw from the queue until the mission ends
    pub fn begin_verification(&mut self, id: OccurrenceId, drone: DroneId) -> Result<&Occurrence> {
        let previous = self.status_of(id)?;
        let occurrence = self.transition(id, OccurrenceStatus::InVerification)?;
        occurrence.resume_status = Some(previous);
        occurrence.assigned_drone = Some(drone);
        Ok(occurrence)
    }

    /// Mission saw fire: raise severity to `floor` and start the fire clock
    pub fn confirm_fire(
        &mut self,
        id: OccurrenceId,
        floor: Severity,
        now: DateTime<Utc>,
    ) -> Result<&Occurrence> {
        let occurrence = self.transition(id, OccurrenceStatus::FireActive)?;
        occurrence.fire_confirmed = true;
        occurrence.assigned_drone = None;
        occurrence.resume_status = None;
        occurrence.fire_start.get_or_insert(now);
        let severity = occurrence.severity.max(floor);
        self.set_severity(id, severity)?;
        self.get(id).ok_or(DispatchError::UnknownOccurrence(id))
    }

    /// Mission saw no fire
    pub fn mark_verified(&mut self, id: OccurrenceId) -> Result<&Occurrence> {
        let occurrence = self.transition(id, OccurrenceStatus::Verified)?;
        occurrence.fire_confirmed = false;
        occurrence.assigned_drone = None;
        occurrence.resume_status = None;
        Ok(occurrence)
    }

    /// Mission failed: put the occurrence back where it was
    pub fn revert_verification(&mut self, id: OccurrenceId) -> Result<OccurrenceStatus> {
        let resume = self
            .get(id)
            .ok_or(DispatchError::UnknownOccurrence(id))?
            .resume_status
            .unwrap_or(OccurrenceStatus::Pending);
        let occurrence = self.transition(id, resume)?;
        occurrence.assigned_drone = None;
        occurrence.resume_status = None;
        Ok(resume)
    }

    /// Fire put out: severity drops to 1 and the clock stops
    pub fn extinguish(&mut self, id: OccurrenceId, now: DateTime<Utc>) -> Result<&Occurrence> {
        let occurrence = self.transition(id, OccurrenceStatus::FireExtinguished)?;
        occurrence.fire_extinguished = true;
        occurrence.fire_end = Some(now);
        occurrence.severity = Severity::MIN;
        Ok(occurrence)
    }

    /// Pop the highest-priority occurrence and hand it to `team`
    pub fn attend_highest(&mut self, team: TeamId) -> Option<&Occurrence> {
        let id = self.queue.peek()?;
        match self.transition(id, OccurrenceStatus::Attending) {
            Ok(occurrence) => {
                occurrence.assigned_team = Some(team);
                Some(occurrence)
            }
            Err(_) => None,
        }
    }

    /// Close an attendance, returning the team that was assigned
    pub fn conclude(&mut self, id: OccurrenceId, now: DateTime<Utc>) -> Result<(Option<TeamId>, &Occurrence)> {
        let occurrence = self.transition(id, OccurrenceStatus::Concluded)?;
        let team = occurrence.assigned_team.take();
        if occurrence.fire_confirmed && !occurrence.fire_extinguished {
            occurrence.fire_extinguished = true;
            occurrence.fire_end = Some(now);
        }
        Ok((team, occurrence))
    }

    /// Ids with the given status, in id order
    pub fn ids_with_status(&self, status: OccurrenceStatus) -> Vec<OccurrenceId> {
        self.occurrences
            .values()
            .filter(|o| o.status == status)
            .map(|o| o.id)
            .collect()
    }

    fn status_of(&self, id: OccurrenceId) -> Result<OccurrenceStatus> {
        self.get(id)
            .map(|o| o.status)
            .ok_or(DispatchError::UnknownOccurrence(id))
    }

    /// Check every queue/store invariant
    pub fn is_consistent(&self) -> bool {
        if !self.queue.is_valid() {
            return false;
        }
        self.occurrences.values().all(|o| {
            let queued = self.queue.contains(o.id);
            queued == o.status.is_queued()
                && (!queued || self.queue.key_of(o.id) == Some(o.priority_key()))
        })
    }
}
