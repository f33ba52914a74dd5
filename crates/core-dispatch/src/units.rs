//! Identifiers for response teams and verification drones

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ground response team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

/// A verification drone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DroneId(pub u32);

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Drone {}", self.0)
    }
}

/// Which pool a unit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Team,
    Drone,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Team => write!(f, "team"),
            ResourceKind::Drone => write!(f, "drone"),
        }
    }
}

/// Teams numbered from 1, in hand-out order
pub fn team_roster(count: usize) -> impl Iterator<Item = TeamId> {
    (1..=count as u32).map(TeamId)
}

/// Drones numbered from 1, in hand-out order
pub fn drone_fleet(count: usize) -> impl Iterator<Item = DroneId> {
    (1..=count as u32).map(DroneId)
}
