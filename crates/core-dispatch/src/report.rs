//! Read-only views: per-region summaries and map markers

use crate::occurrence::{Occurrence, OccurrenceId, OccurrenceStatus, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-region occurrence totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub total: usize,
    /// Occurrences not yet in a terminal status
    pub open: usize,
    pub active_fires: usize,
    pub mean_severity: Option<f64>,
}

impl RegionSummary {
    fn empty(region: &str) -> Self {
        Self {
            region: region.to_string(),
            total: 0,
            open: 0,
            active_fires: 0,
            mean_severity: None,
        }
    }
}

/// Summaries for `regions`, in name order
pub(crate) fn summarize<'a>(
    regions: impl IntoIterator<Item = &'a str>,
    occurrences: impl IntoIterator<Item = &'a Occurrence>,
) -> Vec<RegionSummary> {
    let mut by_region: BTreeMap<&str, (RegionSummary, u32)> = regions
        .into_iter()
        .map(|r| (r, (RegionSummary::empty(r), 0)))
        .collect();

    for occ in occurrences {
        let Some((summary, severity_sum)) = by_region.get_mut(occ.region()) else {
            continue;
        };
        summary.total += 1;
        if !occ.status().is_terminal() {
            summary.open += 1;
        }
        if occ.status() == OccurrenceStatus::FireActive {
            summary.active_fires += 1;
        }
        *severity_sum += u32::from(occ.severity().get());
    }

    by_region
        .into_values()
        .map(|(mut summary, severity_sum)| {
            if summary.total > 0 {
                summary.mean_severity = Some(f64::from(severity_sum) / summary.total as f64);
            }
            summary
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    /// Active fire
    Red,
    /// Extinguished fire
    Green,
}

/// A point for the map collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub occurrence: OccurrenceId,
    pub lat: f64,
    pub lon: f64,
    pub region: String,
    pub severity: Severity,
    pub color: MarkerColor,
    pub label: String,
}

/// Marker for active or extinguished fires that have coordinates
pub(crate) fn marker_for(occ: &Occurrence) -> Option<MapMarker> {
    let color = match occ.status() {
        OccurrenceStatus::FireActive => MarkerColor::Red,
        OccurrenceStatus::FireExtinguished => MarkerColor::Green,
        _ => return None,
    };
    let (lat, lon) = occ.location().lat_lon()?;
    let label = match color {
        MarkerColor::Red => format!("Active fire - {} (severity {})", occ.region(), occ.severity()),
        MarkerColor::Green => format!("Extinguished - {}", occ.region()),
    };
    Some(MapMarker {
        occurrence: occ.id(),
        lat,
        lon,
        region: occ.region().to_string(),
        severity: occ.severity(),
        color,
        label,
    })
}
