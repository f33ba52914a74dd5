//! Operator output: styled tables for humans, JSON for scripts.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};
use sentinel_core_dispatch::{
    DispatchOutcome, FireEngine, MapMarker, OccurrenceSnapshot, OccurrenceStatus, RegionSummary,
};
use sentinel_core_ledger::HistoryRecord;
use sentinel_core_resilience::PoolStats;
use sentinel_watch::WatchStats;
use serde::Serialize;

// ============================================================================
// THEME
// ============================================================================

/// Colors for consistent styling
pub struct Theme;

impl Theme {
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

/// Unicode icons for visual feedback
pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const FIRE: &'static str = "🔥";
    pub const DRONE: &'static str = "🛸";
    pub const SHIELD: &'static str = "🛡";
}

/// Print a section title followed by a rule
pub fn section_header(title: &str) {
    let line_len = 50 - title.chars().count().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO), message);
}

pub fn print_success(message: &str) {
    println!("{} {}", Theme::success(Icons::SUCCESS), Theme::success(message));
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", Theme::warning(Icons::WARNING), Theme::warning(message));
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| {
            Cell::new(label)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn status_cell(status: OccurrenceStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        OccurrenceStatus::FireActive => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        OccurrenceStatus::InVerification => cell.fg(Color::Yellow),
        OccurrenceStatus::FireExtinguished | OccurrenceStatus::Concluded => cell.fg(Color::Green),
        OccurrenceStatus::Verified => cell.fg(Color::DarkGrey),
        _ => cell,
    }
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One row per occurrence
pub fn occurrence_table(occurrences: &[OccurrenceSnapshot]) -> Table {
    let mut table = create_table();
    table.set_header(header(&[
        "ID", "Region", "Location", "Severity", "Key", "Status", "Team", "Drone", "Active",
    ]));

    for occ in occurrences {
        table.add_row(vec![
            Cell::new(occ.id),
            Cell::new(&occ.region),
            Cell::new(&occ.location),
            Cell::new(occ.severity),
            Cell::new(occ.priority_key).fg(Color::DarkGrey),
            status_cell(occ.status),
            Cell::new(optional(occ.team)),
            Cell::new(optional(occ.drone)),
            Cell::new(optional(occ.active_secs.map(|s| format!("{:.0}s", s)))),
        ]);
    }

    table
}

/// The newest `limit` records of a ledger
pub fn ledger_table(records: &[HistoryRecord], limit: usize) -> Table {
    let mut table = create_table();
    table.set_header(header(&["#", "Time", "Kind", "Actor", "Occurrence", "Message"]));

    let skip = records.len().saturating_sub(limit);
    for record in &records[skip..] {
        table.add_row(vec![
            Cell::new(record.seq).fg(Color::DarkGrey),
            Cell::new(record.ts.format("%H:%M:%S")),
            Cell::new(record.kind),
            Cell::new(record.actor.as_deref().unwrap_or("-")),
            Cell::new(optional(record.occurrence)),
            Cell::new(&record.message),
        ]);
    }

    table
}

pub fn region_table(regions: &[RegionSummary]) -> Table {
    let mut table = create_table();
    table.set_header(header(&["Region", "Total", "Open", "Active fires", "Mean severity"]));

    for summary in regions {
        let fires = Cell::new(summary.active_fires);
        let fires = if summary.active_fires > 0 {
            fires.fg(Color::Red)
        } else {
            fires
        };
        table.add_row(vec![
            Cell::new(&summary.region),
            Cell::new(summary.total),
            Cell::new(summary.open),
            fires,
            Cell::new(optional(summary.mean_severity.map(|m| format!("{:.1}", m)))),
        ]);
    }

    table
}

pub fn marker_table(markers: &[MapMarker]) -> Table {
    let mut table = create_table();
    table.set_header(header(&["ID", "Lat", "Lon", "Region", "Severity", "Label"]));

    for marker in markers {
        table.add_row(vec![
            Cell::new(marker.occurrence),
            Cell::new(format!("{:.4}", marker.lat)),
            Cell::new(format!("{:.4}", marker.lon)),
            Cell::new(&marker.region),
            Cell::new(marker.severity),
            Cell::new(&marker.label),
        ]);
    }

    table
}

/// Totals per watcher loop
pub fn watcher_table(watchers: &[WatcherReport]) -> Table {
    let mut table = create_table();
    table.set_header(header(&["Watcher", "Polls", "Actions", "Failures", "Panics", "OK"]));

    for report in watchers {
        let stats = &report.stats;
        let ok = Cell::new(format!("{:.1}%", stats.success_ratio() * 100.0));
        let ok = if stats.failures + stats.panics > 0 {
            ok.fg(Color::Yellow)
        } else {
            ok.fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(report.name),
            Cell::new(stats.attempts()),
            Cell::new(stats.actions),
            Cell::new(stats.failures),
            Cell::new(stats.panics),
            ok,
        ]);
    }

    table
}

pub fn pool_table(pools: &[PoolReport]) -> Table {
    let mut table = create_table();
    table.set_header(header(&["Pool", "Idle", "In use", "Capacity", "Utilization"]));

    for pool in pools {
        table.add_row(vec![
            Cell::new(pool.name),
            Cell::new(pool.idle),
            Cell::new(pool.in_use),
            Cell::new(pool.capacity),
            Cell::new(format!("{:.0}%", pool.utilization)),
        ]);
    }

    table
}

// ============================================================================
// REPORTS
// ============================================================================

/// Pool occupancy at report time
#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub name: &'static str,
    pub idle: usize,
    pub in_use: usize,
    pub capacity: usize,
    pub utilization: f64,
}

impl PoolReport {
    pub fn new(name: &'static str, stats: PoolStats) -> Self {
        Self {
            name,
            idle: stats.idle,
            in_use: stats.in_use,
            capacity: stats.capacity,
            utilization: stats.utilization(),
        }
    }
}

/// Final totals of one watcher loop
#[derive(Debug, Clone, Serialize)]
pub struct WatcherReport {
    pub name: &'static str,
    pub stats: WatchStats,
}

/// Everything printed at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub occurrences: Vec<OccurrenceSnapshot>,
    pub regions: Vec<RegionSummary>,
    pub markers: Vec<MapMarker>,
    pub pending_tasks: Vec<String>,
    pub pools: Vec<PoolReport>,
    pub watchers: Vec<WatcherReport>,
    pub history: Vec<HistoryRecord>,
    pub drone_log: Vec<HistoryRecord>,
}

impl RunReport {
    /// Collect the engine state plus the watcher totals
    pub fn collect(engine: &FireEngine, watchers: Vec<(&'static str, WatchStats)>) -> Self {
        Self {
            occurrences: engine.list(),
            regions: engine.region_report(None),
            markers: engine.map_snapshot(),
            pending_tasks: engine.pending_tasks(),
            pools: vec![
                PoolReport::new("teams", engine.team_stats()),
                PoolReport::new("drones", engine.drone_stats()),
            ],
            watchers: watchers
                .into_iter()
                .map(|(name, stats)| WatcherReport { name, stats })
                .collect(),
            history: engine.history(),
            drone_log: engine.drone_log(),
        }
    }

    /// Occurrences currently burning
    pub fn active_fires(&self) -> usize {
        self.occurrences
            .iter()
            .filter(|o| o.status == OccurrenceStatus::FireActive)
            .count()
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Writer that prints either styled tables or one JSON document
#[derive(Debug, Clone)]
pub struct OutputWriter {
    pub mode: OutputMode,

    /// Ledger rows shown in human mode
    pub ledger_rows: usize,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
            ledger_rows: 20,
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Print the end-of-run report
    pub fn run_report(&self, report: &RunReport) -> crate::Result<()> {
        match self.mode {
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputMode::Human => {
                section_header(&format!("{} Occurrences", Icons::FIRE));
                if report.occurrences.is_empty() {
                    print_info("no occurrences reported");
                } else {
                    println!("{}", occurrence_table(&report.occurrences));
                }

                section_header("Regions");
                println!("{}", region_table(&report.regions));

                if !report.markers.is_empty() {
                    section_header("Map");
                    println!("{}", marker_table(&report.markers));
                }

                section_header(&format!("{} Resources", Icons::DRONE));
                println!("{}", pool_table(&report.pools));

                if !report.watchers.is_empty() {
                    section_header(&format!("{} Watchers", Icons::SHIELD));
                    println!("{}", watcher_table(&report.watchers));
                }

                if !report.pending_tasks.is_empty() {
                    section_header("Pending tasks");
                    for task in &report.pending_tasks {
                        println!("  • {}", task);
                    }
                }

                section_header("History");
                println!("{}", ledger_table(&report.history, self.ledger_rows));

                section_header("Drone log");
                println!("{}", ledger_table(&report.drone_log, self.ledger_rows));

                let fires = report.active_fires();
                if fires > 0 {
                    print_warning(&format!("{} fire(s) still active", fires));
                } else {
                    print_success("no active fires");
                }
            }
        }
        Ok(())
    }

    /// Print the result of a manual dispatch
    pub fn dispatch(&self, occurrence: &OccurrenceSnapshot, outcome: &DispatchOutcome) -> crate::Result<()> {
        match self.mode {
            OutputMode::Json => {
                #[derive(Serialize)]
                struct DispatchLine<'a> {
                    occurrence: &'a OccurrenceSnapshot,
                    dispatch: &'a DispatchOutcome,
                }
                println!(
                    "{}",
                    serde_json::to_string(&DispatchLine {
                        occurrence,
                        dispatch: outcome,
                    })?
                );
            }
            OutputMode::Human => {
                let line = format!(
                    "occurrence {} ({}, severity {}, key {}): {}",
                    occurrence.id,
                    occurrence.region,
                    occurrence.severity,
                    occurrence.priority_key,
                    outcome
                );
                if outcome.is_accepted() {
                    print_success(&line);
                } else {
                    print_warning(&line);
                }
            }
        }
        Ok(())
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        match self.mode {
            OutputMode::Json => {
                #[derive(Serialize)]
                struct ErrorLine {
                    success: bool,
                    error: String,
                }
                let line = ErrorLine {
                    success: false,
                    error: sanitize_error(msg),
                };
                if let Ok(json) = serde_json::to_string(&line) {
                    eprintln!("{}", json);
                }
            }
            OutputMode::Human => {
                eprintln!("{} {}", style(Icons::ERROR).red(), sanitize_error(msg));
            }
        }
    }

    /// Print an info message (suppressed in JSON mode)
    pub fn info(&self, msg: &str) {
        if !self.is_json() {
            print_info(msg);
        }
    }
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core_dispatch::{EngineConfig, Location, Severity};

    fn engine_with_two() -> FireEngine {
        let engine = FireEngine::new(EngineConfig::default()).unwrap();
        engine
            .report(
                Location::coordinates(-9.5, -56.1).unwrap(),
                Severity::new(5).unwrap(),
                "Amazônia",
            )
            .unwrap();
        engine
            .report(Location::named("BR-163 km 40").unwrap(), Severity::new(2).unwrap(), "Cerrado")
            .unwrap();
        engine
    }

    #[test]
    fn test_output_modes() {
        assert!(OutputWriter::new(true).is_json());
        assert!(!OutputWriter::new(false).is_json());
    }

    #[test]
    fn test_sanitize_error() {
        assert_eq!(sanitize_error("  drone\n lost\tcontact "), "drone lost contact");
    }

    #[test]
    fn test_report_collects_engine_state() {
        let engine = engine_with_two();
        let report = RunReport::collect(&engine, vec![("dispatch", WatchStats::new())]);

        assert_eq!(report.occurrences.len(), 2);
        assert_eq!(report.pools.len(), 2);
        assert_eq!(report.pools[0].name, "teams");
        assert_eq!(report.pools[0].idle, 5);
        assert_eq!(report.watchers[0].name, "dispatch");
        assert_eq!(report.active_fires(), 0);
        assert!(!report.history.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["occurrences"].as_array().unwrap().len(), 2);
        assert_eq!(json["pools"][1]["name"], "drones");
    }

    #[test]
    fn test_tables_have_a_row_per_item() {
        let engine = engine_with_two();
        let occurrences = engine.list();
        assert_eq!(occurrence_table(&occurrences).row_iter().count(), 2);

        let history = engine.history();
        let limited = ledger_table(&history, 1);
        assert_eq!(limited.row_iter().count(), 1);

        let regions = engine.region_report(None);
        assert_eq!(region_table(&regions).row_iter().count(), regions.len());
    }
}
