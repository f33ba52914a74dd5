//! Append-only history ledger
//!
//! Records are kept in insertion order and are never mutated or removed.
//! The ledger has no retention limit.

use crate::error::{LedgerError, Result};
use crate::record::{HistoryRecord, RecordDraft, RecordKind};
use chrono::Utc;
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Shared, append-only ledger
///
/// # Thread Safety
/// Cloning a ledger yields another handle to the same records. Appends are
/// serialized by a single short critical section; snapshots copy the
/// records out so readers never hold the lock while working.
///
/// # Example
/// ```
/// use sentinel_core_ledger::{HistoryLedger, HistoryRecord, RecordKind};
///
/// let ledger = HistoryLedger::new();
/// ledger.append(HistoryRecord::draft(RecordKind::Custom, "system online"));
/// ledger.append(
///     HistoryRecord::draft(RecordKind::MissionStarted, "mission started")
///         .with_actor("Drone 1")
///         .with_occurrence(1),
/// );
///
/// let records = ledger.snapshot();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].seq, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    records: Arc<Mutex<Vec<HistoryRecord>>>,
}

impl HistoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning its sequence number
    pub fn append(&self, draft: RecordDraft) -> u64 {
        let mut records = self.records.lock();
        let seq = records.len() as u64;
        records.push(draft.stamp(seq, Utc::now()));
        seq
    }

    /// Append a plain record with no actor or occurrence
    pub fn note(&self, kind: RecordKind, message: impl Into<String>) -> u64 {
        self.append(HistoryRecord::draft(kind, message))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the ledger has no records
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// All records in insertion order
    pub fn snapshot(&self) -> Vec<HistoryRecord> {
        self.records.lock().clone()
    }

    /// Records with `seq >= from`
    pub fn since(&self, from: u64) -> Vec<HistoryRecord> {
        let records = self.records.lock();
        let start = (from as usize).min(records.len());
        records[start..].to_vec()
    }

    /// Records related to a single occurrence
    pub fn for_occurrence(&self, id: u64) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.occurrence == Some(id))
            .cloned()
            .collect()
    }

    /// Most recent record
    pub fn last(&self) -> Option<HistoryRecord> {
        self.records.lock().last().cloned()
    }

    /// Write every record as one JSON object per line
    ///
    /// Returns the number of records written.
    pub fn export_jsonl<W: Write>(&self, mut writer: W) -> Result<usize> {
        let records = self.snapshot();
        for record in &records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

/// Parse records from a JSON Lines export
///
/// Blank lines are ignored.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<Vec<HistoryRecord>> {
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: HistoryRecord = serde_json::from_str(&line)
            .map_err(|e| LedgerError::invalid_entry(line_num + 1, &e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}
