//! Audit ledger for Sentinel Fire
//!
//! Every state-changing event in the dispatch engine is appended to a
//! ledger. The engine keeps two of them: the general history ledger and
//! the drone action log. Both are append-only and insertion-ordered.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Engine / missions / watchers      │
//! └──────────────┬──────────────────────┘
//!                │ append(RecordDraft)
//!                ▼
//! ┌─────────────────────────────────────┐
//! │       HistoryLedger                 │
//! │  seq + UTC timestamp stamped        │
//! │  under one short lock               │
//! └──────────────┬──────────────────────┘
//!                │ snapshot() / export_jsonl()
//!                ▼
//! ┌─────────────────────────────────────┐
//! │  {"seq":0,"kind":"mission_started"} │
//! │  {"seq":1,"kind":"fire_confirmed"}  │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod ledger;
pub mod record;

pub use error::{LedgerError, Result};
pub use ledger::{parse_jsonl, HistoryLedger};
pub use record::{HistoryRecord, RecordDraft, RecordKind};
