//! The four extraction stages and what they share
//!
//! Every stage iterates units of work (the benefit listing, one
//! benefit × year × catalog triple, or one table id), writes each unit's rows
//! as one flushed batch, and isolates request failures to the unit.

pub mod benefits;
pub mod detail;
pub mod table_index;

use std::time::{Duration, Instant};

use nfzstat_core::{FetchError, WalkOutcome, fmt_num};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::FailurePolicy;
use crate::state::Stage;

/// Outcome of one stage run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub units: usize,
    pub failed_units: usize,
    pub rows: usize,
    pub elapsed: Duration,
}

impl StageSummary {
    pub fn log(&self) {
        log::info!(
            "{}: {} units ({} failed), {} rows in {:.1}s",
            self.stage,
            fmt_num(self.units),
            fmt_num(self.failed_units),
            fmt_num(self.rows),
            self.elapsed.as_secs_f64()
        );
    }
}

/// Start/end timestamps around a stage
pub(crate) struct StageClock {
    stage: Stage,
    started: Instant,
}

impl StageClock {
    pub(crate) fn start(stage: Stage) -> Self {
        log::info!("{stage}: Start {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"));
        Self {
            stage,
            started: Instant::now(),
        }
    }

    pub(crate) fn finish(self, units: usize, failed_units: usize, rows: usize) -> StageSummary {
        log::info!("{}: CSV data has been successfully saved.", self.stage);
        self.end(units, failed_units, rows)
    }

    /// End a stage that left its output file as it was
    pub(crate) fn finish_unchanged(self, units: usize, failed_units: usize) -> StageSummary {
        log::warn!("{}: output left unchanged.", self.stage);
        self.end(units, failed_units, 0)
    }

    fn end(self, units: usize, failed_units: usize, rows: usize) -> StageSummary {
        log::info!(
            "{}: End {}",
            self.stage,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        );
        StageSummary {
            stage: self.stage,
            units,
            failed_units,
            rows,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Rows a unit contributes after applying the failure policy
#[derive(Debug)]
pub(crate) struct Settled<R> {
    pub(crate) rows: Vec<R>,
    pub(crate) failed: bool,
}

/// Decide what a unit contributes.
///
/// Without an error all rows pass. With one, the failure is logged and the
/// policy picks between nothing and the rows gathered before it.
pub(crate) fn settle<R>(
    label: &str,
    rows: Vec<R>,
    error: Option<FetchError>,
    policy: FailurePolicy,
) -> Settled<R> {
    let Some(reason) = error else {
        return Settled {
            rows,
            failed: false,
        };
    };
    let rows = match policy {
        FailurePolicy::Skip => {
            log::warn!("{label}: {reason}, skipped");
            Vec::new()
        }
        FailurePolicy::KeepPartial => {
            log::warn!("{label}: {reason}, keeping {} partial rows", rows.len());
            rows
        }
    };
    Settled { rows, failed: true }
}

/// Project raw API records into typed rows.
///
/// Stops at the first record that is not a JSON object, returning the rows
/// before it with a `MalformedResponse`.
pub(crate) fn project<R: DeserializeOwned>(records: Vec<Value>) -> (Vec<R>, Option<FetchError>) {
    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        if !record.is_object() {
            return (rows, Some(FetchError::malformed(format!("record {idx} is not an object"))));
        }
        match serde_json::from_value(record) {
            Ok(row) => rows.push(row),
            Err(e) => {
                return (rows, Some(FetchError::malformed(format!("record {idx}: {e}"))));
            }
        }
    }
    (rows, None)
}

/// Split a walk into its records and its error, if any
pub(crate) fn split_outcome(outcome: WalkOutcome) -> (Vec<Value>, Option<FetchError>) {
    match outcome {
        WalkOutcome::Complete(records) => (records, None),
        WalkOutcome::Failed { reason, partial } => (partial, Some(reason)),
    }
}
