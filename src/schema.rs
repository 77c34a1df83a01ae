//! Interaction input schema
//!
//! Raw interaction records as captured by a client, one per line (NDJSON) or as a
//! JSON array. Records replay into a generator through the same `record_*` calls a
//! live capture would make.
//!
//! ```text
//! {"kind":"keystroke","down":100.0,"up":180.0}
//! {"kind":"mouse","x":10.0,"y":20.0,"t":150.0}
//! {"kind":"scroll","delta_y":-120.0,"t":300.0}
//! {"kind":"focus","has_focus":false,"t":400.0}
//! {"kind":"idle","start":500.0,"end":2500.0}
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::SessionClock;
use crate::error::ProofError;
use crate::generator::ProofGenerator;
use crate::types::EventKind;

/// A single captured interaction, before any derived fields are computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionRecord {
    Keystroke { down: f64, up: f64 },
    Mouse { x: f64, y: f64, t: f64 },
    Scroll { delta_y: f64, t: f64 },
    Focus { has_focus: bool, t: f64 },
    Idle { start: f64, end: f64 },
}

impl InteractionRecord {
    pub fn kind(&self) -> EventKind {
        match self {
            InteractionRecord::Keystroke { .. } => EventKind::Keystroke,
            InteractionRecord::Mouse { .. } => EventKind::Mouse,
            InteractionRecord::Scroll { .. } => EventKind::Scroll,
            InteractionRecord::Focus { .. } => EventKind::Focus,
            InteractionRecord::Idle { .. } => EventKind::Idle,
        }
    }

    /// Earliest and latest instants the record covers (ms)
    pub fn time_bounds(&self) -> (f64, f64) {
        match *self {
            InteractionRecord::Keystroke { down, up } => (down.min(up), down.max(up)),
            InteractionRecord::Mouse { t, .. }
            | InteractionRecord::Scroll { t, .. }
            | InteractionRecord::Focus { t, .. } => (t, t),
            InteractionRecord::Idle { start, end } => (start.min(end), start.max(end)),
        }
    }

    /// Feed this record into a generator
    pub fn apply<C: SessionClock>(&self, generator: &mut ProofGenerator<C>) {
        match *self {
            InteractionRecord::Keystroke { down, up } => generator.record_keystroke(down, up),
            InteractionRecord::Mouse { x, y, t } => generator.record_mouse_movement(x, y, t),
            InteractionRecord::Scroll { delta_y, t } => generator.record_scroll(delta_y, t),
            InteractionRecord::Focus { has_focus, t } => generator.record_focus_change(has_focus, t),
            InteractionRecord::Idle { start, end } => generator.record_idle_period(start, end),
        }
    }
}

/// Parse newline-delimited records, skipping blank lines
pub fn parse_ndjson(ndjson: &str) -> Result<Vec<InteractionRecord>, ProofError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<InteractionRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = line_num + 1, error = %e, "rejected interaction record");
                return Err(ProofError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(records)
}

/// Parse a JSON array of records
pub fn parse_array(json: &str) -> Result<Vec<InteractionRecord>, ProofError> {
    serde_json::from_str(json)
        .map_err(|e| ProofError::ParseError(format!("Failed to parse interaction array: {}", e)))
}

/// Parse either format, picking the array form when the input starts with `[`
pub fn parse_records(input: &str) -> Result<Vec<InteractionRecord>, ProofError> {
    if input.trim_start().starts_with('[') {
        parse_array(input)
    } else {
        parse_ndjson(input)
    }
}

/// Span (ms) from the earliest to the latest instant across all records
///
/// Returns `None` for an empty slice.
pub fn recorded_span_ms(records: &[InteractionRecord]) -> Option<(f64, f64)> {
    records.iter().map(InteractionRecord::time_bounds).fold(None, |acc, (lo, hi)| {
        Some(match acc {
            None => (lo, hi),
            Some((min, max)) => (f64::min(min, lo), f64::max(max, hi)),
        })
    })
}
