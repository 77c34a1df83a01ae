//! Behavioral event recorder
//!
//! Append-only capture of typed interaction events. Each `record_*` call derives
//! its per-event deltas (hold time, interval, velocity, ...) at append time so the
//! aggregator never needs to look back across the log.

use crate::types::{BehavioralEvent, EventKind, EventPayload};

/// Append-only log of behavioral events for one collection session
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Vec<BehavioralEvent>,
    /// Offset of the most recent event of each kind
    last_by_kind: [Option<usize>; EventKind::COUNT],
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keystroke from its key-down and key-up times (ms)
    ///
    /// `interval` is measured from the previous keystroke's key-down, skipping any
    /// mouse, scroll, focus or idle events in between. The Python SDK measures it from
    /// the last event of any kind, so for sessions that mix event kinds the metrics and
    /// fingerprint from this crate will not byte-match the Python SDK's.
    pub fn record_keystroke(&mut self, key_down_time: f64, key_up_time: f64) {
        let hold_duration = key_up_time - key_down_time;
        let interval = self
            .last_of(EventKind::Keystroke)
            .map(|prev| key_down_time - prev.timestamp_ms)
            .unwrap_or(0.0);

        self.push(BehavioralEvent {
            timestamp_ms: key_down_time,
            payload: EventPayload::Keystroke {
                hold_duration,
                interval,
                key_up_time,
            },
        });
    }

    /// Record a pointer position, deriving velocity and acceleration from the
    /// previous mouse sample
    pub fn record_mouse_movement(&mut self, x: f64, y: f64, timestamp: f64) {
        let mut velocity = 0.0;
        let mut acceleration = 0.0;

        if let Some(prev) = self.last_of(EventKind::Mouse) {
            if let EventPayload::Mouse {
                x: prev_x,
                y: prev_y,
                velocity: prev_velocity,
                ..
            } = prev.payload
            {
                let dt = timestamp - prev.timestamp_ms;
                if dt > 0.0 {
                    let dx = x - prev_x;
                    let dy = y - prev_y;
                    velocity = (dx * dx + dy * dy).sqrt() / dt;
                    if prev_velocity > 0.0 {
                        acceleration = (velocity - prev_velocity) / dt;
                    }
                }
            }
        }

        self.push(BehavioralEvent {
            timestamp_ms: timestamp,
            payload: EventPayload::Mouse {
                x,
                y,
                velocity,
                acceleration,
            },
        });
    }

    pub fn record_scroll(&mut self, delta_y: f64, timestamp: f64) {
        self.push(BehavioralEvent {
            timestamp_ms: timestamp,
            payload: EventPayload::Scroll {
                delta_y,
                intensity: delta_y.abs(),
            },
        });
    }

    pub fn record_focus_change(&mut self, has_focus: bool, timestamp: f64) {
        self.push(BehavioralEvent {
            timestamp_ms: timestamp,
            payload: EventPayload::Focus {
                active: if has_focus { 1.0 } else { 0.0 },
            },
        });
    }

    /// Record a detected idle gap; the event is stamped with its start time
    pub fn record_idle_period(&mut self, start_time: f64, end_time: f64) {
        self.push(BehavioralEvent {
            timestamp_ms: start_time,
            payload: EventPayload::Idle {
                duration: end_time - start_time,
            },
        });
    }

    /// Most recent event of the given kind anywhere in the mixed log
    pub fn last_of(&self, kind: EventKind) -> Option<&BehavioralEvent> {
        self.last_by_kind[kind.index()].map(|offset| &self.events[offset])
    }

    /// Events of one kind, in insertion order
    pub fn iter_kind(&self, kind: EventKind) -> impl Iterator<Item = &BehavioralEvent> + '_ {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    pub fn events(&self) -> &[BehavioralEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every recorded event
    pub fn clear(&mut self) {
        self.events.clear();
        self.last_by_kind = [None; EventKind::COUNT];
    }

    fn push(&mut self, event: BehavioralEvent) {
        self.last_by_kind[event.kind().index()] = Some(self.events.len());
        self.events.push(event);
    }
}
