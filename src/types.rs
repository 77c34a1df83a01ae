//! Core data types for behavioral proof-of-human collection
//!
//! Events flow from the recorder into the metrics aggregator, and the resulting
//! metrics are encoded into a fingerprint for on-chain registration.

use serde::{Deserialize, Serialize};

/// Kind of a captured behavioral event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Keystroke,
    Mouse,
    Scroll,
    Focus,
    Idle,
}

impl EventKind {
    /// Number of distinct event kinds
    pub const COUNT: usize = 5;

    /// All kinds, in index order
    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::Keystroke,
        EventKind::Mouse,
        EventKind::Scroll,
        EventKind::Focus,
        EventKind::Idle,
    ];

    /// Stable index used for per-kind lookup tables
    pub fn index(self) -> usize {
        match self {
            EventKind::Keystroke => 0,
            EventKind::Mouse => 1,
            EventKind::Scroll => 2,
            EventKind::Focus => 3,
            EventKind::Idle => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Keystroke => "keystroke",
            EventKind::Mouse => "mouse",
            EventKind::Scroll => "scroll",
            EventKind::Focus => "focus",
            EventKind::Idle => "idle",
        }
    }
}

/// Kind-specific fields derived when an event is recorded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Keystroke {
        /// Time the key was held down (ms)
        hold_duration: f64,
        /// Time since the previous keystroke went down, 0 for the first one (ms)
        interval: f64,
        key_up_time: f64,
    },
    Mouse {
        x: f64,
        y: f64,
        /// Pixels per millisecond since the previous mouse sample
        velocity: f64,
        acceleration: f64,
    },
    Scroll {
        delta_y: f64,
        /// Absolute scroll distance
        intensity: f64,
    },
    Focus {
        /// 1.0 when the window gained focus, 0.0 when it lost it
        active: f64,
    },
    Idle {
        duration: f64,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Keystroke { .. } => EventKind::Keystroke,
            EventPayload::Mouse { .. } => EventKind::Mouse,
            EventPayload::Scroll { .. } => EventKind::Scroll,
            EventPayload::Focus { .. } => EventKind::Focus,
            EventPayload::Idle { .. } => EventKind::Idle,
        }
    }
}

/// A single captured behavioral event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehavioralEvent {
    /// Caller-supplied timestamp in milliseconds; not required to be monotonic
    pub timestamp_ms: f64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl BehavioralEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Aggregated statistics over one collection session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralMetrics {
    /// Sample variance of positive inter-keystroke intervals
    pub keystroke_timing_variance: f64,
    /// Shannon entropy (bits) of the mouse velocity histogram
    pub mouse_movement_entropy: f64,
    pub scroll_pattern_score: f64,
    /// Focus changes per second of session time
    pub focus_switch_frequency: f64,
    pub idle_pattern_score: f64,
    pub total_events: u32,
    pub session_duration_ms: f64,
}

/// Fingerprint output for on-chain registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintResult {
    /// SHA-256 of the canonical metrics buffer
    #[serde(with = "hex_bytes")]
    pub hash: [u8; 32],
    pub metrics: BehavioralMetrics,
    /// Heuristic human-likeness score in `[0, 100]`
    pub confidence: f64,
}

impl FingerprintResult {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// Serde adapter for 32-byte fields carried as lowercase hex strings
pub(crate) mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(D::Error::custom)?;
        <[u8; 32]>::try_from(raw.as_slice())
            .map_err(|_| D::Error::custom(format!("expected 32 bytes, got {}", raw.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_indices_are_dense() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = BehavioralEvent {
            timestamp_ms: 120.0,
            payload: EventPayload::Scroll {
                delta_y: -40.0,
                intensity: 40.0,
            },
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["kind"], "scroll");
        assert_eq!(json["timestamp_ms"], 120.0);
        assert_eq!(json["intensity"], 40.0);
    }

    #[test]
    fn test_fingerprint_hash_round_trips_as_hex() {
        let result = FingerprintResult {
            hash: [0xab; 32],
            metrics: BehavioralMetrics::default(),
            confidence: 40.0,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(&"ab".repeat(32)));

        let parsed: FingerprintResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_short_hex_hash_rejected() {
        let json = r#"{"hash":"abcd","metrics":{"keystrokeTimingVariance":0.0,"mouseMovementEntropy":0.0,"scrollPatternScore":0.0,"focusSwitchFrequency":0.0,"idlePatternScore":100.0,"totalEvents":0,"sessionDurationMs":0.0},"confidence":0.0}"#;
        assert!(serde_json::from_str::<FingerprintResult>(json).is_err());
    }
}
