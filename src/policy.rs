//! Readiness and confidence helpers
//!
//! Neither of these enforces anything: readiness is advisory, and confidence is a
//! heuristic the verifier weighs against its own threshold.

use crate::config::ProofConfig;
use crate::types::BehavioralMetrics;

/// Upper bound of the confidence scale
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Step-function confidence scorer
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    /// Score how human-like a session looks, in `[0, 100]`
    ///
    /// Each condition awards a fixed number of points; NaN metrics fail every
    /// comparison and award nothing.
    pub fn score(metrics: &BehavioralMetrics) -> f64 {
        let mut score = 0.0;

        if metrics.total_events >= 100 {
            score += 20.0;
        } else if metrics.total_events >= 50 {
            score += 10.0;
        }

        if metrics.session_duration_ms >= 30000.0 {
            score += 20.0;
        } else if metrics.session_duration_ms >= 10000.0 {
            score += 10.0;
        }

        if metrics.keystroke_timing_variance > 1000.0 {
            score += 15.0;
        }
        if metrics.mouse_movement_entropy > 2.0 {
            score += 15.0;
        }
        if metrics.scroll_pattern_score > 30.0 {
            score += 10.0;
        }
        if metrics.focus_switch_frequency > 0.05 && metrics.focus_switch_frequency < 2.0 {
            score += 10.0;
        }
        if metrics.idle_pattern_score > 50.0 {
            score += 10.0;
        }

        f64::min(score, MAX_CONFIDENCE)
    }
}

/// Convert a confidence value into the `u8` score the verification instruction takes
pub fn behavioral_score(confidence: f64) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    confidence.clamp(0.0, MAX_CONFIDENCE).floor() as u8
}

/// Advisory check that enough data has been collected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessGate {
    pub min_events: usize,
    pub min_session_duration_ms: f64,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::from_config(&ProofConfig::default())
    }
}

impl ReadinessGate {
    pub fn from_config(config: &ProofConfig) -> Self {
        Self {
            min_events: config.min_events,
            min_session_duration_ms: config.min_session_duration_ms,
        }
    }

    pub fn check(&self, event_count: usize, session_duration_ms: f64) -> bool {
        event_count >= self.min_events && session_duration_ms >= self.min_session_duration_ms
    }
}
