//! Behavioral metrics aggregation
//!
//! Reduces an event log into the fixed statistical summary that gets fingerprinted.
//! Every statistic here feeds the canonical hash, so the operation order of each
//! formula is fixed: sums run left to right in insertion order, and the sample
//! variance is always `Σ(x - mean)² / (n - 1)`.

use crate::types::{BehavioralEvent, BehavioralMetrics, EventKind, EventPayload};

/// Number of bins in the mouse velocity histogram
const VELOCITY_BIN_COUNT: usize = 20;

/// Minimum scroll events before a scroll pattern is scored
const MIN_SCROLL_EVENTS: usize = 3;

/// Idle score reported when no idle periods were observed
const NO_IDLE_SCORE: f64 = 100.0;

/// Floor for the session length (seconds) used as the focus-rate divisor
const MIN_SESSION_SECONDS: f64 = 0.001;

/// Metrics aggregator over a recorded event log
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Compute all metrics for `events` given the elapsed session time
    pub fn compute(events: &[BehavioralEvent], session_duration_ms: f64) -> BehavioralMetrics {
        let intervals: Vec<f64> = events
            .iter()
            .filter_map(|e| match e.payload {
                EventPayload::Keystroke { interval, .. } if interval > 0.0 => Some(interval),
                _ => None,
            })
            .collect();
        let keystroke_timing_variance = sample_variance(&intervals);

        let velocities: Vec<f64> = events
            .iter()
            .filter_map(|e| match e.payload {
                EventPayload::Mouse { velocity, .. } => Some(velocity),
                _ => None,
            })
            .collect();
        let mouse_movement_entropy = histogram_entropy(&velocities);

        let scrolls: Vec<(f64, f64)> = events
            .iter()
            .filter_map(|e| match e.payload {
                EventPayload::Scroll { delta_y, intensity } => Some((delta_y, intensity)),
                _ => None,
            })
            .collect();
        let scroll_pattern_score = scroll_pattern_score(&scrolls);

        let focus_events = events
            .iter()
            .filter(|e| e.kind() == EventKind::Focus)
            .count();
        let focus_switch_frequency =
            focus_events as f64 / (session_duration_ms / 1000.0).max(MIN_SESSION_SECONDS);

        let idle_durations: Vec<f64> = events
            .iter()
            .filter_map(|e| match e.payload {
                EventPayload::Idle { duration } => Some(duration),
                _ => None,
            })
            .collect();
        let idle_pattern_score = idle_pattern_score(&idle_durations, session_duration_ms);

        BehavioralMetrics {
            keystroke_timing_variance,
            mouse_movement_entropy,
            scroll_pattern_score,
            focus_switch_frequency,
            idle_pattern_score,
            total_events: u32::try_from(events.len()).unwrap_or(u32::MAX),
            session_duration_ms,
        }
    }
}

/// Sample variance (Bessel-corrected); 0 with fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squared: f64 = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum();
    squared / (n - 1.0)
}

/// Shannon entropy in bits of a fixed 20-bin histogram over `[min, max]`
pub fn histogram_entropy(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max != min { max - min } else { 1.0 };

    let mut bins = [0usize; VELOCITY_BIN_COUNT];
    for value in values {
        // `as` truncates toward zero and maps NaN to 0
        let idx = (((value - min) / range) * VELOCITY_BIN_COUNT as f64) as usize;
        bins[idx.min(VELOCITY_BIN_COUNT - 1)] += 1;
    }

    let n = values.len() as f64;
    let mut entropy = 0.0;
    for &count in bins.iter().filter(|&&c| c > 0) {
        let p = count as f64 / n;
        entropy -= p * p.log2();
    }
    entropy
}

/// Scroll pattern score from direction flips and intensity spread
///
/// `0.0` with fewer than three scrolls, otherwise
/// `flip_ratio * 50 + min(intensity_variance / 100, 50)`.
fn scroll_pattern_score(scrolls: &[(f64, f64)]) -> f64 {
    if scrolls.len() < MIN_SCROLL_EVENTS {
        return 0.0;
    }

    let mut direction_changes = 0usize;
    let mut prev_direction = 0i8;
    for &(delta, _) in scrolls {
        let direction = if delta > 0.0 { 1 } else { -1 };
        if prev_direction != 0 && direction != prev_direction {
            direction_changes += 1;
        }
        prev_direction = direction;
    }
    let change_ratio = direction_changes as f64 / scrolls.len() as f64;

    let intensities: Vec<f64> = scrolls.iter().map(|&(_, intensity)| intensity).collect();
    let intensity_variance = sample_variance(&intensities);

    change_ratio * 50.0 + (intensity_variance / 100.0).min(50.0)
}

/// Idle pattern score; 100 when no idle periods were recorded
fn idle_pattern_score(durations: &[f64], session_duration_ms: f64) -> f64 {
    if durations.is_empty() {
        return NO_IDLE_SCORE;
    }

    let total_idle: f64 = durations.iter().sum();
    let idle_ratio = total_idle / session_duration_ms.max(1.0);
    let duration_variance = sample_variance(durations);

    let base_score = (1.0 - idle_ratio) * 70.0;
    let variance_bonus = (duration_variance / 10000.0).min(30.0);
    base_score + variance_bonus
}
