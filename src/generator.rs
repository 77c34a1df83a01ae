//! Proof-of-human generator
//!
//! Stateful facade over the recorder, aggregator, encoder and solver. One generator
//! covers one collection session: record events, check readiness, then produce a
//! fingerprint and answer the server's challenge.
//!
//! Mutation (`record_*`, `reset`) takes `&mut self` and reads take `&self`, so a
//! single writer with any number of readers is enforced by the borrow checker.

use tracing::{debug, info};
use uuid::Uuid;

use crate::challenge;
use crate::clock::{SessionClock, SystemClock};
use crate::config::ProofConfig;
use crate::encoder::FingerprintEncoder;
use crate::error::ProofError;
use crate::metrics::MetricsAggregator;
use crate::policy::ReadinessGate;
use crate::recorder::EventRecorder;
use crate::types::{BehavioralEvent, BehavioralMetrics, FingerprintResult};

/// Log a progress line every this many recorded events
const PROGRESS_LOG_INTERVAL: usize = 50;

/// Collects behavioral data and produces a proof-of-human fingerprint
pub struct ProofGenerator<C: SessionClock = SystemClock> {
    recorder: EventRecorder,
    clock: C,
    session_start_ms: f64,
    session_id: Uuid,
    gate: ReadinessGate,
}

impl Default for ProofGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofGenerator<SystemClock> {
    /// Create a generator on the wall clock with default thresholds
    pub fn new() -> Self {
        Self::start(SystemClock, ReadinessGate::default())
    }

    /// Create a generator on the wall clock; fails if `config` does not validate
    pub fn with_config(config: ProofConfig) -> Result<Self, ProofError> {
        Self::with_clock(SystemClock, config)
    }
}

impl<C: SessionClock> ProofGenerator<C> {
    /// Create a generator on a specific clock; the session starts now
    ///
    /// The config is validated first, so a NaN or negative duration threshold is
    /// rejected here instead of pinning `is_ready` to a constant.
    pub fn with_clock(clock: C, config: ProofConfig) -> Result<Self, ProofError> {
        config.validate()?;
        Ok(Self::start(clock, ReadinessGate::from_config(&config)))
    }

    fn start(clock: C, gate: ReadinessGate) -> Self {
        let session_start_ms = clock.now_ms();
        let session_id = Uuid::new_v4();
        debug!(%session_id, session_start_ms, "proof session started");
        Self {
            recorder: EventRecorder::new(),
            clock,
            session_start_ms,
            session_id,
            gate,
        }
    }

    pub fn record_keystroke(&mut self, key_down_time: f64, key_up_time: f64) {
        self.recorder.record_keystroke(key_down_time, key_up_time);
        self.note_recorded();
    }

    pub fn record_mouse_movement(&mut self, x: f64, y: f64, timestamp: f64) {
        self.recorder.record_mouse_movement(x, y, timestamp);
        self.note_recorded();
    }

    pub fn record_scroll(&mut self, delta_y: f64, timestamp: f64) {
        self.recorder.record_scroll(delta_y, timestamp);
        self.note_recorded();
    }

    pub fn record_focus_change(&mut self, has_focus: bool, timestamp: f64) {
        self.recorder.record_focus_change(has_focus, timestamp);
        self.note_recorded();
    }

    pub fn record_idle_period(&mut self, start_time: f64, end_time: f64) {
        self.recorder.record_idle_period(start_time, end_time);
        self.note_recorded();
    }

    /// Milliseconds since the session started (or was last reset)
    pub fn session_duration_ms(&self) -> f64 {
        self.clock.now_ms() - self.session_start_ms
    }

    /// Recompute metrics from the full event log
    pub fn compute_metrics(&self) -> BehavioralMetrics {
        let metrics = MetricsAggregator::compute(self.recorder.events(), self.session_duration_ms());
        debug!(
            session_id = %self.session_id,
            total_events = metrics.total_events,
            session_duration_ms = metrics.session_duration_ms,
            "computed behavioral metrics"
        );
        metrics
    }

    /// Compute metrics, hash them and score their confidence
    pub fn generate_fingerprint(&self) -> FingerprintResult {
        let result = FingerprintEncoder::encode(self.compute_metrics());
        info!(
            session_id = %self.session_id,
            fingerprint = %result.hash_hex(),
            confidence = result.confidence,
            "generated behavioral fingerprint"
        );
        result
    }

    pub fn generate_challenge_nonce(&self) -> [u8; challenge::CHALLENGE_LEN] {
        challenge::generate_challenge_nonce()
    }

    pub fn solve_challenge(
        &self,
        nonce: &[u8],
        fingerprint_hash: &[u8],
    ) -> Result<[u8; challenge::CHALLENGE_LEN], ProofError> {
        challenge::solve_challenge(nonce, fingerprint_hash)
    }

    /// Whether enough data has been collected; advisory only
    pub fn is_ready(&self) -> bool {
        self.gate.check(self.recorder.len(), self.session_duration_ms())
    }

    pub fn event_count(&self) -> usize {
        self.recorder.len()
    }

    pub fn events(&self) -> &[BehavioralEvent] {
        self.recorder.events()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn session_start_ms(&self) -> f64 {
        self.session_start_ms
    }

    pub fn readiness_gate(&self) -> ReadinessGate {
        self.gate
    }

    /// Drop all events and start a new session at the current time
    pub fn reset(&mut self) {
        let discarded = self.recorder.len();
        self.recorder.clear();
        self.session_start_ms = self.clock.now_ms();
        self.session_id = Uuid::new_v4();
        info!(session_id = %self.session_id, discarded, "proof session reset");
    }

    fn note_recorded(&self) {
        let count = self.recorder.len();
        if count % PROGRESS_LOG_INTERVAL == 0 {
            debug!(session_id = %self.session_id, count, "behavioral events recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pretty_assertions::assert_eq;

    fn manual_generator(start_ms: f64) -> (ProofGenerator<ManualClock>, ManualClock) {
        let clock = ManualClock::new(start_ms);
        let generator = ProofGenerator::with_clock(clock.clone(), ProofConfig::default()).unwrap();
        (generator, clock)
    }

    #[test]
    fn test_fifty_constant_keystrokes_are_ready() {
        let (mut generator, clock) = manual_generator(1_000_000.0);
        for i in 0..50 {
            let down = 1_000_000.0 + i as f64 * 120.0;
            generator.record_keystroke(down, down + 60.0);
        }
        clock.advance(5000.0);

        assert!(generator.is_ready());
        let metrics = generator.compute_metrics();
        assert_eq!(metrics.keystroke_timing_variance, 0.0);
        assert_eq!(metrics.total_events, 50);
        assert_eq!(metrics.session_duration_ms, 5000.0);
    }

    #[test]
    fn test_not_ready_until_both_thresholds_met() {
        let (mut generator, clock) = manual_generator(0.0);
        for i in 0..49 {
            generator.record_scroll(if i % 2 == 0 { 40.0 } else { -40.0 }, i as f64);
        }
        clock.set(10_000.0);
        assert!(!generator.is_ready());

        generator.record_focus_change(true, 60.0);
        assert!(generator.is_ready());

        clock.set(4_999.0);
        assert!(!generator.is_ready());
    }

    #[test]
    fn test_metrics_only_differ_by_elapsed_time() {
        let (mut generator, clock) = manual_generator(0.0);
        generator.record_keystroke(0.0, 40.0);
        generator.record_keystroke(180.0, 230.0);
        generator.record_keystroke(500.0, 520.0);
        generator.record_idle_period(600.0, 2600.0);

        clock.set(8000.0);
        let first = generator.compute_metrics();
        let again = generator.compute_metrics();
        assert_eq!(first, again);

        clock.set(9000.0);
        let later = generator.compute_metrics();
        assert_eq!(later.keystroke_timing_variance, first.keystroke_timing_variance);
        assert_eq!(later.total_events, first.total_events);
        assert_eq!(later.session_duration_ms, 9000.0);
        assert!(later.idle_pattern_score > first.idle_pattern_score);
    }

    #[test]
    fn test_fingerprint_matches_encoder() {
        let (mut generator, clock) = manual_generator(500.0);
        generator.record_mouse_movement(0.0, 0.0, 0.0);
        generator.record_mouse_movement(10.0, 0.0, 5.0);
        generator.record_mouse_movement(40.0, 0.0, 10.0);
        clock.advance(12_000.0);

        let result = generator.generate_fingerprint();
        let metrics = generator.compute_metrics();
        assert_eq!(result.metrics, metrics);
        assert_eq!(result.hash, FingerprintEncoder::hash(&metrics));
        // duration >= 10000 and idle score 100
        assert_eq!(result.confidence, 20.0);
    }

    #[test]
    fn test_reset_clears_events_and_restarts_clock() {
        let (mut generator, clock) = manual_generator(0.0);
        generator.record_keystroke(0.0, 10.0);
        generator.record_scroll(5.0, 20.0);
        let first_session = generator.session_id();

        clock.set(7000.0);
        generator.reset();

        assert_eq!(generator.event_count(), 0);
        assert_eq!(generator.session_start_ms(), 7000.0);
        assert_eq!(generator.session_duration_ms(), 0.0);
        assert_ne!(generator.session_id(), first_session);

        generator.record_keystroke(7100.0, 7150.0);
        match generator.events()[0].payload {
            crate::types::EventPayload::Keystroke { interval, .. } => assert_eq!(interval, 0.0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_end_to_end_challenge() {
        let (mut generator, clock) = manual_generator(0.0);
        for i in 0..60 {
            let t = i as f64 * 100.0;
            generator.record_keystroke(t, t + 45.0 + (i % 7) as f64 * 10.0);
        }
        clock.set(6000.0);

        let fingerprint = generator.generate_fingerprint();
        let nonce = generator.generate_challenge_nonce();
        let solution = generator.solve_challenge(&nonce, &fingerprint.hash).unwrap();

        assert_eq!(
            solution,
            challenge::compute_challenge_hash(&nonce, &fingerprint.hash)
        );
        assert!(generator
            .solve_challenge(&nonce[..31], &fingerprint.hash)
            .is_err());
    }

    #[test]
    fn test_custom_thresholds() {
        let clock = ManualClock::new(0.0);
        let config = ProofConfig {
            min_events: 2,
            min_session_duration_ms: 100.0,
        };
        let mut generator = ProofGenerator::with_clock(clock.clone(), config).unwrap();
        generator.record_focus_change(true, 1.0);
        generator.record_focus_change(false, 2.0);
        clock.set(100.0);
        assert!(generator.is_ready());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        for bad in [f64::NAN, -1.0, f64::INFINITY] {
            let config = ProofConfig {
                min_events: 50,
                min_session_duration_ms: bad,
            };
            let err = ProofGenerator::with_clock(ManualClock::new(0.0), config.clone())
                .err()
                .unwrap();
            assert!(matches!(err, ProofError::ConfigError(_)));
            assert!(ProofGenerator::with_config(config).is_err());
        }
    }

    #[test]
    fn test_default_generator_uses_default_gate() {
        let generator = ProofGenerator::new();
        assert_eq!(generator.readiness_gate(), ReadinessGate::default());
    }
}
