//! Session time sources
//!
//! A generator owns its clock. `SystemClock` reads wall-clock time; `ManualClock`
//! is driven by the caller, for replaying recorded sessions and for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Source of "now" in fractional milliseconds
pub trait SessionClock {
    fn now_ms(&self) -> f64;
}

/// Wall-clock time since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SessionClock for SystemClock {
    fn now_ms(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1000.0
    }
}

/// Caller-controlled clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.bits.store(now_ms.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.set(self.now_ms() + delta_ms);
    }
}

impl SessionClock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1000.0);
        let handle = clock.clone();
        handle.advance(250.5);
        assert_eq!(clock.now_ms(), 1250.5);
        handle.set(0.0);
        assert_eq!(clock.now_ms(), 0.0);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(a > 1.6e12);
        assert!(b >= a);
    }
}
