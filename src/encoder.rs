//! Fingerprint encoder
//!
//! Packs behavioral metrics into the canonical 52-byte big-endian buffer and hashes
//! it with SHA-256. The layout is shared with the SDKs in other languages and with
//! the verifier, so it is fixed:
//!
//! ```text
//! offset  size  field
//!      0     8  keystroke_timing_variance   f64
//!      8     8  mouse_movement_entropy      f64
//!     16     8  scroll_pattern_score        f64
//!     24     8  focus_switch_frequency      f64
//!     32     8  idle_pattern_score          f64
//!     40     4  total_events                u32
//!     44     8  session_duration_ms         f64
//! ```

use sha2::{Digest, Sha256};

use crate::error::ProofError;
use crate::policy::ConfidenceScorer;
use crate::types::{BehavioralMetrics, FingerprintResult};

/// Size of the packed metrics buffer
pub const METRICS_BUFFER_LEN: usize = 52;

/// Size of the fingerprint digest
pub const FINGERPRINT_LEN: usize = 32;

/// Fingerprint encoder for behavioral metrics
pub struct FingerprintEncoder;

impl FingerprintEncoder {
    /// Serialize metrics into the canonical big-endian buffer
    pub fn pack(metrics: &BehavioralMetrics) -> [u8; METRICS_BUFFER_LEN] {
        let mut buf = [0u8; METRICS_BUFFER_LEN];
        buf[0..8].copy_from_slice(&metrics.keystroke_timing_variance.to_be_bytes());
        buf[8..16].copy_from_slice(&metrics.mouse_movement_entropy.to_be_bytes());
        buf[16..24].copy_from_slice(&metrics.scroll_pattern_score.to_be_bytes());
        buf[24..32].copy_from_slice(&metrics.focus_switch_frequency.to_be_bytes());
        buf[32..40].copy_from_slice(&metrics.idle_pattern_score.to_be_bytes());
        buf[40..44].copy_from_slice(&metrics.total_events.to_be_bytes());
        buf[44..52].copy_from_slice(&metrics.session_duration_ms.to_be_bytes());
        buf
    }

    /// Decode a canonical buffer back into metrics
    pub fn unpack(bytes: &[u8]) -> Result<BehavioralMetrics, ProofError> {
        let buf: &[u8; METRICS_BUFFER_LEN] = bytes
            .try_into()
            .map_err(|_| {
                ProofError::invalid_length("metrics buffer", METRICS_BUFFER_LEN, bytes.len())
            })?;

        Ok(BehavioralMetrics {
            keystroke_timing_variance: read_f64(buf, 0),
            mouse_movement_entropy: read_f64(buf, 8),
            scroll_pattern_score: read_f64(buf, 16),
            focus_switch_frequency: read_f64(buf, 24),
            idle_pattern_score: read_f64(buf, 32),
            total_events: u32::from_be_bytes([buf[40], buf[41], buf[42], buf[43]]),
            session_duration_ms: read_f64(buf, 44),
        })
    }

    /// SHA-256 of the packed metrics
    pub fn hash(metrics: &BehavioralMetrics) -> [u8; FINGERPRINT_LEN] {
        let digest = Sha256::digest(Self::pack(metrics));
        let mut hash = [0u8; FINGERPRINT_LEN];
        hash.copy_from_slice(&digest);
        hash
    }

    /// Hash the metrics and score their confidence
    pub fn encode(metrics: BehavioralMetrics) -> FingerprintResult {
        FingerprintResult {
            hash: Self::hash(&metrics),
            confidence: ConfidenceScorer::score(&metrics),
            metrics,
        }
    }
}

fn read_f64(buf: &[u8; METRICS_BUFFER_LEN], offset: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_be_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_metrics() -> BehavioralMetrics {
        BehavioralMetrics {
            keystroke_timing_variance: 1234.5,
            mouse_movement_entropy: 2.5,
            scroll_pattern_score: 31.25,
            focus_switch_frequency: 0.5,
            idle_pattern_score: 88.0,
            total_events: 120,
            session_duration_ms: 45000.0,
        }
    }

    #[test]
    fn test_pack_layout() {
        let buf = FingerprintEncoder::pack(&sample_metrics());
        assert_eq!(
            hex::encode(buf),
            "40934a0000000000\
             4004000000000000\
             403f400000000000\
             3fe0000000000000\
             4056000000000000\
             00000078\
             40e5f90000000000"
        );
    }

    #[test]
    fn test_hash_matches_reference_digest() {
        let hash = FingerprintEncoder::hash(&sample_metrics());
        assert_eq!(
            hash,
            [
                0x72, 0xd4, 0xe2, 0x5b, 0x1b, 0x08, 0x4b, 0xd3, 0x5a, 0xea, 0x91, 0x59, 0x60,
                0x1e, 0x8c, 0x15, 0x9a, 0x1f, 0xab, 0x00, 0xcc, 0x71, 0x97, 0x5f, 0x3e, 0x21,
                0xe4, 0x11, 0x43, 0xec, 0xde, 0xe5,
            ]
        );
    }

    #[test]
    fn test_empty_session_digest() {
        let metrics = BehavioralMetrics {
            idle_pattern_score: 100.0,
            ..BehavioralMetrics::default()
        };
        assert_eq!(
            hex::encode(FingerprintEncoder::hash(&metrics)),
            "a4ce9523c7823579ee4999fbe4bda5e06dab71550a441a81eb6816d3b0fcdbd8"
        );
    }

    #[test]
    fn test_unpack_recovers_exact_bits() {
        let metrics = BehavioralMetrics {
            keystroke_timing_variance: 0.1 + 0.2,
            mouse_movement_entropy: f64::MIN_POSITIVE,
            scroll_pattern_score: -0.0,
            focus_switch_frequency: 1.0 / 3.0,
            idle_pattern_score: f64::MAX,
            total_events: u32::MAX,
            session_duration_ms: 1.7e308,
        };
        let unpacked = FingerprintEncoder::unpack(&FingerprintEncoder::pack(&metrics)).unwrap();

        assert_eq!(
            unpacked.keystroke_timing_variance.to_bits(),
            metrics.keystroke_timing_variance.to_bits()
        );
        assert_eq!(
            unpacked.mouse_movement_entropy.to_bits(),
            metrics.mouse_movement_entropy.to_bits()
        );
        assert_eq!(
            unpacked.scroll_pattern_score.to_bits(),
            metrics.scroll_pattern_score.to_bits()
        );
        assert_eq!(
            unpacked.focus_switch_frequency.to_bits(),
            metrics.focus_switch_frequency.to_bits()
        );
        assert_eq!(
            unpacked.idle_pattern_score.to_bits(),
            metrics.idle_pattern_score.to_bits()
        );
        assert_eq!(unpacked.total_events, u32::MAX);
        assert_eq!(
            unpacked.session_duration_ms.to_bits(),
            metrics.session_duration_ms.to_bits()
        );
    }

    #[test]
    fn test_unpack_preserves_nan_payload() {
        let metrics = BehavioralMetrics {
            mouse_movement_entropy: f64::NAN,
            ..sample_metrics()
        };
        let unpacked = FingerprintEncoder::unpack(&FingerprintEncoder::pack(&metrics)).unwrap();
        assert_eq!(
            unpacked.mouse_movement_entropy.to_bits(),
            f64::NAN.to_bits()
        );
    }

    #[test]
    fn test_unpack_rejects_wrong_length() {
        let err = FingerprintEncoder::unpack(&[0u8; 51]).unwrap_err();
        assert!(matches!(
            err,
            ProofError::InvalidLength {
                expected: 52,
                actual: 51,
                ..
            }
        ));
    }

    #[test]
    fn test_encode_attaches_confidence() {
        let result = FingerprintEncoder::encode(sample_metrics());
        assert_eq!(result.hash, FingerprintEncoder::hash(&sample_metrics()));
        // events>=100: 20, duration>=30000: 20, variance>1000: 15, entropy>2: 15,
        // scroll>30: 10, focus in (0.05, 2): 10, idle>50: 10
        assert_eq!(result.confidence, 100.0);
    }
}
