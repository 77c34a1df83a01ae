//! Verification submission envelope
//!
//! The shapes handed to the transport layer: the fingerprint submission and the
//! server-issued challenge. Byte fields travel as lowercase hex and keys are
//! camelCase, matching the platform's JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::challenge::{self, CHALLENGE_LEN};
use crate::error::ProofError;
use crate::policy::behavioral_score;
use crate::types::{hex_bytes, BehavioralMetrics, FingerprintResult};
use crate::{PRODUCER_NAME, PROOF_VERSION};

/// Server-issued challenge, as returned by `/api/verify/challenge`
///
/// ```text
/// {"challengeId": "...", "challengeData": "<64 hex>", "expiresAt": 1700000000, "difficulty": 2}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeIssue {
    pub challenge_id: String,
    /// The challenge nonce; carried as `challengeData` on the wire
    #[serde(rename = "challengeData", alias = "nonce", with = "hex_bytes")]
    pub nonce: [u8; CHALLENGE_LEN],
    /// Unix timestamp (seconds) after which the server rejects the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub difficulty: u32,
}

impl ChallengeIssue {
    /// Build a challenge from a hex nonce as delivered by the server
    pub fn from_hex(challenge_id: impl Into<String>, nonce_hex: &str) -> Result<Self, ProofError> {
        Ok(Self {
            challenge_id: challenge_id.into(),
            nonce: decode_block("challengeData", nonce_hex)?,
            expires_at: None,
            difficulty: 0,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|deadline| now.timestamp() >= deadline)
            .unwrap_or(false)
    }
}

/// Producer metadata attached to every submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// The solved challenge, sent as `response`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeAnswer {
    #[serde(with = "hex_bytes")]
    pub solution: [u8; CHALLENGE_LEN],
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub producer: SubmissionProducer,
}

/// The behavioral fingerprint, sent as `fingerprintData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintData {
    #[serde(with = "hex_bytes")]
    pub fingerprint_hash: [u8; 32],
    pub metrics: BehavioralMetrics,
    pub confidence: f64,
    /// Confidence as the `u8` the on-chain verification instruction takes
    pub behavioral_score: u8,
}

/// Request body for `/api/verify/submit`
///
/// ```text
/// {"challengeId": "...", "response": {...}, "fingerprintData": {...}, "wallet": "<base58>"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSubmission {
    pub challenge_id: String,
    pub response: ChallengeAnswer,
    pub fingerprint_data: FingerprintData,
    /// Base58 wallet address of the account being verified
    pub wallet: String,
}

/// Builds submissions for one wallet, stamping each with this builder's instance id
pub struct SubmissionBuilder {
    wallet: String,
    instance_id: String,
}

impl SubmissionBuilder {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// Solve the challenge against the fingerprint and wrap both for transport
    pub fn build(
        &self,
        session_id: Uuid,
        fingerprint: &FingerprintResult,
        issue: &ChallengeIssue,
    ) -> VerificationSubmission {
        VerificationSubmission {
            challenge_id: issue.challenge_id.clone(),
            response: ChallengeAnswer {
                solution: challenge::compute_challenge_hash(&issue.nonce, &fingerprint.hash),
                session_id,
                created_at: Utc::now(),
                producer: SubmissionProducer {
                    name: PRODUCER_NAME.to_string(),
                    version: PROOF_VERSION.to_string(),
                    instance_id: self.instance_id.clone(),
                },
            },
            fingerprint_data: FingerprintData {
                fingerprint_hash: fingerprint.hash,
                metrics: fingerprint.metrics,
                confidence: fingerprint.confidence,
                behavioral_score: behavioral_score(fingerprint.confidence),
            },
            wallet: self.wallet.clone(),
        }
    }

    pub fn build_json(
        &self,
        session_id: Uuid,
        fingerprint: &FingerprintResult,
        issue: &ChallengeIssue,
    ) -> Result<String, ProofError> {
        let submission = self.build(session_id, fingerprint, issue);
        serde_json::to_string(&submission).map_err(ProofError::JsonError)
    }
}

/// Decode a 32-byte hex field
pub fn decode_block(field: &'static str, hex_str: &str) -> Result<[u8; 32], ProofError> {
    let raw = hex::decode(hex_str.trim()).map_err(|e| ProofError::InvalidHex(format!("{field}: {e}")))?;
    <[u8; 32]>::try_from(raw.as_slice()).map_err(|_| ProofError::invalid_length(field, 32, raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FingerprintEncoder;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn sample_fingerprint() -> FingerprintResult {
        FingerprintEncoder::encode(BehavioralMetrics {
            keystroke_timing_variance: 2400.0,
            mouse_movement_entropy: 2.7,
            scroll_pattern_score: 12.0,
            focus_switch_frequency: 0.1,
            idle_pattern_score: 64.0,
            total_events: 80,
            session_duration_ms: 20000.0,
        })
    }

    fn sample_challenge() -> ChallengeIssue {
        ChallengeIssue::from_hex("chal-1", &"00".repeat(32)).unwrap()
    }

    #[test]
    fn test_server_challenge_payload() {
        let json = format!(
            r#"{{"challengeId":"c1","challengeData":"{}","expiresAt":1700000000,"difficulty":2}}"#,
            "11".repeat(32)
        );
        let issue: ChallengeIssue = serde_json::from_str(&json).unwrap();
        assert_eq!(
            issue,
            ChallengeIssue {
                challenge_id: "c1".to_string(),
                nonce: [0x11; 32],
                expires_at: Some(1_700_000_000),
                difficulty: 2,
            }
        );

        let back = serde_json::to_value(&issue).unwrap();
        assert_eq!(back["challengeData"], "11".repeat(32));
        assert_eq!(back["difficulty"], 2);
        assert!(back.get("nonce").is_none());
    }

    #[test]
    fn test_challenge_accepts_nonce_key() {
        let json = format!(r#"{{"challengeId":"x","nonce":"{}"}}"#, "ab".repeat(32));
        let issue: ChallengeIssue = serde_json::from_str(&json).unwrap();
        assert_eq!(issue.nonce, [0xab; 32]);
        assert_eq!(issue.expires_at, None);
        assert_eq!(issue.difficulty, 0);
    }

    #[test]
    fn test_submission_fields() {
        let fingerprint = sample_fingerprint();
        let builder = SubmissionBuilder::new(WALLET).with_instance_id("test-instance");
        let session_id = Uuid::new_v4();
        let submission = builder.build(session_id, &fingerprint, &sample_challenge());

        assert_eq!(submission.challenge_id, "chal-1");
        assert_eq!(submission.wallet, WALLET);
        assert_eq!(submission.response.session_id, session_id);
        assert_eq!(
            submission.response.solution,
            challenge::compute_challenge_hash(&[0u8; 32], &fingerprint.hash)
        );
        assert_eq!(submission.response.producer.name, PRODUCER_NAME);
        assert_eq!(submission.response.producer.instance_id, "test-instance");

        let data = &submission.fingerprint_data;
        assert_eq!(data.fingerprint_hash, fingerprint.hash);
        assert_eq!(data.metrics, fingerprint.metrics);
        // 10 + 10 + 15 + 15 + 10 + 10
        assert_eq!(data.confidence, 70.0);
        assert_eq!(data.behavioral_score, 70);
    }

    #[test]
    fn test_submission_json_shape() {
        let fingerprint = sample_fingerprint();
        let json = SubmissionBuilder::new(WALLET)
            .build_json(Uuid::new_v4(), &fingerprint, &sample_challenge())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let mut keys: Vec<&str> = parsed
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["challengeId", "fingerprintData", "response", "wallet"]);

        assert_eq!(parsed["challengeId"], "chal-1");
        assert_eq!(parsed["wallet"], WALLET);

        let data = &parsed["fingerprintData"];
        assert_eq!(data["fingerprintHash"], hex::encode(fingerprint.hash));
        assert_eq!(data["metrics"]["totalEvents"], 80);
        assert_eq!(data["metrics"]["keystrokeTimingVariance"], 2400.0);
        assert_eq!(data["confidence"], 70.0);
        assert_eq!(data["behavioralScore"], 70);

        let response = &parsed["response"];
        assert_eq!(response["solution"].as_str().unwrap().len(), 64);
        assert!(response.get("createdAt").is_some());
        assert!(response.get("sessionId").is_some());

        let back: VerificationSubmission = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fingerprint_data.fingerprint_hash, fingerprint.hash);
    }

    #[test]
    fn test_challenge_from_hex_validation() {
        assert!(matches!(
            ChallengeIssue::from_hex("c", "zz"),
            Err(ProofError::InvalidHex(_))
        ));
        assert!(matches!(
            ChallengeIssue::from_hex("c", &"ab".repeat(31)),
            Err(ProofError::InvalidLength { actual: 31, .. })
        ));
    }

    #[test]
    fn test_challenge_expiry() {
        let mut issue = sample_challenge();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert!(!issue.is_expired(now));

        issue.expires_at = Some(now.timestamp() + 60);
        assert!(!issue.is_expired(now));
        issue.expires_at = Some(now.timestamp());
        assert!(issue.is_expired(now));
    }
}
