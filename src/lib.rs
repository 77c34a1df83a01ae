//! your.fun Proof-of-Human collector
//!
//! Turns raw interaction telemetry into a behavioral fingerprint and answers the
//! verifier's challenge for it: event capture → metrics aggregation → canonical
//! encoding + SHA-256 → challenge solving.
//!
//! ## Modules
//!
//! - **Recorder / Metrics**: capture keystroke, mouse, scroll, focus and idle events and
//!   reduce them into `BehavioralMetrics`
//! - **Encoder / Challenge**: the byte-exact fingerprint and challenge-response contract
//!   shared with the on-chain verifier
//! - **Generator**: stateful session facade over all of the above

pub mod challenge;
pub mod clock;
pub mod config;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod policy;
pub mod recorder;
pub mod schema;
pub mod submission;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use challenge::{
    compute_challenge_hash, generate_challenge_nonce, solve_challenge, verify_challenge_response,
};
pub use clock::{ManualClock, SessionClock, SystemClock};
pub use config::ProofConfig;
pub use encoder::FingerprintEncoder;
pub use error::ProofError;
pub use generator::ProofGenerator;
pub use metrics::MetricsAggregator;
pub use policy::{behavioral_score, ConfidenceScorer, ReadinessGate};
pub use recorder::EventRecorder;
pub use schema::InteractionRecord;
pub use submission::{
    ChallengeAnswer, ChallengeIssue, FingerprintData, SubmissionBuilder, VerificationSubmission,
};
pub use types::{BehavioralEvent, BehavioralMetrics, EventKind, EventPayload, FingerprintResult};

/// Crate version embedded in submissions
pub const PROOF_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for submissions
pub const PRODUCER_NAME: &str = "yourfun-proof";
