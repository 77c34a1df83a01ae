//! Collector configuration

use serde::{Deserialize, Serialize};

use crate::error::ProofError;

/// Default minimum number of events before a session is considered ready
pub const DEFAULT_MIN_EVENTS: usize = 50;

/// Default minimum session length (ms) before a session is considered ready
pub const DEFAULT_MIN_SESSION_DURATION_MS: f64 = 5000.0;

/// Tunables for a proof generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Events required before `is_ready` reports true
    pub min_events: usize,
    /// Elapsed session time (ms) required before `is_ready` reports true
    pub min_session_duration_ms: f64,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            min_events: DEFAULT_MIN_EVENTS,
            min_session_duration_ms: DEFAULT_MIN_SESSION_DURATION_MS,
        }
    }
}

impl ProofConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ProofError> {
        let config: ProofConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ProofError> {
        serde_json::to_string_pretty(self).map_err(ProofError::JsonError)
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        if !self.min_session_duration_ms.is_finite() || self.min_session_duration_ms < 0.0 {
            return Err(ProofError::ConfigError(format!(
                "min_session_duration_ms must be a finite non-negative number, got {}",
                self.min_session_duration_ms
            )));
        }
        Ok(())
    }
}
