//! Simulation settings

use duel_error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK_TEXT: &str = "Sorry, I couldn't generate a response right now.";

/// Knobs for one simulation run.
///
/// Every field has a default, so a partial TOML table deserialises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Upper bound on rounds
    pub max_rounds: u32,
    /// Minimum judge score that ends the run successfully
    pub pass_threshold: u8,
    /// First round index whose answer is coached with the previous feedback
    pub coaching_starts_at: u32,
    /// Score recorded when the judge's reply carries none
    pub default_score: u8,
    /// Stand-in for any agent output that failed to generate
    pub fallback_text: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 6,
            pass_threshold: 8,
            coaching_starts_at: 2,
            default_score: 5,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_pass_threshold(mut self, pass_threshold: u8) -> Self {
        self.pass_threshold = pass_threshold;
        self
    }

    pub fn with_coaching_starts_at(mut self, round: u32) -> Self {
        self.coaching_starts_at = round;
        self
    }

    /// Reject settings that make the loop meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(Error::config_invalid("max_rounds", "max_rounds must be at least 1"));
        }
        if !(1..=10).contains(&self.pass_threshold) {
            return Err(Error::config_invalid(
                "pass_threshold",
                format!("pass_threshold must be within 1..=10, got {}", self.pass_threshold),
            ));
        }
        if !(1..=10).contains(&self.default_score) {
            return Err(Error::config_invalid(
                "default_score",
                format!("default_score must be within 1..=10, got {}", self.default_score),
            ));
        }
        if self.fallback_text.trim().is_empty() {
            return Err(Error::config_invalid("fallback_text", "fallback_text must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.max_rounds, 6);
        assert_eq!(config.pass_threshold, 8);
        assert_eq!(config.default_score, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = SimulationConfig::default().with_max_rounds(0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context()[0], ("field", "max_rounds".to_string()));

        assert!(SimulationConfig::default().with_pass_threshold(11).validate().is_err());
        assert!(SimulationConfig::default().with_pass_threshold(0).validate().is_err());
    }

    #[test]
    fn test_every_threshold_in_range_is_valid() {
        for threshold in 1..=10 {
            assert!(SimulationConfig::default().with_pass_threshold(threshold).validate().is_ok());
        }

        let config = SimulationConfig {
            default_score: 0,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.context()[0], ("field", "default_score".to_string()));
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"max_rounds": 3, "coaching_starts_at": 5}"#).unwrap();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.coaching_starts_at, 5);
        assert_eq!(config.pass_threshold, 8);
        assert_eq!(config.fallback_text, DEFAULT_FALLBACK_TEXT);
    }
}
