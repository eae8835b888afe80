//! Error types for retry configuration.
//!
//! Only configuration can fail inside this crate. Errors produced by a
//! wrapped operation are never converted: callers receive the operation's
//! own error type unchanged once the retry loop gives up.

use std::convert::Infallible;
use thiserror::Error;

/// Result type alias for fallible configuration steps.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Raised synchronously while building a retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The attempt budget was zero, negative, fractional or not finite.
    #[error("attempt budget must be greater than 0 (got {value})")]
    InvalidBudget {
        /// The rejected value, as written by the caller
        value: String,
    },

    /// A serialized settings document could not be parsed.
    #[error("invalid retry settings: {0}")]
    InvalidSettings(String),
}

impl ConfigError {
    pub(crate) fn invalid_budget(value: impl ToString) -> Self {
        Self::InvalidBudget {
            value: value.to_string(),
        }
    }
}

impl From<Infallible> for ConfigError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_budget_message() {
        let err = ConfigError::invalid_budget(0);
        assert_eq!(
            err.to_string(),
            "attempt budget must be greater than 0 (got 0)"
        );
    }

    #[test]
    fn test_settings_error_from_json() {
        let err: ConfigError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        match err {
            ConfigError::InvalidSettings(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected InvalidSettings, got {other:?}"),
        }
    }
}
