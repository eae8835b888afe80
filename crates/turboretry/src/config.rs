//! Attempt budgets and serializable retry settings.

use crate::error::{ConfigError, Result};
use crate::retry::RetryPolicyBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Total number of attempts a single invocation may make.
///
/// This counts attempts, not retries: a budget of 3 runs the operation at
/// most three times including the first call. A budget is always at least 1.
///
/// # Examples
///
/// ```rust
/// use turboretry::Budget;
///
/// let budget = Budget::try_from(3).unwrap();
/// assert_eq!(budget.get(), 3);
///
/// assert!(Budget::try_from(0).is_err());
/// assert!(Budget::try_from(-1).is_err());
/// assert!(Budget::try_from(1.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBudget", into = "u32")]
pub struct Budget(NonZeroU32);

impl Budget {
    /// A budget of exactly one attempt.
    pub const ONE: Budget = Budget(NonZeroU32::MIN);

    /// Validate an attempt count.
    pub fn new(attempts: u32) -> Result<Self> {
        NonZeroU32::new(attempts)
            .map(Self)
            .ok_or_else(|| ConfigError::invalid_budget(attempts))
    }

    /// The attempt count.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<NonZeroU32> for Budget {
    fn from(attempts: NonZeroU32) -> Self {
        Self(attempts)
    }
}

impl From<Budget> for u32 {
    fn from(budget: Budget) -> Self {
        budget.get()
    }
}

impl TryFrom<u32> for Budget {
    type Error = ConfigError;

    fn try_from(attempts: u32) -> Result<Self> {
        Self::new(attempts)
    }
}

impl TryFrom<i64> for Budget {
    type Error = ConfigError;

    fn try_from(attempts: i64) -> Result<Self> {
        u32::try_from(attempts)
            .map_err(|_| ConfigError::invalid_budget(attempts))
            .and_then(Self::new)
    }
}

impl TryFrom<i32> for Budget {
    type Error = ConfigError;

    fn try_from(attempts: i32) -> Result<Self> {
        Self::try_from(i64::from(attempts))
    }
}

impl TryFrom<usize> for Budget {
    type Error = ConfigError;

    fn try_from(attempts: usize) -> Result<Self> {
        u32::try_from(attempts)
            .map_err(|_| ConfigError::invalid_budget(attempts))
            .and_then(Self::new)
    }
}

impl TryFrom<f64> for Budget {
    type Error = ConfigError;

    /// Accepts whole numbers only; `1.0` is fine, `1.5` is not.
    fn try_from(attempts: f64) -> Result<Self> {
        let whole = attempts.is_finite()
            && attempts.fract() == 0.0
            && attempts >= 1.0
            && attempts <= f64::from(u32::MAX);
        if !whole {
            return Err(ConfigError::invalid_budget(attempts));
        }
        Self::new(attempts as u32)
    }
}

/// Wire form of a budget before validation. Integers are tried first so
/// that JSON and TOML integers never pass through floating point.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBudget {
    Whole(i64),
    Fractional(f64),
}

impl TryFrom<RawBudget> for Budget {
    type Error = ConfigError;

    fn try_from(raw: RawBudget) -> Result<Self> {
        match raw {
            RawBudget::Whole(attempts) => Self::try_from(attempts),
            RawBudget::Fractional(attempts) => Self::try_from(attempts),
        }
    }
}

/// Serializable retry settings.
///
/// Only the attempt budget has a data representation; conditions and the
/// finish hook are code and are attached to the builder returned by
/// [`RetrySettings::builder`].
///
/// # Examples
///
/// ```rust
/// use turboretry::RetrySettings;
///
/// let settings = RetrySettings::from_toml_str("attempts = 4").unwrap();
/// assert_eq!(settings.attempts.get(), 4);
///
/// let policy = settings.builder::<u32, std::io::Error>().build().unwrap();
/// assert_eq!(policy.budget().get(), 4);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per invocation
    pub attempts: Budget,
}

impl RetrySettings {
    /// Parse settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse settings from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Start a policy builder seeded with these settings.
    pub fn builder<T, E>(&self) -> RetryPolicyBuilder<T, E> {
        RetryPolicyBuilder::default().budget(self.attempts)
    }
}
