#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Bounded, predicate-driven retry for synchronous operations.
//!
//! `turboretry` wraps an operation and re-invokes it up to a fixed number of
//! attempts. After every attempt the outcome is classified:
//!
//! - **Exit-on** conditions stop the loop immediately and always win
//! - **Retry-on** conditions ask for another attempt while budget remains
//! - Anything else stops the loop
//!
//! The final value is returned, or the final error is handed back unchanged.
//! An optional finish hook observes that final outcome exactly once.
//!
//! Conditions come in two kinds: error-kind matchers, tested only against
//! errors, and value predicates, tested only against returned values.
//!
//! There is no backoff, jitter or async support; attempts run back to back
//! on the caller's thread.
//!
//! # Examples
//!
//! ```rust
//! use turboretry::prelude::*;
//! use std::cell::Cell;
//! use std::io;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let calls = Cell::new(0);
//! let fetch = retry()
//!     .budget(3)
//!     .retry_on(Condition::error_matching("timed out", |e: &io::Error| {
//!         e.kind() == io::ErrorKind::TimedOut
//!     }))
//!     .wrap(|| {
//!         calls.set(calls.get() + 1);
//!         if calls.get() < 3 {
//!             Err(io::Error::from(io::ErrorKind::TimedOut))
//!         } else {
//!             Ok("ok")
//!         }
//!     })?;
//!
//! assert_eq!(fetch.call(())?, "ok");
//! assert_eq!(calls.get(), 3);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod outcome;
pub mod retry;

pub use config::{Budget, RetrySettings};
pub use error::{ConfigError, Result};
pub use outcome::Outcome;
pub use retry::{
    Bound, Condition, ConditionSet, Decision, DowncastError, ErrorKind, Operation, Prepend, Retry,
    RetryPolicy, RetryPolicyBuilder, StopReason, ValuePredicate,
};

/// Start configuring a retry policy.
///
/// Shorthand for [`RetryPolicy::builder`]; finish with
/// [`build`](RetryPolicyBuilder::build) for a reusable policy or
/// [`wrap`](RetryPolicyBuilder::wrap) to bind an operation directly.
pub fn retry<T, E>() -> RetryPolicyBuilder<T, E> {
    RetryPolicy::builder()
}

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use turboretry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::retry;
    pub use crate::{Budget, Condition, ConfigError, ErrorKind, Outcome, Retry, RetryPolicy};
}
