//! Bounded retry driven by outcome classification.
//!
//! This module provides the retry decision engine: conditions that classify
//! an attempt's outcome, the policy that turns a classification into a
//! decision, and the controller that binds an operation to a policy.
//!
//! # Key Types
//!
//! - [`Condition`] / [`ConditionSet`] - Error-kind matchers and value predicates
//! - [`RetryPolicy`] - Budget, retry-on and exit-on sets, finish hook
//! - [`Retry`] - An operation wrapped in a policy
//! - [`Bound`] - A `Retry` attached to a receiver, for methods
//!
//! # Examples
//!
//! ```rust
//! use turboretry::retry::{Condition, RetryPolicy};
//! use std::io;
//!
//! let policy = RetryPolicy::builder()
//!     .budget(2)
//!     .retry_on(Condition::error_matching("interrupted", |e: &io::Error| {
//!         e.kind() == io::ErrorKind::Interrupted
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let result: Result<(), io::Error> =
//!     policy.execute(|| Err(io::ErrorKind::Interrupted.into()));
//! assert_eq!(result.unwrap_err().kind(), io::ErrorKind::Interrupted);
//! ```

mod condition;
mod controller;
mod policy;

pub use condition::{Condition, ConditionSet, DowncastError, ErrorKind, ValuePredicate};
pub use controller::{Bound, Operation, Prepend, Retry};
pub use policy::{Decision, RetryPolicy, RetryPolicyBuilder, StopReason};
