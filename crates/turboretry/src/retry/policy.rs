//! The retry decision engine.

use super::condition::ConditionSet;
use super::controller::Retry;
use crate::config::Budget;
use crate::error::{ConfigError, Result};
use crate::outcome::Outcome;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

type FinishHook<T, E> = Arc<dyn Fn(Outcome<&T, &E>) + Send + Sync>;

/// What to do after classifying one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The exit-on set matched; stop now.
    Exit,
    /// The retry-on set matched; go again if budget remains.
    Retry,
    /// Nothing asked for another attempt; stop now.
    Finish,
}

/// Why an invocation stopped making attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An exit condition matched.
    ExitCondition,
    /// No retry condition matched.
    NotRetryable,
    /// Every attempt in the budget was used.
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExitCondition => "exit condition matched",
            Self::NotRetryable => "no retry condition matched",
            Self::BudgetExhausted => "attempt budget exhausted",
        })
    }
}

/// An immutable retry policy: attempt budget, retry-on and exit-on
/// conditions, and an optional finish hook.
///
/// A policy holds no per-invocation state, so one instance can drive any
/// number of invocations, including concurrent ones from several threads.
///
/// # Examples
///
/// ```rust
/// use turboretry::{Condition, RetryPolicy};
/// use std::cell::Cell;
///
/// let policy = RetryPolicy::builder()
///     .budget(3)
///     .retry_on(Condition::value(|v: &u32| *v == 1))
///     .build()
///     .unwrap();
///
/// let values = [1, 1, 2];
/// let calls = Cell::new(0);
/// let result = policy.execute(|| {
///     let value = values[calls.get()];
///     calls.set(calls.get() + 1);
///     Ok::<_, std::io::Error>(value)
/// });
///
/// assert_eq!(result.unwrap(), 2);
/// assert_eq!(calls.get(), 3);
/// ```
pub struct RetryPolicy<T, E> {
    budget: Budget,
    retry_on: ConditionSet<T, E>,
    exit_on: ConditionSet<T, E>,
    on_finish: Option<FinishHook<T, E>>,
}

impl<T, E> RetryPolicy<T, E> {
    /// Create a new builder.
    pub fn builder() -> RetryPolicyBuilder<T, E> {
        RetryPolicyBuilder::default()
    }

    /// Total attempts per invocation.
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Conditions that ask for another attempt.
    pub fn retry_on(&self) -> &ConditionSet<T, E> {
        &self.retry_on
    }

    /// Conditions that stop the loop, overriding `retry_on`.
    pub fn exit_on(&self) -> &ConditionSet<T, E> {
        &self.exit_on
    }

    /// Classify one outcome. Exit conditions are checked first and win.
    pub fn decide(&self, outcome: Outcome<&T, &E>) -> Decision {
        if self.exit_on.matches(outcome) {
            Decision::Exit
        } else if self.retry_on.matches(outcome) {
            Decision::Retry
        } else {
            Decision::Finish
        }
    }

    /// Run `operation` under this policy.
    ///
    /// Returns the last value, or the last error unchanged. The finish hook,
    /// if any, sees the final outcome exactly once before it is returned.
    pub fn execute<F>(&self, operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.run("operation", operation)
    }

    /// Bind `operation` to a copy of this policy.
    pub fn wrap<F>(&self, operation: F) -> Retry<F, T, E> {
        Retry::new(operation, self.clone())
    }

    pub(crate) fn run<F>(&self, name: &str, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::debug_span!("retry", operation = name, budget = self.budget.get()).entered();
        #[cfg(not(feature = "tracing"))]
        let _ = name;

        let mut remaining = self.budget.get();
        let mut attempt = 0u32;

        let (outcome, reason) = loop {
            remaining -= 1;
            attempt += 1;

            let outcome = Outcome::from(operation());
            #[cfg(feature = "tracing")]
            trace!(attempt, remaining, outcome = outcome.kind(), "attempt finished");

            let decision = self.decide(outcome.as_ref());
            match decision {
                Decision::Exit => break (outcome, StopReason::ExitCondition),
                Decision::Finish => break (outcome, StopReason::NotRetryable),
                Decision::Retry if remaining == 0 => {
                    break (outcome, StopReason::BudgetExhausted);
                }
                Decision::Retry => {
                    #[cfg(feature = "tracing")]
                    debug!(attempt, remaining, "retrying");
                }
            }
        };

        log_stop(attempt, &outcome, reason);

        if let Some(on_finish) = &self.on_finish {
            on_finish(outcome.as_ref());
        }

        outcome.into_result()
    }
}

#[cfg(feature = "tracing")]
fn log_stop<T, E>(attempts: u32, outcome: &Outcome<T, E>, reason: StopReason) {
    match reason {
        StopReason::BudgetExhausted => warn!(
            attempts,
            outcome = outcome.kind(),
            "giving up: {reason}"
        ),
        _ => debug!(attempts, outcome = outcome.kind(), "stopped: {reason}"),
    }
}

#[cfg(not(feature = "tracing"))]
fn log_stop<T, E>(_attempts: u32, _outcome: &Outcome<T, E>, _reason: StopReason) {}

impl<T, E> Clone for RetryPolicy<T, E> {
    fn clone(&self) -> Self {
        Self {
            budget: self.budget,
            retry_on: self.retry_on.clone(),
            exit_on: self.exit_on.clone(),
            on_finish: self.on_finish.clone(),
        }
    }
}

impl<T, E> Default for RetryPolicy<T, E> {
    /// One attempt, no conditions: a transparent pass-through.
    fn default() -> Self {
        Self {
            budget: Budget::ONE,
            retry_on: ConditionSet::empty(),
            exit_on: ConditionSet::empty(),
            on_finish: None,
        }
    }
}

impl<T, E> fmt::Debug for RetryPolicy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("budget", &self.budget)
            .field("retry_on", &self.retry_on)
            .field("exit_on", &self.exit_on)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Builder for [`RetryPolicy`].
///
/// Budget validation is deferred to [`build`](Self::build) so the builder
/// can be chained without intermediate `?`.
///
/// # Examples
///
/// ```rust
/// use turboretry::{retry, ConfigError};
///
/// let err = retry::<(), std::io::Error>().budget(0).build().unwrap_err();
/// assert!(matches!(err, ConfigError::InvalidBudget { .. }));
/// ```
pub struct RetryPolicyBuilder<T, E> {
    budget: Result<Budget>,
    retry_on: ConditionSet<T, E>,
    exit_on: ConditionSet<T, E>,
    on_finish: Option<FinishHook<T, E>>,
}

impl<T, E> Default for RetryPolicyBuilder<T, E> {
    fn default() -> Self {
        Self {
            budget: Ok(Budget::ONE),
            retry_on: ConditionSet::empty(),
            exit_on: ConditionSet::empty(),
            on_finish: None,
        }
    }
}

impl<T, E> RetryPolicyBuilder<T, E> {
    /// Set the total attempt count.
    ///
    /// Default: 1
    pub fn budget<B>(mut self, budget: B) -> Self
    where
        B: TryInto<Budget>,
        B::Error: Into<ConfigError>,
    {
        self.budget = budget.try_into().map_err(Into::into);
        self
    }

    /// Set the conditions that ask for another attempt.
    ///
    /// Accepts a single [`Condition`](super::Condition), an error kind, a
    /// value predicate, an `Option`, or a collection of conditions.
    ///
    /// Default: none (exactly one attempt)
    pub fn retry_on(mut self, conditions: impl Into<ConditionSet<T, E>>) -> Self {
        self.retry_on = conditions.into();
        self
    }

    /// Set the conditions that stop the loop immediately.
    ///
    /// Default: none
    pub fn exit_on(mut self, conditions: impl Into<ConditionSet<T, E>>) -> Self {
        self.exit_on = conditions.into();
        self
    }

    /// Set a hook that observes the final outcome of every invocation.
    pub fn on_finish<H>(mut self, hook: H) -> Self
    where
        H: Fn(Outcome<&T, &E>) + Send + Sync + 'static,
    {
        self.on_finish = Some(Arc::new(hook));
        self
    }

    /// Validate and build the policy.
    pub fn build(self) -> Result<RetryPolicy<T, E>> {
        Ok(RetryPolicy {
            budget: self.budget?,
            retry_on: self.retry_on,
            exit_on: self.exit_on,
            on_finish: self.on_finish,
        })
    }

    /// Build the policy and bind `operation` to it.
    pub fn wrap<F>(self, operation: F) -> Result<Retry<F, T, E>> {
        Ok(Retry::new(operation, self.build()?))
    }

    /// Build the policy and bind `operation` under an explicit name.
    pub fn wrap_named<F>(
        self,
        name: impl Into<Cow<'static, str>>,
        operation: F,
    ) -> Result<Retry<F, T, E>> {
        Ok(self.wrap(operation)?.with_name(name))
    }
}

impl<T, E> fmt::Debug for RetryPolicyBuilder<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicyBuilder")
            .field("budget", &self.budget)
            .field("retry_on", &self.retry_on)
            .field("exit_on", &self.exit_on)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Condition;
    use std::cell::Cell;
    use std::io;
    use std::sync::Mutex;

    fn timed_out() -> Condition<u32, io::Error> {
        Condition::error_matching("timed out", |e: &io::Error| {
            e.kind() == io::ErrorKind::TimedOut
        })
    }

    #[test]
    fn test_default_policy_is_pass_through() {
        let policy = RetryPolicy::<u32, io::Error>::default();
        let calls = Cell::new(0);

        let result = policy.execute(|| {
            calls.set(calls.get() + 1);
            Err(io::Error::from(io::ErrorKind::TimedOut))
        });

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_decide_exit_wins_over_retry() {
        let policy = RetryPolicy::builder()
            .budget(5)
            .retry_on(timed_out())
            .exit_on(timed_out())
            .build()
            .unwrap();

        let err = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(policy.decide(Outcome::Error(&err)), Decision::Exit);
        assert_eq!(policy.decide(Outcome::Value(&1)), Decision::Finish);
    }

    #[test]
    fn test_decide_retry_and_finish() {
        let policy = RetryPolicy::builder()
            .retry_on(timed_out())
            .build()
            .unwrap();

        let timed = io::Error::from(io::ErrorKind::TimedOut);
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(policy.decide(Outcome::Error(&timed)), Decision::Retry);
        assert_eq!(policy.decide(Outcome::Error(&missing)), Decision::Finish);
    }

    #[test]
    fn test_retry_success_on_third_attempt() {
        let policy = RetryPolicy::builder()
            .budget(5)
            .retry_on(timed_out())
            .build()
            .unwrap();

        let calls = Cell::new(0u32);
        let result = policy.execute(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(io::Error::from(io::ErrorKind::TimedOut))
            } else {
                Ok(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_budget_exhausted_returns_last_error() {
        let policy = RetryPolicy::builder()
            .budget(3)
            .retry_on(timed_out())
            .build()
            .unwrap();

        let calls = Cell::new(0u32);
        let result: std::result::Result<u32, io::Error> = policy.execute(|| {
            calls.set(calls.get() + 1);
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("attempt {}", calls.get()),
            ))
        });

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "attempt 3");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_non_matching_error_stops_immediately() {
        let policy = RetryPolicy::builder()
            .budget(4)
            .retry_on(timed_out())
            .build()
            .unwrap();

        let calls = Cell::new(0u32);
        let result: std::result::Result<u32, io::Error> = policy.execute(|| {
            calls.set(calls.get() + 1);
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        });

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_exit_on_value_stops_retrying() {
        let policy = RetryPolicy::builder()
            .budget(10)
            .retry_on(Condition::value(|v: &u32| *v < 100))
            .exit_on(Condition::value(|v: &u32| *v == 3))
            .build()
            .unwrap();

        let calls = Cell::new(0u32);
        let result = policy.execute(|| {
            calls.set(calls.get() + 1);
            Ok::<_, io::Error>(calls.get())
        });

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_on_finish_sees_final_outcome_once() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);

        let policy = RetryPolicy::builder()
            .budget(3)
            .retry_on(Condition::value(|v: &u32| *v < 2))
            .on_finish(move |outcome: Outcome<&u32, &io::Error>| {
                sink.lock().unwrap().push(outcome.value().map(|v| **v));
            })
            .build()
            .unwrap();

        let calls = Cell::new(0u32);
        let result = policy.execute(|| {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        });

        assert_eq!(result.unwrap(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![Some(2)]);
    }

    #[test]
    fn test_invocations_are_independent() {
        let policy = RetryPolicy::builder()
            .budget(2)
            .retry_on(timed_out())
            .build()
            .unwrap();

        for _ in 0..3 {
            let calls = Cell::new(0u32);
            let _ = policy.execute(|| {
                calls.set(calls.get() + 1);
                Err::<u32, _>(io::Error::from(io::ErrorKind::TimedOut))
            });
            assert_eq!(calls.get(), 2);
        }
    }

    #[test]
    fn test_builder_keeps_budget_error_until_build() {
        let builder = RetryPolicy::<u32, io::Error>::builder()
            .budget(-1)
            .retry_on(timed_out());

        assert_eq!(
            builder.build().unwrap_err(),
            ConfigError::InvalidBudget {
                value: "-1".to_string()
            }
        );
    }

    #[test]
    fn test_condition_accessors() {
        let policy = RetryPolicy::builder()
            .budget(2)
            .retry_on(vec![timed_out(), Condition::value(|v: &u32| *v == 0)])
            .build()
            .unwrap();

        assert_eq!(policy.retry_on().error_kinds().len(), 1);
        assert_eq!(policy.retry_on().error_kinds()[0].name(), "timed out");
        assert_eq!(policy.retry_on().predicate_count(), 1);
        assert!(policy.exit_on().is_empty());
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::BudgetExhausted.to_string(), "attempt budget exhausted");
        assert_eq!(StopReason::ExitCondition.to_string(), "exit condition matched");
    }
}
