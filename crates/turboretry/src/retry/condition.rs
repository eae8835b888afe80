//! Conditions that classify an attempt's outcome.
//!
//! A [`Condition`] is either an error-kind matcher or a predicate over the
//! returned value. Any number of them compile into a [`ConditionSet`], which
//! keeps the two kinds in separate lists so that matching never has to sort
//! them out again.

use crate::outcome::Outcome;
use std::any::type_name;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Errors that can be asked whether they are a specific concrete type.
///
/// Implemented for the dynamic error containers; concrete error enums use
/// [`ErrorKind::new`] with a variant matcher instead.
pub trait DowncastError {
    /// Returns `true` if the underlying error is a `K`.
    fn is_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static;
}

impl DowncastError for Box<dyn StdError + Send + Sync + 'static> {
    fn is_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static,
    {
        (**self).is::<K>()
    }
}

impl DowncastError for Box<dyn StdError + Send + 'static> {
    fn is_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static,
    {
        (**self).is::<K>()
    }
}

impl DowncastError for Box<dyn StdError + 'static> {
    fn is_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static,
    {
        (**self).is::<K>()
    }
}

impl DowncastError for anyhow::Error {
    fn is_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static,
    {
        self.is::<K>()
    }
}

fn downcasts_to<E, K>(err: &E) -> bool
where
    E: DowncastError,
    K: StdError + Send + Sync + 'static,
{
    err.is_kind::<K>()
}

/// A named test for one kind of error.
pub struct ErrorKind<E> {
    name: Cow<'static, str>,
    matcher: fn(&E) -> bool,
}

impl<E> ErrorKind<E> {
    /// A kind defined by an arbitrary matcher, e.g. a single enum variant.
    ///
    /// ```rust
    /// use turboretry::ErrorKind;
    /// use std::io;
    ///
    /// let timed_out = ErrorKind::new("timed out", |e: &io::Error| {
    ///     e.kind() == io::ErrorKind::TimedOut
    /// });
    /// assert!(timed_out.matches(&io::Error::from(io::ErrorKind::TimedOut)));
    /// ```
    pub fn new(name: impl Into<Cow<'static, str>>, matcher: fn(&E) -> bool) -> Self {
        Self {
            name: name.into(),
            matcher,
        }
    }

    /// Matches when the error downcasts to `K`.
    pub fn of<K>() -> Self
    where
        E: DowncastError,
        K: StdError + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed(type_name::<K>()),
            matcher: downcasts_to::<E, K>,
        }
    }

    /// Human-readable name of the kind.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `err` is of this kind.
    pub fn matches(&self, err: &E) -> bool {
        (self.matcher)(err)
    }
}

impl<E> Clone for ErrorKind<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            matcher: self.matcher,
        }
    }
}

impl<E> fmt::Debug for ErrorKind<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorKind").field(&self.name).finish()
    }
}

/// A predicate over an operation's returned value.
pub struct ValuePredicate<T> {
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> ValuePredicate<T> {
    /// Wrap a predicate function.
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate.
    pub fn test(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

impl<T> Clone for ValuePredicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for ValuePredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValuePredicate(..)")
    }
}

/// One classification rule.
#[derive(Debug)]
pub enum Condition<T, E> {
    /// Matches `Error` outcomes of a given kind.
    Error(ErrorKind<E>),
    /// Matches `Value` outcomes for which the predicate holds.
    Value(ValuePredicate<T>),
}

impl<T, E> Condition<T, E> {
    /// Shorthand for `Condition::Error(ErrorKind::of::<K>())`.
    pub fn error<K>() -> Self
    where
        E: DowncastError,
        K: StdError + Send + Sync + 'static,
    {
        Self::Error(ErrorKind::of::<K>())
    }

    /// Shorthand for `Condition::Error(ErrorKind::new(name, matcher))`.
    pub fn error_matching(name: impl Into<Cow<'static, str>>, matcher: fn(&E) -> bool) -> Self {
        Self::Error(ErrorKind::new(name, matcher))
    }

    /// Shorthand for `Condition::Value(ValuePredicate::new(predicate))`.
    pub fn value<P>(predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::Value(ValuePredicate::new(predicate))
    }
}

impl<T, E> Clone for Condition<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Error(kind) => Self::Error(kind.clone()),
            Self::Value(predicate) => Self::Value(predicate.clone()),
        }
    }
}

impl<T, E> From<ErrorKind<E>> for Condition<T, E> {
    fn from(kind: ErrorKind<E>) -> Self {
        Self::Error(kind)
    }
}

impl<T, E> From<ValuePredicate<T>> for Condition<T, E> {
    fn from(predicate: ValuePredicate<T>) -> Self {
        Self::Value(predicate)
    }
}

/// A compiled classification policy.
///
/// Matching is the logical OR of every error kind (tested only against
/// `Error` outcomes) and every predicate (tested only against `Value`
/// outcomes, in insertion order). The empty set matches nothing.
///
/// # Examples
///
/// ```rust
/// use turboretry::{Condition, ConditionSet, Outcome};
///
/// type DynError = Box<dyn std::error::Error + Send + Sync>;
///
/// let set: ConditionSet<u32, DynError> = vec![
///     Condition::error::<std::fmt::Error>(),
///     Condition::value(|v: &u32| *v == 0),
/// ]
/// .into();
///
/// assert!(set.matches(Outcome::Value(&0)));
/// assert!(!set.matches(Outcome::Value(&1)));
///
/// let err: DynError = Box::new(std::fmt::Error);
/// assert!(set.matches(Outcome::Error(&err)));
/// ```
pub struct ConditionSet<T, E> {
    error_kinds: Vec<ErrorKind<E>>,
    predicates: Vec<ValuePredicate<T>>,
}

impl<T, E> ConditionSet<T, E> {
    /// The set that matches nothing.
    pub fn empty() -> Self {
        Self {
            error_kinds: Vec::new(),
            predicates: Vec::new(),
        }
    }

    /// Returns `true` if the set holds no conditions.
    pub fn is_empty(&self) -> bool {
        self.error_kinds.is_empty() && self.predicates.is_empty()
    }

    /// Add one condition to the matching list for its kind.
    pub fn push(&mut self, condition: impl Into<Condition<T, E>>) {
        match condition.into() {
            Condition::Error(kind) => self.error_kinds.push(kind),
            Condition::Value(predicate) => self.predicates.push(predicate),
        }
    }

    /// The error kinds, in insertion order.
    pub fn error_kinds(&self) -> &[ErrorKind<E>] {
        &self.error_kinds
    }

    /// Number of value predicates.
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    /// Classify an outcome.
    pub fn matches(&self, outcome: Outcome<&T, &E>) -> bool {
        match outcome {
            Outcome::Error(err) => self.error_kinds.iter().any(|kind| kind.matches(err)),
            Outcome::Value(value) => self.predicates.iter().any(|p| p.test(value)),
        }
    }
}

impl<T, E> Default for ConditionSet<T, E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, E> Clone for ConditionSet<T, E> {
    fn clone(&self) -> Self {
        Self {
            error_kinds: self.error_kinds.clone(),
            predicates: self.predicates.clone(),
        }
    }
}

impl<T, E> fmt::Debug for ConditionSet<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionSet")
            .field("error_kinds", &self.error_kinds)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

impl<T, E> Extend<Condition<T, E>> for ConditionSet<T, E> {
    fn extend<I: IntoIterator<Item = Condition<T, E>>>(&mut self, iter: I) {
        for condition in iter {
            self.push(condition);
        }
    }
}

impl<T, E> FromIterator<Condition<T, E>> for ConditionSet<T, E> {
    fn from_iter<I: IntoIterator<Item = Condition<T, E>>>(iter: I) -> Self {
        let mut set = Self::empty();
        set.extend(iter);
        set
    }
}

impl<T, E> From<Condition<T, E>> for ConditionSet<T, E> {
    fn from(condition: Condition<T, E>) -> Self {
        std::iter::once(condition).collect()
    }
}

impl<T, E> From<ErrorKind<E>> for ConditionSet<T, E> {
    fn from(kind: ErrorKind<E>) -> Self {
        Condition::Error(kind).into()
    }
}

impl<T, E> From<ValuePredicate<T>> for ConditionSet<T, E> {
    fn from(predicate: ValuePredicate<T>) -> Self {
        Condition::Value(predicate).into()
    }
}

impl<T, E> From<Option<Condition<T, E>>> for ConditionSet<T, E> {
    fn from(condition: Option<Condition<T, E>>) -> Self {
        condition.into_iter().collect()
    }
}

impl<T, E> From<Vec<Condition<T, E>>> for ConditionSet<T, E> {
    fn from(conditions: Vec<Condition<T, E>>) -> Self {
        conditions.into_iter().collect()
    }
}

impl<T, E, const N: usize> From<[Condition<T, E>; N]> for ConditionSet<T, E> {
    fn from(conditions: [Condition<T, E>; N]) -> Self {
        conditions.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::io;

    type DynError = Box<dyn StdError + Send + Sync>;

    #[derive(Debug)]
    struct Flaky;

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("flaky")
        }
    }

    impl StdError for Flaky {}

    #[test]
    fn test_empty_set_matches_nothing() {
        let set: ConditionSet<u32, DynError> = ConditionSet::empty();
        let err: DynError = Box::new(Flaky);

        assert!(set.is_empty());
        assert!(!set.matches(Outcome::Value(&1)));
        assert!(!set.matches(Outcome::Error(&err)));
    }

    #[test]
    fn test_absent_condition_is_empty() {
        let set: ConditionSet<u32, DynError> = None.into();
        assert!(set.is_empty());
    }

    #[test]
    fn test_error_kind_downcast() {
        let set: ConditionSet<u32, DynError> = Condition::error::<Flaky>().into();

        let flaky: DynError = Box::new(Flaky);
        let other: DynError = Box::new(fmt::Error);

        assert!(set.matches(Outcome::Error(&flaky)));
        assert!(!set.matches(Outcome::Error(&other)));
        assert_eq!(set.error_kinds()[0].name(), type_name::<Flaky>());
    }

    #[test]
    fn test_error_kind_on_anyhow() {
        let kind = ErrorKind::<anyhow::Error>::of::<Flaky>();
        assert!(kind.matches(&anyhow::Error::new(Flaky)));
        assert!(!kind.matches(&anyhow::anyhow!("plain message")));
    }

    #[test]
    fn test_predicates_never_see_errors() {
        let set: ConditionSet<u32, io::Error> = Condition::value(|_: &u32| true).into();
        let err = io::Error::other("nope");

        assert!(set.matches(Outcome::Value(&0)));
        assert!(!set.matches(Outcome::Error(&err)));
    }

    #[test]
    fn test_mixed_collection_is_partitioned() {
        let set: ConditionSet<u32, io::Error> = [
            Condition::value(|v: &u32| *v == 1),
            Condition::error_matching("timed out", |e: &io::Error| {
                e.kind() == io::ErrorKind::TimedOut
            }),
            Condition::value(|v: &u32| *v == 2),
        ]
        .into();

        assert_eq!(set.error_kinds().len(), 1);
        assert_eq!(set.predicate_count(), 2);

        assert!(set.matches(Outcome::Value(&1)));
        assert!(set.matches(Outcome::Value(&2)));
        assert!(!set.matches(Outcome::Value(&3)));
        assert!(set.matches(Outcome::Error(&io::Error::from(io::ErrorKind::TimedOut))));
        assert!(!set.matches(Outcome::Error(&io::Error::from(io::ErrorKind::NotFound))));
    }

    #[test]
    fn test_predicates_short_circuit_in_order() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};

        let second_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&second_calls);

        let set: ConditionSet<u32, io::Error> = vec![
            Condition::value(|_: &u32| true),
            Condition::value(move |_: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
        ]
        .into();

        assert!(set.matches(Outcome::Value(&0)));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }
}
