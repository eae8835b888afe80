//! The retry controller: an operation bound to a policy.

use super::policy::RetryPolicy;
use std::any::type_name;
use std::borrow::Cow;
use std::fmt;

/// A callable that takes its arguments as a tuple.
///
/// Implemented for every `Fn(A1, .., An) -> Result<T, E>` with up to six
/// arguments, so plain functions, closures and associated methods such as
/// `Service::fetch` can all be wrapped.
pub trait Operation<Args, T, E> {
    /// Run the operation once.
    fn invoke(&self, args: Args) -> Result<T, E>;
}

/// Argument tuples that can take a receiver in front.
pub trait Prepend<H> {
    /// The tuple with `H` as its first element.
    type Output;

    /// Put `head` in front of the tuple.
    fn prepend(self, head: H) -> Self::Output;
}

macro_rules! impl_operation {
    ($($arg:ident),*) => {
        impl<F, T, E, $($arg,)*> Operation<($($arg,)*), T, E> for F
        where
            F: Fn($($arg),*) -> Result<T, E>,
        {
            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Result<T, E> {
                self($($arg),*)
            }
        }
    };
}

macro_rules! impl_prepend {
    ($($arg:ident),*) => {
        impl<H, $($arg,)*> Prepend<H> for ($($arg,)*) {
            type Output = (H, $($arg,)*);

            #[allow(non_snake_case)]
            fn prepend(self, head: H) -> Self::Output {
                let ($($arg,)*) = self;
                (head, $($arg,)*)
            }
        }
    };
}

impl_operation!();
impl_operation!(A1);
impl_operation!(A1, A2);
impl_operation!(A1, A2, A3);
impl_operation!(A1, A2, A3, A4);
impl_operation!(A1, A2, A3, A4, A5);
impl_operation!(A1, A2, A3, A4, A5, A6);

impl_prepend!();
impl_prepend!(A1);
impl_prepend!(A1, A2);
impl_prepend!(A1, A2, A3);
impl_prepend!(A1, A2, A3, A4);
impl_prepend!(A1, A2, A3, A4, A5);

/// An operation wrapped in a [`RetryPolicy`].
///
/// Construction never runs the operation. Every [`call`](Self::call) starts
/// a fresh attempt loop; nothing is carried over between calls, so a shared
/// `Retry` can be invoked from several threads at once.
///
/// Calls go through `&self`, so the operation must be `Fn`. Closures that
/// mutate captured state need interior mutability (`Cell`, `Mutex`,
/// atomics); for a one-off `FnMut`, use [`RetryPolicy::execute`] instead.
///
/// # Examples
///
/// ```rust
/// use turboretry::{retry, Condition};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// type DynError = Box<dyn std::error::Error + Send + Sync>;
///
/// let calls = AtomicU32::new(0);
/// let parse = retry()
///     .budget(3)
///     .retry_on(Condition::error::<std::num::ParseIntError>())
///     .wrap(|input: &str| -> Result<u32, DynError> {
///         let n = calls.fetch_add(1, Ordering::SeqCst);
///         let text = if n < 2 { "not a number" } else { input };
///         Ok(text.parse::<u32>()?)
///     })
///     .unwrap();
///
/// assert_eq!(parse.call(("17",)).unwrap(), 17);
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// ```
pub struct Retry<F, T, E> {
    name: Cow<'static, str>,
    operation: F,
    policy: RetryPolicy<T, E>,
}

impl<F, T, E> Retry<F, T, E> {
    /// Bind `operation` to `policy`.
    pub fn new(operation: F, policy: RetryPolicy<T, E>) -> Self {
        Self {
            name: Cow::Borrowed(type_name::<F>()),
            operation,
            policy,
        }
    }

    /// Override the name used in log records.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Name used in log records. Defaults to the operation's type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The policy driving this controller.
    pub fn policy(&self) -> &RetryPolicy<T, E> {
        &self.policy
    }

    /// The wrapped operation.
    pub fn operation(&self) -> &F {
        &self.operation
    }

    /// Invoke the operation under the policy, forwarding `args` to every
    /// attempt.
    pub fn call<Args>(&self, args: Args) -> Result<T, E>
    where
        F: Operation<Args, T, E>,
        Args: Clone,
    {
        self.policy
            .run(&self.name, || self.operation.invoke(args.clone()))
    }

    /// Bind a receiver, producing a callable that passes `receiver` as the
    /// first argument of every attempt.
    ///
    /// The receiver is borrowed shared, so only `&self` methods can be bound.
    /// Receivers whose methods need `&mut self` should keep the mutable
    /// parts behind a `RefCell` or `Mutex`.
    ///
    /// ```rust
    /// use turboretry::RetryPolicy;
    /// use std::convert::Infallible;
    ///
    /// struct Greeter { greeting: &'static str }
    ///
    /// impl Greeter {
    ///     fn greet(&self, who: &str) -> Result<String, Infallible> {
    ///         Ok(format!("{}, {who}", self.greeting))
    ///     }
    /// }
    ///
    /// let greet = RetryPolicy::default().wrap(Greeter::greet);
    /// let hello = Greeter { greeting: "hello" };
    /// let hi = Greeter { greeting: "hi" };
    ///
    /// assert_eq!(greet.bind(&hello).call(("ada",)).unwrap(), "hello, ada");
    /// assert_eq!(greet.bind(&hi).call(("ada",)).unwrap(), "hi, ada");
    /// ```
    pub fn bind<'a, S: ?Sized>(&'a self, receiver: &'a S) -> Bound<'a, S, F, T, E> {
        Bound {
            retry: self,
            receiver,
        }
    }
}

impl<F: Clone, T, E> Clone for Retry<F, T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            operation: self.operation.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<F, T, E> fmt::Debug for Retry<F, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A [`Retry`] attached to one receiver.
pub struct Bound<'a, S: ?Sized, F, T, E> {
    retry: &'a Retry<F, T, E>,
    receiver: &'a S,
}

impl<'a, S: ?Sized, F, T, E> Bound<'a, S, F, T, E> {
    /// The bound receiver.
    pub fn receiver(&self) -> &'a S {
        self.receiver
    }

    /// Invoke with the receiver prepended to `args`.
    pub fn call<Args>(&self, args: Args) -> Result<T, E>
    where
        Args: Prepend<&'a S> + Clone,
        F: Operation<Args::Output, T, E>,
    {
        let retry = self.retry;
        retry.policy.run(&retry.name, || {
            retry.operation.invoke(args.clone().prepend(self.receiver))
        })
    }
}

impl<S: ?Sized, F, T, E> Clone for Bound<'_, S, F, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized, F, T, E> Copy for Bound<'_, S, F, T, E> {}

impl<S: ?Sized, F, T, E> fmt::Debug for Bound<'_, S, F, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("retry", self.retry)
            .finish_non_exhaustive()
    }
}
