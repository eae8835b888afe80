//! The result of a single attempt.

/// What one invocation of the wrapped operation produced.
///
/// Exactly one of a returned value or a raised error, never both. Policies
/// inspect outcomes by reference through [`Outcome::as_ref`], so matching
/// never consumes the payload that is eventually handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome<T, E> {
    /// The operation returned normally.
    Value(T),
    /// The operation failed.
    Error(E),
}

impl<T, E> Outcome<T, E> {
    /// Returns `true` for [`Outcome::Value`].
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns `true` for [`Outcome::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The returned value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// The raised error, if any.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Value(_) => None,
            Self::Error(err) => Some(err),
        }
    }

    /// Borrow both payloads.
    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Self::Value(value) => Outcome::Value(value),
            Self::Error(err) => Outcome::Error(err),
        }
    }

    /// Short label used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Error(_) => "error",
        }
    }

    /// Convert back into a `Result`, re-raising the error if there is one.
    pub fn into_result(self) -> Result<T, E> {
        self.into()
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(err) => Self::Error(err),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Value(value) => Ok(value),
            Outcome::Error(err) => Err(err),
        }
    }
}
