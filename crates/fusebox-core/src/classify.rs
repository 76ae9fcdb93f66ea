//! Failure classification for guarded calls
//!
//! Not every error an operation returns means the dependency behind it is
//! unhealthy. The classifier decides which errors count against the circuit;
//! everything else passes through without touching the failure counter.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether an operation error counts as a circuit failure
///
/// Supplied at construction. The default accepts every error. Errors the
/// classifier does not accept are out of scope for the circuit: they are not
/// counted, do not reset the counter, and propagate to the caller unchanged.
///
/// # Example
/// ```
/// use fusebox_core::FailureClassifier;
///
/// #[derive(Debug)]
/// enum ApiError {
///     Unavailable,
///     InvalidRequest,
/// }
///
/// // Only availability problems should trip the circuit.
/// let classifier =
///     FailureClassifier::matching::<ApiError>(|e| matches!(e, ApiError::Unavailable));
/// ```
#[derive(Clone)]
pub struct FailureClassifier {
    matcher: Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>,
}

impl FailureClassifier {
    /// Every error counts (the default)
    pub fn all() -> Self {
        Self {
            matcher: Arc::new(|_| true),
        }
    }

    /// Only errors of the concrete type `E` count
    pub fn of_type<E: 'static>() -> Self {
        Self {
            matcher: Arc::new(|error| error.is::<E>()),
        }
    }

    /// Errors of type `E` accepted by the predicate count
    pub fn matching<E: 'static>(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            matcher: Arc::new(move |error| {
                error.downcast_ref::<E>().is_some_and(|e| predicate(e))
            }),
        }
    }

    /// Full control over the raw error value
    pub fn custom(matcher: impl Fn(&dyn Any) -> bool + Send + Sync + 'static) -> Self {
        Self {
            matcher: Arc::new(matcher),
        }
    }

    /// Whether the given error counts against the circuit
    pub(crate) fn counts(&self, error: &dyn Any) -> bool {
        (self.matcher)(error)
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for FailureClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FailureClassifier")
    }
}
