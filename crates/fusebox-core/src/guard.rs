//! Wrapping sugar for guarded operations
//!
//! Binds a breaker to a reusable operation so call sites do not repeat the
//! breaker plumbing, and lets the registry name a circuit after the operation
//! it protects. Purely mechanical forwarding to [`CircuitBreaker::call`].

use std::any::type_name;
use std::future::Future;
use std::sync::Arc;

use crate::breaker::CircuitBreaker;
use crate::registry::CircuitBreakerRegistry;
use crate::types::CircuitBreakerError;

/// A fallible operation bound to the circuit breaker guarding it
#[derive(Debug, Clone)]
pub struct Guarded<F> {
    breaker: Arc<CircuitBreaker>,
    operation: F,
}

impl<F> Guarded<F> {
    /// Bind `operation` to `breaker`
    pub fn new(breaker: Arc<CircuitBreaker>, operation: F) -> Self {
        Self { breaker, operation }
    }

    /// The breaker guarding this operation
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<F, Fut, T, E> Guarded<F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: 'static,
{
    /// Run the bound operation under the breaker's rules
    pub async fn call(&self) -> Result<T, CircuitBreakerError<E>> {
        self.breaker.call(&self.operation).await
    }
}

impl CircuitBreaker {
    /// Bind a reusable operation to this breaker
    pub fn guard<F>(self: &Arc<Self>, operation: F) -> Guarded<F> {
        Guarded::new(Arc::clone(self), operation)
    }
}

impl CircuitBreakerRegistry {
    /// Guard an operation with a circuit named after it
    ///
    /// The circuit name is derived from the operation's type name, so passing
    /// a named function guards it under that function's name. The breaker is
    /// created with the registry's default config if it does not exist yet
    /// and is registered either way.
    ///
    /// # Example
    /// ```
    /// use fusebox_core::CircuitBreakerRegistry;
    ///
    /// async fn fetch_quote() -> Result<u64, std::io::Error> {
    ///     Ok(42)
    /// }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let registry = CircuitBreakerRegistry::new();
    /// let guarded = registry.guard(fetch_quote);
    ///
    /// assert_eq!(guarded.call().await.unwrap(), 42);
    /// assert!(registry.get("fetch_quote").is_some());
    /// # }
    /// ```
    pub fn guard<F>(&self, operation: F) -> Guarded<F> {
        let breaker = self.get_or_create(operation_name::<F>());
        Guarded::new(breaker, operation)
    }
}

/// Short name of an operation derived from its type
///
/// `my_app::io::fetch_user` becomes `fetch_user`; closure markers in
/// compiler-generated names are trimmed first, so a closure defined in
/// `my_app::sync` is named `sync`.
fn operation_name<F>() -> &'static str {
    let full = type_name::<F>().trim_end_matches("::{{closure}}");
    full.rsplit("::").next().unwrap_or(full)
}
