//! Circuit breaker primitives for guarding unreliable operations
//!
//! A [`CircuitBreaker`] wraps a fallible async operation, counts consecutive
//! failures, and short-circuits calls once a threshold is crossed, giving the
//! dependency behind the operation time to recover before it is probed again.
//! A [`CircuitBreakerRegistry`] tracks every breaker in the process by name
//! for health checks and monitoring.
//!
//! The breaker never retries, never wraps the operation's own errors beyond
//! carrying them, and imposes no timeout on the operation; those concerns
//! compose around it.
//!
//! # Example
//! ```
//! use fusebox_core::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = CircuitBreakerConfig::default()
//!     .with_failure_threshold(3)
//!     .with_recovery_timeout(Duration::from_secs(10));
//! let breaker = CircuitBreaker::with_config("payments-api", config).unwrap();
//!
//! let result: Result<&str, CircuitBreakerError<std::io::Error>> =
//!     breaker.call(|| async { Ok("charged") }).await;
//! assert_eq!(result.unwrap(), "charged");
//! # }
//! ```

pub mod breaker;
pub mod classify;
pub mod guard;
pub mod registry;
pub mod types;


pub use breaker::CircuitBreaker;
pub use classify::FailureClassifier;
pub use guard::Guarded;
pub use registry::CircuitBreakerRegistry;
pub use types::{
    CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState, ConfigError,
};
