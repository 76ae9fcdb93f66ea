//! Circuit breaker types and configuration

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, operations proceed normally
    Closed,
    /// Circuit is open, operations are rejected
    Open,
    /// Circuit is half-open, a single probe call is allowed to test recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open => f.write_str("open"),
            Self::HalfOpen => f.write_str("half_open"),
        }
    }
}

/// Configuration for circuit breaker behavior
///
/// Durations deserialize from humantime strings, so a config file can say
/// `recovery_timeout = "30s"`.
///
/// # Example
/// ```
/// use fusebox_core::CircuitBreakerConfig;
/// use std::time::Duration;
///
/// let config = CircuitBreakerConfig::default()
///     .with_failure_threshold(3)
///     .with_recovery_timeout(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive classified failures before opening the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe call is allowed
    #[serde(with = "humantime_serde")]
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config for aggressive circuit breaking
    pub fn aggressive() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(15),
        }
    }

    /// Create a config for lenient circuit breaking
    pub fn lenient() -> Self {
        Self {
            failure_threshold: 10,
            recovery_timeout: Duration::from_secs(60),
        }
    }

    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, failure_threshold: u32) -> Self {
        self.failure_threshold = failure_threshold;
        self
    }

    /// Set the recovery timeout
    pub fn with_recovery_timeout(mut self, recovery_timeout: Duration) -> Self {
        self.recovery_timeout = recovery_timeout;
        self
    }

    /// Check the config for values that would make the state machine
    /// degenerate
    ///
    /// A zero threshold opens the circuit on the first failure regardless of
    /// intent and a zero timeout never rejects anything; both fail here, at
    /// construction time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        if self.recovery_timeout.is_zero() {
            return Err(ConfigError::ZeroRecoveryTimeout);
        }
        Ok(())
    }
}

/// Invalid circuit breaker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `failure_threshold` must be positive
    #[error("failure_threshold must be greater than zero")]
    ZeroFailureThreshold,
    /// `recovery_timeout` must be positive
    #[error("recovery_timeout must be greater than zero")]
    ZeroRecoveryTimeout,
}

/// Error from guarded calls
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit rejected the call without invoking the operation
    #[error("circuit '{name}' is open ({failure_count} failures, retry in {retry_after:?})")]
    Open {
        /// Name of the rejecting circuit
        name: String,
        /// Consecutive failures recorded by the circuit
        failure_count: u32,
        /// When the circuit will next allow a probe call
        open_until: Instant,
        /// Time until a probe call will be allowed, zero once elapsed
        retry_after: Duration,
    },
    /// The operation ran and failed; the original error is carried unchanged
    #[error("operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    /// True when the call was rejected by the circuit rather than failed by
    /// the operation
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The operation's own error, if the operation ran at all
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Open { .. } => None,
            Self::OperationFailed(error) => Some(error),
        }
    }
}

/// Point-in-time snapshot of a circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    /// Current state
    pub state: CircuitState,
    /// Consecutive classified failures since the circuit last closed
    pub failure_count: u32,
    /// Calls that reached the operation over the breaker's lifetime
    pub total_calls: u64,
    /// Classified failures over the breaker's lifetime
    pub total_failures: u64,
    /// Calls rejected without running over the breaker's lifetime
    pub total_rejections: u64,
    /// When the circuit last opened, if it is currently open
    pub opened_at: Option<Instant>,
    /// When the last classified failure was recorded
    pub last_failure: Option<Instant>,
}

impl CircuitBreakerStats {
    /// Failure rate as a percentage of calls that reached the operation
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            (self.total_failures as f64 / self.total_calls as f64) * 100.0
        }
    }
}
