//! Circuit breaker implementation

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::classify::FailureClassifier;
use crate::types::{
    CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState, ConfigError,
};

/// Mutable state word of the breaker
///
/// Admission checks and transitions read and write this as a single unit
/// under the lock; the lock is never held across an await point.
#[derive(Debug)]
struct Core {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    last_failure: Option<Instant>,
}

/// Admission refusal, turned into [`CircuitBreakerError::Open`] by the caller
struct Rejected {
    failure_count: u32,
    open_until: Instant,
    retry_after: Duration,
}

/// Circuit breaker guarding one fallible operation
///
/// Tracks consecutive failures of the operation and short-circuits calls once
/// a threshold is crossed, so the dependency behind the operation gets time
/// to recover before being probed again.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Circuit name, used as the registry key and in logs and errors
    name: String,
    config: CircuitBreakerConfig,
    classifier: FailureClassifier,
    core: Mutex<Core>,
    /// Calls that reached the operation
    total_calls: AtomicU64,
    /// Classified failures
    total_failures: AtomicU64,
    /// Calls rejected without running
    total_rejections: AtomicU64,
}

impl CircuitBreaker {
    /// Create a breaker with the default configuration
    pub fn new(name: impl Into<String>) -> Self {
        // default config values are always valid
        Self::from_validated(
            name.into(),
            CircuitBreakerConfig::default(),
            FailureClassifier::all(),
        )
    }

    /// Create a breaker with a custom configuration
    ///
    /// Fails fast on a degenerate config instead of misbehaving at call time.
    pub fn with_config(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(
            name.into(),
            config,
            FailureClassifier::all(),
        ))
    }

    /// Create a breaker with a custom configuration and failure classifier
    pub fn with_classifier(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        classifier: FailureClassifier,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(name.into(), config, classifier))
    }

    /// Construct from a config already checked by `validate`
    pub(crate) fn from_validated(
        name: String,
        config: CircuitBreakerConfig,
        classifier: FailureClassifier,
    ) -> Self {
        Self {
            name,
            config,
            classifier,
            core: Mutex::new(Core {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
                probe_in_flight: false,
                last_failure: None,
            }),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_rejections: AtomicU64::new(0),
        }
    }

    /// Get the circuit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state
    ///
    /// Reading never transitions; the open-to-half-open flip happens only
    /// when a call is admitted.
    pub fn state(&self) -> CircuitState {
        self.core.lock().state
    }

    /// Consecutive classified failures since the circuit last closed
    pub fn failure_count(&self) -> u32 {
        self.core.lock().failure_count
    }

    /// True while the circuit is not open (the health-check predicate)
    pub fn is_closed(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// When the open circuit will next allow a probe call
    pub fn open_until(&self) -> Option<Instant> {
        self.core
            .lock()
            .opened_at
            .map(|opened| opened + self.config.recovery_timeout)
    }

    /// Time remaining until a probe call is allowed
    ///
    /// Zero once the recovery timeout has elapsed or the circuit has not
    /// opened; `open_until` exposes the raw deadline for callers that need it.
    pub fn open_remaining(&self) -> Duration {
        self.open_until()
            .map_or(Duration::ZERO, |until| {
                until.saturating_duration_since(Instant::now())
            })
    }

    /// Run `operation` under the circuit's rules
    ///
    /// Rejected calls fail with [`CircuitBreakerError::Open`] and the
    /// operation is never invoked. When the operation runs and fails, the
    /// failure is recorded if the classifier accepts it, and the original
    /// error is returned unchanged either way. The operation runs inline:
    /// nothing is spawned and no timeout is imposed on it.
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: 'static,
    {
        if let Err(rejected) = self.try_acquire() {
            self.total_rejections.fetch_add(1, Ordering::Relaxed);
            return Err(CircuitBreakerError::Open {
                name: self.name.clone(),
                failure_count: rejected.failure_count,
                open_until: rejected.open_until,
                retry_after: rejected.retry_after,
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                if self.classifier.counts(&error) {
                    self.record_failure();
                } else {
                    // Out-of-scope error: neither counted nor resetting, but
                    // a reserved probe slot must not stay taken.
                    self.release_probe();
                }
                Err(CircuitBreakerError::OperationFailed(error))
            }
        }
    }

    /// Record a successful operation against the state machine
    pub fn record_success(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        let mut core = self.core.lock();
        match core.state {
            CircuitState::Closed => core.failure_count = 0,
            CircuitState::HalfOpen => self.close_locked(&mut core),
            // Forced open mid-flight; admission rules take over from here.
            CircuitState::Open => {}
        }
    }

    /// Record a failed operation against the state machine
    pub fn record_failure(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.total_failures.fetch_add(1, Ordering::Relaxed);

        let mut core = self.core.lock();
        core.last_failure = Some(Instant::now());
        match core.state {
            CircuitState::Closed => {
                core.failure_count += 1;
                if core.failure_count >= self.config.failure_threshold {
                    self.open_locked(&mut core);
                }
            }
            CircuitState::HalfOpen => {
                // A failed probe re-opens immediately; the threshold does not
                // apply in half-open.
                core.failure_count += 1;
                self.open_locked(&mut core);
            }
            CircuitState::Open => {}
        }
    }

    /// Force the circuit open, restarting the recovery timeout regardless of
    /// recorded failures
    pub fn trip(&self) {
        let mut core = self.core.lock();
        self.open_locked(&mut core);
    }

    /// Force the circuit closed and clear the failure counter
    pub fn reset(&self) {
        let mut core = self.core.lock();
        self.close_locked(&mut core);
    }

    /// Get a snapshot of the breaker's counters and state
    pub fn stats(&self) -> CircuitBreakerStats {
        let core = self.core.lock();
        CircuitBreakerStats {
            state: core.state,
            failure_count: core.failure_count,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_rejections: self.total_rejections.load(Ordering::Relaxed),
            opened_at: core.opened_at,
            last_failure: core.last_failure,
        }
    }

    /// Admission decision for one call attempt
    ///
    /// Open circuits whose recovery timeout has elapsed flip to half-open
    /// here, and exactly one caller wins the probe slot; concurrent callers
    /// keep being rejected until the probe resolves.
    fn try_acquire(&self) -> Result<(), Rejected> {
        let now = Instant::now();
        let mut core = self.core.lock();
        match core.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                // opened_at is always recorded while the circuit is open
                let until = core
                    .opened_at
                    .map_or(now, |opened| opened + self.config.recovery_timeout);
                if now >= until {
                    core.state = CircuitState::HalfOpen;
                    core.probe_in_flight = true;
                    tracing::info!(circuit = %self.name, "circuit half-open, probing for recovery");
                    Ok(())
                } else {
                    Err(Rejected {
                        failure_count: core.failure_count,
                        open_until: until,
                        retry_after: until.saturating_duration_since(now),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if core.probe_in_flight {
                    Err(Rejected {
                        failure_count: core.failure_count,
                        open_until: core
                            .opened_at
                            .map_or(now, |opened| opened + self.config.recovery_timeout),
                        retry_after: Duration::ZERO,
                    })
                } else {
                    core.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Release a reserved probe slot without recording an outcome
    fn release_probe(&self) {
        let mut core = self.core.lock();
        if core.state == CircuitState::HalfOpen {
            core.probe_in_flight = false;
        }
    }

    fn open_locked(&self, core: &mut Core) {
        core.state = CircuitState::Open;
        core.opened_at = Some(Instant::now());
        core.probe_in_flight = false;

        tracing::warn!(
            circuit = %self.name,
            failures = core.failure_count,
            "circuit opened"
        );
    }

    fn close_locked(&self, core: &mut Core) {
        core.state = CircuitState::Closed;
        core.failure_count = 0;
        core.opened_at = None;
        core.probe_in_flight = false;

        tracing::info!(circuit = %self.name, "circuit closed");
    }
}
