//! Circuit breaker registry for health checks and monitoring

use std::sync::Arc;

use crate::breaker::CircuitBreaker;
use crate::classify::FailureClassifier;
use crate::types::{CircuitBreakerConfig, CircuitBreakerStats, CircuitState, ConfigError};

/// Directory of circuit breakers keyed by name
///
/// A passive lookup structure for introspection; the hot call path never goes
/// through it. There is no removal: breakers are created once and live as
/// long as the registry. Registering a second breaker under an existing name
/// replaces the first (last write wins), so callers are responsible for
/// keeping names unique.
///
/// The registry is an ordinary owned value with no global instance; create
/// one at startup and hand it (typically in an `Arc`) to whatever serves
/// health or metrics endpoints.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: dashmap::DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    /// Create a registry whose `get_or_create` uses the default config
    pub fn new() -> Self {
        Self {
            breakers: dashmap::DashMap::new(),
            default_config: CircuitBreakerConfig::default(),
        }
    }

    /// Create a registry with a custom default config for `get_or_create`
    pub fn with_config(config: CircuitBreakerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            breakers: dashmap::DashMap::new(),
            default_config: config,
        })
    }

    /// Insert a breaker under its name, replacing any previous entry
    pub fn register(&self, breaker: Arc<CircuitBreaker>) {
        self.breakers.insert(breaker.name().to_string(), breaker);
    }

    /// Look up a breaker by name
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Get the breaker registered under `name`, creating it with the
    /// registry's default config if absent
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                // default_config was validated when the registry was built
                Arc::new(CircuitBreaker::from_validated(
                    name.to_string(),
                    self.default_config.clone(),
                    FailureClassifier::all(),
                ))
            })
            .clone()
    }

    /// Snapshot of all registered breakers
    pub fn breakers(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Names of all registered breakers
    pub fn names(&self) -> Vec<String> {
        self.breakers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered breakers
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// True when no breaker has been registered
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// True iff no registered breaker is currently open
    pub fn all_closed(&self) -> bool {
        self.breakers.iter().all(|entry| entry.value().is_closed())
    }

    /// Breakers currently in the open state
    pub fn open_breakers(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers
            .iter()
            .filter(|entry| entry.value().state() == CircuitState::Open)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Breakers currently closed or half-open
    pub fn closed_breakers(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers
            .iter()
            .filter(|entry| entry.value().is_closed())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Stats snapshots for every registered breaker
    pub fn all_stats(&self) -> Vec<(String, CircuitBreakerStats)> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect()
    }

    /// Force every registered breaker closed
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
