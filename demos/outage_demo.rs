//! Circuit breaker walk-through with a flaky dependency
//!
//! Run with: cargo run --example outage_demo

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use fusebox_core::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry};
use thiserror::Error as ThisError;
use tokio::time::sleep;

#[derive(Debug, ThisError)]
#[error("connection refused")]
struct ConnectionRefused;

/// A dependency that fails on a scripted set of calls
async fn external_call(call_id: u32) -> Result<&'static str, ConnectionRefused> {
    match call_id {
        2 | 3 | 6 | 7 | 10 | 12 | 15 => Err(ConnectionRefused),
        _ => Ok("SUCCESS"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = CircuitBreakerConfig::default()
        .with_failure_threshold(2)
        .with_recovery_timeout(Duration::from_secs(3));
    let breaker = Arc::new(CircuitBreaker::with_config("external_call", config)?);

    let registry = CircuitBreakerRegistry::new();
    registry.register(breaker.clone());

    for call_id in 0..20 {
        println!("CALL: {call_id}");
        match breaker.call(|| external_call(call_id)).await {
            Ok(response) => println!(" ## {response}"),
            Err(error) => println!("  \\__ {error}"),
        }

        sleep(Duration::from_millis(500)).await;
    }

    println!("\ncircuit summary:");
    for (name, stats) in registry.all_stats() {
        println!(
            "  {name}: state={} calls={} failures={} rejections={} failure_rate={:.1}%",
            stats.state,
            stats.total_calls,
            stats.total_failures,
            stats.total_rejections,
            stats.failure_rate()
        );
    }
    println!(
        "all circuits closed: {}",
        if registry.all_closed() { "yes" } else { "no" }
    );

    Ok(())
}
