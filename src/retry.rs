//! Bounded immediate retries

use crate::Error;
use std::future::Future;

/// Outcome of a bounded retry
#[derive(Debug)]
pub enum Attempt<T> {
    Success { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: Error },
}

impl<T> Attempt<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Attempt::Success { attempts, .. } | Attempt::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Run `op` up to `max_attempts` times, back to back, until it succeeds.
///
/// The attempt number (1-based) is passed in. No backoff, and the failure reason does
/// not change what the next attempt does.
pub async fn retry_immediately<F, Fut, T>(max_attempts: u32, mut op: F) -> Attempt<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        tracing::info!(attempt, max_attempts, "Try #{}", attempt);
        match op(attempt).await {
            Ok(value) => {
                return Attempt::Success {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Attempt failed");
                last_error = Some(e);
            }
        }
    }

    Attempt::Exhausted {
        attempts: max_attempts,
        last_error: last_error
            .unwrap_or_else(|| Error::Contract("no attempt was made".to_string())),
    }
}
