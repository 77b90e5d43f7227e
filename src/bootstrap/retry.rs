// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded polling shared by the secret and ManifestWork status sub-pollers.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// How long to keep polling an eventually-consistent resource.
///
/// `max_attempts` bounds the number of reads, `timeout` bounds the wall clock time
/// including reads that hang. At least one of them is always set by the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub delay: Duration,
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Read at most `max_attempts` times, sleeping `delay` between reads
    pub fn attempts(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            delay,
            timeout: None,
        }
    }

    /// Read every `interval` until `timeout` has elapsed
    pub fn deadline(timeout: Duration, interval: Duration) -> Self {
        Self {
            max_attempts: None,
            delay: interval,
            timeout: Some(timeout),
        }
    }
}

/// Result of a single poll read
#[derive(Debug, PartialEq, Eq)]
pub enum Step<T> {
    Ready(T),
    Pending,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollError<E> {
    /// The check reported a terminal failure
    Failed(E),
    /// Every attempt came back pending
    Exhausted { attempts: u32 },
    /// The deadline passed before the check became ready
    TimedOut { timeout: Duration, attempts: u32 },
}

/// Drive `check` according to `policy` until it is ready, fails, or the policy runs out.
///
/// `check` receives the 1-based attempt number. Terminal failures are returned
/// immediately without further attempts.
pub async fn poll<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut check: F,
) -> std::result::Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<Step<T>, E>>,
{
    let started = AtomicU32::new(0);
    let attempts = async {
        loop {
            let attempt = started.fetch_add(1, Ordering::Relaxed) + 1;
            match check(attempt).await {
                Ok(Step::Ready(value)) => return Ok(value),
                Ok(Step::Pending) => {}
                Err(e) => return Err(PollError::Failed(e)),
            }

            if policy.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(PollError::Exhausted { attempts: attempt });
            }

            debug!(
                operation,
                attempt,
                delay_ms = policy.delay.as_millis() as u64,
                "not converged yet, polling again"
            );
            sleep(policy.delay).await;
        }
    };

    match policy.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(PollError::TimedOut {
                timeout,
                attempts: started.load(Ordering::Relaxed),
            }),
        },
        None => attempts.await,
    }
}
