//! Retry with exponential backoff around backing-store calls
//!
//! [`RetryingSource`] decorates any [`MetadataSource`]; the adapters
//! themselves know nothing about retries. Only upstream-class errors
//! (database, network, I/O) are retried. Everything else fails immediately.

use async_trait::async_trait;
use gallery_common::config::RetryConfig;
use gallery_common::Result;
use std::future::Future;
use std::time::Duration;

use super::{MetadataSource, RawRecord};

/// Retry policy: attempt count and backoff curve
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (minimum 1)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: if config.multiplier >= 1.0 { config.multiplier } else { 1.0 },
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1` (attempt is 1-based), capped at `max_delay`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);

        // Clamp in f64: the uncapped product overflows Duration for large attempts
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos as u64).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-upstream error,
    /// or runs out of attempts.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            "Backing store call succeeded after retry"
                        );
                    }
                    return Ok(result);
                }
                Err(err) if !err.is_upstream() => return Err(err),
                Err(err) if attempt >= self.max_attempts => {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Backing store call failed: retries exhausted"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Backing store call failed, will retry after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// [`MetadataSource`] decorator applying a [`RetryPolicy`] to every call
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: MetadataSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<S: MetadataSource> MetadataSource for RetryingSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        self.policy.run("fetch_records", || self.inner.fetch_records()).await
    }

    async fn fetch_record(&self, id: &str) -> Result<Option<RawRecord>> {
        self.policy.run("fetch_record", || self.inner.fetch_record(id)).await
    }

    async fn fetch_categories(&self) -> Result<Option<Vec<String>>> {
        self.policy.run("fetch_categories", || self.inner.fetch_categories()).await
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<bool> {
        self.policy
            .run("set_published", || self.inner.set_published(id, published))
            .await
    }

    async fn set_label_number(&self, id: &str, label_number: &str) -> Result<bool> {
        self.policy
            .run("set_label_number", || self.inner.set_label_number(id, label_number))
            .await
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<bool> {
        self.policy
            .run("set_verified", || self.inner.set_verified(id, verified))
            .await
    }

    async fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        self.policy.run("add_tag", || self.inner.add_tag(id, tag)).await
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        self.policy.run("remove_tag", || self.inner.remove_tag(id, tag)).await
    }
}
