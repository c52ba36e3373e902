use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Calculate delay with exponential backoff and jitter
fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponential = config.exponential_base.powi((attempt - 1) as i32);
    let delay_ms = (config.base_delay.as_millis() as f64 * exponential) as u64;

    // Add jitter (±25%)
    let jitter = (delay_ms as f64 * 0.25) as u64;
    let jittered = delay_ms + rand::random::<u64>() % (jitter * 2 + 1) - jitter;

    let final_delay = jittered.min(config.max_delay.as_millis() as u64);

    Duration::from_millis(final_delay)
}

/// Retry policy for specific error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Abort,
}

/// Retry a future with exponential backoff until it succeeds, attempts run out,
/// or `policy` aborts on an error
pub async fn retry_with_policy<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
    policy: impl Fn(&E) -> RetryDecision,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if policy(&e) == RetryDecision::Abort {
                    log::error!("{} aborted: {}", operation_name, e);
                    return Err(e);
                }

                log::warn!(
                    "{} failed (attempt {}/{}): {}",
                    operation_name,
                    attempt,
                    max_attempts,
                    e
                );

                if attempt >= max_attempts {
                    return Err(e);
                }

                let delay = calculate_delay(config, attempt);
                log::info!("Retrying {} in {:?}...", operation_name, delay);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            exponential_base: 2.0,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_policy(
            &fast(),
            "flaky",
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("attempt {}", n)) } else { Ok(n) }
            },
            |_| RetryDecision::Retry,
        )
        .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_policy(
            &fast(),
            "broken",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            },
            |_| RetryDecision::Retry,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn abort_policy_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_policy(
            &fast(),
            "rejected",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("bad request".to_string())
            },
            |_| RetryDecision::Abort,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_is_capped() {
        let config = fast();
        assert!(calculate_delay(&config, 10) <= config.max_delay);
    }
}
