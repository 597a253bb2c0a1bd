//! Retry policy and the bounded backend invoke loop

use std::time::Duration;
use log::{debug, error, info, warn};
use crate::config::{GenerationParams, RetryConfig, RetryScope};
use crate::error::Error;
use crate::providers::TextBackend;
use crate::{ChatMessage, GenerationResult};

pub const FAILURE_MESSAGE: &str
  = "An error occurred while processing your request";

/// Retry policy for failed backend calls
#[derive(Debug, Clone)]
pub struct RetryPolicy
{   pub max_attempts: usize
  , pub scope: RetryScope
  , pub backoff_multiplier: f32
  , pub initial_backoff: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_attempts: usize
    , scope: RetryScope
    , backoff_multiplier: f32
    , initial_backoff_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_attempts: max_attempts.max(1)
          , scope
          , backoff_multiplier
          , initial_backoff: Duration::from_millis(
              initial_backoff_ms
            )
        }
    }

    /// Retry immediately, up to `max_attempts` calls in total
    pub fn immediate(max_attempts: usize) -> Self
    {   RetryPolicy::new(max_attempts, RetryScope::All, 1.0, 0)
    }

    /// Calculate the pause before retry number `attempt` (1-based)
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   if self.initial_backoff.is_zero()
        {   return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1) as i32;
        let multiplier
          = self.backoff_multiplier.powi(exponent);
        Duration::from_millis(
          (self.initial_backoff.as_millis() as f32
            * multiplier) as u64
        )
    }

    /// Whether another attempt should follow `err`
    pub fn should_retry(&self, err: &Error, attempts: usize) -> bool
    {   if attempts >= self.max_attempts
        {   return false;
        }
        match self.scope
        {   RetryScope::All => true
          , RetryScope::TransientOnly => err.is_transient()
        }
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy
{   fn from(config: &RetryConfig) -> Self
    {   RetryPolicy::new(
          config.max_attempts,
          config.scope,
          config.backoff_multiplier,
          config.initial_backoff_ms
        )
    }
}

/// Call the backend until it succeeds or the policy gives up.
///
/// Attempts run one after another on the caller's task.
pub async fn invoke_with_retry(
  backend: &dyn TextBackend
, messages: &[ChatMessage]
, params: &GenerationParams
, policy: &RetryPolicy
) -> GenerationResult
{   debug_assert!(!messages.is_empty());
    let mut attempts = 0;

    loop
    {   attempts += 1;
        debug!(
          "{} attempt {}/{}",
          backend.name(),
          attempts,
          policy.max_attempts
        );

        let err = match backend.generate(messages, params).await
        {   Ok(text) => {
              if attempts > 1
              {   info!(
                    "{} succeeded after {} attempts",
                    backend.name(),
                    attempts
                  );
              }
              return GenerationResult::Success { text };
            }
          , Err(err) => err
        };

        warn!(
          "{} attempt {} failed: {}",
          backend.name(),
          attempts,
          err
        );

        if !policy.should_retry(&err, attempts)
        {   return give_up(policy, err, attempts);
        }

        let pause = policy.backoff_for_attempt(attempts);
        if !pause.is_zero()
        {   tokio::time::sleep(pause).await;
        }
    }
}

fn give_up(policy: &RetryPolicy, err: Error, attempts: usize)
  -> GenerationResult
{   let detail = if attempts >= policy.max_attempts
    {   format!(
          "Failed after {} attempts. Last error: {}",
          attempts,
          err
        )
    } else
    {   format!(
          "Backend rejected request after {} attempt(s): {}",
          attempts,
          err
        )
    };
    error!("{}", detail);
    GenerationResult::Failure
    {   message: FAILURE_MESSAGE.to_string()
      , detail
      , attempts
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn default_policy_retries_immediately_three_times()
    {   let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_for_attempt(1), Duration::ZERO);
        assert!(policy.should_retry(&Error::Timeout, 2));
        assert!(!policy.should_retry(&Error::Timeout, 3));
    }

    #[test]
    fn backoff_grows_geometrically()
    {   let policy = RetryPolicy::new(5, RetryScope::All, 2.0, 100);
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn scope_controls_terminal_errors()
    {   let unauthorized = Error::Unauthorized("bad key".into());
        let all = RetryPolicy::immediate(3);
        assert!(all.should_retry(&unauthorized, 1));

        let transient_only
          = RetryPolicy::new(3, RetryScope::TransientOnly, 1.0, 0);
        assert!(!transient_only.should_retry(&unauthorized, 1));
        assert!(transient_only.should_retry(&Error::RateLimitExceeded, 1));
    }

    #[test]
    fn zero_attempts_is_clamped()
    {   assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }

    /// Fails until `succeed_on`, counting calls
    struct Flaky
    {   succeed_on: usize
      , calls: std::sync::atomic::AtomicUsize
    }

    #[async_trait::async_trait]
    impl TextBackend for Flaky
    {   fn name(&self) -> &str
        {   "flaky"
        }

        async fn generate(
          &self
        , _messages: &[ChatMessage]
        , _params: &GenerationParams
        ) -> Result<String, Error>
        {   let n = self.calls
              .fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if n >= self.succeed_on
            {   Ok(format!("ok on {}", n))
            } else
            {   Err(Error::HttpError(format!("fail {}", n)))
            }
        }
    }

    #[test]
    fn loop_reports_attempts_and_last_error()
    {   let backend = Flaky
        {   succeed_on: 10
          , calls: Default::default()
        };
        let result = tokio_test::block_on(invoke_with_retry(
          &backend,
          &[ChatMessage::user("hi")],
          &GenerationParams::default(),
          &RetryPolicy::immediate(3)
        ));
        assert_eq!(result, GenerationResult::Failure
        {   message: FAILURE_MESSAGE.to_string()
          , detail: "Failed after 3 attempts. Last error: HTTP error: fail 3"
              .to_string()
          , attempts: 3
        });
    }

    #[test]
    fn loop_returns_first_success()
    {   let backend = Flaky
        {   succeed_on: 2
          , calls: Default::default()
        };
        let result = tokio_test::block_on(invoke_with_retry(
          &backend,
          &[ChatMessage::user("hi")],
          &GenerationParams::default(),
          &RetryPolicy::immediate(3)
        ));
        assert_eq!(
          result,
          GenerationResult::Success { text: "ok on 2".to_string() }
        );
        assert_eq!(
          backend.calls.load(std::sync::atomic::Ordering::SeqCst),
          2
        );
    }
}
