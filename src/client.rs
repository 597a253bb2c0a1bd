use std::sync::Arc;
use log::{debug, error, warn};
use crate::config::GatewayConfig;
use crate::conversation::build_messages;
use crate::error::Error;
use crate::providers::{build_backend, TextBackend};
use crate::request;
use crate::response::GatewayResponse;
use crate::retry::{invoke_with_retry, RetryPolicy};
use crate::{ConversationRequest, GenerationResult};

/// The generation pipeline: validate, build, invoke, format.
///
/// Holds the backend handle and the configuration it was started with.
/// Neither changes after construction, so one instance is shared by all
/// concurrent requests.
pub struct Gateway
{   config: GatewayConfig
  , policy: RetryPolicy
  , backend: Arc<dyn TextBackend>
}

impl Gateway
{   /// Create a gateway around an already constructed backend
    pub fn new(
      config: GatewayConfig
    , backend: Arc<dyn TextBackend>
    ) -> Self
    {   debug!(
          "Creating Gateway: mode={:?} backend={} max_attempts={}",
          config.mode,
          backend.name(),
          config.retry.max_attempts
        );
        let policy = RetryPolicy::from(&config.retry);
        Gateway
        {   config
          , policy
          , backend
        }
    }

    /// Create a gateway and the backend its configuration names
    pub fn from_config(config: GatewayConfig) -> Result<Self, Error>
    {   config.validate()?;
        if config.backend.missing_credential()
        {   warn!(
              "No API key set for {:?} backend at {}; every request will \
               fail until PROMPTGATE_API_KEY or GITHUB_TOKEN is provided",
              config.backend.kind,
              config.backend.base_url
            );
        }
        let backend = build_backend(&config.backend)?;
        Ok(Gateway::new(config, backend))
    }

    pub fn config(&self) -> &GatewayConfig
    {   &self.config
    }

    /// Run a validated request through the backend
    pub async fn generate(
      &self
    , request: &ConversationRequest
    ) -> GenerationResult
    {   let messages = build_messages(
          request,
          self.config.system_prompt.as_deref()
        );
        debug!(
          "Invoking {} with {} messages",
          self.backend.name(),
          messages.len()
        );
        invoke_with_retry(
          self.backend.as_ref(),
          &messages,
          &self.config.generation,
          &self.policy
        ).await
    }

    /// Full pipeline for a raw request body
    pub async fn handle(&self, body: &[u8]) -> GatewayResponse
    {   let request = match request::parse_body(body, self.config.mode)
        {   Ok(r) => r
          , Err(err) => {
              debug!("Rejected request: {}", err);
              return GatewayResponse::from_error(&err);
            }
        };

        let result = self.generate(&request).await;
        if let GenerationResult::Failure { attempts, .. } = &result
        {   error!(
              "Generation failed after {} attempt(s) on {}",
              attempts,
              self.backend.name()
            );
        }
        GatewayResponse::from_result(result)
    }
}
