//! Text-generation backend implementations

pub mod openai;
pub mod local;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use crate::config::{BackendConfig, BackendKind, GenerationParams};
use crate::error::Error;
use crate::ChatMessage;

// Re-export for convenience
pub use openai::OpenAiBackend;
pub use local::LocalBackend;

/// Anything that turns a message sequence into generated text.
///
/// One call is one attempt; retrying is the caller's job.
#[async_trait]
pub trait TextBackend: Send + Sync
{   /// Short name used in logs
    fn name(&self) -> &str;

    async fn generate(
      &self
    , messages: &[ChatMessage]
    , params: &GenerationParams
    ) -> Result<String, Error>;
}

/// Construct the configured backend
pub fn build_backend(config: &BackendConfig)
  -> Result<Arc<dyn TextBackend>, Error>
{   debug!("Building {:?} backend for {}", config.kind, config.base_url);
    let backend: Arc<dyn TextBackend> = match config.kind
    {   BackendKind::OpenAi => Arc::new(OpenAiBackend::new(config)?)
      , BackendKind::Local => Arc::new(LocalBackend::new(config)?)
    };
    Ok(backend)
}

fn http_client(config: &BackendConfig) -> Result<reqwest::Client, Error>
{   let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs
    {   builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| {
      Error::InvalidConfiguration(
        format!("failed to build HTTP client: {}", e)
      )
    })
}

fn endpoint(base_url: &str, path: &str) -> String
{   format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Turn a non-success response into an error, keeping the body as detail
async fn status_error(response: reqwest::Response) -> Error
{   let status = response.status().as_u16();
    let body = response.text().await
      .unwrap_or_else(|_| "Unknown error".to_string());
    Error::from_status(status, body)
}
