use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use log::{debug, trace, error};
use crate::config::{BackendConfig, GenerationParams};
use crate::conversation::render_transcript;
use crate::error::Error;
use crate::ChatMessage;

#[derive(Debug, Clone, Serialize)]
pub struct LocalGenerateRequest
{   pub prompt: String
  , pub max_length: usize
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalGenerateResponse
{   pub content: String
}

/// A causal language model served on the local machine.
///
/// The model takes one prompt string, so the conversation is flattened
/// into a transcript first. Sampling parameters other than the output
/// length are owned by the model server.
pub struct LocalBackend
{   base_url: String
  , http_client: reqwest::Client
}

impl LocalBackend
{   pub fn new(config: &BackendConfig) -> Result<Self, Error>
    {   debug!("Creating LocalBackend at {}", config.base_url);
        Ok(LocalBackend
        {   base_url: config.base_url.clone()
          , http_client: super::http_client(config)?
        })
    }
}

#[async_trait]
impl super::TextBackend for LocalBackend
{   fn name(&self) -> &str
    {   "local"
    }

    async fn generate(
      &self
    , messages: &[ChatMessage]
    , params: &GenerationParams
    ) -> Result<String, Error>
    {   let request = LocalGenerateRequest
        {   prompt: render_transcript(messages)
          , max_length: params.max_tokens
        };
        trace!("Local generate request: {:?}", request);

        let response = self.http_client
          .post(super::endpoint(&self.base_url, "generate"))
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("Local model unreachable: {}", e);
            Error::from(e)
          })?;

        if !response.status().is_success()
        {   let err = super::status_error(response).await;
            error!("Local model error: {}", err);
            return Err(err);
        }

        let reply: LocalGenerateResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            Error::ParseError(e.to_string())
          })?;
        Ok(reply.content)
    }
}
