use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use log::{debug, trace, error};
use crate::config::{AuthScheme, BackendConfig, GenerationParams};
use crate::error::Error;
use crate::ChatMessage;

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a>
{   pub model: &'a str
  , pub messages: &'a [ChatMessage]
  , pub temperature: f32
  , pub max_tokens: usize
  , pub top_p: f32
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub content: Option<String>
}

// ===== Backend =====

/// OpenAI-compatible hosted chat completions (OpenAI, Azure, GitHub Models)
pub struct OpenAiBackend
{   base_url: String
  , api_key: Option<String>
  , auth_scheme: AuthScheme
  , http_client: reqwest::Client
}

impl OpenAiBackend
{   pub fn new(config: &BackendConfig) -> Result<Self, Error>
    {   debug!("Creating OpenAiBackend");
        Ok(OpenAiBackend
        {   base_url: config.base_url.clone()
          , api_key: config.api_key.clone()
          , auth_scheme: config.auth_scheme
          , http_client: super::http_client(config)?
        })
    }

    fn api_key(&self) -> Result<&str, Error>
    {   self.api_key.as_deref().ok_or_else(|| {
          error!("No API key configured");
          Error::MissingApiKey("openai".to_string())
        })
    }
}

#[async_trait]
impl super::TextBackend for OpenAiBackend
{   fn name(&self) -> &str
    {   "openai"
    }

    async fn generate(
      &self
    , messages: &[ChatMessage]
    , params: &GenerationParams
    ) -> Result<String, Error>
    {   debug!(
          "Sending {} messages to {}",
          messages.len(),
          params.model
        );

        let api_key = self.api_key()?;

        let request = ChatCompletionRequest
        {   model: &params.model
          , messages
          , temperature: params.temperature
          , max_tokens: params.max_tokens
          , top_p: params.top_p
        };

        trace!("Chat completion request: {:?}", request);

        let builder = self.http_client
          .post(super::endpoint(&self.base_url, "chat/completions"))
          .header("Content-Type", "application/json");
        let builder = match self.auth_scheme
        {   AuthScheme::Bearer => builder
              .header("Authorization", format!("Bearer {}", api_key))
          , AuthScheme::ApiKeyHeader => builder
              .header("api-key", api_key)
        };

        let response = builder
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::from(e)
          })?;

        let status = response.status();
        trace!("Chat completion response status: {}", status);

        if !status.is_success()
        {   let err = super::status_error(response).await;
            error!("Backend API error: {}", err);
            return Err(err);
        }

        let chat_response: ChatCompletionResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            Error::ParseError(e.to_string())
          })?;

        chat_response.choices.into_iter()
          .next()
          .map(|c| c.message.content.unwrap_or_default())
          .ok_or_else(|| {
            error!("No choices in response");
            Error::NoChoicesInResponse
          })
    }
}
