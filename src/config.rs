//! Configuration for the gateway, its backend and retry behavior

use serde::{Deserialize, Serialize};
use log::debug;
use crate::error::Error;

pub const DEFAULT_BASE_URL: &str
  = "https://models.inference.ai.azure.com";
pub const DEFAULT_LOCAL_BASE_URL: &str
  = "http://127.0.0.1:5000";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Which request shape the gateway accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode
{   /// Accepts `conversation_history`
    Conversational
  , /// Only `user_input`; history is ignored
    SingleTurn
}

impl std::str::FromStr for Mode
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "conversational" | "chat" => Ok(Mode::Conversational)
          , "single_turn" | "single-turn" | "single" => {
              Ok(Mode::SingleTurn)
            }
          , other => Err(Error::InvalidConfiguration(
              format!("unknown mode: {}", other)
            ))
        }
    }
}

/// Which backend implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind
{   /// OpenAI-compatible hosted chat completions
    OpenAi
  , /// Locally served causal language model
    Local
}

impl std::str::FromStr for BackendKind
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "openai" | "hosted" => Ok(BackendKind::OpenAi)
          , "local" => Ok(BackendKind::Local)
          , other => Err(Error::InvalidConfiguration(
              format!("unknown backend: {}", other)
            ))
        }
    }
}

/// How the credential is presented to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme
{   /// `Authorization: Bearer <key>`
    Bearer
  , /// `api-key: <key>` (Azure deployments)
    ApiKeyHeader
}

impl std::str::FromStr for AuthScheme
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "bearer" => Ok(AuthScheme::Bearer)
          , "api_key" | "api-key" | "api_key_header" => {
              Ok(AuthScheme::ApiKeyHeader)
            }
          , other => Err(Error::InvalidConfiguration(
              format!("unknown auth scheme: {}", other)
            ))
        }
    }
}

/// Fixed sampling parameters sent with every backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams
{   pub model: String
  , pub temperature: f32
  , pub max_tokens: usize
  , pub top_p: f32
}

impl Default for GenerationParams
{   fn default() -> Self
    {   GenerationParams
        {   model: DEFAULT_MODEL.to_string()
          , temperature: 0.7
          , max_tokens: 1000
          , top_p: 1.0
        }
    }
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig
{   pub kind: BackendKind
  , /// API base URL
    pub base_url: String
  , /// Credential; never logged
    #[serde(skip_serializing)]
    pub api_key: Option<String>
  , pub auth_scheme: AuthScheme
  , /// Per-call timeout in seconds; `None` keeps the client default
    pub timeout_secs: Option<u64>
}

impl Default for BackendConfig
{   fn default() -> Self
    {   BackendConfig
        {   kind: BackendKind::OpenAi
          , base_url: DEFAULT_BASE_URL.to_string()
          , api_key: None
          , auth_scheme: AuthScheme::Bearer
          , timeout_secs: None
        }
    }
}

impl BackendConfig
{   /// Hosted backends cannot serve a single request without a credential
    pub fn missing_credential(&self) -> bool
    {   self.kind == BackendKind::OpenAi && self.api_key.is_none()
    }
}

/// Which backend errors are worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryScope
{   /// Retry every backend error up to the cap
    All
  , /// Stop at the first error that is not transient
    TransientOnly
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig
{   /// Total backend calls allowed per request
    pub max_attempts: usize
  , pub scope: RetryScope
  , /// Backoff multiplier for retries
    pub backoff_multiplier: f32
  , /// Initial backoff duration in milliseconds, 0 retries immediately
    pub initial_backoff_ms: u64
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_attempts: 3
          , scope: RetryScope::All
          , backoff_multiplier: 2.0
          , initial_backoff_ms: 0
        }
    }
}

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;

/// HTTP bind address and request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig
{   pub host: String
  , pub port: u16
  , /// Largest accepted `/generate` body
    pub max_payload_bytes: usize
}

impl Default for ServerConfig
{   fn default() -> Self
    {   ServerConfig
        {   host: "127.0.0.1".to_string()
          , port: 5000
          , max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES
        }
    }
}

/// Per-run overrides, applied on top of the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides
{   pub mode: Option<Mode>
  , pub backend: Option<BackendKind>
  , pub base_url: Option<String>
  , pub max_attempts: Option<usize>
  , pub host: Option<String>
  , pub port: Option<u16>
}

/// Gateway configuration, built once at startup and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig
{   pub mode: Mode
  , /// Prepended as a system turn when set, even if empty
    pub system_prompt: Option<String>
  , pub generation: GenerationParams
  , pub backend: BackendConfig
  , pub retry: RetryConfig
  , pub server: ServerConfig
}

impl Default for GatewayConfig
{   fn default() -> Self
    {   GatewayConfig::conversational()
    }
}

impl GatewayConfig
{   /// Accepts history, no system framing
    pub fn conversational() -> Self
    {   GatewayConfig
        {   mode: Mode::Conversational
          , system_prompt: None
          , generation: GenerationParams::default()
          , backend: BackendConfig::default()
          , retry: RetryConfig::default()
          , server: ServerConfig::default()
        }
    }

    /// Prompt only, with an empty system turn in front
    pub fn single_turn() -> Self
    {   GatewayConfig
        {   mode: Mode::SingleTurn
          , system_prompt: Some(String::new())
          , generation: GenerationParams
            {   temperature: 1.0
              , max_tokens: 4096
              , ..GenerationParams::default()
            }
          , ..GatewayConfig::conversational()
        }
    }

    pub fn for_mode(mode: Mode) -> Self
    {   match mode
        {   Mode::Conversational => GatewayConfig::conversational()
          , Mode::SingleTurn => GatewayConfig::single_turn()
        }
    }

    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self, Error>
    {   Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| {
          lookup(key).filter(|v| !v.trim().is_empty())
        };

        let mode = match get("PROMPTGATE_MODE")
        {   Some(v) => v.parse()?
          , None => Mode::Conversational
        };
        let mut config = GatewayConfig::for_mode(mode);

        if let Some(v) = get("PROMPTGATE_BACKEND")
        {   config.backend.kind = v.parse()?;
            if config.backend.kind == BackendKind::Local
            {   config.backend.base_url
                  = DEFAULT_LOCAL_BASE_URL.to_string();
            }
        }
        if let Some(v) = get("PROMPTGATE_BASE_URL")
        {   config.backend.base_url = v;
        }
        config.backend.api_key = get("PROMPTGATE_API_KEY")
          .or_else(|| get("GITHUB_TOKEN"));
        if let Some(v) = get("PROMPTGATE_HOST")
        {   config.server.host = v;
        }
        if let Some(v) = get("PROMPTGATE_PORT")
        {   config.server.port = parse_number(&v, "port")?;
        }
        if let Some(v) = get("PROMPTGATE_MAX_PAYLOAD_BYTES")
        {   config.server.max_payload_bytes
              = parse_number(&v, "max payload bytes")?;
        }
        if let Some(v) = get("PROMPTGATE_AUTH_SCHEME")
        {   config.backend.auth_scheme = v.parse()?;
        }
        if let Some(v) = get("PROMPTGATE_TIMEOUT_SECS")
        {   config.backend.timeout_secs
              = Some(parse_number(&v, "timeout")?);
        }
        if let Some(v) = get("PROMPTGATE_SYSTEM_PROMPT")
        {   config.system_prompt = Some(v);
        }

        debug!(
          "Loaded config: mode={:?} backend={:?} base_url={} key_set={}",
          config.mode,
          config.backend.kind,
          config.backend.base_url,
          config.backend.api_key.is_some()
        );
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides. Switching mode swaps in that mode's preset but
    /// keeps the backend, retry and server settings already resolved.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self
    {   if let Some(mode) = overrides.mode
        {   if mode != self.mode
            {   let mut preset = GatewayConfig::for_mode(mode);
                preset.backend = self.backend;
                preset.retry = self.retry;
                preset.server = self.server;
                self = preset;
            }
        }
        if let Some(kind) = overrides.backend
        {   if kind == BackendKind::Local
              && self.backend.kind != BackendKind::Local
            {   self.backend.base_url = DEFAULT_LOCAL_BASE_URL.to_string();
            }
            self.backend.kind = kind;
        }
        if let Some(url) = overrides.base_url
        {   self.backend.base_url = url;
        }
        if let Some(n) = overrides.max_attempts
        {   self.retry.max_attempts = n;
        }
        if let Some(host) = overrides.host
        {   self.server.host = host;
        }
        if let Some(port) = overrides.port
        {   self.server.port = port;
        }
        self
    }

    /// Reject values the gateway cannot run with
    pub fn validate(&self) -> Result<(), Error>
    {   if self.retry.max_attempts == 0
        {   return Err(Error::InvalidConfiguration(
              "retry.max_attempts must be at least 1".to_string()
            ));
        }
        if self.backend.base_url.trim().is_empty()
        {   return Err(Error::InvalidConfiguration(
              "backend.base_url is empty".to_string()
            ));
        }
        if self.server.max_payload_bytes == 0
        {   return Err(Error::InvalidConfiguration(
              "server.max_payload_bytes must be positive".to_string()
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str)
  -> Result<T, Error>
{   value.trim().parse().map_err(|_| {
      Error::InvalidConfiguration(format!("invalid {}: {}", what, value))
    })
}
