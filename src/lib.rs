pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod conversation;
pub mod retry;
pub mod response;
pub mod client;
pub mod server;
use serde::{Deserialize, Serialize};

pub use client::Gateway;
pub use config::{GatewayConfig, GenerationParams};
pub use error::Error;
pub use providers::TextBackend;

/*

promptgate: one POST /generate endpoint in front of a text-generation
backend (hosted chat-completion api or a locally served model).
every request is independent:

  validate -> build conversation -> invoke backend (bounded retry) -> format

promptgate/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Shared message/result types
│   ├── main.rs         # Binary: env + cli config, logger, serve
│   ├── error.rs        # Error type and transient classification
│   ├── config.rs       # Gateway, backend, generation and retry config
│   ├── request.rs      # Lenient payload validation
│   ├── conversation.rs # Message sequence assembly
│   ├── retry.rs        # Retry policy and bounded invoke loop
│   ├── response.rs     # JSON envelope + status
│   ├── client.rs       # Gateway pipeline
│   ├── server.rs       # axum router
│   └── providers/
│       ├── mod.rs      # TextBackend trait
│       ├── openai.rs   # OpenAI-compatible chat completions
│       └── local.rs    # Locally served causal LM
└── tests/

*/

/// Speaker of a single chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   /// Parse a caller-supplied role. Unknown roles yield `None`.
    pub fn parse(s: &str) -> Option<Self>
    {   match s
        {   "system" => Some(Role::System)
          , "user" => Some(Role::User)
          , "assistant" => Some(Role::Assistant)
          , _ => None
        }
    }

    pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

impl Default for Role
{   fn default() -> Self
    {   Role::User
    }
}

/// One turn of a conversation, in the shape chat backends expect
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
}

impl ChatMessage
{   pub fn new(role: Role, content: impl Into<String>) -> Self
    {   ChatMessage
        {   role
          , content: content.into()
        }
    }

    pub fn system(content: impl Into<String>) -> Self
    {   ChatMessage::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   ChatMessage::new(Role::Assistant, content)
    }
}

/// A validated incoming request. Lives for one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest
{   /// The new user turn, never empty
    pub current_input: String
  , /// Prior turns in chronological order
    pub history: Vec<ChatMessage>
}

/// Outcome of the backend invoker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult
{   Success
    {   text: String
    }
  , Failure
    {   /// Generic, user-facing message
        message: String
      , /// Last observed backend error, with attempt count
        detail: String
      , /// Backend calls made before giving up
        attempts: usize
    }
}
