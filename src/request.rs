//! Incoming payload validation
//!
//! Parsing is lenient: only a missing or empty `user_input` rejects the
//! request. Anything odd inside `conversation_history` is replaced by
//! defaults rather than reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, trace};
use crate::config::Mode;
use crate::error::Error;
use crate::{ChatMessage, ConversationRequest, Role};

pub const INPUT_FIELD: &str = "user_input";
pub const HISTORY_FIELD: &str = "conversation_history";

pub const NO_INPUT_MESSAGE: &str = "No input provided";
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON payload";

/// Wire shape of `POST /generate`, for clients of the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest
{   pub user_input: String
  , #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation_history: Vec<HistoryEntry>
}

/// One caller-supplied history turn; both fields optional on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>
}

impl HistoryEntry
{   fn from_value(value: &Value) -> Self
    {   HistoryEntry
        {   role: value.get("role")
              .and_then(Value::as_str)
              .map(str::to_string)
          , content: value.get("content")
              .and_then(Value::as_str)
              .map(str::to_string)
        }
    }

    /// Missing or unrecognized role means `user`, missing content is empty
    pub fn into_message(self) -> ChatMessage
    {   let role = match self.role.as_deref()
        {   Some(r) => Role::parse(r).unwrap_or_else(|| {
              debug!("Unknown history role {:?}, using user", r);
              Role::User
            })
          , None => Role::User
        };
        ChatMessage::new(role, self.content.unwrap_or_default())
    }
}

/// Validate a raw body into a conversation request
pub fn parse_body(body: &[u8], mode: Mode)
  -> Result<ConversationRequest, Error>
{   let value: Value = serde_json::from_slice(body).map_err(|e| {
      debug!("Rejecting unparseable body: {}", e);
      Error::InvalidInput(INVALID_JSON_MESSAGE.to_string())
    })?;
    validate(&value, mode)
}

/// Validate an already-parsed JSON payload
pub fn validate(payload: &Value, mode: Mode)
  -> Result<ConversationRequest, Error>
{   let object = payload.as_object().ok_or_else(|| {
      debug!("Rejecting non-object payload");
      Error::InvalidInput(INVALID_JSON_MESSAGE.to_string())
    })?;

    let current_input = object.get(INPUT_FIELD)
      .and_then(Value::as_str)
      .filter(|s| !s.is_empty())
      .ok_or_else(|| Error::InvalidInput(NO_INPUT_MESSAGE.to_string()))?
      .to_string();

    let history = match mode
    {   Mode::Conversational => parse_history(object.get(HISTORY_FIELD))
      , Mode::SingleTurn => Vec::new()
    };

    trace!(
      "Validated request: {} chars, {} history turns",
      current_input.len(),
      history.len()
    );
    Ok(ConversationRequest
    {   current_input
      , history
    })
}

fn parse_history(value: Option<&Value>) -> Vec<ChatMessage>
{   match value.and_then(Value::as_array)
    {   Some(entries) => entries
          .iter()
          .map(|e| HistoryEntry::from_value(e).into_message())
          .collect()
      , None => Vec::new()
    }
}
