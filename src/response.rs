//! JSON envelope returned by `/generate`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::retry::FAILURE_MESSAGE;
use crate::GenerationResult;

/// Response body. Exactly one of the shapes is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody
{   Success
    {   response: String
    }
  , Failure
    {   error: String
      , #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>
    }
}

/// Status code plus body, ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse
{   pub status: StatusCode
  , pub body: ResponseBody
}

impl GatewayResponse
{   pub fn from_result(result: GenerationResult) -> Self
    {   match result
        {   GenerationResult::Success { text } => GatewayResponse
            {   status: StatusCode::OK
              , body: ResponseBody::Success { response: text }
            }
          , GenerationResult::Failure { message, detail, .. } => {
              GatewayResponse
              {   status: StatusCode::INTERNAL_SERVER_ERROR
                , body: ResponseBody::Failure
                  {   error: message
                    , details: Some(detail)
                  }
              }
            }
        }
    }

    /// Errors raised before the backend is reached
    pub fn from_error(err: &Error) -> Self
    {   match err
        {   Error::InvalidInput(message) => GatewayResponse
            {   status: StatusCode::BAD_REQUEST
              , body: ResponseBody::Failure
                {   error: message.clone()
                  , details: None
                }
            }
          , _ => GatewayResponse::internal()
        }
    }

    /// Body could not be read; keeps the extractor's status (413 for
    /// bodies over the configured limit)
    pub fn rejected(status: StatusCode) -> Self
    {   let error = if status == StatusCode::PAYLOAD_TOO_LARGE
        {   "Request body too large"
        } else
        {   "Failed to read request body"
        };
        GatewayResponse
        {   status
          , body: ResponseBody::Failure
            {   error: error.to_string()
              , details: None
            }
        }
    }

    /// Generic 500 with no detail
    pub fn internal() -> Self
    {   GatewayResponse
        {   status: StatusCode::INTERNAL_SERVER_ERROR
          , body: ResponseBody::Failure
            {   error: FAILURE_MESSAGE.to_string()
              , details: None
            }
        }
    }
}

impl IntoResponse for GatewayResponse
{   fn into_response(self) -> Response
    {   (self.status, Json(self.body)).into_response()
    }
}
