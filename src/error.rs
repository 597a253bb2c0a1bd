use std::fmt;

/// Custom error type for gateway operations
/// Implements Clone so a failed attempt can be kept as the last error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Caller payload rejected before reaching the backend
    InvalidInput(String)
  , /// Credential is missing for a backend
    MissingApiKey(String)
  , /// Backend rejected the credential (HTTP 401/403)
    Unauthorized(String)
  , /// Transport-level HTTP failure
    HttpError(String)
  , /// Backend returned a non-success status
    ApiError
    {   status: u16
      , message: String
    }
  , /// Failed to parse backend response
    ParseError(String)
  , /// No choices in backend response
    NoChoicesInResponse
  , /// Backend throttled the request (HTTP 429)
    RateLimitExceeded
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Timeout error
    Timeout
  , /// Generic error
    Other(String)
}

impl Error
{   /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Network failures, throttling, 5xx responses and garbled bodies are
    /// transient. Credential problems and other 4xx rejections are not.
    pub fn is_transient(&self) -> bool
    {   match self
        {   Error::HttpError(_)
          | Error::Timeout
          | Error::RateLimitExceeded
          | Error::ParseError(_)
          | Error::NoChoicesInResponse
          | Error::Other(_) => true
          , Error::ApiError { status, .. } => {
              *status >= 500 || *status == 408
            }
          , Error::InvalidInput(_)
          | Error::MissingApiKey(_)
          | Error::Unauthorized(_)
          | Error::InvalidConfiguration(_) => false
        }
    }

    /// Map a backend HTTP status and body to an error
    pub fn from_status(status: u16, body: String) -> Self
    {   match status
        {   429 => Error::RateLimitExceeded
          , 401 | 403 => Error::Unauthorized(body)
          , _ => Error::ApiError { status, message: body }
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidInput(msg) => {
              write!(f, "{}", msg)
            }
          , Error::MissingApiKey(backend) => {
              write!(f, "Missing API key for: {}", backend)
            }
          , Error::Unauthorized(msg) => {
              write!(f, "Unauthorized: {}", msg)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, message } => {
              write!(f, "API error ({}): {}", status, message)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::RateLimitExceeded => {
              write!(f, "API rate limit exceeded")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else if e.is_decode()
        {   Error::ParseError(e.to_string())
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn classifies_status_codes()
    {   assert_eq!(
          Error::from_status(429, String::new()),
          Error::RateLimitExceeded
        );
        assert!(Error::from_status(429, String::new()).is_transient());
        assert!(Error::from_status(503, "down".into()).is_transient());
        assert!(!Error::from_status(401, "bad key".into()).is_transient());
        assert!(!Error::from_status(400, "bad body".into()).is_transient());
    }

    #[test]
    fn configuration_errors_are_terminal()
    {   assert!(!Error::MissingApiKey("openai".into()).is_transient());
        assert!(!Error::InvalidInput("x".into()).is_transient());
        assert!(Error::Timeout.is_transient());
    }
}
