use thiserror::Error;

/// Origin tag for failures raised by the dispatch layer itself
pub const FACTORY_ORIGIN: &str = "AIFactory";

/// Message carried by a response when nothing could be selected
pub const NO_PROVIDERS_MESSAGE: &str = "No AI providers available";

/// Provider id reported when no provider produced the outcome
pub const NO_PROVIDER: &str = "none";

pub type Result<T> = std::result::Result<T, Error>;

/// Custom error type for aifactory operations
/// Implements Clone so failures can be copied into responses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error
{   /// Registry is empty or selection found no candidate
    #[error("{}", NO_PROVIDERS_MESSAGE)]
    NoProvidersAvailable
  , /// A provider reported `success:false`
    #[error("{message}")]
    ProviderFailure
    {   provider_id: String
      , message: String
    }
  , /// Escaped panic or internal bug caught at the dispatch boundary
    #[error("Dispatch error: {0}")]
    Dispatch(String)
  , /// API key is missing for a provider
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String)
  , /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiError
    {   status: u16
      , message: String
    }
  , /// Failed to parse API response
    #[error("Parse error: {0}")]
    ParseError(String)
  , /// No choices in API response
    #[error("API response contained no choices")]
    NoChoicesInResponse
  , /// Rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Timeout error
    #[error("Request timed out")]
    Timeout
  , /// Generic error
    #[error("Error: {0}")]
    Other(String)
}

impl Error
{   /// Where the failure originated: the dispatch layer or a provider
    pub fn origin(&self) -> &str
    {   match self
        {   Error::ProviderFailure { provider_id, .. } => provider_id.as_str()
          , _ => FACTORY_ORIGIN
        }
    }

    /// Provider context for the failure, `"none"` when no provider ran
    pub fn provider_id(&self) -> &str
    {   match self
        {   Error::ProviderFailure { provider_id, .. } => provider_id.as_str()
          , _ => NO_PROVIDER
        }
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ParseError(e.to_string())
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
