//! HTTP plumbing shared by the built-in providers

use log::{debug, error, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// One reusable client per provider, safe for concurrent requests
#[derive(Debug, Clone)]
pub struct HttpTransport
{   client: reqwest::Client
  , base_url: String
  , headers: HeaderMap
}

impl HttpTransport
{   pub fn new(
      base_url: impl Into<String>
    , timeout_secs: Option<u64>
    ) -> Result<Self>
    {   let timeout = Duration::from_secs(
          timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
        );
        let client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::InvalidConfiguration(e.to_string())
          })?;
        let mut headers = HeaderMap::new();
        headers.insert(
          CONTENT_TYPE
        , HeaderValue::from_static("application/json")
        );
        Ok(HttpTransport
        {   client
          , base_url: base_url.into().trim_end_matches('/').to_string()
          , headers
        })
    }

    /// Attach a header sent with every request
    pub fn with_header(
      mut self
    , name: &'static str
    , value: &str
    ) -> Result<Self>
    {   let value = HeaderValue::from_str(value).map_err(|e| {
          Error::InvalidConfiguration(
            format!("invalid {} header: {}", name, e)
          )
        })?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }

    pub fn with_bearer(self, token: &str) -> Result<Self>
    {   self.with_header("authorization", &format!("Bearer {}", token))
    }

    pub fn base_url(&self) -> &str
    {   &self.base_url
    }

    fn url(&self, path: &str) -> String
    {   format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned
    {   let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client
          .get(&url)
          .headers(self.headers.clone())
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::from(e)
          })?;
        Self::decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + std::fmt::Debug
      , T: DeserializeOwned
    {   let url = self.url(path);
        debug!("POST {}", url);
        trace!("Request body: {:?}", body);
        let response = self.client
          .post(&url)
          .headers(self.headers.clone())
          .json(body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::from(e)
          })?;
        Self::decode(response).await
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned
    {   let status = response.status();
        trace!("Response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_| "Unknown error".to_string());
            error!("API error {}: {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        let text = response.text().await.map_err(|e| {
          error!("Failed to read response: {}", e);
          Error::from(e)
        })?;
        serde_json::from_str(&text).map_err(|e| {
          error!("Parse error: {}", e);
          Error::ParseError(e.to_string())
        })
    }
}

fn status_error(status: StatusCode, message: String) -> Error
{   match status
    {   StatusCode::TOO_MANY_REQUESTS => Error::RateLimitExceeded
      , _ => Error::ApiError
        {   status: status.as_u16()
          , message
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn rate_limit_status_maps_to_rate_limit_error()
    {   let err = status_error(
          StatusCode::TOO_MANY_REQUESTS
        , "slow down".to_string()
        );
        assert_eq!(err, Error::RateLimitExceeded);
    }

    #[test]
    fn other_statuses_keep_body()
    {   let err = status_error(
          StatusCode::UNAUTHORIZED
        , "bad key".to_string()
        );
        assert_eq!(
          err
        , Error::ApiError { status: 401, message: "bad key".to_string() }
        );
    }

    #[test]
    fn base_url_drops_trailing_slash()
    {   let transport = HttpTransport::new("http://localhost:11434/", None)
          .expect("client");
        assert_eq!(transport.base_url(), "http://localhost:11434");
        assert_eq!(transport.url("/api/tags"), "http://localhost:11434/api/tags");
    }
}
