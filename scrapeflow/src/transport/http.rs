//! HTTP transport on `reqwest`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use tracing::debug;

use super::Transport;
use crate::config::FetchConfig;
use crate::errors::TransportError;

/// Fetches documents over HTTP(S).
///
/// Non-2xx answers are errors; bodies larger than
/// `FetchConfig::max_response_size` are rejected.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_response_size: usize,
}

impl HttpTransport {
    /// Creates a transport from a fetch configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header is invalid or the client
    /// cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| TransportError::new("", format!("invalid header name {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::new("", format!("invalid header value for {key}: {e}")))?;
            headers.insert(name, value);
        }

        let timeout = config
            .timeout()
            .map_err(|e| TransportError::new("", e.to_string()))?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| TransportError::new("", format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_response_size: config.max_response_size,
        })
    }

    fn too_large(&self, url: &str, size: usize) -> TransportError {
        TransportError::new(
            url,
            format!(
                "response of {size} bytes exceeds the limit of {} bytes",
                self.max_response_size
            ),
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::new(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(url, format!("HTTP {status}")).with_status(status.as_u16()));
        }

        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(length) = declared {
            if length > self.max_response_size {
                return Err(self.too_large(url, length).with_status(status.as_u16()));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(url, format!("cannot read body: {e}")))?;

        if body.len() > self.max_response_size {
            return Err(self.too_large(url, body.len()).with_status(status.as_u16()));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_config() {
        let config = FetchConfig::new()
            .with_timeout(5.0)
            .with_header("Accept-Language", "en-US");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.max_response_size, config.max_response_size);
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let config = FetchConfig::new().with_header("bad header", "x");
        assert!(HttpTransport::new(&config).is_err());
    }

    #[test]
    fn test_unusable_timeout_is_rejected() {
        let config = FetchConfig::new().with_timeout(-1.0);
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(err.message.contains("fetch.timeout_seconds"));
    }
}
