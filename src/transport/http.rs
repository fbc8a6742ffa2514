// src/transport/http.rs

//! Primary HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::error::Result;
use crate::models::FetchConfig;
use crate::transport::Transport;

/// `reqwest`-based transport with fixed-pause retry.
pub struct HttpTransport {
    client: reqwest::Client,
    attempts: u32,
    retry_delay: Duration,
}

impl HttpTransport {
    /// Create a configured asynchronous HTTP transport.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(super::ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(super::ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    /// Single fetch attempt. The body is decoded honoring a declared charset,
    /// falling back to UTF-8.
    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    log::warn!(
                        "HTTP attempt {}/{} failed for {}: {}",
                        attempt,
                        self.attempts,
                        url,
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        // attempts >= 1, so last_error is set by the time we get here
        Err(last_error.expect("at least one attempt was made"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_config() {
        let transport = HttpTransport::new(&FetchConfig::default()).unwrap();
        assert_eq!(transport.attempts, 2);
        assert_eq!(transport.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_attempts_clamped_to_one() {
        let config = FetchConfig {
            retry_attempts: 0,
            ..FetchConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.attempts, 1);
    }
}
