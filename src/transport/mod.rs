// src/transport/mod.rs

//! Remote content retrieval.
//!
//! Two implementations of one [`Transport`] capability: a primary
//! `reqwest`-based client with retry, and a `curl` subprocess fallback for
//! environments where the primary cannot be built or keeps failing. They are
//! composed through [`FallbackTransport`], which walks the chain in order and
//! only gives up when every available transport has failed.

pub mod curl;
pub mod http;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

pub use curl::CurlTransport;
pub use http::HttpTransport;

/// Header set sent by every transport.
pub(crate) const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub(crate) const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// A mechanism that retrieves the raw body of a remote page.
///
/// The whole body is buffered in memory; there are no streaming semantics.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Whether this transport can run in the current environment.
    fn is_available(&self) -> bool {
        true
    }

    /// Fetch the body of `url` as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Ordered chain over the configured transports.
pub struct FallbackTransport {
    transports: Vec<Box<dyn Transport>>,
}

impl FallbackTransport {
    /// Compose an explicit chain. The order given is the order tried.
    pub fn new(transports: Vec<Box<dyn Transport>>) -> Self {
        Self { transports }
    }

    /// The standard chain: HTTP client first, curl subprocess second.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(vec![
            Box::new(HttpTransport::new(config)?),
            Box::new(CurlTransport::new(&config.user_agent)),
        ]))
    }
}

#[async_trait]
impl Transport for FallbackTransport {
    fn name(&self) -> &'static str {
        "fallback-chain"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_error: Option<AppError> = None;

        for transport in &self.transports {
            if !transport.is_available() {
                log::debug!("Transport {} unavailable, skipping", transport.name());
                continue;
            }

            match transport.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    log::warn!("Transport {} failed: {}", transport.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(cause) => AppError::transport(url, format!("all transports failed: {cause}")),
            None => AppError::transport(url, "no transport available"),
        })
    }
}
