// src/transport/curl.rs

//! Subprocess fallback transport.
//!
//! Shells out to `curl`. The body lands in a temp file, is read back as
//! lossy UTF-8, and the temp file is deleted best-effort.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::transport::Transport;

/// Transport that invokes the external `curl` binary.
pub struct CurlTransport {
    user_agent: String,
}

impl CurlTransport {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!(
            "modwatch_http_{}_{}.tmp",
            std::process::id(),
            Utc::now().timestamp_millis()
        ))
    }
}

#[async_trait]
impl Transport for CurlTransport {
    fn name(&self) -> &'static str {
        "curl"
    }

    fn is_available(&self) -> bool {
        std::process::Command::new("curl")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let tmp = Self::temp_path();

        let status = tokio::process::Command::new("curl")
            .arg("-sS")
            .arg("-L")
            .arg("--compressed")
            .args(["-A", &self.user_agent])
            .args(["-H", &format!("Accept: {}", super::ACCEPT)])
            .args(["-H", &format!("Accept-Language: {}", super::ACCEPT_LANGUAGE)])
            .arg(url)
            .arg("--output")
            .arg(&tmp)
            .status()
            .await?;

        if !status.success() {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::transport(
                url,
                format!("curl exited with {status}"),
            ));
        }

        let bytes = tokio::fs::read(&tmp).await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        // Best effort: a leftover temp file is not a failed fetch.
        if let Err(e) = tokio::fs::remove_file(&tmp).await {
            log::debug!("Could not remove temp file {}: {}", tmp.display(), e);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_paths_are_distinct() {
        let a = CurlTransport::temp_path();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = CurlTransport::temp_path();
        assert_ne!(a, b);
    }

    #[test]
    fn test_name() {
        assert_eq!(CurlTransport::new("ua").name(), "curl");
    }
}
