// src/notify/sms.rs

//! Bulk SMS extension.
//!
//! Recipient addresses come from a plain-text list file; gateway credentials
//! come from the environment. Either being absent disables the extension for
//! the run — the core pipeline never aborts over notification plumbing.
//!
//! Fan-out is strictly sequential with a fixed pause between recipients (the
//! gateway rate limit), and a failed send to one recipient never blocks the
//! rest.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::SmsConfig;

/// Required address length after digit cleaning.
const PHONE_LENGTH: usize = 11;

/// Allowed address prefixes.
const VALID_PREFIXES: [&str; 6] = ["13", "14", "15", "17", "18", "19"];

/// Template parameters carried by every message in a batch.
#[derive(Debug, Clone, Copy)]
pub struct SmsParams {
    pub today_count: u64,
    pub yesterday_count: u64,
    pub increment: i64,
}

impl SmsParams {
    /// Gateway-side template parameters. Values are strings, matching the
    /// message template contract.
    pub fn template_params(&self) -> serde_json::Value {
        json!({
            "todaycount": self.today_count.to_string(),
            "yesterdaycount": self.yesterday_count.to_string(),
            "increment": self.increment.to_string(),
        })
    }
}

/// A mechanism that delivers one templated message to one recipient.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, params: &SmsParams) -> Result<()>;
}

/// Gateway implementation posting JSON to a configured HTTP endpoint.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    sign_name: String,
    template_code: String,
    access_key_id: String,
    access_key_secret: String,
}

impl HttpSmsGateway {
    /// Build the gateway from configuration and environment credentials.
    ///
    /// Missing credentials are a configuration error; the caller decides
    /// whether that disables the extension or aborts.
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        let access_key_id = std::env::var(&config.access_key_id_env).map_err(|_| {
            AppError::config(format!(
                "environment variable {} is not set",
                config.access_key_id_env
            ))
        })?;
        let access_key_secret = std::env::var(&config.access_key_secret_env).map_err(|_| {
            AppError::config(format!(
                "environment variable {} is not set",
                config.access_key_secret_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            sign_name: config.sign_name.clone(),
            template_code: config.template_code.clone(),
            access_key_id,
            access_key_secret,
        })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, phone: &str, params: &SmsParams) -> Result<()> {
        let payload = json!({
            "phone_number": phone,
            "sign_name": self.sign_name,
            "template_code": self.template_code,
            "template_param": params.template_params(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.access_key_id, Some(&self.access_key_secret))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        // The gateway reports application-level failures in the body.
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if let Some(code) = body.get("code").and_then(|v| v.as_str()) {
            if code != "OK" {
                let message = body
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown gateway failure");
                return Err(AppError::transport(
                    self.endpoint.as_str(),
                    format!("gateway returned code {code}: {message}"),
                ));
            }
        }
        Ok(())
    }
}

/// Load and filter the recipient list.
///
/// Blank lines and `#` comments are skipped; remaining entries are cleaned
/// to digits. Entries with the wrong length or a disallowed prefix are
/// excluded with a warning and never count toward the batch total. The
/// result is deduplicated and sorted.
pub fn load_recipients(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("cannot read recipient list {}: {}", path.display(), e))
    })?;

    let mut phones = std::collections::BTreeSet::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
        if is_valid_phone(&digits) {
            phones.insert(digits);
        } else {
            log::warn!("Skipping malformed recipient entry: {line}");
        }
    }

    Ok(phones.into_iter().collect())
}

fn is_valid_phone(digits: &str) -> bool {
    digits.len() == PHONE_LENGTH
        && VALID_PREFIXES
            .iter()
            .any(|prefix| digits.starts_with(prefix))
}

/// Send the delta message to every recipient, strictly sequentially.
///
/// Returns `(success_count, total_count)`. A per-recipient failure is logged
/// and tallied, never escalated.
pub async fn notify_batch(
    gateway: &dyn SmsGateway,
    recipients: &[String],
    params: &SmsParams,
    delay: Duration,
) -> (usize, usize) {
    let total = recipients.len();
    let mut success = 0;

    for (index, phone) in recipients.iter().enumerate() {
        log::debug!("[{}/{}] Sending SMS to {}", index + 1, total, phone);

        match gateway.send(phone, params).await {
            Ok(()) => {
                success += 1;
                log::info!("SMS delivered to {phone}");
            }
            Err(e) => log::warn!("SMS delivery to {phone} failed: {e}"),
        }

        if index + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    (success, total)
}
