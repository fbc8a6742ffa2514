//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP transport behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Ledger persistence settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Subject, metric, and timezone settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Bulk SMS extension settings
    #[serde(default)]
    pub sms: SmsConfig,

    /// Display message templates
    #[serde(default)]
    pub messages: Messages,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.fetch.url).is_err() {
            return Err(AppError::validation("fetch.url is not a valid URL"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.retry_attempts == 0 {
            return Err(AppError::validation("fetch.retry_attempts must be > 0"));
        }
        if self.fetch.use_mirror && self.fetch.mirror_prefix.trim().is_empty() {
            return Err(AppError::validation(
                "fetch.mirror_prefix is empty but fetch.use_mirror is set",
            ));
        }
        if self.ledger.path.trim().is_empty() {
            return Err(AppError::validation("ledger.path is empty"));
        }
        if self.report.subject.trim().is_empty() {
            return Err(AppError::validation("report.subject is empty"));
        }
        if !(-12..=14).contains(&self.report.utc_offset_hours) {
            return Err(AppError::validation(
                "report.utc_offset_hours must be between -12 and 14",
            ));
        }
        if self.sms.enabled {
            if url::Url::parse(&self.sms.endpoint).is_err() {
                return Err(AppError::validation("sms.endpoint is not a valid URL"));
            }
            if self.sms.sign_name.trim().is_empty() {
                return Err(AppError::validation("sms.sign_name is empty"));
            }
            if self.sms.template_code.trim().is_empty() {
                return Err(AppError::validation("sms.template_code is empty"));
            }
            if self.sms.recipients_file.trim().is_empty() {
                return Err(AppError::validation("sms.recipients_file is empty"));
            }
        }
        Ok(())
    }
}

/// HTTP transport behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Page to fetch the metric from
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Route the request through the mirror prefix
    #[serde(default = "defaults::use_mirror")]
    pub use_mirror: bool,

    /// Mirror prefix prepended to the scheme-stripped target URL
    #[serde(default = "defaults::mirror_prefix")]
    pub mirror_prefix: String,

    /// Total attempts for the primary transport
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between attempts in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            use_mirror: defaults::use_mirror(),
            mirror_prefix: defaults::mirror_prefix(),
            retry_attempts: defaults::retry_attempts(),
            retry_delay_secs: defaults::retry_delay(),
        }
    }
}

/// Prior-day lookup policy.
///
/// `StrictDate` resolves yesterday's count only from a row whose date
/// normalizes to yesterday. `Latest` is the legacy mode that takes the last
/// row regardless of its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LookupPolicy {
    #[default]
    StrictDate,
    Latest,
}

/// Ledger persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the count table file
    #[serde(default = "defaults::ledger_path")]
    pub path: String,

    /// Plain-text snapshot written after each successful run
    #[serde(default = "defaults::debug_file")]
    pub debug_file: Option<String>,

    /// How yesterday's count is resolved
    #[serde(default)]
    pub lookup: LookupPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: defaults::ledger_path(),
            debug_file: defaults::debug_file(),
            lookup: LookupPolicy::default(),
        }
    }
}

/// Subject, metric, and timezone settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Subject label recorded in the ledger
    #[serde(default = "defaults::subject")]
    pub subject: String,

    /// Metric name used in the debug snapshot
    #[serde(default = "defaults::metric_name")]
    pub metric_name: String,

    /// Fixed UTC offset the calendar day is anchored to
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Human-readable timezone label
    #[serde(default = "defaults::timezone_label")]
    pub timezone_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            subject: defaults::subject(),
            metric_name: defaults::metric_name(),
            utc_offset_hours: defaults::utc_offset_hours(),
            timezone_label: defaults::timezone_label(),
        }
    }
}

/// Bulk SMS extension settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Whether the extension runs at all
    #[serde(default)]
    pub enabled: bool,

    /// Gateway endpoint the send request is posted to
    #[serde(default)]
    pub endpoint: String,

    /// Signature name attached to each message
    #[serde(default)]
    pub sign_name: String,

    /// Message template identifier on the gateway side
    #[serde(default)]
    pub template_code: String,

    /// File holding one recipient address per line
    #[serde(default = "defaults::recipients_file")]
    pub recipients_file: String,

    /// Environment variable holding the gateway access key id
    #[serde(default = "defaults::access_key_id_env")]
    pub access_key_id_env: String,

    /// Environment variable holding the gateway access key secret
    #[serde(default = "defaults::access_key_secret_env")]
    pub access_key_secret_env: String,

    /// Pause between recipients in milliseconds (gateway rate limit)
    #[serde(default = "defaults::send_delay_ms")]
    pub send_delay_ms: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            sign_name: String::new(),
            template_code: String::new(),
            recipients_file: defaults::recipients_file(),
            access_key_id_env: defaults::access_key_id_env(),
            access_key_secret_env: defaults::access_key_secret_env(),
            send_delay_ms: defaults::send_delay_ms(),
        }
    }
}

/// Display message templates.
///
/// Supported placeholders: `{date}`, `{subject}`, `{count}` in `summary`;
/// `{diff}`, `{yesterday_date}`, `{yesterday_count}` in the delta clauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "defaults::msg_summary")]
    pub summary: String,

    #[serde(default = "defaults::msg_increase")]
    pub increase: String,

    #[serde(default = "defaults::msg_decrease")]
    pub decrease: String,

    #[serde(default = "defaults::msg_title_done")]
    pub notify_title_done: String,

    #[serde(default = "defaults::msg_title_failed")]
    pub notify_title_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            summary: defaults::msg_summary(),
            increase: defaults::msg_increase(),
            decrease: defaults::msg_decrease(),
            notify_title_done: defaults::msg_title_done(),
            notify_title_failed: defaults::msg_title_failed(),
        }
    }
}

mod defaults {
    // Fetch defaults
    pub fn url() -> String {
        "https://steamcommunity.com/app/3167020/workshop/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn use_mirror() -> bool {
        true
    }
    pub fn mirror_prefix() -> String {
        "https://r.jina.ai/http://".into()
    }
    pub fn retry_attempts() -> u32 {
        2
    }
    pub fn retry_delay() -> u64 {
        2
    }

    // Ledger defaults
    pub fn ledger_path() -> String {
        "data/mod-counts.csv".into()
    }
    pub fn debug_file() -> Option<String> {
        Some("data/latest.txt".into())
    }

    // Report defaults
    pub fn subject() -> String {
        "Escape From Duckov".into()
    }
    pub fn metric_name() -> String {
        "ModCount".into()
    }
    pub fn utc_offset_hours() -> i32 {
        8
    }
    pub fn timezone_label() -> String {
        "Beijing Time".into()
    }

    // SMS defaults
    pub fn recipients_file() -> String {
        "data/phonelist.txt".into()
    }
    pub fn access_key_id_env() -> String {
        "SMS_ACCESS_KEY_ID".into()
    }
    pub fn access_key_secret_env() -> String {
        "SMS_ACCESS_KEY_SECRET".into()
    }
    pub fn send_delay_ms() -> u64 {
        1000
    }

    // Message defaults
    pub fn msg_summary() -> String {
        "{date}: the {subject} workshop lists {count} mods in total".into()
    }
    pub fn msg_increase() -> String {
        ", up {diff} from yesterday's {yesterday_count}".into()
    }
    pub fn msg_decrease() -> String {
        ", down {diff} from yesterday's {yesterday_count}".into()
    }
    pub fn msg_title_done() -> String {
        "Workshop mod count recorded".into()
    }
    pub fn msg_title_failed() -> String {
        "Workshop mod count failed".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_invalid_url() {
        let mut config = Config::default();
        config.fetch.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.fetch.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_subject() {
        let mut config = Config::default();
        config.report.subject = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_offset() {
        let mut config = Config::default();
        config.report.utc_offset_hours = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_checks_sms_only_when_enabled() {
        let mut config = Config::default();
        config.sms.endpoint = String::new();
        assert!(config.validate().is_ok());

        config.sms.enabled = true;
        assert!(config.validate().is_err());

        config.sms.endpoint = "https://sms.example.com/send".to_string();
        config.sms.sign_name = "Workshop".to_string();
        config.sms.template_code = "TPL_001".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_policy_parses_kebab_case() {
        let config: Config = toml::from_str("[ledger]\nlookup = \"latest\"\n").unwrap();
        assert_eq!(config.ledger.lookup, LookupPolicy::Latest);

        let config: Config = toml::from_str("[ledger]\nlookup = \"strict-date\"\n").unwrap();
        assert_eq!(config.ledger.lookup, LookupPolicy::StrictDate);
    }
}
