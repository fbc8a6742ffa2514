// src/models/mod.rs

//! Domain models for the mod-count tracker.

mod config;
mod sample;

// Re-export all public types
pub use config::{
    Config, FetchConfig, LedgerConfig, LookupPolicy, Messages, ReportConfig, SmsConfig,
};
pub use sample::MetricSample;
