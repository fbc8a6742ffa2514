// src/pipeline/run.rs

//! The single batch run: fetch → extract → lookup → upsert → report.
//!
//! One invocation measures once. The run either completes or fails as a
//! whole; core failures propagate to the caller, while notification plumbing
//! (debug snapshot, toast, SMS) degrades gracefully.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{AppError, Result};
use crate::extract::CountExtractor;
use crate::ledger::Ledger;
use crate::models::{Config, LookupPolicy, MetricSample};
use crate::notify::{self, Notifier};
use crate::notify::sms::{self, HttpSmsGateway, SmsParams};
use crate::report::DeltaReporter;
use crate::transport::Transport;
use crate::utils::{time, url};

/// Run the pipeline once and return the rendered summary message.
pub async fn run_once(
    config: &Config,
    transport: &dyn Transport,
    notifier: &dyn Notifier,
) -> Result<String> {
    let offset = time::fixed_offset(config.report.utc_offset_hours)
        .ok_or_else(|| AppError::config("report.utc_offset_hours is out of range"))?;
    let now = time::now_in(offset);
    let today = now.date_naive();
    let yesterday = today - chrono::Duration::days(1);

    // Fetch
    let effective_url = if config.fetch.use_mirror {
        url::rewrite_for_mirror(&config.fetch.mirror_prefix, &config.fetch.url)
    } else {
        config.fetch.url.clone()
    };
    log::info!("Fetching {}", effective_url);
    let body = transport.fetch(&effective_url).await?;

    // Extract
    let count = CountExtractor::new().parse(&body)?;
    log::info!("Parsed count: {}", count);

    // Lookup yesterday, then record today
    let ledger = Ledger::new(&config.ledger.path);
    let previous = match config.ledger.lookup {
        LookupPolicy::StrictDate => ledger.lookup_by_date(yesterday)?,
        LookupPolicy::Latest => ledger.lookup_latest()?,
    };

    let sample = MetricSample::new(today, config.report.subject.clone(), count);
    ledger.upsert(&sample)?;
    log::info!(
        "Recorded {} = {} in {}",
        sample.canonical_date(),
        count,
        ledger.path().display()
    );

    if let Some(debug_file) = &config.ledger.debug_file {
        if let Err(e) = write_debug_snapshot(
            Path::new(debug_file),
            &config.report.metric_name,
            &config.report.timezone_label,
            today,
            count,
            now,
        ) {
            log::warn!("Could not write debug snapshot {}: {}", debug_file, e);
        }
    }

    // Report
    let yesterday_pair = previous
        .as_ref()
        .map(|entry| (entry.date.unwrap_or(yesterday), entry.count));
    let message =
        DeltaReporter::new(&config.messages, &config.report.subject).summarize(
            today,
            count,
            yesterday_pair,
        );

    notify::notify_best_effort(notifier, &config.messages.notify_title_done, &message);

    if config.sms.enabled {
        send_bulk_sms(config, count, yesterday_pair).await;
    }

    Ok(message)
}

/// Bulk SMS extension. Nothing here is fatal to the run.
async fn send_bulk_sms(
    config: &Config,
    today_count: u64,
    yesterday_pair: Option<(NaiveDate, u64)>,
) {
    let Some((_, yesterday_count)) = yesterday_pair else {
        log::info!("No prior-day record, skipping SMS notification");
        return;
    };

    let gateway = match HttpSmsGateway::from_config(&config.sms) {
        Ok(gateway) => gateway,
        Err(e) => {
            log::warn!("SMS extension disabled: {}", e);
            return;
        }
    };

    let recipients = match sms::load_recipients(Path::new(&config.sms.recipients_file)) {
        Ok(recipients) => recipients,
        Err(e) => {
            log::warn!("SMS extension disabled: {}", e);
            return;
        }
    };
    if recipients.is_empty() {
        log::info!("No valid recipients, skipping SMS notification");
        return;
    }

    let params = SmsParams {
        today_count,
        yesterday_count,
        increment: today_count as i64 - yesterday_count as i64,
    };
    let delay = Duration::from_millis(config.sms.send_delay_ms);

    let (success, total) = sms::notify_batch(&gateway, &recipients, &params, delay).await;
    if success == total {
        log::info!("SMS delivered to all {} recipients", total);
    } else {
        log::warn!("SMS partially delivered: {}/{}", success, total);
    }
}

/// Write the three-line debug snapshot.
fn write_debug_snapshot(
    path: &Path,
    metric_name: &str,
    timezone_label: &str,
    date: NaiveDate,
    count: u64,
    now: DateTime<FixedOffset>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = format!(
        "Date: {}\n{}: {}\nWrittenAt: {} ({})\n",
        time::date_string(date),
        metric_name,
        count,
        now.format("%Y-%m-%d %H:%M:%S"),
        timezone_label
    );
    std::fs::write(path, contents)?;
    Ok(())
}
