// src/report.rs

//! Day-over-day delta summary.
//!
//! Renders the notification message from the configured templates. Wording
//! lives entirely in [`Messages`](crate::models::Messages) so deployments can
//! localize it without touching code.

use chrono::NaiveDate;

use crate::models::Messages;
use crate::utils::time;

/// Builds the human-readable summary for one day's measurement.
pub struct DeltaReporter<'a> {
    messages: &'a Messages,
    subject: &'a str,
}

impl<'a> DeltaReporter<'a> {
    pub fn new(messages: &'a Messages, subject: &'a str) -> Self {
        Self { messages, subject }
    }

    /// Render the summary message.
    ///
    /// The summary clause always carries the date, the subject, and today's
    /// count. When a prior-day entry is given, a comparison clause follows:
    /// an increase for a non-negative difference (zero included), a decrease
    /// otherwise, always with the magnitude. No prior-day entry means no
    /// comparison clause, never an error.
    pub fn summarize(
        &self,
        date: NaiveDate,
        today_count: u64,
        yesterday: Option<(NaiveDate, u64)>,
    ) -> String {
        let mut message = self
            .messages
            .summary
            .replace("{date}", &time::date_string(date))
            .replace("{subject}", self.subject)
            .replace("{count}", &today_count.to_string());

        if let Some((yesterday_date, yesterday_count)) = yesterday {
            let diff = today_count as i64 - yesterday_count as i64;
            let template = if diff >= 0 {
                &self.messages.increase
            } else {
                &self.messages.decrease
            };

            message.push_str(
                &template
                    .replace("{diff}", &diff.abs().to_string())
                    .replace("{yesterday_date}", &time::date_string(yesterday_date))
                    .replace("{yesterday_count}", &yesterday_count.to_string()),
            );
        }

        message
    }
}
