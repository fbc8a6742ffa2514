// src/utils/time.rs

//! Fixed-timezone clock utilities.
//!
//! The calendar day a measurement belongs to is always taken in one
//! configured UTC offset, so runs from hosts in different zones agree on
//! which row they touch.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Canonical date format used as the ledger key.
pub const CANONICAL_DATE_FORMAT: &str = "%Y/%m/%d";

/// Build a fixed offset from whole hours east of UTC.
pub fn fixed_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
}

/// Current time in the given fixed offset.
pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Render a date in the canonical `YYYY/MM/DD` form.
pub fn date_string(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}
