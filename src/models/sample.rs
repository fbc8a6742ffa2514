//! Metric sample data structure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::time;

/// One recorded measurement: a calendar day, a subject label, and a count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricSample {
    /// Calendar day in the configured fixed timezone
    pub date: NaiveDate,

    /// Subject the count belongs to
    pub subject: String,

    /// Measured count
    pub count: u64,
}

impl MetricSample {
    pub fn new(date: NaiveDate, subject: impl Into<String>, count: u64) -> Self {
        Self {
            date,
            subject: subject.into(),
            count,
        }
    }

    /// The canonical date string used as the ledger key.
    pub fn canonical_date(&self) -> String {
        time::date_string(self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_date() {
        let sample = MetricSample::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            "Escape From Duckov",
            100,
        );
        assert_eq!(sample.canonical_date(), "2024/05/01");
    }
}
