//! Date-keyed ledger of metric samples.
//!
//! One plain-text table per subject: a header row (`Date,Subject,Count`)
//! followed by one data row per canonical day. Cells are centered within a
//! minimum display width so the file reads as a table, and trimmed on read.
//!
//! ## Invariants
//!
//! - At most one row per canonical date; re-running on the same day
//!   overwrites that row's count in place.
//! - Rows are never deleted here.
//! - Callers only see normalized `(date, count)` pairs, never raw cells.
//!
//! The store is a single file with no locking; overlapping writers are an
//! unsupported condition, not a handled error path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};

use crate::error::{AppError, Result};
use crate::models::MetricSample;
use crate::utils::time;

/// Minimum display width of each column.
const MIN_COLUMN_WIDTH: usize = 16;

/// Column headers, in storage order.
const HEADERS: [&str; 3] = ["Date", "Subject", "Count"];

/// A normalized lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Parsed date of the matched row. `None` only in the legacy latest-row
    /// mode, when the stored cell does not parse as a date.
    pub date: Option<NaiveDate>,

    /// Stored count.
    pub count: u64,
}

/// One raw data row, cells trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub date_cell: String,
    pub subject: String,
    pub count: u64,
}

/// The persisted, date-keyed tabular store.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Open a ledger backed by the given file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All data rows in storage order. A missing file is an empty store.
    pub fn rows(&self) -> Result<Vec<LedgerRow>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::ledger(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let mut rows = Vec::new();
        // The first line is always the header row.
        for (index, line) in content.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(parse_row(line, index + 1)?);
        }
        Ok(rows)
    }

    /// Insert or overwrite the row for the sample's canonical date.
    ///
    /// Idempotent: applying the same sample twice leaves one row with the
    /// same stored state. Only the count cell is overwritten on a match.
    pub fn upsert(&self, sample: &MetricSample) -> Result<()> {
        let key = sample.canonical_date();
        let mut rows = self.rows()?;

        match rows.iter_mut().find(|row| comparable_key(&row.date_cell) == key) {
            Some(row) => row.count = sample.count,
            None => rows.push(LedgerRow {
                date_cell: key,
                subject: sample.subject.clone(),
                count: sample.count,
            }),
        }

        self.store(&rows)
    }

    /// Strict by-date lookup.
    ///
    /// Returns the entry whose row normalizes to exactly `date`, or `None`.
    /// Never substitutes the most recent row for an absent date.
    pub fn lookup_by_date(&self, date: NaiveDate) -> Result<Option<LedgerEntry>> {
        let key = time::date_string(date);

        for row in self.rows()? {
            if comparable_key(&row.date_cell) == key {
                return Ok(Some(LedgerEntry {
                    date: normalize_date_cell(&row.date_cell).or(Some(date)),
                    count: row.count,
                }));
            }
        }
        Ok(None)
    }

    /// Legacy lookup: the last row's entry, whatever date it holds.
    pub fn lookup_latest(&self) -> Result<Option<LedgerEntry>> {
        Ok(self.rows()?.last().map(|row| LedgerEntry {
            date: normalize_date_cell(&row.date_cell),
            count: row.count,
        }))
    }

    /// Render and persist the table atomically (write to temp, then rename).
    fn store(&self, rows: &[LedgerRow]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = String::new();
        content.push_str(&render_line(HEADERS[0], HEADERS[1], HEADERS[2]));
        for row in rows {
            content.push_str(&render_line(
                &row.date_cell,
                &row.subject,
                &row.count.to_string(),
            ));
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &content).map_err(|e| {
            AppError::ledger(format!("cannot write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::ledger(format!("cannot replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

/// Normalize a stored date cell, in fallback order: canonical format, ISO
/// date, RFC 3339 timestamp.
fn normalize_date_cell(cell: &str) -> Option<NaiveDate> {
    let text = cell.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, time::CANONICAL_DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    None
}

/// Comparable key for a date cell: the canonical date string when the cell
/// parses, the raw trimmed text verbatim otherwise.
fn comparable_key(cell: &str) -> String {
    match normalize_date_cell(cell) {
        Some(date) => time::date_string(date),
        None => cell.trim().to_string(),
    }
}

/// Split a data line into its three cells.
///
/// The subject column is taken between the first and last delimiter, so
/// subject labels may themselves contain commas.
fn parse_row(line: &str, line_no: usize) -> Result<LedgerRow> {
    let (date_cell, rest) = line
        .split_once(',')
        .ok_or_else(|| AppError::ledger(format!("line {line_no}: expected 3 columns")))?;
    let (subject, count_cell) = rest
        .rsplit_once(',')
        .ok_or_else(|| AppError::ledger(format!("line {line_no}: expected 3 columns")))?;

    let count = count_cell.trim().parse::<u64>().map_err(|_| {
        AppError::ledger(format!(
            "line {line_no}: count cell {:?} is not a non-negative integer",
            count_cell.trim()
        ))
    })?;

    Ok(LedgerRow {
        date_cell: date_cell.trim().to_string(),
        subject: subject.trim().to_string(),
        count,
    })
}

/// Render one line with centered, min-width cells.
fn render_line(date: &str, subject: &str, count: &str) -> String {
    format!(
        "{:^w$},{:^w$},{:^w$}\n",
        date,
        subject,
        count,
        w = MIN_COLUMN_WIDTH
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(y: i32, m: u32, d: u32, count: u64) -> MetricSample {
        MetricSample::new(date(y, m, d), "Escape From Duckov", count)
    }

    fn ledger_in(tmp: &TempDir) -> Ledger {
        Ledger::new(tmp.path().join("counts.csv"))
    }

    #[test]
    fn test_first_write_creates_header() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        ledger.upsert(&sample(2024, 5, 1, 100)).unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, format!("{:^16},{:^16},{:^16}", "Date", "Subject", "Count"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        ledger.upsert(&sample(2024, 5, 1, 100)).unwrap();
        let first = fs::read_to_string(ledger.path()).unwrap();

        ledger.upsert(&sample(2024, 5, 1, 100)).unwrap();
        let second = fs::read_to_string(ledger.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.rows().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_overwrites_count_in_place() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        ledger.upsert(&sample(2024, 5, 1, 100)).unwrap();
        ledger.upsert(&sample(2024, 5, 1, 130)).unwrap();

        let rows = ledger.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 130);

        let entry = ledger.lookup_by_date(date(2024, 5, 1)).unwrap().unwrap();
        assert_eq!(entry.count, 130);
    }

    #[test]
    fn test_lookup_by_date_is_strict() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        ledger.upsert(&sample(2024, 5, 1, 100)).unwrap();
        ledger.upsert(&sample(2024, 5, 2, 130)).unwrap();

        // Absent date must not fall back to the latest row.
        assert!(ledger.lookup_by_date(date(2024, 4, 30)).unwrap().is_none());
    }

    #[test]
    fn test_lookup_normalizes_iso_date_cells() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        let content = format!(
            "{}{}",
            render_line("Date", "Subject", "Count"),
            render_line("2024-05-01", "X", "100")
        );
        fs::write(ledger.path(), content).unwrap();

        let entry = ledger.lookup_by_date(date(2024, 5, 1)).unwrap().unwrap();
        assert_eq!(entry.count, 100);
        assert_eq!(entry.date, Some(date(2024, 5, 1)));
    }

    #[test]
    fn test_upsert_matches_iso_date_cells() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        let content = format!(
            "{}{}",
            render_line("Date", "Subject", "Count"),
            render_line("2024-05-01", "X", "100")
        );
        fs::write(ledger.path(), content).unwrap();

        ledger.upsert(&MetricSample::new(date(2024, 5, 1), "X", 130)).unwrap();

        let rows = ledger.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 130);
    }

    #[test]
    fn test_lookup_latest_ignores_dates() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        ledger.upsert(&sample(2024, 5, 1, 100)).unwrap();
        ledger.upsert(&sample(2024, 5, 2, 130)).unwrap();

        let entry = ledger.lookup_latest().unwrap().unwrap();
        assert_eq!(entry.date, Some(date(2024, 5, 2)));
        assert_eq!(entry.count, 130);
    }

    #[test]
    fn test_subject_with_comma_round_trips() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        let subject = "Duckov, Escape From";
        ledger
            .upsert(&MetricSample::new(date(2024, 5, 1), subject, 7))
            .unwrap();

        let rows = ledger.rows().unwrap();
        assert_eq!(rows[0].subject, subject);
        assert_eq!(rows[0].count, 7);
    }

    #[test]
    fn test_corrupt_count_cell_is_ledger_error() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        let content = format!(
            "{}{}",
            render_line("Date", "Subject", "Count"),
            render_line("2024/05/01", "X", "many")
        );
        fs::write(ledger.path(), content).unwrap();

        assert!(matches!(ledger.rows(), Err(AppError::Ledger(_))));
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        assert!(ledger.rows().unwrap().is_empty());
        assert!(ledger.lookup_by_date(date(2024, 5, 1)).unwrap().is_none());
        assert!(ledger.lookup_latest().unwrap().is_none());
    }

    #[test]
    fn test_two_day_sequence() {
        let tmp = TempDir::new().unwrap();
        let ledger = ledger_in(&tmp);

        ledger.upsert(&MetricSample::new(date(2024, 5, 1), "X", 100)).unwrap();
        assert_eq!(ledger.rows().unwrap().len(), 1);

        ledger.upsert(&MetricSample::new(date(2024, 5, 2), "X", 130)).unwrap();
        assert_eq!(ledger.rows().unwrap().len(), 2);

        // Day 1 is unaffected by day 2's upsert.
        let day1 = ledger.lookup_by_date(date(2024, 5, 1)).unwrap().unwrap();
        assert_eq!(day1.count, 100);

        let day2 = ledger.lookup_by_date(date(2024, 5, 2)).unwrap().unwrap();
        assert_eq!(day2.count - day1.count, 30);
    }
}
