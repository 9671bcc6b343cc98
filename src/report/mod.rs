//! Text summary over the persisted metric table.
//!
//! Implements the consumer side of the table contract: read the CSV, coerce
//! the time-to-integration column to numeric (invalid values become
//! missing), sort by merge date, drop rows sharing an exact merge date, and
//! aggregate per calendar month.

use std::collections::BTreeMap;

use camino::Utf8Path;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use tracing::warn;

use crate::github::error::IngestError;
use crate::persistence::table::{MERGE_DATE_COLUMN, MERGE_DATE_FORMAT};

const DAYS_COLUMN: &str = "Time to Integration (days)";
const ADDITIONS_COLUMN: &str = "Total Additions";
const DELETIONS_COLUMN: &str = "Total Deletions";

/// One table row after coercion.
#[derive(Debug, Clone, PartialEq)]
struct ReportRow {
    merged_at: DateTime<Utc>,
    days: Option<f64>,
    lines_changed: u64,
}

/// Aggregates for one calendar month of merged pull requests.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    /// Calendar month in `YYYY-MM` form.
    pub month: String,
    /// Merged pull requests in the month.
    pub merged: usize,
    /// Mean time to integration over rows with a numeric value.
    pub mean_days: Option<f64>,
    /// Sum of lines changed across the month.
    pub total_lines_changed: u64,
    /// Share of rows integrated in under twenty-four hours.
    pub proportion_under_24h: f64,
}

/// Reads the metric table and renders the monthly summary as text.
///
/// # Errors
///
/// Returns [`IngestError::TableMissing`] when no table exists at `path`,
/// [`IngestError::TableMalformed`] when the header lacks the merge-date
/// column, and [`IngestError::Io`] for read failures.
pub fn render_report(path: &Utf8Path) -> Result<String, IngestError> {
    let rows = load_rows(path)?;
    let summaries = monthly_summaries(rows);
    Ok(render(&summaries))
}

fn load_rows(path: &Utf8Path) -> Result<Vec<ReportRow>, IngestError> {
    if !path.as_std_path().exists() {
        return Err(IngestError::TableMissing {
            path: path.to_string(),
        });
    }

    let mut reader = csv::Reader::from_path(path).map_err(|error| IngestError::Io {
        message: format!("failed to open metric table '{path}': {error}"),
    })?;

    let headers = reader
        .headers()
        .map_err(|error| IngestError::TableMalformed {
            message: format!("unreadable header: {error}"),
        })?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|error| IngestError::TableMalformed {
            message: format!("unreadable row: {error}"),
        })?;
        if let Some(row) = columns.coerce(&record) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Header positions of the columns the summary consumes.
struct ColumnIndex {
    merge_date: usize,
    days: usize,
    additions: Option<usize>,
    deletions: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let position = |name: &str| headers.iter().position(|header| header == name);

        let Some(merge_date) = position(MERGE_DATE_COLUMN) else {
            return Err(IngestError::TableMalformed {
                message: format!("'{MERGE_DATE_COLUMN}' column not found"),
            });
        };
        let Some(days) = position(DAYS_COLUMN) else {
            return Err(IngestError::TableMalformed {
                message: format!("'{DAYS_COLUMN}' column not found"),
            });
        };
        Ok(Self {
            merge_date,
            days,
            additions: position(ADDITIONS_COLUMN),
            deletions: position(DELETIONS_COLUMN),
        })
    }

    /// Coerces one record, dropping it only when the merge date is absent
    /// or unparseable. An invalid time-to-integration value becomes missing
    /// rather than discarding the row.
    fn coerce(&self, record: &csv::StringRecord) -> Option<ReportRow> {
        let raw_date = record.get(self.merge_date)?;
        let merged_at = match NaiveDateTime::parse_from_str(raw_date, MERGE_DATE_FORMAT) {
            Ok(naive) => naive.and_utc(),
            Err(error) => {
                warn!(value = raw_date, "dropping row with unparseable merge date: {error}");
                return None;
            }
        };

        let days = record.get(self.days).and_then(|value| value.parse().ok());
        let lines_changed =
            counter(record, self.additions) + counter(record, self.deletions);

        Some(ReportRow {
            merged_at,
            days,
            lines_changed,
        })
    }
}

fn counter(record: &csv::StringRecord, index: Option<usize>) -> u64 {
    index
        .and_then(|index| record.get(index))
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

/// Sorts by merge date, drops later rows sharing an exact merge date, and
/// folds the remainder into per-month aggregates in chronological order.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "means and proportions over row counts are inherently floating point"
)]
fn monthly_summaries(mut rows: Vec<ReportRow>) -> Vec<MonthlySummary> {
    rows.sort_by_key(|row| row.merged_at);
    rows.dedup_by_key(|row| row.merged_at);

    let mut buckets: BTreeMap<(i32, u32), Vec<ReportRow>> = BTreeMap::new();
    for row in rows {
        buckets
            .entry((row.merged_at.year(), row.merged_at.month()))
            .or_default()
            .push(row);
    }

    buckets
        .into_iter()
        .map(|((year, month), rows)| {
            let merged = rows.len();
            let numeric: Vec<f64> = rows.iter().filter_map(|row| row.days).collect();
            let mean_days = if numeric.is_empty() {
                None
            } else {
                Some(numeric.iter().sum::<f64>() / numeric.len() as f64)
            };
            let under_24h = rows
                .iter()
                .filter(|row| row.days.is_some_and(|days| days < 1.0))
                .count();
            let total_lines_changed = rows.iter().map(|row| row.lines_changed).sum();

            MonthlySummary {
                month: format!("{year:04}-{month:02}"),
                merged,
                mean_days,
                total_lines_changed,
                proportion_under_24h: under_24h as f64 / merged as f64,
            }
        })
        .collect()
}

#[expect(
    clippy::float_arithmetic,
    reason = "percentage rendering of an already-computed proportion"
)]
fn render(summaries: &[MonthlySummary]) -> String {
    let mut out = format!(
        "{:<8} {:>7} {:>10} {:>14} {:>10}\n",
        "Month", "Merged", "Mean days", "Lines changed", "Under 24h"
    );
    for summary in summaries {
        let mean = summary
            .mean_days
            .map_or_else(|| "-".to_owned(), |days| format!("{days:.2}"));
        out.push_str(&format!(
            "{:<8} {:>7} {:>10} {:>14} {:>9.1}%\n",
            summary.month,
            summary.merged,
            mean,
            summary.total_lines_changed,
            summary.proportion_under_24h * 100.0
        ));
    }
    out
}
