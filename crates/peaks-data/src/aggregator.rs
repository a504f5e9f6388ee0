//! Per-(month, region) peak aggregation over a CSV stream.
//!
//! The first line is the header; every following line is tokenized, checked
//! and folded into a running maximum keyed by month and region. Malformed
//! rows are skipped and tallied unless strict mode is on.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::BufRead;

use peaks_core::error::{PeaksError, Result};
use peaks_core::models::{MonthKey, RequiredColumns, SkipReason, SkipStats};
use tracing::{debug, trace};

use crate::lines::TextLines;
use crate::month::month_key;
use crate::tokenizer::split_fields;

// ── HeaderIndex ───────────────────────────────────────────────────────────────

/// Column name to zero-based position. Duplicate names keep the last position.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

/// Resolved positions of the three required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPositions {
    pub date: usize,
    pub region: usize,
    pub value: usize,
}

impl ColumnPositions {
    /// Minimum field count a row needs to reach every required column.
    pub fn min_fields(&self) -> usize {
        self.date.max(self.region).max(self.value) + 1
    }
}

impl HeaderIndex {
    pub fn from_fields(fields: &[String]) -> Self {
        let positions = fields
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { positions }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Look up all three required columns, reporting every missing name.
    pub fn resolve(&self, columns: &RequiredColumns) -> Result<ColumnPositions> {
        let missing: Vec<String> = columns
            .names()
            .iter()
            .filter(|name| self.position(name).is_none())
            .map(|name| name.to_string())
            .collect();

        match (
            self.position(&columns.date),
            self.position(&columns.region),
            self.position(&columns.value),
        ) {
            (Some(date), Some(region), Some(value)) => Ok(ColumnPositions {
                date,
                region,
                value,
            }),
            _ => Err(PeaksError::MissingColumns { missing }),
        }
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    peaks: BTreeMap<(MonthKey, String), i64>,
    months: BTreeSet<MonthKey>,
    /// Data lines read after the header, blank ones included.
    pub rows_read: u64,
    /// Rows that contributed to the aggregate.
    pub rows_aggregated: u64,
    pub skipped: SkipStats,
}

impl Aggregation {
    /// Fold one value into the running maximum for `(month, region)`.
    pub fn record(&mut self, month: MonthKey, region: &str, value: i64) {
        self.months.insert(month);
        self.rows_aggregated += 1;
        self.peaks
            .entry((month, region.to_string()))
            .and_modify(|peak| {
                if value > *peak {
                    *peak = value;
                }
            })
            .or_insert(value);
    }

    /// Maximum value seen for `(month, region)`.
    pub fn peak(&self, month: MonthKey, region: &str) -> Option<i64> {
        self.peaks.get(&(month, region.to_string())).copied()
    }

    /// Distinct months seen, ascending.
    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months.iter().copied()
    }

    /// `(region, peak)` pairs for one month, regions ascending.
    pub fn peaks_in(&self, month: MonthKey) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.peaks
            .range((month, String::new())..)
            .take_while(move |((m, _), _)| *m == month)
            .map(|((_, region), value)| (region.as_str(), *value))
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }

    /// Number of distinct `(month, region)` pairs.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

// ── PeakAggregator ────────────────────────────────────────────────────────────

/// Reads a CSV stream into an [`Aggregation`].
#[derive(Debug, Clone, Default)]
pub struct PeakAggregator {
    columns: RequiredColumns,
    strict: bool,
}

impl PeakAggregator {
    pub fn new(columns: RequiredColumns) -> Self {
        Self {
            columns,
            strict: false,
        }
    }

    /// When `true`, the first malformed row aborts the pass.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Consume `reader` line by line. `\n`, `\r\n` and a lone `\r` all end a line.
    ///
    /// Fails with [`PeaksError::EmptyInput`] when there is no header line and
    /// [`PeaksError::MissingColumns`] when the header lacks a required column.
    pub fn aggregate<R: BufRead>(&self, reader: R) -> Result<Aggregation> {
        let mut lines = TextLines::new(reader);

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(PeaksError::EmptyInput),
        };
        let positions = HeaderIndex::from_fields(&split_fields(&header)).resolve(&self.columns)?;
        debug!(
            "Columns resolved: {}={}, {}={}, {}={}",
            self.columns.date,
            positions.date,
            self.columns.region,
            positions.region,
            self.columns.value,
            positions.value
        );

        let mut agg = Aggregation::default();

        // Header is line 1.
        for (line_no, line) in (2usize..).zip(lines) {
            let line = line?;
            agg.rows_read += 1;

            match parse_row(&line, &positions) {
                Ok((month, region, value)) => agg.record(month, &region, value),
                Err(reason) => {
                    if self.strict && reason.is_malformed() {
                        return Err(PeaksError::MalformedRow {
                            line: line_no,
                            reason,
                        });
                    }
                    trace!("Skipping line {}: {}", line_no, reason);
                    agg.skipped.record(reason);
                }
            }
        }

        debug!(
            "Aggregated {} of {} rows into {} months ({} skipped)",
            agg.rows_aggregated,
            agg.rows_read,
            agg.month_count(),
            agg.skipped.total()
        );

        Ok(agg)
    }
}

// ── Row parsing ───────────────────────────────────────────────────────────────

/// Extract `(month, region, value)` from one data line.
fn parse_row(
    line: &str,
    positions: &ColumnPositions,
) -> std::result::Result<(MonthKey, String, i64), SkipReason> {
    if line.trim().is_empty() {
        return Err(SkipReason::BlankLine);
    }

    let fields = split_fields(line);
    if fields.len() < positions.min_fields() {
        return Err(SkipReason::TooFewFields);
    }

    let month = month_key(&fields[positions.date]).ok_or(SkipReason::InvalidDate)?;

    let region = fields[positions.region].trim();
    if region.is_empty() {
        return Err(SkipReason::EmptyRegion);
    }
    let region = region.to_string();

    let raw_value = fields[positions.value].trim();
    if raw_value.is_empty() {
        return Err(SkipReason::EmptyValue);
    }
    let value = parse_value(raw_value).ok_or(SkipReason::NonNumericValue)?;

    Ok((month, region, value))
}

/// Read an integer or decimal string, truncating decimals toward zero.
///
/// Finite floats beyond the `i64` range saturate to `i64::MIN` / `i64::MAX`;
/// only `inf` and `nan` yield `None`.
fn parse_value(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f: f64 = raw.parse().ok()?;
    if !f.is_finite() {
        return None;
    }
    // Float to int `as` casts saturate at the bounds.
    Some(f.trunc() as i64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
