use serde::{Deserialize, Serialize};
use std::fmt;

/// Header of every rendered report.
pub const REPORT_HEADER: &str = "month,states,count";

/// Separator placed between region names inside one report row.
pub const REGION_SEPARATOR: &str = ";";

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month rendered as `"YYYY-MM"`.
///
/// Ordering compares year then month, which is the same order as comparing the
/// rendered strings lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: u16,
    month: u8,
}

impl MonthKey {
    /// Build a key, returning `None` when `month` is outside `1..=12` or the
    /// year does not fit in four digits.
    pub fn new(year: u16, month: u8) -> Option<Self> {
        if year > 9999 || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ── RequiredColumns ───────────────────────────────────────────────────────────

/// Names of the three header columns the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredColumns {
    /// Column holding the loosely formatted date.
    pub date: String,
    /// Column holding the region (state) name.
    pub region: String,
    /// Column holding the numeric metric.
    pub value: String,
}

impl RequiredColumns {
    pub fn new(
        date: impl Into<String>,
        region: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
            value: value.into(),
        }
    }

    /// The three names in date, region, value order.
    pub fn names(&self) -> [&str; 3] {
        [&self.date, &self.region, &self.value]
    }
}

impl Default for RequiredColumns {
    fn default() -> Self {
        Self::new("date", "state", "totalTestResults")
    }
}

// ── Skip diagnostics ──────────────────────────────────────────────────────────

/// Why a data line did not contribute to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Empty or whitespace-only line.
    BlankLine,
    /// Fewer fields than the highest required column index needs.
    TooFewFields,
    /// The date field yielded no month key.
    InvalidDate,
    /// The region field was empty after trimming.
    EmptyRegion,
    /// The value field was empty after trimming.
    EmptyValue,
    /// The value field could not be read as a number.
    NonNumericValue,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::BlankLine => "blank line",
            SkipReason::TooFewFields => "too few fields",
            SkipReason::InvalidDate => "unparseable date",
            SkipReason::EmptyRegion => "empty region",
            SkipReason::EmptyValue => "empty value",
            SkipReason::NonNumericValue => "non-numeric value",
        }
    }

    /// Blank lines are padding, everything else is a malformed row.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, SkipReason::BlankLine)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-reason tally of skipped lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipStats {
    pub blank_lines: u64,
    pub too_few_fields: u64,
    pub invalid_date: u64,
    pub empty_region: u64,
    pub empty_value: u64,
    pub non_numeric_value: u64,
}

impl SkipStats {
    pub fn record(&mut self, reason: SkipReason) {
        let slot = match reason {
            SkipReason::BlankLine => &mut self.blank_lines,
            SkipReason::TooFewFields => &mut self.too_few_fields,
            SkipReason::InvalidDate => &mut self.invalid_date,
            SkipReason::EmptyRegion => &mut self.empty_region,
            SkipReason::EmptyValue => &mut self.empty_value,
            SkipReason::NonNumericValue => &mut self.non_numeric_value,
        };
        *slot += 1;
    }

    /// Skipped rows excluding blank lines.
    pub fn malformed(&self) -> u64 {
        self.too_few_fields
            + self.invalid_date
            + self.empty_region
            + self.empty_value
            + self.non_numeric_value
    }

    pub fn total(&self) -> u64 {
        self.blank_lines + self.malformed()
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// One output line: the regions whose monthly peak exceeded the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub month: MonthKey,
    /// Sorted ascending.
    pub regions: Vec<String>,
}

impl ReportRow {
    pub fn count(&self) -> usize {
        self.regions.len()
    }

    /// `<month>,<r1>;<r2>;...,<count>`. Region names are written verbatim.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{}",
            self.month,
            self.regions.join(REGION_SEPARATOR),
            self.count()
        )
    }
}

/// The full threshold report, one row per month in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Header line followed by one line per row.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(REPORT_HEADER.to_string());
        lines.extend(self.rows.iter().map(ReportRow::to_csv_line));
        lines
    }

    /// Lines joined with `\n`, without a trailing newline.
    pub fn render(&self) -> String {
        self.lines().join("\n")
    }

    /// Number of months with at least one qualifying region.
    pub fn qualifying_months(&self) -> usize {
        self.rows.iter().filter(|r| r.count() > 0).count()
    }
}
