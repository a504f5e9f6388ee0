//! Heuristic date-to-month normalization.
//!
//! Every ASCII digit in the input is concatenated and the first six are read
//! as `YYYYMM`. Separators and text are ignored, so `2020-03-15`, `20200315`
//! and `2020/03` all map to `2020-03`. Layouts that do not lead with the year
//! (e.g. `03/15/2020`) are mis-read without any error signal. Only ASCII
//! digits count; digits from other scripts are ignored like any other text.

use peaks_core::models::MonthKey;

/// Minimum digit count for a year + month reading.
const MIN_DIGITS: usize = 6;

/// Extract a month key from a date-like string.
///
/// Returns `None` when fewer than six digits are present or the two digits
/// after the year are not a month in `1..=12`.
pub fn month_key(raw: &str) -> Option<MonthKey> {
    let digits: Vec<u8> = raw
        .chars()
        .filter_map(|c| c.to_digit(10))
        .take(MIN_DIGITS)
        .map(|d| d as u8)
        .collect();

    if digits.len() < MIN_DIGITS {
        return None;
    }

    let year = digits[..4]
        .iter()
        .fold(0u16, |acc, &d| acc * 10 + u16::from(d));
    let month = digits[4] * 10 + digits[5];

    MonthKey::new(year, month)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
