/// Format an integer with thousands separators.
///
/// # Examples
///
/// ```
/// use peaks_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1_000_000), "1,000,000");
/// assert_eq!(format_count(-9876), "-9,876");
/// ```
pub fn format_count(value: i64) -> String {
    // unsigned_abs keeps i64::MIN representable.
    let grouped = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format `part` out of `whole` as `"part/whole (pct%)"`, one decimal place.
///
/// Returns `"0/0 (0.0%)"` when `whole` is zero.
///
/// # Examples
///
/// ```
/// use peaks_core::formatting::format_ratio;
///
/// assert_eq!(format_ratio(1, 4), "1/4 (25.0%)");
/// assert_eq!(format_ratio(1_500, 3_000), "1,500/3,000 (50.0%)");
/// ```
pub fn format_ratio(part: u64, whole: u64) -> String {
    let pct = if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    };
    format!(
        "{}/{} ({:.1}%)",
        group_thousands(&part.to_string()),
        group_thousands(&whole.to_string()),
        pct
    )
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
