//! Threshold filtering of an [`Aggregation`] into a [`Report`].

use std::io::Write;

use peaks_core::models::{Report, ReportRow};

use crate::aggregator::Aggregation;

/// One row per month seen, ascending. A region is listed when its monthly peak
/// is strictly greater than `threshold`; region names are sorted ascending.
pub fn build_report(agg: &Aggregation, threshold: i64) -> Report {
    let rows = agg
        .months()
        .map(|month| {
            let mut regions: Vec<String> = agg
                .peaks_in(month)
                .filter(|&(_, peak)| peak > threshold)
                .map(|(region, _)| region.to_string())
                .collect();
            regions.sort();
            ReportRow { month, regions }
        })
        .collect();

    Report { rows }
}

/// Write the rendered report in one shot. No trailing newline is added.
pub fn write_report<W: Write>(report: &Report, mut writer: W) -> std::io::Result<()> {
    writer.write_all(report.render().as_bytes())?;
    writer.flush()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
