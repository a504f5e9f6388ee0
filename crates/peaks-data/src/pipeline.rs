//! End-to-end report pipeline.
//!
//! Aggregates the input, filters by threshold and writes the report. The
//! stream variants work on any reader/writer pair; the path variant adds file
//! handling and only replaces the destination once the full report exists.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use peaks_core::error::{PeaksError, Result};
use peaks_core::formatting::{format_count, format_ratio};
use peaks_core::models::{Report, RequiredColumns, SkipStats};
use peaks_core::settings::PipelineConfig;
use tracing::{debug, info};

use crate::aggregator::PeakAggregator;
use crate::report::{build_report, write_report};

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters describing one pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    pub threshold: i64,
    /// Data lines read after the header.
    pub rows_read: u64,
    /// Rows that contributed to the aggregate.
    pub rows_aggregated: u64,
    pub skipped: SkipStats,
    /// Report rows written (one per month seen).
    pub months: usize,
    /// Months with at least one region above the threshold.
    pub qualifying_months: usize,
}

// ── Stream pipeline ───────────────────────────────────────────────────────────

/// Aggregate `reader` and build the threshold report in memory.
pub fn generate_report<R: BufRead>(
    reader: R,
    threshold: i64,
    columns: &RequiredColumns,
    strict: bool,
) -> Result<(Report, RunSummary)> {
    let agg = PeakAggregator::new(columns.clone())
        .strict(strict)
        .aggregate(reader)?;
    let report = build_report(&agg, threshold);

    let summary = RunSummary {
        generated_at: Utc::now(),
        threshold,
        rows_read: agg.rows_read,
        rows_aggregated: agg.rows_aggregated,
        skipped: agg.skipped,
        months: report.rows.len(),
        qualifying_months: report.qualifying_months(),
    };

    Ok((report, summary))
}

/// Run the whole pipeline from `reader` to `writer`.
///
/// Nothing is written unless aggregation succeeds.
pub fn run_report<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    threshold: i64,
    columns: &RequiredColumns,
    strict: bool,
) -> Result<RunSummary> {
    let (report, summary) = generate_report(reader, threshold, columns, strict)?;
    write_report(&report, writer)?;
    Ok(summary)
}

// ── File pipeline ─────────────────────────────────────────────────────────────

/// Read `config.input`, write the report to `config.output` and return the
/// output path.
///
/// The report goes to a sibling `.tmp` file first and is renamed into place,
/// so a failed run never leaves a partial report behind.
pub fn states_above_threshold_by_month(config: &PipelineConfig) -> Result<PathBuf> {
    let (path, _) = run_with_summary(config)?;
    Ok(path)
}

/// Same as [`states_above_threshold_by_month`] but also returns the
/// [`RunSummary`].
pub fn run_with_summary(config: &PipelineConfig) -> Result<(PathBuf, RunSummary)> {
    debug!(
        "Reading {} (threshold {})",
        config.input.display(),
        format_count(config.threshold)
    );

    let file = File::open(&config.input).map_err(|source| PeaksError::FileRead {
        path: config.input.clone(),
        source,
    })?;
    let (report, summary) = generate_report(
        BufReader::new(file),
        config.threshold,
        &config.columns,
        config.strict,
    )?;
    // The input handle is released here, before the output is opened.

    write_atomically(&config.output, &report)?;

    info!(
        "Wrote {} at {}: {} months, {} with regions above {}; rows aggregated {}, skipped {}",
        config.output.display(),
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.months,
        summary.qualifying_months,
        format_count(summary.threshold),
        format_ratio(summary.rows_aggregated, summary.rows_read),
        format_count(summary.skipped.total() as i64),
    );
    if summary.skipped.malformed() > 0 {
        debug!("Skip breakdown: {:?}", summary.skipped);
    }

    Ok((config.output.clone(), summary))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// `<name>.tmp` next to `path`.
fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        PeaksError::Config(format!("output path has no file name: {}", path.display()))
    })?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Write to a temp file then rename for atomicity.
fn write_atomically(path: &Path, report: &Report) -> Result<()> {
    let write_err = |source: std::io::Error| PeaksError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let tmp = temp_path_for(path)?;
    let result = File::create(&tmp)
        .and_then(|file| write_report(report, std::io::BufWriter::new(file)))
        .and_then(|()| std::fs::rename(&tmp, path));

    if let Err(source) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const HEADER: &str = "date,state,totalTestResults";

    fn run(input: &str, threshold: i64) -> Result<String> {
        let mut out = Vec::new();
        run_report(
            Cursor::new(input),
            &mut out,
            threshold,
            &RequiredColumns::default(),
            false,
        )?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn write_input(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    // ── stream pipeline ───────────────────────────────────────────────────────

    #[test]
    fn test_basic_scenario() {
        let input = [
            HEADER,
            "20200101,NY,500000",
            "20200115,NY,1200000",
            "20200201,CA,999999",
        ]
        .join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,NY,1\n2020-02,,0");
    }

    #[test]
    fn test_quoted_region_appears_verbatim() {
        let input = [HEADER, "20200101,\"New, York\",2000000", "20200101,NJ,3000000"].join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,NJ;New, York,2");
    }

    #[test]
    fn test_short_row_does_not_abort() {
        let input = [HEADER, "20200101,NY", "20200102,NY,2000000"].join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,NY,1");
    }

    #[test]
    fn test_threshold_boundary() {
        let input = [HEADER, "20200101,AA,1000000", "20200101,BB,1000001"].join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,BB,1");
    }

    #[test]
    fn test_invalid_dates_skipped() {
        let input = [HEADER, "2021,NY,5000000", "20211301,NY,5000000", "20210301,NY,5"].join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2021-03,,0");
    }

    #[test]
    fn test_decimal_values_truncated() {
        let input = [HEADER, "20200101,NY,1000000.99"].join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,,0");
    }

    #[test]
    fn test_out_of_range_values_saturate() {
        let input = [
            HEADER,
            "20200101,NY,1e300",
            "20200201,CA,-1e300",
            "20200301,TX,9223372036854775808",
        ]
        .join("\n");
        let out = run(&input, 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,NY,1\n2020-02,,0\n2020-03,TX,1");
    }

    #[test]
    fn test_cr_only_input() {
        let out = run("date,state,totalTestResults\r20200101,NY,2000000", 1_000_000).unwrap();
        assert_eq!(out, "month,states,count\n2020-01,NY,1");
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let input = [
            HEADER,
            "20200301,TX,3",
            "20200101,NY,9",
            "20200201,CA,9",
            "20200101,AL,9",
            "20200301,AK,9",
        ]
        .join("\n");
        let first = run(&input, 5).unwrap();
        let second = run(&input, 5).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "month,states,count\n2020-01,AL;NY,2\n2020-02,CA,1\n2020-03,AK,1"
        );
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let mut out = Vec::new();
        let err = run_report(
            Cursor::new(""),
            &mut out,
            0,
            &RequiredColumns::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, PeaksError::EmptyInput));
        assert!(out.is_empty());
    }

    #[test]
    fn test_generate_report_summary() {
        let input = [HEADER, "", "20200101,NY,9", "bad,NY,1", "20200201,CA,1"].join("\n");
        let started = Utc::now();
        let (report, summary) =
            generate_report(Cursor::new(input), 5, &RequiredColumns::default(), false).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.rows_aggregated, 2);
        assert_eq!(summary.skipped.blank_lines, 1);
        assert_eq!(summary.skipped.invalid_date, 1);
        assert_eq!(summary.months, 2);
        assert_eq!(summary.qualifying_months, 1);
        assert_eq!(summary.threshold, 5);
        assert!(summary.generated_at >= started);
        assert!(summary.generated_at <= Utc::now());
    }

    // ── file pipeline ─────────────────────────────────────────────────────────

    #[test]
    fn test_file_pipeline_writes_report() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "in.csv",
            &[HEADER, "20200101,NY,500000", "20200115,NY,1200000", "20200201,CA,999999"],
        );
        let output = dir.path().join("reports").join("out.csv");

        let config = PipelineConfig::new(&input, &output, 1_000_000);
        let written = states_above_threshold_by_month(&config).unwrap();

        assert_eq!(written, output);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "month,states,count\n2020-01,NY,1\n2020-02,,0");
        assert!(!dir.path().join("reports").join("out.csv.tmp").exists());
    }

    #[test]
    fn test_file_pipeline_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.csv", &[HEADER, "2020-06-01,WA,7", "2020-06-30,OR,2"]);
        let output = dir.path().join("out.csv");
        let config = PipelineConfig::new(&input, &output, 3);

        states_above_threshold_by_month(&config).unwrap();
        let first = std::fs::read(&output).unwrap();
        states_above_threshold_by_month(&config).unwrap();
        let second = std::fs::read(&output).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_file_pipeline_missing_input() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(dir.path().join("nope.csv"), dir.path().join("out.csv"), 0);
        let err = states_above_threshold_by_month(&config).unwrap_err();
        assert!(matches!(err, PeaksError::FileRead { .. }));
        assert!(!dir.path().join("out.csv").exists());
    }

    #[test]
    fn test_file_pipeline_missing_columns_keeps_old_output() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.csv", &["date,state", "20200101,NY"]);
        let output = dir.path().join("out.csv");
        std::fs::write(&output, "previous report").unwrap();

        let config = PipelineConfig::new(&input, &output, 0);
        let err = states_above_threshold_by_month(&config).unwrap_err();

        assert_eq!(
            err.to_string(),
            "missing required columns in CSV header: totalTestResults"
        );
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous report");
    }

    #[test]
    fn test_file_pipeline_custom_columns_and_strict() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.csv", &["when,where,n", "20200101,NY,5", "20200102,NY,x"]);
        let output = dir.path().join("out.csv");

        let lenient = PipelineConfig::new(&input, &output, 1)
            .with_columns(RequiredColumns::new("when", "where", "n"));
        let (_, summary) = run_with_summary(&lenient).unwrap();
        assert_eq!(summary.skipped.non_numeric_value, 1);

        let strict = lenient.with_strict(true);
        let err = states_above_threshold_by_month(&strict).unwrap_err();
        assert!(matches!(err, PeaksError::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn test_temp_path_for() {
        assert_eq!(
            temp_path_for(Path::new("/a/b/report.csv")).unwrap(),
            PathBuf::from("/a/b/report.csv.tmp")
        );
        assert!(matches!(
            temp_path_for(Path::new("/")),
            Err(PeaksError::Config(_))
        ));
    }
}
