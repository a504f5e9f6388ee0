use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sub-directory of the download folder that holds the dataset.
const DATA_DIR: &str = "extracted_files";
const DEFAULT_INPUT: &str = "usscv19d.csv";
const DEFAULT_OUTPUT: &str = "states_above_1M_by_month.csv";

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber, writing to stderr.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

/// Map the CLI level names onto tracing's lowercase level names.
fn filter_directive(log_level: &str) -> String {
    let upper = log_level.to_uppercase();
    match upper.as_str() {
        "DEBUG" | "CRITICAL" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

// ── Default paths ──────────────────────────────────────────────────────────────

/// Directory holding the default input and output files.
///
/// Uses the platform download directory, falling back to `~/Downloads` and
/// finally to the working directory.
pub fn default_data_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR)
}

/// `(input, output)` used when neither CLI nor config file names them.
pub fn default_paths() -> (PathBuf, PathBuf) {
    let dir = default_data_dir();
    (dir.join(DEFAULT_INPUT), dir.join(DEFAULT_OUTPUT))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_maps_cli_names() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("CRITICAL"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("error"), "error");
    }

    #[test]
    fn test_filter_directive_passes_through_unknown() {
        assert_eq!(filter_directive("Trace"), "trace");
    }

    #[test]
    fn test_default_paths_share_data_dir() {
        let (input, output) = default_paths();
        assert_eq!(input.parent(), output.parent());
        assert!(input.ends_with("extracted_files/usscv19d.csv"));
        assert!(output.ends_with("extracted_files/states_above_1M_by_month.csv"));
    }
}
