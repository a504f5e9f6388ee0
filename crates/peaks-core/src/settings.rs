use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PeaksError, Result};
use crate::models::RequiredColumns;

/// Threshold used when neither the command line nor a config file sets one.
pub const DEFAULT_THRESHOLD: i64 = 1_000_000;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// List, per month, the regions whose peak value exceeded a threshold
#[derive(Parser, Debug, Clone)]
#[command(
    name = "state-peaks",
    about = "List, per month, the regions whose peak value exceeded a threshold",
    version
)]
pub struct Settings {
    /// Input CSV file (defaults to the downloads directory)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output CSV report (defaults to the downloads directory)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Exclusive lower bound a monthly peak must exceed
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    pub threshold: i64,

    /// Name of the date column
    #[arg(long, default_value = "date")]
    pub date_column: String,

    /// Name of the region column
    #[arg(long, default_value = "state")]
    pub region_column: String,

    /// Name of the value column
    #[arg(long, default_value = "totalTestResults")]
    pub value_column: String,

    /// JSON config file (defaults to ~/.state-peaks/config.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Abort on the first malformed row instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Optional JSON document supplying the same knobs as the command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl ConfigFile {
    /// `~/.state-peaks/config.json`.
    pub fn default_path() -> PathBuf {
        Self::default_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// The default config path rooted at `base_dir` (used for testing).
    pub fn default_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".state-peaks").join("config.json")
    }

    /// Load a config file that the user asked for explicitly. Missing or
    /// unparseable files are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PeaksError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the implicit default config. An absent file yields `Default`.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Everything one report run needs, resolved from CLI, config file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub threshold: i64,
    pub columns: RequiredColumns,
    /// Abort on the first malformed row.
    pub strict: bool,
}

impl PipelineConfig {
    /// Default column names, lenient row handling.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, threshold: i64) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            threshold,
            columns: RequiredColumns::default(),
            strict: false,
        }
    }

    pub fn with_columns(mut self, columns: RequiredColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge in the config file where no explicit CLI
    /// value was provided.
    pub fn load() -> Result<Self> {
        Self::load_impl(std::env::args_os().collect(), &ConfigFile::default_path())
    }

    /// Full implementation, taking args and the implicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_impl(args: Vec<std::ffi::OsString>, default_config: &Path) -> Result<Self> {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        let file = match &settings.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load_optional(default_config)?,
        };

        // CLI always wins over the file.
        if settings.input.is_none() {
            settings.input = file.input;
        }
        if settings.output.is_none() {
            settings.output = file.output;
        }
        if !is_arg_explicitly_set(&matches, "threshold") {
            if let Some(v) = file.threshold {
                settings.threshold = v;
            }
        }
        // NOTE: clap stores the arg id using the *field name* (underscores).
        if !is_arg_explicitly_set(&matches, "date_column") {
            if let Some(v) = file.date_column {
                settings.date_column = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "region_column") {
            if let Some(v) = file.region_column {
                settings.region_column = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "value_column") {
            if let Some(v) = file.value_column {
                settings.value_column = v;
            }
        }
        if !settings.strict {
            settings.strict = file.strict.unwrap_or(false);
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }

    /// Resolve into a [`PipelineConfig`], filling unset paths with the given
    /// defaults.
    pub fn to_pipeline_config(&self, default_input: &Path, default_output: &Path) -> PipelineConfig {
        PipelineConfig {
            input: self
                .input
                .clone()
                .unwrap_or_else(|| default_input.to_path_buf()),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| default_output.to_path_buf()),
            threshold: self.threshold,
            columns: RequiredColumns::new(
                self.date_column.clone(),
                self.region_column.clone(),
                self.value_column.clone(),
            ),
            strict: self.strict,
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
