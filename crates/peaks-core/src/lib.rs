//! Core types for state-peaks.
//!
//! Error taxonomy, the report data model, configuration (CLI, config file
//! and the resolved [`settings::PipelineConfig`]) and small formatting helpers
//! shared by the data and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{PeaksError, Result};
