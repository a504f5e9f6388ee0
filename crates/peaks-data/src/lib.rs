//! Data layer for state-peaks.
//!
//! Tokenizes CSV lines, normalizes dates to month keys, aggregates
//! per-(month, region) peaks and renders the threshold report, either over
//! arbitrary streams or between files.

pub mod aggregator;
pub mod lines;
pub mod month;
pub mod pipeline;
pub mod report;
pub mod tokenizer;

pub use peaks_core as core;
