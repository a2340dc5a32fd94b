//! Error types for flow import and configuration loading.
//!
//! Flow-connection rejections live in [`crate::validation::ValidationError`].
//! None of these are fatal: every failing operation leaves the model untouched.

use thiserror::Error;

/// Why an information-flow import was discarded.
///
/// The `Display` text is suitable for showing to the user as-is.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The content is not valid JSON.
    #[error("Failed to load the JSON file. Please check the file format.")]
    Parse(#[from] serde_json::Error),

    /// The content parsed but its top level is not an array.
    #[error("Invalid JSON format.")]
    NotAnArray,

    /// An entry is not a `[source, destination]` pair of node snapshots.
    #[error("Invalid information flow at index {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse editor configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Level tolerance must be a finite, non-negative number (got {0})")]
    InvalidLevelTolerance(f32),
}
