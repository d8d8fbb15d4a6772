//! Error type shared by every pipeline stage.

use std::path::PathBuf;

use crate::parser::ZipCode;

/// Errors that abort a pipeline run (or, for [`PipelineError::Render`] and
/// [`PipelineError::EmptyDataset`], a single chart).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A file could not be opened, read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected a file or a row.
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required header is absent.
    #[error("{} is missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A postal code could not be coerced to a numeric key.
    #[error("{}:{line}: invalid zip code '{value}'", .path.display())]
    InvalidZip {
        path: PathBuf,
        line: u64,
        value: String,
    },

    /// A numeric column held something other than a finite number.
    #[error("{}:{line}: column '{column}' has non-numeric value '{value}'", .path.display())]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },

    /// The geo table lists the same zip code twice, which would fan out the join.
    #[error("zip code {0} appears more than once in the geo table")]
    DuplicateZip(ZipCode),

    /// A chart was asked to draw an empty series.
    #[error("no data to plot for {0}")]
    EmptyDataset(String),

    /// The plotting backend failed.
    #[error("failed to render {chart}: {message}")]
    Render { chart: String, message: String },

    /// The region outline could not be used.
    #[error("invalid outline {}: {message}", .path.display())]
    Outline { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
