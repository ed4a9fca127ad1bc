//! Error types for the kegg_matrix library.
//!
//! Parsing and reference loading fail the whole construction of a
//! [`KeggMatrix`](crate::engine::KeggMatrix). Group queries fail per call
//! and leave the already-built matrices usable.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed abundance matrix.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("I/O error while reading matrix: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Matrix is empty: no header line found")]
    MissingHeader,

    #[error("Matrix header declares no samples")]
    NoSamples,

    #[error("Duplicate sample '{sample}' in header at column {column}")]
    DuplicateSample { sample: String, column: usize },

    #[error("Empty sample name in header at column {column}")]
    EmptySample { column: usize },

    #[error("Row {row} has {actual} columns, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Row {row} has an empty ortholog identifier")]
    EmptyOrtholog { row: usize },

    #[error("Invalid abundance value '{value}' at row {row}, column {column}")]
    InvalidValue {
        value: String,
        row: usize,
        column: usize,
    },
}

/// The versioned reference mapping could not be resolved or deserialized.
#[derive(Error, Debug)]
pub enum ReferenceLoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Version file {} is empty", .path.display())]
    EmptyVersion { path: PathBuf },

    #[error("Failed to deserialize reference mapping {}: {source}", .path.display())]
    Deserialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Reference mapping version '{0}' contains no reactions")]
    NoReactions(String),
}

/// A group query references samples or reactions the reaction matrix does not have.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("sample selection does not match the input matrix: no samples selected")]
    EmptySelection,

    #[error("sample selection does not match the input matrix: unknown samples {0:?}")]
    UnknownSamples(Vec<String>),

    #[error(
        "sample selection does not match the input matrix: sample '{sample}' \
         lacks reactions {missing:?} and has unexpected reactions {unexpected:?}"
    )]
    VocabularyMismatch {
        sample: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    ReferenceLoad(#[from] ReferenceLoadError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
