use std::path::PathBuf;
use thiserror::Error;

/// The main error type for thermalprep operations.
///
/// Variants that describe a single image or file (`UnreadableImage`,
/// `ConversionFailed`, `CopyFailed`) are recoverable: the pipeline records
/// them in its report and moves on. Everything else aborts the run.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Annotation table {path} is missing required column(s): {}", missing.join(", "))]
    MalformedTable { path: PathBuf, missing: Vec<String> },

    #[error("Failed to parse annotation table {path}: {source}")]
    TableParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Image pool directory not found: {path}")]
    PoolMissing { path: PathBuf },

    #[error("Invalid split parameters: {message}")]
    InvalidSplit { message: String },

    #[error("Cannot read image {path}: {message}")]
    UnreadableImage { path: PathBuf, message: String },

    #[error("Failed to convert image {path}: {source}")]
    ConversionFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write label file {path}: {source}")]
    LabelWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write dataset manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to render report as JSON: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
