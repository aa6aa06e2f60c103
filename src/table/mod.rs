//! Bounding-box annotation table reader.
//!
//! The table is a CSV file with one row per box and absolute pixel
//! coordinates:
//!
//! ```text
//! imageFilename,x(column),y(row),width,height
//! img1.tif,10,20,100,50
//! img1.tif,200,40,30,30
//! ```
//!
//! Several rows may name the same image. Extra columns are ignored. Values
//! are read as-is; range checks belong to the pipeline's box policy.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::PrepError;

/// Header names the table must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "imageFilename",
    "x(column)",
    "y(row)",
    "width",
    "height",
];

/// One annotated box, top-left corner plus size in pixels.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AnnotationRow {
    #[serde(rename = "imageFilename")]
    pub image_filename: String,
    #[serde(rename = "x(column)")]
    pub x: f64,
    #[serde(rename = "y(row)")]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Reads the annotation table at `path`, preserving row order.
///
/// # Errors
/// [`PrepError::MalformedTable`] if any required column is absent, and
/// [`PrepError::TableParse`] if a row cannot be decoded.
pub fn read_annotation_table(path: &Path) -> Result<Vec<AnnotationRow>, PrepError> {
    let file = File::open(path).map_err(PrepError::Io)?;
    read_rows(BufReader::new(file), path)
}

/// Reads an annotation table held in memory.
pub fn from_table_str(csv_str: &str) -> Result<Vec<AnnotationRow>, PrepError> {
    read_rows(csv_str.as_bytes(), Path::new("<string>"))
}

fn read_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<AnnotationRow>, PrepError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| PrepError::TableParse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        return Err(PrepError::MalformedTable {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: AnnotationRow = result.map_err(|source| PrepError::TableParse {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }

    Ok(rows)
}

fn missing_columns(headers: &csv::StringRecord) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .map(|required| required.to_string())
        .collect()
}
