//! Per-image label aggregation.
//!
//! Boxes are collected in memory, keyed by image stem, in the order the
//! annotation table lists them. Nothing touches the disk until
//! [`LabelAggregator::finalize`] writes one YOLO label file per stem and
//! hands back a read-only [`LabelStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PrepError;
use crate::geom::NormalizedBox;

pub const LABEL_EXTENSION: &str = "txt";

/// Collects boxes per image stem.
#[derive(Debug, Default)]
pub struct LabelAggregator {
    records: BTreeMap<String, Vec<NormalizedBox>>,
}

impl LabelAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bbox` to the record for `stem`, creating it if needed.
    pub fn append(&mut self, stem: impl Into<String>, bbox: NormalizedBox) {
        self.records.entry(stem.into()).or_default().push(bbox);
    }

    /// Boxes recorded so far for `stem`, in arrival order.
    pub fn record(&self, stem: &str) -> Option<&[NormalizedBox]> {
        self.records.get(stem).map(Vec::as_slice)
    }

    pub fn image_count(&self) -> usize {
        self.records.len()
    }

    pub fn box_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Writes `<stem>.txt` under `staging_dir` for every record, one line
    /// per box, and returns the store of written files.
    pub fn finalize(self, staging_dir: &Path) -> Result<LabelStore, PrepError> {
        fs::create_dir_all(staging_dir).map_err(PrepError::Io)?;

        let mut files = BTreeMap::new();
        for (stem, boxes) in self.records {
            let path = staging_dir.join(format!("{stem}.{LABEL_EXTENSION}"));
            write_label_file(&path, &boxes)?;
            files.insert(
                stem,
                StoredLabel {
                    path,
                    boxes: boxes.len(),
                },
            );
        }

        Ok(LabelStore {
            root: staging_dir.to_path_buf(),
            files,
        })
    }
}

/// Writes one label file, one `class cx cy w h` line per box.
pub fn write_label_file(path: &Path, boxes: &[NormalizedBox]) -> Result<(), PrepError> {
    let mut writer = BufWriter::new(fs::File::create(path).map_err(PrepError::Io)?);
    for bbox in boxes {
        writeln!(writer, "{bbox}").map_err(PrepError::Io)?;
    }
    writer.flush().map_err(PrepError::Io)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StoredLabel {
    path: PathBuf,
    boxes: usize,
}

/// Finalized label files, looked up by image stem.
#[derive(Clone, Debug)]
pub struct LabelStore {
    root: PathBuf,
    files: BTreeMap<String, StoredLabel>,
}

impl LabelStore {
    /// Directory holding the finalized label files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the label file for `stem`, if that image has boxes.
    pub fn get(&self, stem: &str) -> Option<&Path> {
        self.files.get(stem).map(|label| label.path.as_path())
    }

    pub fn box_count(&self, stem: &str) -> usize {
        self.files.get(stem).map_or(0, |label| label.boxes)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}
