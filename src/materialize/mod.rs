//! Split directory layout.
//!
//! ```text
//! <output>/images/{train,val,test}/<basename>
//! <output>/labels/{train,val,test}/<stem>.txt
//! ```
//!
//! Every image placed under `images/<split>` gets exactly one label file of
//! the same stem under `labels/<split>`, empty when the image has no boxes.
//! Copy failures are skipped and reported; an image whose label cannot be
//! written is removed again so the pairing holds. Label files are keyed by
//! stem, so only the first image of each stem is placed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::PrepError;
use crate::labels::{LabelStore, LABEL_EXTENSION};
use crate::pool::CorpusEntry;
use crate::report::{IssueCode, PrepareIssue, PrepareReport, SplitCounts};
use crate::split::{Split, SplitAssignment};

/// Writes split directories under one output root.
#[derive(Clone, Debug)]
pub struct Materializer {
    output_root: PathBuf,
}

impl Materializer {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.output_root.join("images").join(split.dir_name())
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.output_root.join("labels").join(split.dir_name())
    }

    /// Recreates all six split directories empty.
    pub fn reset_dirs(&self) -> Result<(), PrepError> {
        for split in Split::ALL {
            for dir in [self.images_dir(split), self.labels_dir(split)] {
                if dir.exists() {
                    fs::remove_dir_all(&dir).map_err(PrepError::Io)?;
                }
                fs::create_dir_all(&dir).map_err(PrepError::Io)?;
            }
        }
        Ok(())
    }

    /// Copies every assigned image and its label into place.
    ///
    /// Failed files are recorded in `report` and skipped; the returned
    /// counts only include images that were fully placed.
    pub fn materialize(
        &self,
        assignment: &SplitAssignment<CorpusEntry>,
        labels: &LabelStore,
        report: &mut PrepareReport,
    ) -> Result<SplitCounts, PrepError> {
        self.reset_dirs()?;

        let mut counts = SplitCounts::default();
        let mut placed_stems: HashMap<&str, &str> = HashMap::new();
        for (split, entries) in assignment.subsets() {
            let mut placed = 0;
            for entry in entries {
                if let Some(first) = placed_stems.get(entry.stem()) {
                    warn!(image = %entry.relative_path, first = %first, "stem already placed");
                    report.add(PrepareIssue::warning(
                        IssueCode::StemCollision,
                        format!(
                            "{} shares its stem with {}; not placed",
                            entry.relative_path, first
                        ),
                    ));
                    continue;
                }

                match self.place(split, entry, labels) {
                    Ok(()) => {
                        placed_stems.insert(entry.stem(), &entry.relative_path);
                        placed += 1;
                    }
                    Err(err) => {
                        warn!(image = %entry.relative_path, error = %err, "skipping image");
                        report.add(PrepareIssue::warning(IssueCode::CopyFailed, err.to_string()));
                    }
                }
            }
            info!(split = split.dir_name(), placed, "split materialized");

            match split {
                Split::Train => counts.train = placed,
                Split::Val => counts.val = placed,
                Split::Test => counts.test = placed,
            }
        }

        Ok(counts)
    }

    fn place(
        &self,
        split: Split,
        entry: &CorpusEntry,
        labels: &LabelStore,
    ) -> Result<(), PrepError> {
        let image_dst = self.images_dir(split).join(entry.file_name());
        fs::copy(&entry.path, &image_dst).map_err(|source| PrepError::CopyFailed {
            from: entry.path.clone(),
            to: image_dst.clone(),
            source,
        })?;

        let label_dst = self
            .labels_dir(split)
            .join(format!("{}.{}", entry.stem(), LABEL_EXTENSION));

        if let Err(err) = write_label(labels.get(entry.stem()), &label_dst) {
            // Never leave an image without its label.
            if let Err(cleanup) = fs::remove_file(&image_dst) {
                debug!(path = %image_dst.display(), error = %cleanup, "cleanup failed");
            }
            return Err(err);
        }

        Ok(())
    }
}

fn write_label(label: Option<&Path>, dst: &Path) -> Result<(), PrepError> {
    let written = match label {
        Some(src) => fs::copy(src, dst).map(|_| ()),
        None => fs::File::create(dst).map(|_| ()),
    };
    written.map_err(|source| PrepError::LabelWrite {
        path: dst.to_path_buf(),
        source,
    })
}
