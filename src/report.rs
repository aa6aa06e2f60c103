//! Run reports.
//!
//! Recoverable problems (a table row naming a missing image, an image that
//! cannot be decoded, a copy that failed) never abort a run. They are
//! collected here as issues so the final summary accounts for every skipped
//! row and file.

use serde::Serialize;
use std::fmt;

use crate::pool::PoolKind;

/// Summary of one `prepare` (or conversion-only) run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PrepareReport {
    /// Data rows read from the annotation table.
    pub rows_read: usize,
    /// Boxes that made it into label files.
    pub boxes_written: usize,
    /// Distinct images that received at least one box.
    pub images_labelled: usize,
    /// Images rewritten by the codec.
    pub images_converted: usize,
    pub corpus: CorpusCounts,
    pub split: SplitCounts,
    pub issues: Vec<PrepareIssue>,
}

impl PrepareReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: PrepareIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .count()
    }

    /// Number of issues carrying `code`.
    pub fn count(&self, code: IssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }

    /// Table rows whose box did not end up in any label file.
    pub fn skipped_rows(&self) -> usize {
        self.count(IssueCode::ImageNotFound)
            + self.count(IssueCode::UnreadableImage)
            + self.count(IssueCode::BoxSkipped)
            + self.count(IssueCode::ImageExcluded)
    }

    fn write_issues(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (severity, title) in [(Severity::Warning, "Warnings"), (Severity::Info, "Notes")] {
            let matching: Vec<&PrepareIssue> = self
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if matching.is_empty() {
                continue;
            }

            writeln!(f)?;
            writeln!(f, "{} ({}):", title, matching.len())?;
            for issue in matching {
                writeln!(f, "  - [{:?}] {}", issue.code, issue.message)?;
            }
        }
        Ok(())
    }

    /// Renders only the issue sections, for conversion-only runs.
    pub fn issues_summary(&self) -> String {
        struct Issues<'a>(&'a PrepareReport);

        impl fmt::Display for Issues<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.write_issues(f)
            }
        }

        Issues(self).to_string()
    }
}

impl fmt::Display for PrepareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.images_converted > 0 {
            writeln!(f, "  converted {} image(s)", self.images_converted)?;
        }
        writeln!(
            f,
            "  {} annotation row(s), {} box(es) written for {} image(s), {} row(s) skipped",
            self.rows_read,
            self.boxes_written,
            self.images_labelled,
            self.skipped_rows()
        )?;
        writeln!(
            f,
            "  corpus: {} image(s) ({} positive, {} negative)",
            self.corpus.total(),
            self.corpus.positive,
            self.corpus.negative
        )?;
        writeln!(
            f,
            "  split: train={} | val={} | test={}",
            self.split.train, self.split.val, self.split.test
        )?;

        self.write_issues(f)
    }
}

/// Image counts per pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CorpusCounts {
    pub positive: usize,
    pub negative: usize,
}

impl CorpusCounts {
    pub fn record(&mut self, kind: PoolKind) {
        match kind {
            PoolKind::Positive => self.positive += 1,
            PoolKind::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative
    }
}

/// Images materialized per split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct PrepareIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl PrepareIssue {
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// Stable codes for recoverable problems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A table row names a file that no pool holds.
    ImageNotFound,
    /// The codec could not read an image's dimensions.
    UnreadableImage,
    /// A table row names an image that was left out of the corpus.
    ImageExcluded,
    /// Two corpus images share a stem; the later one was left out.
    StemCollision,
    /// A box reaches outside its image and was kept as-is.
    BoxOutOfBounds,
    /// A box reaching outside its image was clamped.
    BoxClamped,
    /// A box reaching outside its image was dropped.
    BoxSkipped,
    ConversionFailed,
    CopyFailed,
    /// Leftover files could not be removed.
    CleanupFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity_and_code() {
        let mut report = PrepareReport::new();
        report.add(PrepareIssue::warning(IssueCode::ImageNotFound, "a.tif"));
        report.add(PrepareIssue::warning(IssueCode::UnreadableImage, "b.tif"));
        report.add(PrepareIssue::warning(IssueCode::CopyFailed, "c.tif"));
        report.add(PrepareIssue::info(IssueCode::BoxClamped, "d.tif"));

        assert_eq!(report.warning_count(), 3);
        assert_eq!(report.info_count(), 1);
        assert_eq!(report.skipped_rows(), 2);
        assert_eq!(report.count(IssueCode::CopyFailed), 1);
    }

    #[test]
    fn display_lists_split_and_issues() {
        let mut report = PrepareReport {
            rows_read: 3,
            boxes_written: 2,
            images_labelled: 1,
            corpus: CorpusCounts {
                positive: 6,
                negative: 4,
            },
            split: SplitCounts {
                train: 7,
                val: 2,
                test: 1,
            },
            ..Default::default()
        };
        report.add(PrepareIssue::warning(
            IssueCode::ImageNotFound,
            "image not found: ghost.tif",
        ));

        let text = report.to_string();
        assert!(text.contains("corpus: 10 image(s) (6 positive, 4 negative)"));
        assert!(text.contains("train=7 | val=2 | test=1"));
        assert!(text.contains("1 row(s) skipped"));
        assert!(text.contains("Warnings (1):"));
        assert!(text.contains("[ImageNotFound] image not found: ghost.tif"));
        assert!(!text.contains("Notes"));
    }

    #[test]
    fn serializes_codes_in_snake_case() {
        let mut report = PrepareReport::new();
        report.add(PrepareIssue::warning(IssueCode::CopyFailed, "x"));
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"code\":\"copy_failed\""));
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
