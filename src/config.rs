//! Pipeline configuration.
//!
//! The CLI resolves its arguments into a [`PipelineConfig`]; library users
//! can build one directly, usually starting from
//! [`PipelineConfig::for_data_dir`].

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;

use crate::codec::ImageFormat;
use crate::error::PrepError;
use crate::pool::{Pool, PoolKind};

pub const DEFAULT_TABLE_NAME: &str = "Bounding Box Label.csv";
pub const DEFAULT_POSITIVE_DIR: &str = "Positive";
pub const DEFAULT_NEGATIVE_DIR: &str = "Negative";
pub const DEFAULT_MANIFEST_NAME: &str = "data.yaml";
pub const STAGING_DIR_NAME: &str = "all_labels";

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.7;
pub const DEFAULT_TEST_FRACTION: f64 = 0.33;

/// What to do with a box that reaches outside its image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxPolicy {
    /// Keep the unclamped values and report a warning.
    #[default]
    Warn,
    /// Clamp the box to the image before normalizing.
    Clamp,
    /// Drop the box and report a warning.
    Skip,
}

/// Seed and target proportions for the train/val/test split.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SplitConfig {
    pub seed: u64,
    /// Share of the corpus that goes to train.
    pub train_fraction: f64,
    /// Share of the non-train remainder that goes to test; the rest is val.
    pub test_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), PrepError> {
        for (name, value) in [
            ("train fraction", self.train_fraction),
            ("test fraction", self.test_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PrepError::InvalidSplit {
                    message: format!("{name} must be in [0.0, 1.0], got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Everything one `prepare` run needs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub table_path: PathBuf,
    /// Searched in order; the first pool holding a filename wins.
    pub pools: Vec<Pool>,
    pub output_root: PathBuf,
    pub split: SplitConfig,
    pub box_policy: BoxPolicy,
    /// Convert pool images to this format before anything else runs.
    pub target_format: Option<ImageFormat>,
    pub keep_originals: bool,
    pub manifest_name: String,
    pub keep_staging: bool,
}

impl PipelineConfig {
    /// Default layout: table and `Positive`/`Negative` pools inside
    /// `data_dir`, output written next to them.
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            table_path: data_dir.join(DEFAULT_TABLE_NAME),
            pools: vec![
                Pool::new(data_dir.join(DEFAULT_POSITIVE_DIR), PoolKind::Positive),
                Pool::new(data_dir.join(DEFAULT_NEGATIVE_DIR), PoolKind::Negative),
            ],
            output_root: data_dir.to_path_buf(),
            split: SplitConfig::default(),
            box_policy: BoxPolicy::default(),
            target_format: None,
            keep_originals: false,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            keep_staging: false,
        }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.output_root.join(STAGING_DIR_NAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_root.join(&self.manifest_name)
    }
}
