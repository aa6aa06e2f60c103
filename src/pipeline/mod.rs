//! End-to-end dataset preparation.
//!
//! [`prepare`] runs every stage in order:
//!
//! 1. read the annotation table and enumerate the pools (all fatal checks
//!    happen here, before anything is written),
//! 2. optionally convert pool images to a single format,
//! 3. resolve, normalize and aggregate every annotated box,
//! 4. flush the label files to the staging directory,
//! 5. split the corpus and materialize `images/` + `labels/`,
//! 6. write `classes.txt` and the dataset descriptor.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::codec::{self, ImageCodec};
use crate::config::{BoxPolicy, PipelineConfig};
use crate::error::PrepError;
use crate::geom::{self, BBoxXYXY, Pixel};
use crate::labels::LabelAggregator;
use crate::manifest;
use crate::materialize::Materializer;
use crate::pool::{CorpusCollector, CorpusEntry, ImageLocator, ResolvedImage};
use crate::report::{CorpusCounts, IssueCode, PrepareIssue, PrepareReport};
use crate::split;
use crate::table::{self, AnnotationRow};

/// Runs the whole preparation pipeline described by `config`.
///
/// # Errors
/// Fails on a malformed table, a missing pool, invalid split fractions, or
/// when output directories and the manifest cannot be written. Per-row and
/// per-file problems are recorded in the returned report instead.
pub fn prepare(
    config: &PipelineConfig,
    codec: &dyn ImageCodec,
) -> Result<PrepareReport, PrepError> {
    config.split.validate()?;

    let rows = table::read_annotation_table(&config.table_path)?;
    info!(rows = rows.len(), table = %config.table_path.display(), "annotation table loaded");

    if let Some(pool) = config.pools.iter().find(|pool| !pool.dir.is_dir()) {
        return Err(PrepError::PoolMissing {
            path: pool.dir.clone(),
        });
    }

    let mut report = PrepareReport::new();
    report.rows_read = rows.len();

    if let Some(target) = config.target_format {
        codec::convert_pools(
            &config.pools,
            target,
            config.keep_originals,
            codec,
            &mut report,
        )?;
    }

    let corpus = CorpusCollector::new(&config.pools)
        .with_target_format(config.target_format)
        .collect()?;
    let (corpus, excluded) = drop_stem_collisions(corpus, &mut report);
    report.corpus = count_pools(&corpus);
    info!(
        positive = report.corpus.positive,
        negative = report.corpus.negative,
        "corpus collected"
    );

    let locator = ImageLocator::new(&config.pools).with_target_format(config.target_format);
    let aggregator = aggregate_labels(
        &rows,
        &locator,
        &excluded,
        codec,
        config.box_policy,
        &mut report,
    );

    let staging = config.staging_dir();
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(PrepError::Io)?;
    }
    let labels = aggregator.finalize(&staging)?;
    report.images_labelled = labels.len();
    report.boxes_written = labels.stems().map(|stem| labels.box_count(stem)).sum();
    info!(
        boxes = report.boxes_written,
        images = report.images_labelled,
        skipped_rows = report.skipped_rows(),
        "labels written"
    );

    let assignment = split::split(
        &corpus,
        config.split.seed,
        config.split.train_fraction,
        config.split.test_fraction,
    );
    info!(
        train = assignment.train.len(),
        val = assignment.val.len(),
        test = assignment.test.len(),
        seed = config.split.seed,
        "corpus split"
    );

    report.split =
        Materializer::new(&config.output_root).materialize(&assignment, &labels, &mut report)?;

    let manifest_path = config.manifest_path();
    manifest::write_manifest(&config.output_root, &manifest_path)?;
    info!(path = %manifest_path.display(), "manifest written");

    if !config.keep_staging {
        remove_staging(labels.root().to_path_buf(), &mut report);
    }

    Ok(report)
}

/// Resolves each row's image, normalizes its box and collects the result
/// per image stem. Rows that cannot be resolved, or that point at an image in
/// `excluded`, are recorded in `report`.
pub fn aggregate_labels(
    rows: &[AnnotationRow],
    locator: &ImageLocator<'_>,
    excluded: &HashSet<PathBuf>,
    codec: &dyn ImageCodec,
    policy: BoxPolicy,
    report: &mut PrepareReport,
) -> LabelAggregator {
    let mut aggregator = LabelAggregator::new();
    let mut dimensions: HashMap<PathBuf, Option<(u32, u32)>> = HashMap::new();

    for (idx, row) in rows.iter().enumerate() {
        // Header is line 1.
        let line = idx + 2;

        let Some(located) = locator.locate(&row.image_filename) else {
            warn!(line, image = %row.image_filename, "image not found in any pool");
            report.add(PrepareIssue::warning(
                IssueCode::ImageNotFound,
                format!("row {line}: image not found: {}", row.image_filename),
            ));
            continue;
        };

        if excluded.contains(&located.path) {
            warn!(line, image = %located.relative_path, "image left out of the corpus");
            report.add(PrepareIssue::warning(
                IssueCode::ImageExcluded,
                format!(
                    "row {line}: {} was left out of the corpus (stem collision)",
                    located.relative_path
                ),
            ));
            continue;
        }

        let dims = *dimensions
            .entry(located.path.clone())
            .or_insert_with(|| match codec.dimensions(&located.path) {
                Ok(dims) => Some(dims),
                Err(err) => {
                    warn!(error = %err, "unreadable image");
                    None
                }
            });
        let Some(dims) = dims else {
            report.add(PrepareIssue::warning(
                IssueCode::UnreadableImage,
                format!(
                    "row {line}: cannot read dimensions of {}",
                    located.relative_path
                ),
            ));
            continue;
        };

        let image = ResolvedImage::new(located, dims);
        let Some(bbox) = apply_box_policy(row, &image, line, policy, report) else {
            continue;
        };

        let normalized = geom::from_pixel_box(&bbox, image.width, image.height);
        debug!(image = %image.relative_path, label = %normalized, "box normalized");
        aggregator.append(image.stem(), normalized);
    }

    aggregator
}

fn apply_box_policy(
    row: &AnnotationRow,
    image: &ResolvedImage,
    line: usize,
    policy: BoxPolicy,
    report: &mut PrepareReport,
) -> Option<BBoxXYXY<Pixel>> {
    let bbox = BBoxXYXY::<Pixel>::from_xywh(row.x, row.y, row.width, row.height);
    let (width, height) = (image.width as f64, image.height as f64);
    if bbox.is_within(width, height) {
        return Some(bbox);
    }

    let detail = format!(
        "row {line}: box ({}, {}, {}, {}) exceeds {}x{} image {}",
        row.x, row.y, row.width, row.height, image.width, image.height, image.relative_path
    );

    match policy {
        BoxPolicy::Warn => {
            warn!(line, image = %image.relative_path, "box outside image, kept unclamped");
            report.add(PrepareIssue::warning(IssueCode::BoxOutOfBounds, detail));
            Some(bbox)
        }
        BoxPolicy::Clamp => {
            report.add(PrepareIssue::info(
                IssueCode::BoxClamped,
                format!("{detail}; clamped"),
            ));
            Some(bbox.clamp_to(width, height))
        }
        BoxPolicy::Skip => {
            warn!(line, image = %image.relative_path, "box outside image, skipped");
            report.add(PrepareIssue::warning(
                IssueCode::BoxSkipped,
                format!("{detail}; skipped"),
            ));
            None
        }
    }
}

/// Keeps the first corpus entry for each stem, in pool order. Label files
/// are keyed by stem, so a later image with the same stem would share them.
fn drop_stem_collisions(
    corpus: Vec<CorpusEntry>,
    report: &mut PrepareReport,
) -> (Vec<CorpusEntry>, HashSet<PathBuf>) {
    let mut kept: Vec<CorpusEntry> = Vec::with_capacity(corpus.len());
    let mut first_by_stem: HashMap<String, usize> = HashMap::new();
    let mut excluded = HashSet::new();

    for entry in corpus {
        if let Some(&idx) = first_by_stem.get(entry.stem()) {
            warn!(
                kept = %kept[idx].relative_path,
                dropped = %entry.relative_path,
                "stem collision"
            );
            report.add(PrepareIssue::warning(
                IssueCode::StemCollision,
                format!(
                    "{} shares its stem with {}; left out of the corpus",
                    entry.relative_path, kept[idx].relative_path
                ),
            ));
            excluded.insert(entry.path);
            continue;
        }
        first_by_stem.insert(entry.stem().to_string(), kept.len());
        kept.push(entry);
    }

    (kept, excluded)
}

fn count_pools(corpus: &[CorpusEntry]) -> CorpusCounts {
    let mut counts = CorpusCounts::default();
    for entry in corpus {
        counts.record(entry.pool);
    }
    counts
}

fn remove_staging(staging: PathBuf, report: &mut PrepareReport) {
    if let Err(err) = fs::remove_dir_all(&staging) {
        warn!(path = %staging.display(), error = %err, "could not remove staging labels");
        report.add(PrepareIssue::warning(
            IssueCode::CleanupFailed,
            format!("could not remove {}: {}", staging.display(), err),
        ));
    }
}
