//! Source image pools.
//!
//! A pool is a flat directory of images of one kind (positive examples with
//! boxes, negative examples without). Pools are kept in an explicit order:
//! the [`ImageLocator`] resolves a filename to the first pool that holds it,
//! and the [`CorpusCollector`] enumerates pools in the same order.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::codec::ImageFormat;
use crate::error::PrepError;

/// Image extensions picked up from the pools (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 5] = ["tif", "tiff", "png", "jpg", "jpeg"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Positive,
    Negative,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Positive => write!(f, "positive"),
            PoolKind::Negative => write!(f, "negative"),
        }
    }
}

/// One source directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Pool {
    /// Directory name, used as the prefix of relative paths.
    pub name: String,
    pub dir: PathBuf,
    pub kind: PoolKind,
}

impl Pool {
    pub fn new(dir: impl Into<PathBuf>, kind: PoolKind) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| kind.to_string());
        Self { name, dir, kind }
    }

    fn relative(&self, file_name: &str) -> String {
        format!("{}/{}", self.name, file_name)
    }
}

/// An image file found in a pool, before its dimensions are known.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedImage {
    pub relative_path: String,
    pub path: PathBuf,
    pub pool: PoolKind,
}

/// A located image together with its pixel dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedImage {
    pub relative_path: String,
    pub path: PathBuf,
    pub pool: PoolKind,
    pub width: u32,
    pub height: u32,
}

impl ResolvedImage {
    pub fn new(located: LocatedImage, (width, height): (u32, u32)) -> Self {
        Self {
            relative_path: located.relative_path,
            path: located.path,
            pool: located.pool,
            width,
            height,
        }
    }

    pub fn file_name(&self) -> &str {
        last_segment(&self.relative_path)
    }

    pub fn stem(&self) -> &str {
        file_stem(self.file_name())
    }
}

/// One member of the image population, annotated or not.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorpusEntry {
    pub relative_path: String,
    pub path: PathBuf,
    pub pool: PoolKind,
}

impl CorpusEntry {
    pub fn file_name(&self) -> &str {
        last_segment(&self.relative_path)
    }

    /// File name without its extension; the key into the label store.
    pub fn stem(&self) -> &str {
        file_stem(self.file_name())
    }
}

/// Finds which pool holds a given filename.
pub struct ImageLocator<'a> {
    pools: &'a [Pool],
    target_format: Option<ImageFormat>,
}

impl<'a> ImageLocator<'a> {
    pub fn new(pools: &'a [Pool]) -> Self {
        Self {
            pools,
            target_format: None,
        }
    }

    /// Look up images under the converted name, e.g. `a.tif` as `a.png`.
    pub fn with_target_format(mut self, target: Option<ImageFormat>) -> Self {
        self.target_format = target;
        self
    }

    /// Returns the first pool entry named `filename`, or `None` if no pool
    /// holds it.
    pub fn locate(&self, filename: &str) -> Option<LocatedImage> {
        let file_name = self.lookup_name(filename);
        self.pools.iter().find_map(|pool| {
            let path = pool.dir.join(&file_name);
            path.is_file().then(|| LocatedImage {
                relative_path: pool.relative(&file_name),
                path,
                pool: pool.kind,
            })
        })
    }

    fn lookup_name(&self, filename: &str) -> String {
        match self.target_format {
            Some(target) if has_extension(Path::new(filename), &IMAGE_EXTENSIONS) => {
                format!("{}.{}", file_stem(filename), target.extension())
            }
            _ => filename.to_string(),
        }
    }
}

/// Enumerates every image in every pool.
pub struct CorpusCollector<'a> {
    pools: &'a [Pool],
    target_format: Option<ImageFormat>,
}

impl<'a> CorpusCollector<'a> {
    pub fn new(pools: &'a [Pool]) -> Self {
        Self {
            pools,
            target_format: None,
        }
    }

    /// Only collect files already in `target` format.
    pub fn with_target_format(mut self, target: Option<ImageFormat>) -> Self {
        self.target_format = target;
        self
    }

    /// Lists pool images in pool order, sorted by file name within a pool.
    ///
    /// # Errors
    /// [`PrepError::PoolMissing`] if a pool directory does not exist.
    pub fn collect(&self) -> Result<Vec<CorpusEntry>, PrepError> {
        let extensions: &[&str] = match self.target_format {
            Some(target) => target.extensions(),
            None => &IMAGE_EXTENSIONS,
        };

        let mut entries = Vec::new();
        for pool in self.pools {
            for path in list_images(&pool.dir, extensions)? {
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let file_name = file_name.to_string();
                entries.push(CorpusEntry {
                    relative_path: pool.relative(&file_name),
                    pool: pool.kind,
                    path,
                });
            }
        }

        Ok(entries)
    }
}

/// Lists image files directly inside `dir`, sorted by file name.
pub(crate) fn list_images(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, PrepError> {
    if !dir.is_dir() {
        return Err(PrepError::PoolMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| {
            PrepError::Io(source.into_io_error().unwrap_or_else(|| {
                std::io::Error::other(format!("failed while traversing {}", dir.display()))
            }))
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

fn last_segment(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

pub(crate) fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pools_in(root: &Path) -> Vec<Pool> {
        let positive = root.join("Positive");
        let negative = root.join("Negative");
        fs::create_dir_all(&positive).expect("create positive");
        fs::create_dir_all(&negative).expect("create negative");
        vec![
            Pool::new(positive, PoolKind::Positive),
            Pool::new(negative, PoolKind::Negative),
        ]
    }

    #[test]
    fn locate_prefers_earlier_pool() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let pools = pools_in(temp.path());
        fs::write(temp.path().join("Positive/dup.png"), b"p").expect("write");
        fs::write(temp.path().join("Negative/dup.png"), b"n").expect("write");
        fs::write(temp.path().join("Negative/neg.png"), b"n").expect("write");

        let locator = ImageLocator::new(&pools);

        let dup = locator.locate("dup.png").expect("found");
        assert_eq!(dup.pool, PoolKind::Positive);
        assert_eq!(dup.relative_path, "Positive/dup.png");

        let neg = locator.locate("neg.png").expect("found");
        assert_eq!(neg.pool, PoolKind::Negative);
        assert_eq!(neg.path, temp.path().join("Negative/neg.png"));

        assert!(locator.locate("missing.png").is_none());
    }

    #[test]
    fn locate_remaps_extension_for_target_format() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let pools = pools_in(temp.path());
        fs::write(temp.path().join("Positive/frame_01.png"), b"p").expect("write");

        let plain = ImageLocator::new(&pools);
        assert!(plain.locate("frame_01.tif").is_none());

        let remapped = ImageLocator::new(&pools).with_target_format(Some(ImageFormat::Png));
        let found = remapped.locate("frame_01.tif").expect("found");
        assert_eq!(found.relative_path, "Positive/frame_01.png");
    }

    #[test]
    fn collect_walks_pools_in_order_and_filters_extensions() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let pools = pools_in(temp.path());
        fs::write(temp.path().join("Positive/b.TIF"), b"").expect("write");
        fs::write(temp.path().join("Positive/a.jpg"), b"").expect("write");
        fs::write(temp.path().join("Positive/notes.txt"), b"").expect("write");
        fs::write(temp.path().join("Negative/c.jpeg"), b"").expect("write");
        fs::create_dir_all(temp.path().join("Positive/nested")).expect("mkdir");
        fs::write(temp.path().join("Positive/nested/d.png"), b"").expect("write");

        let entries = CorpusCollector::new(&pools).collect().expect("collect");
        let rels: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["Positive/a.jpg", "Positive/b.TIF", "Negative/c.jpeg"]);
        assert_eq!(entries[2].pool, PoolKind::Negative);
        assert_eq!(entries[1].stem(), "b");
    }

    #[test]
    fn collect_with_target_format_only_sees_converted_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let pools = pools_in(temp.path());
        fs::write(temp.path().join("Positive/a.tif"), b"").expect("write");
        fs::write(temp.path().join("Positive/a.png"), b"").expect("write");

        let entries = CorpusCollector::new(&pools)
            .with_target_format(Some(ImageFormat::Png))
            .collect()
            .expect("collect");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name(), "a.png");
    }

    #[test]
    fn collect_fails_on_missing_pool() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let pools = vec![Pool::new(temp.path().join("Positive"), PoolKind::Positive)];
        let err = CorpusCollector::new(&pools).collect().unwrap_err();
        assert!(matches!(err, PrepError::PoolMissing { .. }));
    }

    #[test]
    fn stems_keep_inner_dots() {
        assert_eq!(file_stem("frame.001.tif"), "frame.001");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }
}
