//! Image codec boundary.
//!
//! Everything that touches pixels goes through [`ImageCodec`]: reading an
//! image's size for box normalization and rewriting images as 3-channel
//! RGB. [`FsCodec`] is the real implementation; tests substitute their own.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::PrepError;
use crate::pool::{has_extension, list_images, Pool, IMAGE_EXTENSIONS};
use crate::report::{IssueCode, PrepareIssue, PrepareReport};

/// Output image formats the codec can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tiff,
}

impl ImageFormat {
    /// Extension used when writing files in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tif",
        }
    }

    /// Every extension that denotes this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Png => &["png"],
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Tiff => &["tif", "tiff"],
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Tiff]
            .into_iter()
            .find(|format| has_extension(path, format.extensions()))
    }

    fn codec_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// Pixel-level operations the pipeline needs from an image library.
pub trait ImageCodec {
    /// Returns `(width, height)` in pixels. Never returns a zero side.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), PrepError>;

    /// Decodes `src`, converts it to 3-channel RGB and writes it to `dst` in
    /// `format`. `src` and `dst` may be the same path.
    fn convert_rgb(&self, src: &Path, dst: &Path, format: ImageFormat) -> Result<(), PrepError>;
}

/// Filesystem codec: header-only size reads via `imagesize`, full decode and
/// encode via `image`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsCodec;

impl ImageCodec for FsCodec {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), PrepError> {
        let size = imagesize::size(path).map_err(|source| PrepError::UnreadableImage {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

        let width: u32 = size
            .width
            .try_into()
            .map_err(|_| PrepError::UnreadableImage {
                path: path.to_path_buf(),
                message: format!("image width {} does not fit in u32", size.width),
            })?;
        let height: u32 = size
            .height
            .try_into()
            .map_err(|_| PrepError::UnreadableImage {
                path: path.to_path_buf(),
                message: format!("image height {} does not fit in u32", size.height),
            })?;

        if width == 0 || height == 0 {
            return Err(PrepError::UnreadableImage {
                path: path.to_path_buf(),
                message: format!("image has zero size {width}x{height}"),
            });
        }

        Ok((width, height))
    }

    fn convert_rgb(&self, src: &Path, dst: &Path, format: ImageFormat) -> Result<(), PrepError> {
        let rgb = {
            let decoded = image::open(src).map_err(|source| PrepError::ConversionFailed {
                path: src.to_path_buf(),
                source,
            })?;
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };

        rgb.save_with_format(dst, format.codec_format())
            .map_err(|source| PrepError::ConversionFailed {
                path: dst.to_path_buf(),
                source,
            })
    }
}

/// Converts every pool image not already in `target` format, writing
/// `<stem>.<target ext>` next to it.
///
/// Originals are removed after a successful conversion unless
/// `keep_originals` is set. A failed conversion leaves the original in place
/// and is recorded in `report`. Returns the number of converted images.
pub fn convert_pools(
    pools: &[Pool],
    target: ImageFormat,
    keep_originals: bool,
    codec: &dyn ImageCodec,
    report: &mut PrepareReport,
) -> Result<usize, PrepError> {
    let mut converted = 0;

    for pool in pools {
        for src in list_images(&pool.dir, &IMAGE_EXTENSIONS)? {
            if has_extension(&src, target.extensions()) {
                continue;
            }

            let dst = src.with_extension(target.extension());
            if let Err(err) = codec.convert_rgb(&src, &dst, target) {
                warn!(path = %src.display(), error = %err, "conversion failed");
                report.add(PrepareIssue::warning(IssueCode::ConversionFailed, err.to_string()));
                continue;
            }
            debug!(from = %src.display(), to = %dst.display(), "converted");
            converted += 1;

            if !keep_originals {
                remove_original(&src, report);
            }
        }
    }

    info!(converted, format = target.extension(), "pool conversion finished");
    report.images_converted += converted;
    Ok(converted)
}

/// Rewrites every image under `dirs` (recursively) in place as 3-channel RGB,
/// keeping each file's format.
pub fn convert_dirs_to_rgb(
    dirs: &[PathBuf],
    codec: &dyn ImageCodec,
    report: &mut PrepareReport,
) -> Result<usize, PrepError> {
    let mut converted = 0;

    for dir in dirs {
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|source| {
                PrepError::Io(source.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other(format!("failed while traversing {}", dir.display()))
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(format) = ImageFormat::from_path(path) else {
                continue;
            };

            match codec.convert_rgb(path, path, format) {
                Ok(()) => converted += 1,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "rgb conversion failed");
                    report.add(PrepareIssue::warning(IssueCode::ConversionFailed, err.to_string()));
                }
            }
        }
    }

    info!(converted, "rgb conversion finished");
    report.images_converted += converted;
    Ok(converted)
}

fn remove_original(path: &Path, report: &mut PrepareReport) {
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "could not remove original");
        report.add(PrepareIssue::warning(
            IssueCode::CleanupFailed,
            format!("could not remove {}: {}", path.display(), err),
        ));
    }
}
