//! Bounding-box geometry.
//!
//! Boxes are tagged with the coordinate space they live in so that absolute
//! pixel values read from the annotation table can never be written out as
//! if they were already image-relative.
//!
//! ```
//! use thermalprep::geom::{BBoxXYXY, Pixel};
//!
//! let px = BBoxXYXY::<Pixel>::from_xywh(10.0, 20.0, 100.0, 50.0);
//! let (cx, cy, w, h) = px.to_normalized(640.0, 480.0).to_cxcywh();
//! assert!((cx - 0.09375).abs() < 1e-12);
//! assert!((cy - 0.09375).abs() < 1e-12);
//! assert!((w - 0.15625).abs() < 1e-12);
//! assert!((h - 50.0 / 480.0).abs() < 1e-12);
//! ```

mod bbox;
mod normalize;

use std::fmt;

pub use bbox::BBoxXYXY;
pub use normalize::{normalize, NormalizedBox, CLASS_ID};
pub(crate) use normalize::from_pixel_box;

/// Absolute pixel space, origin at the top-left corner of the image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Image-relative space where the full image spans 0.0..=1.0 on both axes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
