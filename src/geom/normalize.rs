//! Absolute-to-relative box conversion for YOLO label lines.

use std::fmt;

use serde::Serialize;

use super::{BBoxXYXY, Pixel};

/// The single class every box is labelled with.
pub const CLASS_ID: u32 = 0;

/// One YOLO label line: class id plus center/size relative to the image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// True if all four coordinates lie in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        [self.x_center, self.y_center, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    /// Recovers the absolute `(x, y, width, height)` box, top-left origin.
    pub fn to_pixel_xywh(&self, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
        let px = BBoxXYXY::from_cxcywh(self.x_center, self.y_center, self.width, self.height)
            .to_pixel(image_width as f64, image_height as f64);
        px.to_xywh()
    }
}

impl fmt::Display for NormalizedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Converts a top-left/size pixel box into YOLO center/size form.
///
/// `image_width` and `image_height` must be non-zero; the dimension resolver
/// rejects zero-sized images before they get here.
pub fn normalize(
    image_width: u32,
    image_height: u32,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
) -> NormalizedBox {
    from_pixel_box(
        &BBoxXYXY::<Pixel>::from_xywh(x, y, w, h),
        image_width,
        image_height,
    )
}

pub(crate) fn from_pixel_box(
    bbox: &BBoxXYXY<Pixel>,
    image_width: u32,
    image_height: u32,
) -> NormalizedBox {
    let (x_center, y_center, width, height) = bbox
        .to_normalized(image_width as f64, image_height as f64)
        .to_cxcywh();

    NormalizedBox {
        class_id: CLASS_ID,
        x_center,
        y_center,
        width,
        height,
    }
}
