//! Axis-aligned boxes in corner (XYXY) form.

use std::marker::PhantomData;

use super::{Normalized, Pixel};

/// An axis-aligned bounding box stored as `(xmin, ymin, xmax, ymax)`.
///
/// Construction never checks ordering or bounds; out-of-image boxes from the
/// annotation table must stay representable so the caller can decide what to
/// do with them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Builds a box from its top-left corner and size.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Builds a box from its center and size.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.xmin, self.ymin, self.width(), self.height())
    }

    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        let (w, h) = (self.width(), self.height());
        (self.xmin + w / 2.0, self.ymin + h / 2.0, w, h)
    }

    /// Clamps every corner into `[0, max_x] x [0, max_y]`.
    pub fn clamp_to(&self, max_x: f64, max_y: f64) -> Self {
        Self::from_xyxy(
            self.xmin.clamp(0.0, max_x),
            self.ymin.clamp(0.0, max_y),
            self.xmax.clamp(0.0, max_x),
            self.ymax.clamp(0.0, max_y),
        )
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl BBoxXYXY<Pixel> {
    /// Divides by the image size. Callers guarantee non-zero dimensions.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.xmin / image_width,
            self.ymin / image_height,
            self.xmax / image_width,
            self.ymax / image_height,
        )
    }

    /// True if the box lies entirely inside a `width` x `height` image.
    pub fn is_within(&self, width: f64, height: f64) -> bool {
        self.xmin >= 0.0 && self.ymin >= 0.0 && self.xmax <= width && self.ymax <= height
    }
}

impl BBoxXYXY<Normalized> {
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xyxy(
            self.xmin * image_width,
            self.ymin * image_height,
            self.xmax * image_width,
            self.ymax * image_height,
        )
    }
}
