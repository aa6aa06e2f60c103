#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Tolerance for recovering a pixel box from its normalized form.
pub fn eps_pixels(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-9
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image width and height in pixels, thermal-camera sized.
pub fn arb_image_dims() -> BoxedStrategy<(u32, u32)> {
    (1u32..=4096, 1u32..=4096).boxed()
}

/// An image size together with a whole-pixel box `(x, y, w, h)` inside it,
/// as the annotation tool exports them.
pub fn arb_in_bounds_box() -> BoxedStrategy<((u32, u32), (f64, f64, f64, f64))> {
    arb_image_dims()
        .prop_flat_map(|(w, h)| (Just((w, h)), 0..=w, 0..=h))
        .prop_flat_map(|((w, h), x, y)| (Just(((w, h), x, y)), 0..=(w - x), 0..=(h - y)))
        .prop_map(|((dims, x, y), bw, bh)| {
            (dims, (x as f64, y as f64, bw as f64, bh as f64))
        })
        .boxed()
}

/// Corpus of distinct file names.
pub fn arb_corpus(max_len: usize) -> BoxedStrategy<Vec<String>> {
    (0..=max_len)
        .prop_map(|n| (0..n).map(|i| format!("frame_{i:04}.png")).collect())
        .boxed()
}

/// Train fraction and test-of-remainder fraction, both in `[0, 1]`.
pub fn arb_fractions() -> BoxedStrategy<(f64, f64)> {
    (0.0f64..=1.0, 0.0f64..=1.0).boxed()
}
