//! Deterministic train/val/test partitioning.
//!
//! The corpus is cut twice with a seeded shuffle: first a holdout of
//! `1 - train_fraction` is set aside, then the holdout is divided into test
//! (`test_fraction` of it) and val. Both shuffles start from a fresh
//! `StdRng::seed_from_u64(seed)`, so the same corpus order and seed always
//! yield the same partition.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

/// Three disjoint subsets that together cover the corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitAssignment<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Default for SplitAssignment<T> {
    fn default() -> Self {
        Self {
            train: Vec::new(),
            val: Vec::new(),
            test: Vec::new(),
        }
    }
}

impl<T> SplitAssignment<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subsets paired with their directory names, in train/val/test order.
    pub fn subsets(&self) -> [(Split, &[T]); 3] {
        [
            (Split::Train, self.train.as_slice()),
            (Split::Val, self.val.as_slice()),
            (Split::Test, self.test.as_slice()),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Partitions `entries` into train, val and test.
///
/// `train_fraction` and `test_fraction_of_rest` are expected in `[0, 1]`
/// (see [`SplitConfig::validate`](crate::config::SplitConfig::validate)).
/// An empty input yields three empty subsets.
pub fn split<T: Clone>(
    entries: &[T],
    seed: u64,
    train_fraction: f64,
    test_fraction_of_rest: f64,
) -> SplitAssignment<T> {
    if entries.is_empty() {
        return SplitAssignment::default();
    }

    let holdout_len = portion(entries.len(), 1.0 - train_fraction);
    let (holdout, train) = shuffle_and_cut(entries.to_vec(), seed, holdout_len);

    let test_len = portion(holdout.len(), test_fraction_of_rest);
    let (test, val) = shuffle_and_cut(holdout, seed, test_len);

    SplitAssignment { train, val, test }
}

/// Shuffles with a freshly seeded generator and returns `(first cut, rest)`.
fn shuffle_and_cut<T>(mut items: Vec<T>, seed: u64, cut: usize) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    let rest = items.split_off(cut.min(items.len()));
    (items, rest)
}

/// `ceil(total * fraction)`, ignoring float noise around whole numbers so
/// that e.g. `100 * (1 - 0.7)` counts as 30, not 31.
pub fn portion(total: usize, fraction: f64) -> usize {
    let raw = total as f64 * fraction.clamp(0.0, 1.0);
    let rounded = raw.round();
    let count = if (raw - rounded).abs() < 1e-9 {
        rounded
    } else {
        raw.ceil()
    };
    (count as usize).min(total)
}
