use std::collections::HashSet;

use proptest::prelude::*;
use thermalprep::split::{portion, split};

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn split_is_a_partition(
        corpus in proptest_helpers::arb_corpus(300),
        seed in any::<u64>(),
        (train, test) in proptest_helpers::arb_fractions(),
    ) {
        let assignment = split(&corpus, seed, train, test);
        prop_assert_eq!(assignment.len(), corpus.len());

        let mut seen = HashSet::new();
        for (_, subset) in assignment.subsets() {
            for name in subset {
                prop_assert!(seen.insert(name.clone()), "{} assigned twice", name);
            }
        }
        prop_assert_eq!(seen.len(), corpus.len());
    }

    #[test]
    fn split_sizes_follow_fractions(
        corpus in proptest_helpers::arb_corpus(300),
        seed in any::<u64>(),
        (train, test) in proptest_helpers::arb_fractions(),
    ) {
        let assignment = split(&corpus, seed, train, test);
        let holdout = portion(corpus.len(), 1.0 - train);
        prop_assert_eq!(assignment.train.len(), corpus.len() - holdout);
        prop_assert_eq!(assignment.test.len(), portion(holdout, test));
        prop_assert_eq!(assignment.val.len(), holdout - portion(holdout, test));
    }

    #[test]
    fn same_seed_same_split(
        corpus in proptest_helpers::arb_corpus(200),
        seed in any::<u64>(),
    ) {
        let first = split(&corpus, seed, 0.7, 0.33);
        let second = split(&corpus, seed, 0.7, 0.33);
        prop_assert_eq!(first.train, second.train);
        prop_assert_eq!(first.val, second.val);
        prop_assert_eq!(first.test, second.test);
    }
}
