//! Property-based tests for lexivec invariants.
//!
//! These hold for arbitrary sentences and configurations:
//! - every yielded window satisfies the configured length bounds
//! - no window overlaps a sentence boundary marker
//! - containment stays in [0, 1] with its fixed points
//! - multiset merge is commutative and associative
//! - pruning is monotone in every threshold

use proptest::prelude::*;

use lexivec::aggregate::Aggregator;
use lexivec::config::{ExtractionConfig, PruneConfig, SENT_END, SENT_START};
use lexivec::multiset::{containment_index, merge_multisets, Multiset};
use lexivec::window::WindowExtractor;

fn arb_sentence() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec![
            "the", "a", "cat", "dog", "sat", "ran", "on", "mat", "rug", "big", ",", "42",
        ]),
        0..12,
    )
    .prop_map(|words| words.into_iter().map(str::to_string).collect())
}

fn arb_config() -> impl Strategy<Value = ExtractionConfig> {
    (1usize..4, 0usize..3, 0usize..3, 0usize..3, 0usize..3).prop_map(
        |(max_phrase, min_left, left_extra, min_right, right_extra)| ExtractionConfig {
            max_phrase_length: max_phrase,
            min_left_length: min_left,
            max_left_length: min_left + left_extra,
            min_right_length: min_right,
            max_right_length: min_right + right_extra,
            token_filter: None,
        },
    )
}

fn arb_multiset() -> impl Strategy<Value = Multiset<String>> {
    prop::collection::hash_map(
        prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(str::to_string),
        1u64..20,
        0..5,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn windows_respect_length_bounds(sentence in arb_sentence(), config in arb_config()) {
        // both-sides-zero is the one rejected combination
        prop_assume!(config.max_left_length > 0 || config.max_right_length > 0);
        let extractor = WindowExtractor::new(config.clone()).unwrap();
        for (phrase, context, _) in extractor.windows(&sentence) {
            let phrase_len = phrase.text().split(' ').count();
            prop_assert!(phrase_len >= 1 && phrase_len <= config.max_phrase_length);

            let left_len = if context.left.is_empty() { 0 } else { context.left.split(' ').count() };
            let right_len = if context.right.is_empty() { 0 } else { context.right.split(' ').count() };
            prop_assert!(left_len >= config.min_left_length && left_len <= config.max_left_length);
            prop_assert!(right_len >= config.min_right_length && right_len <= config.max_right_length);
        }
    }

    #[test]
    fn phrases_never_contain_markers(sentence in arb_sentence(), config in arb_config()) {
        prop_assume!(config.max_left_length > 0 || config.max_right_length > 0);
        let extractor = WindowExtractor::new(config).unwrap();
        for (phrase, context, _) in extractor.windows(&sentence) {
            for token in phrase.text().split(' ') {
                prop_assert!(token != SENT_START && token != SENT_END);
            }
            prop_assert!(!(context.left == SENT_START && context.right == SENT_END));
        }
    }

    #[test]
    fn extraction_is_restartable(sentence in arb_sentence(), config in arb_config()) {
        prop_assume!(config.max_left_length > 0 || config.max_right_length > 0);
        let extractor = WindowExtractor::new(config).unwrap();
        let first: Vec<_> = extractor.windows(&sentence).collect();
        let second: Vec<_> = extractor.windows(&sentence).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn containment_stays_in_unit_interval(a in arb_multiset(), b in arb_multiset()) {
        let c = containment_index(&a, &b);
        prop_assert!((0.0..=1.0).contains(&c));
        if !a.is_empty() {
            prop_assert_eq!(containment_index(&a, &a), 1.0);
        }
        let empty = Multiset::new();
        prop_assert_eq!(containment_index(&empty, &b), 0.0);
    }

    #[test]
    fn merge_is_commutative_and_associative(
        a in arb_multiset(),
        b in arb_multiset(),
        c in arb_multiset(),
    ) {
        prop_assert_eq!(merge_multisets([&a, &b]), merge_multisets([&b, &a]));
        let left = merge_multisets([&merge_multisets([&a, &b]), &c]);
        let right = merge_multisets([&a, &merge_multisets([&b, &c])]);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn pruning_is_monotone(
        sentences in prop::collection::vec(arb_sentence(), 1..8),
        window_threshold in 1u64..4,
        phrase_threshold in 1u64..4,
        context_threshold in 1u64..4,
    ) {
        let config = ExtractionConfig {
            max_phrase_length: 2,
            min_left_length: 1,
            max_left_length: 1,
            min_right_length: 1,
            max_right_length: 1,
            token_filter: None,
        };
        let corpus = vec![sentences];
        let base = Aggregator::new(config.clone(), PruneConfig {
            min_phrase_context_count: window_threshold,
            min_phrase_count: phrase_threshold,
            min_context_count: context_threshold,
        }).unwrap().aggregate(&corpus);
        let stricter = Aggregator::new(config, PruneConfig {
            min_phrase_context_count: window_threshold + 1,
            min_phrase_count: phrase_threshold + 1,
            min_context_count: context_threshold + 1,
        }).unwrap().aggregate(&corpus);

        let windows = |idx: &lexivec::aggregate::PrunedIndex|
            idx.windows.values().map(|c| c.len()).sum::<usize>();
        prop_assert!(windows(&stricter) <= windows(&base));
        prop_assert!(stricter.phrase_counts.len() <= base.phrase_counts.len());
        prop_assert!(stricter.context_counts.len() <= base.context_counts.len());
    }
}
