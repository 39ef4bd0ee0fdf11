//! Property-based tests for the classifier

use contextprio::classify::{classify_label, ContextTier, ThresholdEntry, ThresholdTable};
use proptest::prelude::*;

/// Strictly increasing bounds paired with non-decreasing tiers
fn ascending_table() -> impl Strategy<Value = ThresholdTable> {
    (
        -1000.0f64..1000.0,
        prop::collection::vec((0.001f64..500.0, 0i64..=1), 0..4),
    )
        .prop_map(|(start, steps)| {
            let mut entries = vec![ThresholdEntry::new(start, ContextTier::Lowest)];
            let (mut bound, mut rank) = (start, 0i64);
            for (gap, bump) in steps {
                bound += gap;
                rank += bump;
                entries.push(ThresholdEntry::new(bound, ContextTier::from_rank_clamped(rank)));
            }
            ThresholdTable::new(entries).unwrap()
        })
}

/// classify is monotonic non-decreasing for every ascending table
#[test]
fn test_classify_monotonic_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(ascending_table(), -5000.0f64..5000.0, -5000.0f64..5000.0),
            |(table, x, y)| {
                let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
                prop_assert!(table.classify(lo) <= table.classify(hi));
                Ok(())
            },
        )
        .unwrap();
}

/// Every bound classifies to exactly its own tier; below the first bound is Lowest
#[test]
fn test_classify_boundary_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&ascending_table(), |table| {
            for entry in table.entries() {
                prop_assert_eq!(table.classify(entry.lower_bound), entry.tier);
            }
            let first = table.entries()[0].lower_bound;
            prop_assert_eq!(table.classify(first - 0.5), ContextTier::Lowest);
            prop_assert_eq!(table.classify(f64::NAN), ContextTier::Lowest);
            Ok(())
        })
        .unwrap();
}

/// Arbitrary strings always yield a tier; only the four exact labels leave Lowest
#[test]
fn test_classify_label_total_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |label| {
            let tier = classify_label(Some(label.as_str()));
            let expected = match label.as_str() {
                "Low" => ContextTier::Low,
                "High" => ContextTier::High,
                "Highest" => ContextTier::Highest,
                _ => ContextTier::Lowest,
            };
            prop_assert_eq!(tier, expected);
            Ok(())
        })
        .unwrap();

    for tier in ContextTier::ALL {
        assert_eq!(classify_label(Some(tier.as_str())), tier);
        assert_eq!(classify_label(Some(tier.as_str().to_lowercase().as_str())), ContextTier::Lowest);
    }
    assert_eq!(classify_label(None), ContextTier::Lowest);
}
