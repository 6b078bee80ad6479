use super::*;
use proptest::prelude::*;

fn splits(n: usize) -> Vec<TokenRange> {
    split_token_ring(NonZeroUsize::new(n).expect("test split count must be positive"))
}

fn assert_ring_partition(ranges: &[TokenRange], n: usize) {
    assert_eq!(ranges.len(), n, "split({n}) must return exactly {n} ranges");
    assert_eq!(ranges[0].from(), None, "first range must start at ring minimum");
    assert_eq!(
        ranges[n - 1].upper_bound(),
        RING_MAX,
        "last range must end at ring maximum"
    );

    for pair in ranges.windows(2) {
        assert_eq!(pair[0].to(), pair[1].from(), "adjacent ranges must share a boundary");
        assert!(
            pair[0].lower_bound() < pair[0].upper_bound(),
            "range {} must be non-empty",
            pair[0]
        );
    }
}

#[test]
fn single_split_is_whole_ring() {
    assert_eq!(splits(1), vec![TokenRange::full()]);
}

#[test]
fn two_splits_meet_at_minus_one() {
    let expected = vec![
        TokenRange::new(None, Some(-1)).expect("valid range"),
        TokenRange::new(Some(-1), Some(RING_MAX)).expect("valid range"),
    ];

    assert_eq!(splits(2), expected);
}

#[test]
fn small_split_counts_partition_the_ring() {
    for n in 1..100 {
        assert_ring_partition(&splits(n), n);
    }
}

#[test]
fn split_is_deterministic() {
    assert_eq!(splits(17), splits(17));
}

#[test]
fn new_rejects_inverted_bounds() {
    assert!(TokenRange::new(Some(5), Some(5)).is_none());
    assert!(TokenRange::new(Some(6), Some(5)).is_none());
    assert!(TokenRange::new(Some(5), None).is_some());
}

#[test]
fn fraction_clamps_outside_bounds() {
    let range = TokenRange::new(Some(100), Some(200)).expect("valid range");

    assert!(range.fraction_at(50).abs() < f64::EPSILON);
    assert!((range.fraction_at(200) - 1.0).abs() < f64::EPSILON);
    assert!((range.fraction_at(i64::MAX) - 1.0).abs() < f64::EPSILON);
    assert!((range.fraction_at(150) - 0.5).abs() < 1e-12);
}

#[test]
fn fraction_over_full_ring_does_not_overflow() {
    let full = TokenRange::full();

    assert!(full.fraction_at(RING_MIN).abs() < f64::EPSILON);
    assert!((full.fraction_at(0) - 0.5).abs() < 1e-9);
    assert!((full.fraction_at(RING_MAX) - 1.0).abs() < f64::EPSILON);
}

proptest! {
    #[test]
    fn any_split_count_partitions_the_ring(n in 1usize..4096) {
        let ranges = splits(n);
        prop_assert_eq!(ranges.len(), n);
        prop_assert_eq!(ranges[0].from(), None);
        prop_assert_eq!(ranges[n - 1].upper_bound(), RING_MAX);
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].to(), pair[1].from());
        }
    }

    #[test]
    fn fraction_is_monotonic_in_token(a in any::<i64>(), b in any::<i64>(), n in 1usize..64, pick in any::<prop::sample::Index>()) {
        let ranges = splits(n);
        let range = ranges[pick.index(n)];
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let f_lo = range.fraction_at(lo);
        let f_hi = range.fraction_at(hi);
        prop_assert!((0.0..=1.0).contains(&f_lo));
        prop_assert!((0.0..=1.0).contains(&f_hi));
        prop_assert!(f_lo <= f_hi);
    }
}
