use rstest::*;
use tap_core::models::{
    AllocationTerms, Amount, BidKind, BidStatus, FrozenBid, Rate,
};
use tap_core::ports::Allocator;
use tap_engine::{AllocationError, UniformPriceEngine};

fn terms(target: i64) -> AllocationTerms {
    AllocationTerms {
        target_amount: Amount(target),
        denomination: Amount(1_000),
        tenor_days: None,
    }
}

fn competitive(id: u32, quantity: i64, rate: i64, at: i64) -> FrozenBid<u32, i64> {
    FrozenBid {
        id,
        kind: BidKind::Competitive,
        quantity: Amount(quantity),
        rate: Some(Rate(rate)),
        submitted_at: at,
    }
}

fn noncompetitive(id: u32, quantity: i64, at: i64) -> FrozenBid<u32, i64> {
    FrozenBid {
        id,
        kind: BidKind::NonCompetitive,
        quantity: Amount(quantity),
        rate: None,
        submitted_at: at,
    }
}

#[test]
fn marginal_tier_pro_rata() {
    // target 1,000,000 with 300,000 non-competitive leaves 700,000 to the
    // competitive side: the 24.0% bid fills, the 24.5% bid takes the
    // remaining 300,000 of its requested 500,000, the 25.0% bid gets nothing.
    let bids = vec![
        noncompetitive(1, 300_000, 10),
        competitive(2, 400_000, 2400, 11),
        competitive(3, 500_000, 2450, 12),
        competitive(4, 300_000, 2500, 13),
    ];

    let outcome = UniformPriceEngine.allocate(&terms(1_000_000), bids).unwrap();

    assert_eq!(outcome.summary.marginal_yield, Some(Rate(2450)));
    assert_eq!(outcome.summary.total_bids, Amount(1_500_000));
    assert_eq!(outcome.summary.total_accepted, Amount(1_000_000));
    assert_eq!(outcome.summary.bid_to_cover, 1.5);

    let nc = &outcome.allocations[&1];
    assert_eq!((nc.allocated, nc.status), (Amount(300_000), BidStatus::Allotted));
    let best = &outcome.allocations[&2];
    assert_eq!((best.allocated, best.status), (Amount(400_000), BidStatus::Allotted));
    let marginal = &outcome.allocations[&3];
    assert_eq!(
        (marginal.allocated, marginal.status),
        (Amount(300_000), BidStatus::PartiallyAllotted)
    );
    let worst = &outcome.allocations[&4];
    assert_eq!((worst.allocated, worst.status), (Amount(0), BidStatus::Rejected));

    // quantity-weighted over the allocated competitive side:
    // (400,000 * 2400 + 300,000 * 2450) / 700,000
    assert_eq!(outcome.summary.average_yield, Some(Rate(2421)));
}

#[test]
fn under_subscription_allots_everything() {
    let bids = vec![
        noncompetitive(1, 200_000, 10),
        competitive(2, 250_000, 2400, 11),
        competitive(3, 150_000, 2600, 12),
    ];

    let outcome = UniformPriceEngine.allocate(&terms(1_000_000), bids).unwrap();

    assert_eq!(outcome.summary.total_accepted, Amount(600_000));
    assert_eq!(outcome.summary.bid_to_cover, 0.6);
    // worst yield received becomes the marginal
    assert_eq!(outcome.summary.marginal_yield, Some(Rate(2600)));
    for (_, verdict) in &outcome.allocations {
        assert_eq!(verdict.status, BidStatus::Allotted);
    }
}

#[test]
fn under_subscription_with_only_noncompetitive_has_no_marginal() {
    let bids = vec![noncompetitive(1, 200_000, 10), noncompetitive(2, 100_000, 11)];

    let outcome = UniformPriceEngine.allocate(&terms(1_000_000), bids).unwrap();

    assert_eq!(outcome.summary.marginal_yield, None);
    assert_eq!(outcome.summary.average_yield, None);
    assert_eq!(outcome.summary.total_accepted, Amount(300_000));
}

#[test]
fn noncompetitive_oversubscription_rejects_all_competitive() {
    let bids = vec![
        noncompetitive(1, 600_000, 10),
        noncompetitive(2, 600_000, 11),
        competitive(3, 100_000, 2400, 12),
    ];

    let outcome = UniformPriceEngine.allocate(&terms(1_000_000), bids).unwrap();

    // pro-rata 1,000,000 over 1,200,000 demanded: 500,000 each
    assert_eq!(outcome.allocations[&1].allocated, Amount(500_000));
    assert_eq!(outcome.allocations[&2].allocated, Amount(500_000));
    assert_eq!(outcome.allocations[&1].status, BidStatus::PartiallyAllotted);
    assert_eq!(outcome.allocations[&3].status, BidStatus::Rejected);
    // best competitive yield observed is recorded as the marginal
    assert_eq!(outcome.summary.marginal_yield, Some(Rate(2400)));
    assert_eq!(outcome.summary.total_accepted, Amount(1_000_000));
}

#[test]
fn rounding_remainder_cascades_from_earliest_submission() {
    // Three equal bids at the marginal yield over 2,000 of capacity: each
    // floors to zero at the 1,000 denomination, so the remainder tops up the
    // two earliest submissions and the third is rejected.
    let bids = vec![
        competitive(7, 1_000, 2400, 30),
        competitive(5, 1_000, 2400, 10),
        competitive(6, 1_000, 2400, 20),
    ];

    let outcome = UniformPriceEngine.allocate(&terms(2_000), bids).unwrap();

    assert_eq!(outcome.allocations[&5].allocated, Amount(1_000));
    assert_eq!(outcome.allocations[&6].allocated, Amount(1_000));
    assert_eq!(outcome.allocations[&7].allocated, Amount(0));
}

#[test]
fn timestamp_tie_breaks_by_bid_id() {
    let bids = vec![
        competitive(9, 1_000, 2400, 10),
        competitive(8, 1_000, 2400, 10),
    ];

    let outcome = UniformPriceEngine.allocate(&terms(1_000), bids).unwrap();

    assert_eq!(outcome.allocations[&8].allocated, Amount(1_000));
    assert_eq!(outcome.allocations[&9].allocated, Amount(0));
}

#[test]
fn marginal_price_derived_for_bills() {
    let terms = AllocationTerms {
        target_amount: Amount(1_000_000),
        denomination: Amount(1_000),
        tenor_days: Some(364),
    };
    let bids = vec![competitive(1, 1_000_000, 2450, 10)];

    let outcome = UniformPriceEngine.allocate(&terms, bids).unwrap();

    assert_eq!(outcome.summary.marginal_yield, Some(Rate(2450)));
    assert_eq!(
        outcome.summary.marginal_price,
        Some(tap_engine::discount_price(Rate(2450), 364))
    );
}

#[test]
fn empty_bid_set_publishes_zeroes() {
    let outcome = UniformPriceEngine
        .allocate(&terms(1_000_000), Vec::<FrozenBid<u32, i64>>::new())
        .unwrap();

    assert_eq!(outcome.summary.total_bids, Amount(0));
    assert_eq!(outcome.summary.total_accepted, Amount(0));
    assert_eq!(outcome.summary.marginal_yield, None);
    assert!(outcome.allocations.is_empty());
}

#[test]
fn competitive_bid_without_rate_is_an_error() {
    let bids = vec![FrozenBid::<u32, i64> {
        id: 1,
        kind: BidKind::Competitive,
        quantity: Amount(1_000),
        rate: None,
        submitted_at: 10,
    }];

    let result = UniformPriceEngine.allocate(&terms(1_000_000), bids);
    assert_eq!(result.unwrap_err(), AllocationError::MissingRate);
}

#[test]
fn non_positive_target_is_an_error() {
    let result =
        UniformPriceEngine.allocate(&terms(0), Vec::<FrozenBid<u32, i64>>::new());
    assert_eq!(
        result.unwrap_err(),
        AllocationError::InvalidTarget { target: Amount(0) }
    );
}

/// A grab-bag of bid sets for property-style checks.
#[fixture]
pub fn mixed_book() -> Vec<FrozenBid<u32, i64>> {
    vec![
        noncompetitive(1, 250_000, 5),
        competitive(2, 400_000, 2375, 6),
        competitive(3, 500_000, 2450, 7),
        noncompetitive(4, 50_000, 8),
        competitive(5, 500_000, 2450, 9),
        competitive(6, 300_000, 2600, 10),
    ]
}

#[rstest]
#[case::scarce(1_000_000)]
#[case::exact(2_000_000)]
#[case::abundant(5_000_000)]
fn allocated_quantities_sum_to_accepted(
    mixed_book: Vec<FrozenBid<u32, i64>>,
    #[case] target: i64,
) {
    let outcome = UniformPriceEngine.allocate(&terms(target), mixed_book).unwrap();

    let allocated: Amount = outcome
        .allocations
        .values()
        .map(|verdict| verdict.allocated)
        .sum();
    assert_eq!(allocated, outcome.summary.total_accepted);
    assert!(outcome.summary.total_accepted <= Amount(target));
}

#[rstest]
fn noncompetitive_bids_never_trail_accepted_competitive_bids(
    mixed_book: Vec<FrozenBid<u32, i64>>,
) {
    let outcome = UniformPriceEngine
        .allocate(&terms(1_000_000), mixed_book.clone())
        .unwrap();

    // if any competitive bid received an allocation, every non-competitive
    // bid must be allotted in full
    let any_competitive_fill = mixed_book
        .iter()
        .filter(|bid| bid.kind == BidKind::Competitive)
        .any(|bid| outcome.allocations[&bid.id].allocated > Amount(0));
    if any_competitive_fill {
        for bid in mixed_book.iter().filter(|b| b.kind == BidKind::NonCompetitive) {
            assert_eq!(outcome.allocations[&bid.id].allocated, bid.quantity);
        }
    }
}

#[rstest]
fn identical_inputs_produce_identical_outcomes(mixed_book: Vec<FrozenBid<u32, i64>>) {
    let first = UniformPriceEngine
        .allocate(&terms(1_000_000), mixed_book.clone())
        .unwrap();
    let second = UniformPriceEngine.allocate(&terms(1_000_000), mixed_book).unwrap();

    assert_eq!(first.summary, second.summary);
    let lhs: Vec<_> = first.allocations.into_iter().collect();
    let rhs: Vec<_> = second.allocations.into_iter().collect();
    assert_eq!(lhs, rhs);
}
