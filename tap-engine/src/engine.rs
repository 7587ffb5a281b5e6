use crate::price::discount_price;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use tap_core::models::{
    AllocationOutcome, AllocationSummary, AllocationTerms, Amount, BidKind, BidOutcome, BidStatus,
    FrozenBid, Map, Rate,
};
use tap_core::ports::Allocator;
use thiserror::Error;

/// The ways an allocation computation can fail.
///
/// Any of these abort the run with no partial state; the auction stays
/// `Closed` and the computation can be retried after operator attention.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// The target amount must be positive
    #[error("non-positive target amount: {target}")]
    InvalidTarget {
        /// The offending target
        target: Amount,
    },
    /// A competitive bid reached the engine without a yield
    #[error("competitive bid without a yield in frozen bid set")]
    MissingRate,
    /// The allocated quantities did not sum to the accepted total
    #[error("allocation invariant violation: allocated {allocated}, accepted {accepted}")]
    InvariantViolation {
        /// Sum of per-bid allocations
        allocated: Amount,
        /// The total the auction accepted
        accepted: Amount,
    },
}

/// The uniform-price allocator.
///
/// Competitive bids are ranked by yield ascending (lower yield is more
/// favorable to the issuer); non-competitive bids take priority up to their
/// share of the target. Everything clears at the single marginal yield.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPriceEngine;

impl<BidId, DateTime> Allocator<BidId, DateTime> for UniformPriceEngine
where
    BidId: Clone + Eq + Hash + Ord,
    DateTime: Ord,
{
    type Error = AllocationError;

    fn allocate(
        &self,
        terms: &AllocationTerms,
        bids: Vec<FrozenBid<BidId, DateTime>>,
    ) -> Result<AllocationOutcome<BidId>, AllocationError> {
        let target = terms.target_amount;
        if target <= Amount::ZERO {
            return Err(AllocationError::InvalidTarget { target });
        }

        let total_bids: Amount = bids.iter().map(|b| b.quantity).sum();

        let mut noncomp: Vec<&FrozenBid<BidId, DateTime>> = Vec::new();
        let mut comp: Vec<(Rate, &FrozenBid<BidId, DateTime>)> = Vec::new();
        for bid in &bids {
            match bid.kind {
                BidKind::NonCompetitive => noncomp.push(bid),
                BidKind::Competitive => {
                    comp.push((bid.rate.ok_or(AllocationError::MissingRate)?, bid))
                }
            }
        }

        // Submission order decides pro-rata rounding remainders; yield order
        // decides allocation priority. Both sorts end with the bid id so the
        // entire computation has a total order.
        noncomp.sort_by(|a, b| (&a.submitted_at, &a.id).cmp(&(&b.submitted_at, &b.id)));
        comp.sort_by(|a, b| (a.0, &a.1.submitted_at, &a.1.id).cmp(&(b.0, &b.1.submitted_at, &b.1.id)));

        let nc_total: Amount = noncomp.iter().map(|b| b.quantity).sum();

        let mut alloc: FxHashMap<BidId, Amount> = FxHashMap::default();
        let marginal_yield;
        let total_accepted;

        if total_bids < target {
            // Under-subscribed: everyone is allotted in full and the marginal
            // yield is the worst yield received.
            for bid in &bids {
                alloc.insert(bid.id.clone(), bid.quantity);
            }
            marginal_yield = comp.iter().map(|(rate, _)| *rate).max();
            total_accepted = total_bids;
        } else if nc_total >= target {
            // Non-competitive demand alone exhausts the offer: pro-rate it,
            // reject every competitive bid, and record the best competitive
            // yield observed as the marginal.
            pro_rata(&noncomp, target, terms.denomination, &mut alloc);
            marginal_yield = comp.iter().map(|(rate, _)| *rate).min();
            total_accepted = target;
        } else {
            for bid in &noncomp {
                alloc.insert(bid.id.clone(), bid.quantity);
            }
            let rem = target - nc_total;

            // Walk the yield-ordered competitive bids until cumulative
            // quantity crosses the remaining capacity; that bid's yield is
            // the marginal yield.
            let mut crossing = None;
            let mut cumulative = Amount::ZERO;
            for (rate, bid) in &comp {
                cumulative += bid.quantity;
                if cumulative >= rem {
                    crossing = Some(*rate);
                    break;
                }
            }
            let Some(marginal) = crossing else {
                // Unreachable when total_bids >= target, but the invariant
                // check below must never be bypassed by a panic.
                return Err(AllocationError::InvariantViolation {
                    allocated: nc_total + cumulative,
                    accepted: target,
                });
            };

            let mut tier: Vec<&FrozenBid<BidId, DateTime>> = Vec::new();
            let mut better_total = Amount::ZERO;
            for (rate, bid) in &comp {
                if *rate < marginal {
                    alloc.insert(bid.id.clone(), bid.quantity);
                    better_total += bid.quantity;
                } else if *rate == marginal {
                    tier.push(bid);
                }
            }
            pro_rata(&tier, rem - better_total, terms.denomination, &mut alloc);

            marginal_yield = Some(marginal);
            total_accepted = target;
        }

        // Quantity-weighted mean yield over allocated competitive bids.
        let mut weighted: i128 = 0;
        let mut weight: i128 = 0;
        for (rate, bid) in &comp {
            let allocated = alloc.get(&bid.id).copied().unwrap_or(Amount::ZERO);
            if allocated > Amount::ZERO {
                weighted += allocated.0 as i128 * rate.0 as i128;
                weight += allocated.0 as i128;
            }
        }
        let average_yield = if weight > 0 {
            Some(Rate(((weighted + weight / 2) / weight) as i64))
        } else {
            None
        };

        let marginal_price = match (terms.tenor_days, marginal_yield) {
            (Some(tenor), Some(rate)) => Some(discount_price(rate, tenor)),
            _ => None,
        };

        let mut allocations = Map::default();
        let mut allocated_total = Amount::ZERO;
        for bid in &bids {
            let allocated = alloc.get(&bid.id).copied().unwrap_or(Amount::ZERO);
            allocated_total += allocated;
            let status = if allocated == Amount::ZERO {
                BidStatus::Rejected
            } else if allocated == bid.quantity {
                BidStatus::Allotted
            } else {
                BidStatus::PartiallyAllotted
            };
            allocations.insert(bid.id.clone(), BidOutcome { allocated, status });
        }

        if allocated_total != total_accepted {
            return Err(AllocationError::InvariantViolation {
                allocated: allocated_total,
                accepted: total_accepted,
            });
        }

        Ok(AllocationOutcome {
            summary: AllocationSummary {
                marginal_yield,
                marginal_price,
                average_yield,
                total_bids,
                total_accepted,
                bid_to_cover: total_bids.0 as f64 / target.0 as f64,
            },
            allocations,
        })
    }
}

/// Distribute `capacity` across a tier of bids proportionally to requested
/// quantity, rounding each share down to the denomination.
///
/// The rounding remainder goes to the earliest-submitted bid in the tier,
/// cascading to the next-earliest when topping up would exceed a bid's
/// requested quantity. `tier` must already be in (submission time, id)
/// order, and `capacity` must not exceed the tier's total quantity.
fn pro_rata<BidId, DateTime>(
    tier: &[&FrozenBid<BidId, DateTime>],
    capacity: Amount,
    denomination: Amount,
    alloc: &mut FxHashMap<BidId, Amount>,
) where
    BidId: Clone + Eq + Hash,
{
    let quantity_sum: Amount = tier.iter().map(|b| b.quantity).sum();
    if quantity_sum <= capacity {
        for bid in tier {
            alloc.insert(bid.id.clone(), bid.quantity);
        }
        return;
    }

    let mut shares: Vec<Amount> = tier
        .iter()
        .map(|bid| {
            let exact = capacity.0 as i128 * bid.quantity.0 as i128 / quantity_sum.0 as i128;
            Amount(exact as i64).floor_to(denomination)
        })
        .collect();

    // With every quantity a denomination multiple, the remainder is one too.
    let mut remainder = capacity - shares.iter().copied().sum();
    for (share, bid) in shares.iter_mut().zip(tier) {
        if remainder == Amount::ZERO {
            break;
        }
        let headroom = bid.quantity - *share;
        let top_up = if headroom < remainder { headroom } else { remainder };
        *share += top_up;
        remainder -= top_up;
    }

    for (share, bid) in shares.iter().zip(tier) {
        alloc.insert(bid.id.clone(), *share);
    }
}
