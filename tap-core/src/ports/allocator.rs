use crate::models::{AllocationOutcome, AllocationTerms, FrozenBid};
use std::hash::Hash;

/// Interface for the allocation engine.
///
/// Given the frozen, non-cancelled bid set of a closed auction and its
/// terms, compute the marginal yield and a per-bid allocation. The contract:
///
/// - **Deterministic**: identical inputs produce identical outputs. The id
///   and timestamp ordering bounds exist purely to serve the tie-break rule.
/// - **Single pass, no I/O**: the computation is one in-memory pass over the
///   bid set, so a timeout can never leave it half-applied.
/// - **All or nothing**: an error discards every intermediate value; the
///   caller keeps the auction in `Closed` for a retry.
pub trait Allocator<BidId, DateTime>
where
    BidId: Clone + Eq + Hash + Ord,
    DateTime: Ord,
{
    /// How the engine reports an unsatisfiable or inconsistent computation
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compute the allocation for one auction.
    fn allocate(
        &self,
        terms: &AllocationTerms,
        bids: Vec<FrozenBid<BidId, DateTime>>,
    ) -> Result<AllocationOutcome<BidId>, Self::Error>;
}
