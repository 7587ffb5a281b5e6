use super::{Amount, BidKind, BidStatus, Map, Price, Rate};
use std::hash::Hash;

/// The auction parameters the allocation engine works from.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationTerms {
    /// The amount on offer
    pub target_amount: Amount,
    /// The security's minimum denomination; allocations round down to it
    pub denomination: Amount,
    /// Tenor of the instrument, when a discount price should be derived
    pub tenor_days: Option<u32>,
}

/// A bid in the frozen, non-cancelled set handed to the engine at close.
///
/// The submission timestamp and id provide the deterministic tie-break for
/// pro-rata rounding remainders.
#[derive(Debug, Clone)]
pub struct FrozenBid<BidId, DateTime> {
    /// The bid's unique reference
    pub id: BidId,
    /// Competitive or non-competitive
    pub kind: BidKind,
    /// Requested quantity
    pub quantity: Amount,
    /// The bid yield, for competitive bids
    pub rate: Option<Rate>,
    /// When the bid was accepted into the ledger
    pub submitted_at: DateTime,
}

/// The engine's verdict on one bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BidOutcome {
    /// Quantity allocated to the bid
    pub allocated: Amount,
    /// Allotted, partially allotted, or rejected
    pub status: BidStatus,
}

/// Auction-level statistics computed by the engine.
///
/// The repository stamps a publication timestamp onto this summary to form
/// the auction's published results.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationSummary {
    /// The market-clearing yield; None if no competitive bid informed it
    pub marginal_yield: Option<Rate>,
    /// The price equivalent of the marginal yield (bills only)
    pub marginal_price: Option<Price>,
    /// Quantity-weighted mean yield over allocated competitive bids
    pub average_yield: Option<Rate>,
    /// Sum of all submitted quantities
    pub total_bids: Amount,
    /// Total quantity allocated
    pub total_accepted: Amount,
    /// total_bids / target_amount
    pub bid_to_cover: f64,
}

/// The complete, validated output of one allocation run.
#[derive(Debug, Clone)]
pub struct AllocationOutcome<BidId: Eq + Hash> {
    /// Auction-level statistics
    pub summary: AllocationSummary,
    /// Per-bid verdicts, in deterministic order
    pub allocations: Map<BidId, BidOutcome>,
}

/// The data emitted to the settlement collaborator once results publish.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "BidderId: serde::Serialize, DateTime: serde::Serialize",
        deserialize = "BidderId: serde::Deserialize<'de> + Eq + Hash, DateTime: serde::Deserialize<'de>"
    ))
)]
pub struct SettlementInstruction<BidderId: Eq + Hash, DateTime> {
    /// The auction code
    pub auction_code: String,
    /// The scheduled settlement date
    pub settlement_date: DateTime,
    /// Total allocated quantity per bidder
    pub allocations: Map<BidderId, Amount>,
}
