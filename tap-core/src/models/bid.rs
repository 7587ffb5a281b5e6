use super::{Amount, Rate};

/// Whether a bid names its own yield or accepts the clearing yield.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidKind {
    /// Carries a yield; allocated at or better than the marginal yield
    Competitive,
    /// Accepts the clearing yield in exchange for allocation priority
    NonCompetitive,
}

impl BidKind {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BidKind::Competitive => "competitive",
            BidKind::NonCompetitive => "non_competitive",
        }
    }
}

impl std::str::FromStr for BidKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "competitive" => Ok(BidKind::Competitive),
            "non_competitive" => Ok(BidKind::NonCompetitive),
            other => Err(format!("unknown bid kind: {other}")),
        }
    }
}

/// The state of a bid.
///
/// `Pending → Submitted → {Allotted | PartiallyAllotted | Rejected}`, or
/// `Cancelled` at any point before the auction closes. The allocation states
/// and `Cancelled` are terminal.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidStatus {
    /// Received but not yet validated
    Pending,
    /// Accepted into the ledger, awaiting allocation
    Submitted,
    /// Allocated in full
    Allotted,
    /// Allocated below the requested quantity
    PartiallyAllotted,
    /// Received no allocation
    Rejected,
    /// Withdrawn before the auction closed
    Cancelled,
}

impl BidStatus {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Pending => "pending",
            BidStatus::Submitted => "submitted",
            BidStatus::Allotted => "allotted",
            BidStatus::PartiallyAllotted => "partially_allotted",
            BidStatus::Rejected => "rejected",
            BidStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BidStatus::Pending),
            "submitted" => Ok(BidStatus::Submitted),
            "allotted" => Ok(BidStatus::Allotted),
            "partially_allotted" => Ok(BidStatus::PartiallyAllotted),
            "rejected" => Ok(BidStatus::Rejected),
            "cancelled" => Ok(BidStatus::Cancelled),
            other => Err(format!("unknown bid status: {other}")),
        }
    }
}

/// A bid as submitted by a bidder (or a primary dealer on behalf of an
/// aggregated client order; the ledger does not distinguish).
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct BidSubmission<AuctionId> {
    /// The auction being bid into
    pub auction_id: AuctionId,
    /// Competitive or non-competitive
    pub kind: BidKind,
    /// Requested quantity in minor units
    pub quantity: Amount,
    /// The bid yield; required iff competitive
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub rate: Option<Rate>,
}

/// A stored bid.
///
/// Quantity and rate are immutable once the owning auction leaves `Open`;
/// the allocation fields are written exactly once by the allocation run.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct BidRecord<BidId, AuctionId, BidderId, DateTime> {
    /// The bid's unique reference
    pub id: BidId,
    /// The owning auction
    pub auction_id: AuctionId,
    /// Who submitted the bid
    pub bidder_id: BidderId,
    /// Competitive or non-competitive
    pub kind: BidKind,
    /// Requested quantity
    pub quantity: Amount,
    /// The bid yield, for competitive bids
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rate: Option<Rate>,
    /// Current state
    pub status: BidStatus,
    /// Allocated quantity, once allocation has run
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub allocated: Option<Amount>,
    /// When the bid was accepted into the ledger
    pub submitted_at: DateTime,
}
