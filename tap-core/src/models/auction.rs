use super::{AllocationTerms, Amount, Price, Rate, Security, SecurityKind};

/// Which kinds of bids the auction admits.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionMode {
    /// Competitive bids only
    Competitive,
    /// Non-competitive bids only
    NonCompetitive,
    /// Both kinds of bids
    Mixed,
}

impl AuctionMode {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionMode::Competitive => "competitive",
            AuctionMode::NonCompetitive => "non_competitive",
            AuctionMode::Mixed => "mixed",
        }
    }
}

/// The lifecycle state of an auction.
///
/// Transitions run strictly forward:
/// `Announced → Open → Closed → ResultsPublished → Settled`.
/// Terminal states have no outgoing edges; an auction is never deleted,
/// only superseded by status.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionStatus {
    /// Announced but not yet open for bidding
    Announced,
    /// Accepting bids
    Open,
    /// Bidding closed, allocation pending
    Closed,
    /// Allocation complete, results published
    ResultsPublished,
    /// Settlement confirmed by the CSD
    Settled,
}

impl AuctionStatus {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Announced => "announced",
            AuctionStatus::Open => "open",
            AuctionStatus::Closed => "closed",
            AuctionStatus::ResultsPublished => "results_published",
            AuctionStatus::Settled => "settled",
        }
    }
}

impl std::str::FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "announced" => Ok(AuctionStatus::Announced),
            "open" => Ok(AuctionStatus::Open),
            "closed" => Ok(AuctionStatus::Closed),
            "results_published" => Ok(AuctionStatus::ResultsPublished),
            "settled" => Ok(AuctionStatus::Settled),
            other => Err(format!("unknown auction status: {other}")),
        }
    }
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An acceptable price band for competitive bids (bond auctions).
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    /// Lowest acceptable price
    pub min: Price,
    /// Highest acceptable price
    pub max: Price,
}

/// The timetable of an auction.
///
/// The ordering `open < close < settlement` is validated when the auction
/// (or staged announcement) is created, never at transition time.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionSchedule<DateTime> {
    /// When bidding opens
    pub open_at: DateTime,
    /// When bidding closes
    pub close_at: DateTime,
    /// The settlement date
    pub settle_at: DateTime,
}

impl<DateTime: PartialOrd> AuctionSchedule<DateTime> {
    /// Whether the timetable runs strictly forward.
    pub fn is_ordered(&self) -> bool {
        self.open_at < self.close_at && self.close_at < self.settle_at
    }
}

/// The immutable terms of an auction.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionData<DateTime> {
    /// The unique auction code
    pub code: String,
    /// The security on offer
    pub security: Security<DateTime>,
    /// Which bid kinds are admitted
    pub mode: AuctionMode,
    /// The amount on offer
    pub target_amount: Amount,
    /// Minimum bid quantity
    pub min_bid: Amount,
    /// Maximum bid quantity, if capped
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub max_bid: Option<Amount>,
    /// Ceiling on a single non-competitive bid, if capped
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub max_noncompetitive: Option<Amount>,
    /// Acceptable price band (bond auctions)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub price_range: Option<PriceRange>,
}

impl<DateTime> AuctionData<DateTime> {
    /// The parameters the allocation engine needs from these terms.
    ///
    /// A marginal price is only derived for bills; bond price determination
    /// is a settlement-convention concern and stays out of allocation.
    pub fn allocation_terms(&self) -> AllocationTerms {
        AllocationTerms {
            target_amount: self.target_amount,
            denomination: self.security.denomination,
            tenor_days: match self.security.kind {
                SecurityKind::Bill => Some(self.security.tenor_days),
                SecurityKind::Bond => None,
            },
        }
    }
}

/// The published outcome of an auction.
///
/// Written exactly once when allocation completes, immutable thereafter, and
/// retrievable by auction code indefinitely for audit.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionResults<DateTime> {
    /// The market-clearing yield; None if no competitive bid informed it
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub marginal_yield: Option<Rate>,
    /// The price equivalent of the marginal yield (bills only)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub marginal_price: Option<Price>,
    /// Quantity-weighted mean yield over allocated competitive bids
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub average_yield: Option<Rate>,
    /// Sum of all submitted quantities
    pub total_bids: Amount,
    /// Total quantity allocated
    pub total_accepted: Amount,
    /// total_bids / target_amount, a demand-strength indicator
    pub bid_to_cover: f64,
    /// When the results were published
    pub published_at: DateTime,
}

/// A stored auction with its full lifecycle state.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct AuctionRecord<AuctionId, DateTime> {
    /// The auction's unique id
    pub id: AuctionId,
    /// The immutable auction terms
    pub data: AuctionData<DateTime>,
    /// The auction timetable
    pub schedule: AuctionSchedule<DateTime>,
    /// Current lifecycle state
    pub status: AuctionStatus,
    /// When the auction was announced (created)
    pub announced_at: DateTime,
    /// Published results, once allocation has run
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub results: Option<AuctionResults<DateTime>>,
    /// The settlement date confirmed by the depository
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub settled_at: Option<DateTime>,
    /// Running count of non-cancelled bids
    pub bid_count: i64,
    /// Running sum of non-cancelled bid quantities
    pub total_bid_amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_ordering() {
        let ordered = AuctionSchedule {
            open_at: 1,
            close_at: 2,
            settle_at: 3,
        };
        assert!(ordered.is_ordered());

        let settle_before_close = AuctionSchedule {
            open_at: 1,
            close_at: 3,
            settle_at: 2,
        };
        assert!(!settle_before_close.is_ordered());

        let degenerate = AuctionSchedule {
            open_at: 1,
            close_at: 1,
            settle_at: 2,
        };
        assert!(!degenerate.is_ordered());
    }
}
