use super::Repository;
use crate::models::{Amount, BidRecord, BidSubmission};
use thiserror::Error;

/// The ways a bid ledger operation can fail.
///
/// These are caller faults or stale views, returned synchronously and never
/// retried by the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BidFailure {
    /// The referenced auction or bid does not exist
    #[error("does not exist")]
    DoesNotExist,
    /// The caller may not act on this bid
    #[error("access denied")]
    AccessDenied,
    /// The owning auction is not accepting bids
    #[error("auction is not open")]
    AuctionNotOpen,
    /// Quantity outside the configured bounds or not a denomination multiple
    #[error("invalid bid amount: {quantity}")]
    InvalidBidAmount {
        /// The offending quantity
        quantity: Amount,
    },
    /// A competitive bid arrived without a yield
    #[error("competitive bid requires a price/yield")]
    MissingPrice,
    /// The bid kind is not admitted by the auction's mode
    #[error("bid kind not admitted by this auction")]
    KindNotAllowed,
}

/// Repository interface for the bid ledger.
///
/// Guarantee: no bid is accepted once the owning auction is not `Open`, even
/// under a concurrent close: the status read and the bid insert happen as
/// one unit at the store layer.
pub trait BidRepository: Repository {
    /// Accept a bid into the ledger.
    ///
    /// Validates the quantity against the auction's bounds (and the
    /// non-competitive ceiling where configured), requires a yield on
    /// competitive bids, and atomically bumps the auction's running bid
    /// statistics. On success the stored bid has status `Submitted`.
    fn submit_bid(
        &self,
        bid_id: Self::BidId,
        bidder_id: Self::BidderId,
        submission: BidSubmission<Self::AuctionId>,
        as_of: Self::DateTime,
    ) -> impl Future<
        Output = Result<
            Result<
                BidRecord<Self::BidId, Self::AuctionId, Self::BidderId, Self::DateTime>,
                BidFailure,
            >,
            Self::Error,
        >,
    > + Send;

    /// Cancel a bid, removing it from allocation consideration.
    ///
    /// Fails with [`BidFailure::AuctionNotOpen`] once the owning auction has
    /// closed. Cancelling reverses the bid's contribution to the auction's
    /// running statistics.
    fn cancel_bid(
        &self,
        bid_id: Self::BidId,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<(), BidFailure>, Self::Error>> + Send;

    /// Look up a single bid.
    fn get_bid(
        &self,
        bid_id: Self::BidId,
    ) -> impl Future<
        Output = Result<
            Option<BidRecord<Self::BidId, Self::AuctionId, Self::BidderId, Self::DateTime>>,
            Self::Error,
        >,
    > + Send;

    /// The non-cancelled bids of an auction, in submission order.
    fn list_bids(
        &self,
        auction_id: Self::AuctionId,
    ) -> impl Future<
        Output = Result<
            Vec<BidRecord<Self::BidId, Self::AuctionId, Self::BidderId, Self::DateTime>>,
            Self::Error,
        >,
    > + Send;
}
