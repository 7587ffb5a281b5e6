use thiserror::Error;

/// The ways a review decision can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReviewFailure {
    /// The referenced staged record does not exist
    #[error("does not exist")]
    DoesNotExist,
    /// The record has already been decided
    #[error("record is not pending review")]
    NotPendingReview,
    /// A rejection requires a non-empty reason
    #[error("rejection requires a reason")]
    MissingReason,
}

/// Repository interface for the review workflow.
///
/// Approval is the only path by which a staged announcement produces an
/// auction; both decisions are one-way and exclusive, so a concurrent
/// double-approval yields exactly one auction and the loser observes
/// [`ReviewFailure::NotPendingReview`].
pub trait ReviewRepository: super::AuctionRepository + super::StagingRepository {
    /// Promote a pending candidate into an `Announced` auction.
    ///
    /// Atomically marks the staged record `Approved` (with reviewer and
    /// timestamp) and creates the auction from the staged terms. Returns the
    /// new auction's id.
    fn approve_staged(
        &self,
        staged_id: Self::StagedId,
        auction_id: Self::AuctionId,
        reviewer: &str,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<Self::AuctionId, ReviewFailure>, Self::Error>> + Send;

    /// Discard a pending candidate, retaining it for audit.
    ///
    /// An empty (or all-whitespace) reason fails with
    /// [`ReviewFailure::MissingReason`] before any state is touched.
    fn reject_staged(
        &self,
        staged_id: Self::StagedId,
        reviewer: &str,
        reason: &str,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<(), ReviewFailure>, Self::Error>> + Send;
}
