use super::{Allocator, Repository, ReviewRepository};

/// The composition root of a running service.
///
/// An application binds a repository implementation to an allocation engine
/// and an authorization context (e.g. verified JWT claims). Route handlers
/// and the scheduler only ever talk to this trait, which keeps the HTTP
/// layer free of any policy decisions of its own.
pub trait Application: Send + Sync {
    /// The authorization context extracted from a request
    type Context: Send + Sync;

    /// The persistence adapter
    type Repository: ReviewRepository;

    /// The allocation engine
    type Allocator: Allocator<
            <Self::Repository as Repository>::BidId,
            <Self::Repository as Repository>::DateTime,
        > + Send;

    /// Access the repository.
    fn database(&self) -> &Self::Repository;

    /// A fresh engine instance for one allocation run.
    fn allocator(&self) -> Self::Allocator;

    /// The current time, in the repository's representation.
    fn now(&self) -> <Self::Repository as Repository>::DateTime;

    /// Mint an auction id.
    fn generate_auction_id(&self) -> <Self::Repository as Repository>::AuctionId;

    /// Mint a bid id.
    fn generate_bid_id(&self) -> <Self::Repository as Repository>::BidId;

    /// Mint a staged announcement id.
    fn generate_staged_id(&self) -> <Self::Repository as Repository>::StagedId;

    /// If the context may submit bids, the bidder it acts for.
    fn can_submit_bid(
        &self,
        context: &Self::Context,
    ) -> impl Future<Output = Option<<Self::Repository as Repository>::BidderId>> + Send;

    /// Whether the context may view bids belonging to `bidder_id`.
    fn can_view_bid(
        &self,
        context: &Self::Context,
        bidder_id: &<Self::Repository as Repository>::BidderId,
    ) -> impl Future<Output = bool> + Send;

    /// Whether the context is the extraction collaborator.
    fn can_stage_announcements(&self, context: &Self::Context)
    -> impl Future<Output = bool> + Send;

    /// If the context may review announcements, the reviewer identity to
    /// record on decisions.
    fn can_review_announcements(
        &self,
        context: &Self::Context,
    ) -> impl Future<Output = Option<String>> + Send;

    /// Whether the context may create, close, and inspect auctions.
    fn can_manage_auctions(&self, context: &Self::Context) -> impl Future<Output = bool> + Send;

    /// Whether the context is the settlement collaborator.
    fn can_confirm_settlement(&self, context: &Self::Context)
    -> impl Future<Output = bool> + Send;
}
