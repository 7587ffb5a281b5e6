use super::Allocator;
use crate::models::{
    AuctionData, AuctionRecord, AuctionResults, AuctionSchedule, AuctionStatus, DateTimeRangeQuery,
    DateTimeRangeResponse, SettlementInstruction,
};
use thiserror::Error;

/// The ways a lifecycle operation can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleFailure {
    /// The referenced auction does not exist
    #[error("does not exist")]
    DoesNotExist,
    /// The timetable does not run strictly forward
    #[error("schedule must order open < close < settlement")]
    InvalidScheduleOrdering,
    /// The auction code is already taken
    #[error("auction code already exists")]
    DuplicateAuctionCode,
    /// The requested transition has no edge from the current state
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// The auction's current status
        from: AuctionStatus,
        /// The requested status
        to: AuctionStatus,
    },
    /// Results are written exactly once
    #[error("results already published")]
    ResultsAlreadyPublished,
    /// The confirmed settlement date precedes the bidding close
    #[error("settlement date precedes bidding close")]
    SettlementDateMismatch,
}

/// How an allocation run can fail: either the auction was not in a state to
/// allocate, or the engine itself faulted. An engine fault discards all
/// intermediate state and leaves the auction `Closed` for a retry.
#[derive(Debug, Error)]
pub enum AllocationRunFailure<E: std::error::Error> {
    /// The auction is not in the `Closed` state
    #[error(transparent)]
    Lifecycle(LifecycleFailure),
    /// The engine rejected the computation
    #[error("allocation engine failure: {0}")]
    Engine(E),
}

/// Repository interface for the auction lifecycle state machine.
///
/// Time-based transitions are idempotent so a scheduler double-tick is
/// harmless; every one-shot transition is a compare-and-set at the store
/// layer, since the service is horizontally replicated.
pub trait AuctionRepository: super::BidRepository {
    /// Create an auction in the `Announced` state (direct admin entry).
    ///
    /// The schedule ordering is validated here, never at transition time.
    fn create_auction(
        &self,
        auction_id: Self::AuctionId,
        data: AuctionData<Self::DateTime>,
        schedule: AuctionSchedule<Self::DateTime>,
        as_of: Self::DateTime,
    ) -> impl Future<
        Output = Result<
            Result<AuctionRecord<Self::AuctionId, Self::DateTime>, LifecycleFailure>,
            Self::Error,
        >,
    > + Send;

    /// Look up an auction by id.
    fn get_auction(
        &self,
        auction_id: Self::AuctionId,
    ) -> impl Future<
        Output = Result<Option<AuctionRecord<Self::AuctionId, Self::DateTime>>, Self::Error>,
    > + Send;

    /// Look up an auction by its code, for indefinite results audit.
    fn get_auction_by_code(
        &self,
        code: &str,
    ) -> impl Future<
        Output = Result<Option<AuctionRecord<Self::AuctionId, Self::DateTime>>, Self::Error>,
    > + Send;

    /// Page through auctions by closing time, most recent first.
    fn list_auctions(
        &self,
        query: DateTimeRangeQuery<Self::DateTime>,
        limit: usize,
    ) -> impl Future<
        Output = Result<
            DateTimeRangeResponse<AuctionRecord<Self::AuctionId, Self::DateTime>, Self::DateTime>,
            Self::Error,
        >,
    > + Send;

    /// `Announced → Open` for every auction whose open time has passed.
    ///
    /// Idempotent: re-invoking after the transition is a no-op. Returns
    /// the ids that transitioned on this call.
    fn open_due_auctions(
        &self,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Vec<Self::AuctionId>, Self::Error>> + Send;

    /// `Open → Closed` for every auction whose close time has passed.
    ///
    /// Idempotent; returns the ids that transitioned on this call, which the
    /// caller is expected to feed to [`run_allocation`](Self::run_allocation).
    /// From this point the bid ledger is frozen.
    fn close_due_auctions(
        &self,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Vec<Self::AuctionId>, Self::Error>> + Send;

    /// Explicit administrative `Open → Closed`.
    ///
    /// Returns `Ok(true)` if this call performed the transition, `Ok(false)`
    /// if the auction was already at or past `Closed` (redundant invocation
    /// is success, not an error). Closing from `Announced` is an
    /// [`LifecycleFailure::InvalidStateTransition`].
    fn force_close(
        &self,
        auction_id: Self::AuctionId,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<bool, LifecycleFailure>, Self::Error>> + Send;

    /// Run the allocation engine over the frozen bid set and publish results.
    ///
    /// In one transaction: verify the auction is `Closed`, hand the frozen
    /// non-cancelled bids to `allocator`, persist the per-bid outcomes and
    /// the results value, and transition `Closed → ResultsPublished`.
    /// A second invocation observes the auction is no longer `Closed` and
    /// fails with [`LifecycleFailure::ResultsAlreadyPublished`] without
    /// recomputing; the scheduler treats that as a benign no-op.
    fn run_allocation<A>(
        &self,
        auction_id: Self::AuctionId,
        allocator: A,
        as_of: Self::DateTime,
    ) -> impl Future<
        Output = Result<
            Result<AuctionResults<Self::DateTime>, AllocationRunFailure<A::Error>>,
            Self::Error,
        >,
    > + Send
    where
        A: Allocator<Self::BidId, Self::DateTime> + Send;

    /// `ResultsPublished → Settled`, triggered by the CSD confirmation.
    ///
    /// Fails with [`LifecycleFailure::SettlementDateMismatch`] if the
    /// confirmed date precedes the bidding close.
    fn confirm_settlement(
        &self,
        auction_id: Self::AuctionId,
        settlement_date: Self::DateTime,
        as_of: Self::DateTime,
    ) -> impl Future<
        Output = Result<
            Result<AuctionRecord<Self::AuctionId, Self::DateTime>, LifecycleFailure>,
            Self::Error,
        >,
    > + Send;

    /// The per-bidder allocation export for the settlement collaborator.
    ///
    /// `None` until results are published.
    fn settlement_instructions(
        &self,
        auction_id: Self::AuctionId,
    ) -> impl Future<
        Output = Result<
            Option<SettlementInstruction<Self::BidderId, Self::DateTime>>,
            Self::Error,
        >,
    > + Send;
}
