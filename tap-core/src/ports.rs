mod allocator;
mod app;
mod auction;
mod bid;
mod review;
mod staging;

pub use allocator::Allocator;
pub use app::Application;
pub use auction::{AllocationRunFailure, AuctionRepository, LifecycleFailure};
pub use bid::{BidFailure, BidRepository};
pub use review::{ReviewFailure, ReviewRepository};
pub use staging::{StagingFailure, StagingRepository};

use std::fmt::Debug;
use std::hash::Hash;

/// The base trait for persistence adapters.
///
/// Implementations choose their own id and timestamp representations; the
/// domain only requires that bids order totally (for deterministic
/// allocation tie-breaks) and that timestamps compare.
pub trait Repository {
    /// Infrastructure error type (connection failures, serialization, ...)
    type Error: std::error::Error + Send + Sync + 'static;
    /// Timestamp type; must totally order for schedule comparisons
    type DateTime: Clone + Ord + Send + Sync + 'static;
    /// Auction identifier
    type AuctionId: Clone + Debug + Send + Sync + 'static;
    /// Bid identifier; ordered for deterministic tie-breaking
    type BidId: Clone + Debug + Eq + Hash + Ord + Send + Sync + 'static;
    /// Staged announcement identifier
    type StagedId: Clone + Debug + Send + Sync + 'static;
    /// Bidder identifier
    type BidderId: Clone + Debug + Eq + Hash + Send + Sync + 'static;
}
