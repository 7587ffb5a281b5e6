mod allocation;
mod amount;
mod auction;
mod bid;
mod datetime;
mod map;
mod security;
mod staged;

pub use allocation::{
    AllocationOutcome, AllocationSummary, AllocationTerms, BidOutcome, FrozenBid,
    SettlementInstruction,
};
pub use amount::{Amount, Price, Rate};
pub use auction::{
    AuctionData, AuctionMode, AuctionRecord, AuctionResults, AuctionSchedule, AuctionStatus,
    PriceRange,
};
pub use bid::{BidKind, BidRecord, BidStatus, BidSubmission};
pub use datetime::{DateTimeRangeQuery, DateTimeRangeResponse};
pub use map::Map;
pub use security::{Security, SecurityKind};
pub use staged::{Confidence, InvalidConfidence, ReviewStatus, StagedAuctionData, StagedAuctionRecord};
