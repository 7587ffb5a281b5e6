use crate::{
    Db,
    types::{AuctionId, BidId, BidderId, DateTime, StagedId},
};
use tap_core::ports::Repository;

mod auction;
mod bid;
mod review;
mod staging;

impl Repository for Db {
    type Error = sqlx::Error;
    type DateTime = DateTime;
    type AuctionId = AuctionId;
    type BidId = BidId;
    type StagedId = StagedId;
    type BidderId = BidderId;
}
