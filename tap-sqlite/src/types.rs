//! Concrete types used by the SQLite backend.

mod datetime;
mod ids;

pub use datetime::DateTime;
pub use ids::{AuctionId, BidId, BidderId, StagedId};

use tap_core::models::{
    AuctionData, AuctionRecord, AuctionResults, AuctionSchedule, AuctionStatus, BidKind, BidRecord,
    BidStatus, Confidence, ReviewStatus, StagedAuctionData, StagedAuctionRecord,
};

fn decode_err(column: &str, source: impl Into<sqlx::error::BoxDynError>) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.into(),
        source: source.into(),
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AuctionRow {
    pub id: AuctionId,
    pub data: sqlx::types::Json<AuctionData<DateTime>>,
    pub status: String,
    pub open_at: DateTime,
    pub close_at: DateTime,
    pub settle_at: DateTime,
    pub announced_at: DateTime,
    pub results: Option<sqlx::types::Json<AuctionResults<DateTime>>>,
    pub settled_at: Option<DateTime>,
    pub bid_count: i64,
    pub total_bid_amount: i64,
}

impl AuctionRow {
    pub(crate) fn into_record(self) -> Result<AuctionRecord<AuctionId, DateTime>, sqlx::Error> {
        let status = self
            .status
            .parse::<AuctionStatus>()
            .map_err(|e| decode_err("status", e))?;
        Ok(AuctionRecord {
            id: self.id,
            data: self.data.0,
            schedule: AuctionSchedule {
                open_at: self.open_at,
                close_at: self.close_at,
                settle_at: self.settle_at,
            },
            status,
            announced_at: self.announced_at,
            results: self.results.map(|r| r.0),
            settled_at: self.settled_at,
            bid_count: self.bid_count,
            total_bid_amount: tap_core::models::Amount(self.total_bid_amount),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BidRow {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    pub kind: String,
    pub quantity: i64,
    pub rate: Option<i64>,
    pub status: String,
    pub allocated: Option<i64>,
    pub submitted_at: DateTime,
}

impl BidRow {
    pub(crate) fn into_record(
        self,
    ) -> Result<BidRecord<BidId, AuctionId, BidderId, DateTime>, sqlx::Error> {
        let kind = self
            .kind
            .parse::<BidKind>()
            .map_err(|e| decode_err("kind", e))?;
        let status = self
            .status
            .parse::<BidStatus>()
            .map_err(|e| decode_err("status", e))?;
        Ok(BidRecord {
            id: self.id,
            auction_id: self.auction_id,
            bidder_id: self.bidder_id,
            kind,
            quantity: tap_core::models::Amount(self.quantity),
            rate: self.rate.map(tap_core::models::Rate),
            status,
            allocated: self.allocated.map(tap_core::models::Amount),
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct StagedRow {
    pub id: StagedId,
    pub data: sqlx::types::Json<StagedAuctionData<DateTime>>,
    pub confidence: f64,
    pub extracted_at: DateTime,
    pub status: String,
    pub reviewer: Option<String>,
    pub reviewed_at: Option<DateTime>,
    pub rejection_reason: Option<String>,
}

impl StagedRow {
    pub(crate) fn into_record(
        self,
    ) -> Result<StagedAuctionRecord<StagedId, DateTime>, sqlx::Error> {
        let status = self
            .status
            .parse::<ReviewStatus>()
            .map_err(|e| decode_err("status", e))?;
        let confidence =
            Confidence::new(self.confidence).map_err(|e| decode_err("confidence", e))?;
        Ok(StagedAuctionRecord {
            id: self.id,
            data: self.data.0,
            confidence,
            extracted_at: self.extracted_at,
            status,
            reviewer: self.reviewer,
            reviewed_at: self.reviewed_at,
            rejection_reason: self.rejection_reason,
        })
    }
}
