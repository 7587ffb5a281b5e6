use tap_core::{
    models::{
        Amount, AuctionData, AuctionMode, AuctionSchedule, Security, SecurityKind,
        StagedAuctionData,
    },
    ports::Application,
};
use tap_engine::UniformPriceEngine;
use tap_sqlite::{
    Db,
    types::{AuctionId, BidId, BidderId, DateTime, StagedId},
};

pub struct TestApp(pub Db);

impl Application for TestApp {
    type Context = ();
    type Repository = Db;
    type Allocator = UniformPriceEngine;

    fn database(&self) -> &Self::Repository {
        &self.0
    }

    fn allocator(&self) -> Self::Allocator {
        UniformPriceEngine::default()
    }

    fn now(&self) -> DateTime {
        time::OffsetDateTime::now_utc().into()
    }

    fn generate_auction_id(&self) -> AuctionId {
        uuid::Uuid::new_v4().into()
    }

    fn generate_bid_id(&self) -> BidId {
        uuid::Uuid::new_v4().into()
    }

    fn generate_staged_id(&self) -> StagedId {
        uuid::Uuid::new_v4().into()
    }

    async fn can_submit_bid(&self, _context: &Self::Context) -> Option<BidderId> {
        Some(BidderId(uuid::Uuid::new_v4()))
    }

    async fn can_view_bid(&self, _context: &Self::Context, _bidder_id: &BidderId) -> bool {
        true
    }

    async fn can_stage_announcements(&self, _context: &Self::Context) -> bool {
        true
    }

    async fn can_review_announcements(&self, _context: &Self::Context) -> Option<String> {
        Some("reviewer".into())
    }

    async fn can_manage_auctions(&self, _context: &Self::Context) -> bool {
        true
    }

    async fn can_confirm_settlement(&self, _context: &Self::Context) -> bool {
        true
    }
}

/// A 364-day bill auction with a 1000 minimum denomination.
#[allow(dead_code)]
pub fn bill_auction(code: &str, target: i64) -> AuctionData<DateTime> {
    let maturity = time::OffsetDateTime::now_utc() + time::Duration::days(364);
    AuctionData {
        code: code.into(),
        security: Security {
            code: format!("SEC-{code}"),
            kind: SecurityKind::Bill,
            tenor_days: 364,
            coupon_rate: None,
            denomination: Amount(1_000),
            maturity_date: maturity.into(),
        },
        mode: AuctionMode::Mixed,
        target_amount: Amount(target),
        min_bid: Amount(1_000),
        max_bid: None,
        max_noncompetitive: Some(Amount(200_000)),
        price_range: None,
    }
}

/// A timetable with bidding already open: opened an hour ago, closing in an
/// hour, settling in two days.
#[allow(dead_code)]
pub fn open_schedule() -> AuctionSchedule<DateTime> {
    let now = time::OffsetDateTime::now_utc();
    AuctionSchedule {
        open_at: (now - time::Duration::hours(1)).into(),
        close_at: (now + time::Duration::hours(1)).into(),
        settle_at: (now + time::Duration::days(2)).into(),
    }
}

#[allow(dead_code)]
pub fn staged_candidate(tender: &str, code: &str) -> StagedAuctionData<DateTime> {
    StagedAuctionData {
        tender_number: tender.into(),
        source: "treasury-bulletin".into(),
        auction: bill_auction(code, 1_000_000),
        schedule: open_schedule(),
        eligibility: Some("primary dealers".into()),
        notes: vec!["extracted from weekly bulletin".into()],
    }
}
