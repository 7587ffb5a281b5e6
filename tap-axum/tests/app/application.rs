use super::Permissions;
use headers::{Authorization, authorization::Bearer};
use tap_core::ports::Application;
use tap_engine::UniformPriceEngine;
use tap_sqlite::{
    Db,
    types::{AuctionId, BidId, BidderId, DateTime, StagedId},
};

#[derive(Clone)]
pub struct TestApp(pub Db);

impl TestApp {
    // We stuff plain-text declarations of the permissions in the token.
    fn permissions(&self, context: &Authorization<Bearer>) -> Option<Permissions> {
        context.0.token().parse().ok()
    }
}

impl Application for TestApp {
    type Context = Authorization<Bearer>;
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

    async fn can_submit_bid(&self, context: &Self::Context) -> Option<BidderId> {
        self.permissions(context).and_then(|p| p.bidder_id)
    }

    async fn can_view_bid(&self, context: &Self::Context, bidder_id: &BidderId) -> bool {
        self.permissions(context)
            .map(|p| p.admin || p.bidder_id.as_ref() == Some(bidder_id))
            .unwrap_or(false)
    }

    async fn can_stage_announcements(&self, context: &Self::Context) -> bool {
        self.permissions(context).map(|p| p.extractor).unwrap_or(false)
    }

    async fn can_review_announcements(&self, context: &Self::Context) -> Option<String> {
        self.permissions(context).and_then(|p| p.reviewer)
    }

    async fn can_manage_auctions(&self, context: &Self::Context) -> bool {
        self.permissions(context).map(|p| p.admin).unwrap_or(false)
    }

    async fn can_confirm_settlement(&self, context: &Self::Context) -> bool {
        self.permissions(context).map(|p| p.settlement).unwrap_or(false)
    }
}
