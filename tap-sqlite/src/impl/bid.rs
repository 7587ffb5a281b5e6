use crate::{
    Db,
    types::{AuctionRow, BidRow},
};
use tap_core::{
    models::{AuctionMode, AuctionStatus, BidKind, BidRecord, BidSubmission},
    ports::{BidFailure, BidRepository},
};

impl BidRepository for Db {
    async fn submit_bid(
        &self,
        bid_id: Self::BidId,
        bidder_id: Self::BidderId,
        submission: BidSubmission<Self::AuctionId>,
        as_of: Self::DateTime,
    ) -> Result<
        Result<BidRecord<Self::BidId, Self::AuctionId, Self::BidderId, Self::DateTime>, BidFailure>,
        Self::Error,
    > {
        let mut tx = self.writer.begin().await?;

        // The status read and the bid insert share this transaction, so a
        // concurrent close cannot slip a bid past the freeze.
        let auction = sqlx::query_as::<_, AuctionRow>(
            r#"
            select
                id, data, status, open_at, close_at, settle_at, announced_at,
                results, settled_at, bid_count, total_bid_amount
            from
                auction
            where
                id = $1
            "#,
        )
        .bind(submission.auction_id.clone())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(auction) = auction else {
            return Ok(Err(BidFailure::DoesNotExist));
        };
        let auction = auction.into_record()?;

        if auction.status != AuctionStatus::Open {
            return Ok(Err(BidFailure::AuctionNotOpen));
        }

        let admitted = match auction.data.mode {
            AuctionMode::Competitive => submission.kind == BidKind::Competitive,
            AuctionMode::NonCompetitive => submission.kind == BidKind::NonCompetitive,
            AuctionMode::Mixed => true,
        };
        if !admitted {
            return Ok(Err(BidFailure::KindNotAllowed));
        }

        if submission.kind == BidKind::Competitive && submission.rate.is_none() {
            return Ok(Err(BidFailure::MissingPrice));
        }

        let quantity = submission.quantity;
        let mut valid = quantity >= auction.data.min_bid
            && quantity.is_multiple_of(auction.data.security.denomination);
        if let Some(max_bid) = auction.data.max_bid {
            valid = valid && quantity <= max_bid;
        }
        if submission.kind == BidKind::NonCompetitive {
            if let Some(ceiling) = auction.data.max_noncompetitive {
                valid = valid && quantity <= ceiling;
            }
        }
        if !valid {
            return Ok(Err(BidFailure::InvalidBidAmount { quantity }));
        }

        let row = sqlx::query_as::<_, BidRow>(
            r#"
            insert into
                bid (id, auction_id, bidder_id, kind, quantity, rate, status, submitted_at)
            values
                ($1, $2, $3, $4, $5, $6, 'submitted', $7)
            returning
                id, auction_id, bidder_id, kind, quantity, rate, status, allocated, submitted_at
            "#,
        )
        .bind(bid_id)
        .bind(submission.auction_id)
        .bind(bidder_id)
        .bind(submission.kind.as_str())
        .bind(quantity.0)
        .bind(submission.rate.map(|r| r.0))
        .bind(as_of)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            update
                auction
            set
                bid_count = bid_count + 1,
                total_bid_amount = total_bid_amount + $2
            where
                id = $1
            "#,
        )
        .bind(auction.id)
        .bind(quantity.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Ok(row.into_record()?))
    }

    async fn cancel_bid(
        &self,
        bid_id: Self::BidId,
        _as_of: Self::DateTime,
    ) -> Result<Result<(), BidFailure>, Self::Error> {
        let mut tx = self.writer.begin().await?;

        let bid = sqlx::query_as::<_, BidRow>(
            r#"
            select
                id, auction_id, bidder_id, kind, quantity, rate, status, allocated, submitted_at
            from
                bid
            where
                id = $1
            "#,
        )
        .bind(bid_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(bid) = bid else {
            return Ok(Err(BidFailure::DoesNotExist));
        };
        let bid = bid.into_record()?;

        // Re-cancelling is a no-op, not an error.
        if bid.status == tap_core::models::BidStatus::Cancelled {
            return Ok(Ok(()));
        }

        let status = sqlx::query_scalar::<_, String>(
            r#"
            select status from auction where id = $1
            "#,
        )
        .bind(bid.auction_id.clone())
        .fetch_one(&mut *tx)
        .await?;
        if status != AuctionStatus::Open.as_str() {
            return Ok(Err(BidFailure::AuctionNotOpen));
        }

        sqlx::query(
            r#"
            update bid set status = 'cancelled' where id = $1
            "#,
        )
        .bind(bid.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            update
                auction
            set
                bid_count = bid_count - 1,
                total_bid_amount = total_bid_amount - $2
            where
                id = $1
            "#,
        )
        .bind(bid.auction_id)
        .bind(bid.quantity.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Ok(()))
    }

    async fn get_bid(
        &self,
        bid_id: Self::BidId,
    ) -> Result<
        Option<BidRecord<Self::BidId, Self::AuctionId, Self::BidderId, Self::DateTime>>,
        Self::Error,
    > {
        sqlx::query_as::<_, BidRow>(
            r#"
            select
                id, auction_id, bidder_id, kind, quantity, rate, status, allocated, submitted_at
            from
                bid
            where
                id = $1
            "#,
        )
        .bind(bid_id)
        .fetch_optional(&self.reader)
        .await?
        .map(BidRow::into_record)
        .transpose()
    }

    async fn list_bids(
        &self,
        auction_id: Self::AuctionId,
    ) -> Result<
        Vec<BidRecord<Self::BidId, Self::AuctionId, Self::BidderId, Self::DateTime>>,
        Self::Error,
    > {
        sqlx::query_as::<_, BidRow>(
            r#"
            select
                id, auction_id, bidder_id, kind, quantity, rate, status, allocated, submitted_at
            from
                bid
            where
                auction_id = $1
                and status != 'cancelled'
            order by
                submitted_at, id
            "#,
        )
        .bind(auction_id)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(BidRow::into_record)
        .collect()
    }
}
