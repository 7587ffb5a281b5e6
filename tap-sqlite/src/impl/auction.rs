use crate::{
    Db,
    types::{AuctionId, AuctionRow, BidderId, DateTime},
};
use tap_core::{
    models::{
        Amount, AuctionData, AuctionRecord, AuctionResults, AuctionSchedule, AuctionStatus,
        BidKind, DateTimeRangeQuery, DateTimeRangeResponse, FrozenBid, Map, Rate,
        SettlementInstruction,
    },
    ports::{AllocationRunFailure, Allocator, AuctionRepository, LifecycleFailure},
};

const AUCTION_COLUMNS: &str = r#"
    id, data, status, open_at, close_at, settle_at, announced_at,
    results, settled_at, bid_count, total_bid_amount
"#;

impl Db {
    async fn fetch_auction(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        auction_id: AuctionId,
    ) -> Result<Option<AuctionRecord<AuctionId, DateTime>>, sqlx::Error> {
        sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            select {AUCTION_COLUMNS} from auction where id = $1
            "#
        ))
        .bind(auction_id)
        .fetch_optional(&mut **tx)
        .await?
        .map(AuctionRow::into_record)
        .transpose()
    }
}

impl AuctionRepository for Db {
    async fn create_auction(
        &self,
        auction_id: Self::AuctionId,
        data: AuctionData<Self::DateTime>,
        schedule: AuctionSchedule<Self::DateTime>,
        as_of: Self::DateTime,
    ) -> Result<
        Result<AuctionRecord<Self::AuctionId, Self::DateTime>, LifecycleFailure>,
        Self::Error,
    > {
        if !schedule.is_ordered() {
            return Ok(Err(LifecycleFailure::InvalidScheduleOrdering));
        }

        let row = sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            insert into
                auction (id, code, data, status, open_at, close_at, settle_at, announced_at)
            values
                ($1, $2, $3, 'announced', $4, $5, $6, $7)
            returning {AUCTION_COLUMNS}
            "#
        ))
        .bind(auction_id)
        .bind(data.code.clone())
        .bind(sqlx::types::Json(&data))
        .bind(schedule.open_at)
        .bind(schedule.close_at)
        .bind(schedule.settle_at)
        .bind(as_of)
        .fetch_one(&self.writer)
        .await;

        match row {
            Ok(row) => Ok(Ok(row.into_record()?)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(Err(LifecycleFailure::DuplicateAuctionCode))
            }
            Err(other) => Err(other),
        }
    }

    async fn get_auction(
        &self,
        auction_id: Self::AuctionId,
    ) -> Result<Option<AuctionRecord<Self::AuctionId, Self::DateTime>>, Self::Error> {
        sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            select {AUCTION_COLUMNS} from auction where id = $1
            "#
        ))
        .bind(auction_id)
        .fetch_optional(&self.reader)
        .await?
        .map(AuctionRow::into_record)
        .transpose()
    }

    async fn get_auction_by_code(
        &self,
        code: &str,
    ) -> Result<Option<AuctionRecord<Self::AuctionId, Self::DateTime>>, Self::Error> {
        sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            select {AUCTION_COLUMNS} from auction where code = $1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.reader)
        .await?
        .map(AuctionRow::into_record)
        .transpose()
    }

    async fn list_auctions(
        &self,
        query: DateTimeRangeQuery<Self::DateTime>,
        limit: usize,
    ) -> Result<
        DateTimeRangeResponse<AuctionRecord<Self::AuctionId, Self::DateTime>, Self::DateTime>,
        Self::Error,
    > {
        let limit_p1 = (limit + 1) as i64;
        let mut rows = sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            select {AUCTION_COLUMNS}
            from
                auction
            where
                ($1 is null or close_at < $1)
            and
                ($2 is null or close_at >= $2)
            order by
                close_at desc
            limit $3
            "#
        ))
        .bind(query.before)
        .bind(query.after)
        .bind(limit_p1)
        .fetch_all(&self.reader)
        .await?;

        let more = if rows.len() == limit + 1 {
            rows.pop();
            // The boundary must be the last row actually returned; keying it
            // off the popped row would skip that record under the strict
            // `close_at < $1` filter on the next page.
            rows.last().map(|last| DateTimeRangeQuery {
                before: Some(last.close_at),
                after: query.after,
            })
        } else {
            None
        };

        Ok(DateTimeRangeResponse {
            results: rows
                .into_iter()
                .map(AuctionRow::into_record)
                .collect::<Result<_, _>>()?,
            more,
        })
    }

    async fn open_due_auctions(
        &self,
        as_of: Self::DateTime,
    ) -> Result<Vec<Self::AuctionId>, Self::Error> {
        sqlx::query_scalar::<_, AuctionId>(
            r#"
            update
                auction
            set
                status = 'open'
            where
                status = 'announced'
                and open_at <= $1
            returning id
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.writer)
        .await
    }

    async fn close_due_auctions(
        &self,
        as_of: Self::DateTime,
    ) -> Result<Vec<Self::AuctionId>, Self::Error> {
        sqlx::query_scalar::<_, AuctionId>(
            r#"
            update
                auction
            set
                status = 'closed'
            where
                status = 'open'
                and close_at <= $1
            returning id
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.writer)
        .await
    }

    async fn force_close(
        &self,
        auction_id: Self::AuctionId,
        _as_of: Self::DateTime,
    ) -> Result<Result<bool, LifecycleFailure>, Self::Error> {
        let mut tx = self.writer.begin().await?;

        let done = sqlx::query(
            r#"
            update auction set status = 'closed' where id = $1 and status = 'open'
            "#,
        )
        .bind(auction_id)
        .execute(&mut *tx)
        .await?;

        if done.rows_affected() == 1 {
            tx.commit().await?;
            return Ok(Ok(true));
        }

        let status = sqlx::query_scalar::<_, String>(
            r#"
            select status from auction where id = $1
            "#,
        )
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await?;

        match status.as_deref() {
            None => Ok(Err(LifecycleFailure::DoesNotExist)),
            Some("announced") => Ok(Err(LifecycleFailure::InvalidStateTransition {
                from: AuctionStatus::Announced,
                to: AuctionStatus::Closed,
            })),
            // Already at or past closed; redundant invocation is success.
            Some(_) => Ok(Ok(false)),
        }
    }

    async fn run_allocation<A>(
        &self,
        auction_id: Self::AuctionId,
        allocator: A,
        as_of: Self::DateTime,
    ) -> Result<Result<AuctionResults<Self::DateTime>, AllocationRunFailure<A::Error>>, Self::Error>
    where
        A: Allocator<Self::BidId, Self::DateTime> + Send,
    {
        let mut tx = self.writer.begin().await?;

        let Some(auction) = Self::fetch_auction(&mut tx, auction_id).await? else {
            return Ok(Err(AllocationRunFailure::Lifecycle(
                LifecycleFailure::DoesNotExist,
            )));
        };

        match auction.status {
            AuctionStatus::Closed => {}
            AuctionStatus::ResultsPublished | AuctionStatus::Settled => {
                return Ok(Err(AllocationRunFailure::Lifecycle(
                    LifecycleFailure::ResultsAlreadyPublished,
                )));
            }
            from => {
                return Ok(Err(AllocationRunFailure::Lifecycle(
                    LifecycleFailure::InvalidStateTransition {
                        from,
                        to: AuctionStatus::ResultsPublished,
                    },
                )));
            }
        }

        #[derive(sqlx::FromRow)]
        struct FrozenRow {
            id: crate::types::BidId,
            kind: String,
            quantity: i64,
            rate: Option<i64>,
            submitted_at: DateTime,
        }

        let bids = sqlx::query_as::<_, FrozenRow>(
            r#"
            select
                id, kind, quantity, rate, submitted_at
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
        .fetch_all(&mut *tx)
        .await?;

        let bids = bids
            .into_iter()
            .map(|row| {
                Ok(FrozenBid {
                    id: row.id,
                    kind: row
                        .kind
                        .parse::<BidKind>()
                        .map_err(|e| sqlx::Error::ColumnDecode {
                            index: "kind".into(),
                            source: e.into(),
                        })?,
                    quantity: Amount(row.quantity),
                    rate: row.rate.map(Rate),
                    submitted_at: row.submitted_at,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let terms = auction.data.allocation_terms();
        let outcome = match allocator.allocate(&terms, bids) {
            Ok(outcome) => outcome,
            // Nothing written yet; the auction stays closed for a retry.
            Err(e) => return Ok(Err(AllocationRunFailure::Engine(e))),
        };

        for (bid_id, verdict) in &outcome.allocations {
            sqlx::query(
                r#"
                update bid set status = $2, allocated = $3 where id = $1
                "#,
            )
            .bind(*bid_id)
            .bind(verdict.status.as_str())
            .bind(verdict.allocated.0)
            .execute(&mut *tx)
            .await?;
        }

        let results = AuctionResults {
            marginal_yield: outcome.summary.marginal_yield,
            marginal_price: outcome.summary.marginal_price,
            average_yield: outcome.summary.average_yield,
            total_bids: outcome.summary.total_bids,
            total_accepted: outcome.summary.total_accepted,
            bid_to_cover: outcome.summary.bid_to_cover,
            published_at: as_of,
        };

        let published = sqlx::query(
            r#"
            update
                auction
            set
                status = 'results_published',
                results = $2
            where
                id = $1
                and status = 'closed'
            "#,
        )
        .bind(auction_id)
        .bind(sqlx::types::Json(&results))
        .execute(&mut *tx)
        .await?;

        if published.rows_affected() == 0 {
            return Ok(Err(AllocationRunFailure::Lifecycle(
                LifecycleFailure::ResultsAlreadyPublished,
            )));
        }

        tx.commit().await?;
        Ok(Ok(results))
    }

    async fn confirm_settlement(
        &self,
        auction_id: Self::AuctionId,
        settlement_date: Self::DateTime,
        _as_of: Self::DateTime,
    ) -> Result<
        Result<AuctionRecord<Self::AuctionId, Self::DateTime>, LifecycleFailure>,
        Self::Error,
    > {
        let mut tx = self.writer.begin().await?;

        let Some(auction) = Self::fetch_auction(&mut tx, auction_id).await? else {
            return Ok(Err(LifecycleFailure::DoesNotExist));
        };

        if auction.status != AuctionStatus::ResultsPublished {
            return Ok(Err(LifecycleFailure::InvalidStateTransition {
                from: auction.status,
                to: AuctionStatus::Settled,
            }));
        }

        if settlement_date < auction.schedule.close_at {
            return Ok(Err(LifecycleFailure::SettlementDateMismatch));
        }

        let row = sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            update
                auction
            set
                status = 'settled',
                settled_at = $2
            where
                id = $1
                and status = 'results_published'
            returning {AUCTION_COLUMNS}
            "#
        ))
        .bind(auction_id)
        .bind(settlement_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Ok(row.into_record()?))
    }

    async fn settlement_instructions(
        &self,
        auction_id: Self::AuctionId,
    ) -> Result<Option<SettlementInstruction<Self::BidderId, Self::DateTime>>, Self::Error> {
        let Some(auction) = sqlx::query_as::<_, AuctionRow>(&format!(
            r#"
            select {AUCTION_COLUMNS} from auction where id = $1
            "#
        ))
        .bind(auction_id)
        .fetch_optional(&self.reader)
        .await?
        .map(AuctionRow::into_record)
        .transpose()?
        else {
            return Ok(None);
        };

        if auction.results.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, (BidderId, i64)>(
            r#"
            select
                bidder_id, sum(allocated)
            from
                bid
            where
                auction_id = $1
                and allocated > 0
            group by
                bidder_id
            order by
                min(submitted_at)
            "#,
        )
        .bind(auction_id)
        .fetch_all(&self.reader)
        .await?;

        Ok(Some(SettlementInstruction {
            auction_code: auction.data.code,
            settlement_date: auction.settled_at.unwrap_or(auction.schedule.settle_at),
            allocations: rows
                .into_iter()
                .map(|(bidder, total)| (bidder, Amount(total)))
                .collect::<Map<_, _>>(),
        }))
    }
}
