use crate::Db;
use tap_core::ports::{ReviewFailure, ReviewRepository};

impl ReviewRepository for Db {
    async fn approve_staged(
        &self,
        staged_id: Self::StagedId,
        auction_id: Self::AuctionId,
        reviewer: &str,
        as_of: Self::DateTime,
    ) -> Result<Result<Self::AuctionId, ReviewFailure>, Self::Error> {
        let mut tx = self.writer.begin().await?;

        let staged = sqlx::query_as::<_, crate::types::StagedRow>(
            r#"
            select
                id, data, confidence, extracted_at, status,
                reviewer, reviewed_at, rejection_reason
            from
                staged_auction
            where
                id = $1
            "#,
        )
        .bind(staged_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(staged) = staged else {
            return Ok(Err(ReviewFailure::DoesNotExist));
        };
        let staged = staged.into_record()?;

        // Compare-and-set: under a concurrent double-decision exactly one
        // caller takes this row, the other observes NotPendingReview.
        let decided = sqlx::query(
            r#"
            update
                staged_auction
            set
                status = 'approved',
                reviewer = $2,
                reviewed_at = $3
            where
                id = $1
                and status = 'pending_review'
            "#,
        )
        .bind(staged_id)
        .bind(reviewer)
        .bind(as_of)
        .execute(&mut *tx)
        .await?;

        if decided.rows_affected() == 0 {
            return Ok(Err(ReviewFailure::NotPendingReview));
        }

        sqlx::query(
            r#"
            insert into
                auction (id, code, data, status, open_at, close_at, settle_at, announced_at)
            values
                ($1, $2, $3, 'announced', $4, $5, $6, $7)
            "#,
        )
        .bind(auction_id)
        .bind(staged.data.auction.code.clone())
        .bind(sqlx::types::Json(&staged.data.auction))
        .bind(staged.data.schedule.open_at)
        .bind(staged.data.schedule.close_at)
        .bind(staged.data.schedule.settle_at)
        .bind(as_of)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Ok(auction_id))
    }

    async fn reject_staged(
        &self,
        staged_id: Self::StagedId,
        reviewer: &str,
        reason: &str,
        as_of: Self::DateTime,
    ) -> Result<Result<(), ReviewFailure>, Self::Error> {
        if reason.trim().is_empty() {
            return Ok(Err(ReviewFailure::MissingReason));
        }

        let mut tx = self.writer.begin().await?;

        let decided = sqlx::query(
            r#"
            update
                staged_auction
            set
                status = 'rejected',
                reviewer = $2,
                reviewed_at = $3,
                rejection_reason = $4
            where
                id = $1
                and status = 'pending_review'
            "#,
        )
        .bind(staged_id)
        .bind(reviewer)
        .bind(as_of)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        if decided.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, i64>(
                r#"
                select count(*) from staged_auction where id = $1
                "#,
            )
            .bind(staged_id)
            .fetch_one(&mut *tx)
            .await?;
            return if exists == 0 {
                Ok(Err(ReviewFailure::DoesNotExist))
            } else {
                Ok(Err(ReviewFailure::NotPendingReview))
            };
        }

        tx.commit().await?;
        Ok(Ok(()))
    }
}
