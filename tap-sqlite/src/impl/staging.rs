use crate::{Db, types::StagedRow};
use tap_core::{
    models::{Confidence, ReviewStatus, StagedAuctionData, StagedAuctionRecord},
    ports::{StagingFailure, StagingRepository},
};

impl StagingRepository for Db {
    async fn stage_announcement(
        &self,
        staged_id: Self::StagedId,
        data: StagedAuctionData<Self::DateTime>,
        confidence: f64,
        as_of: Self::DateTime,
    ) -> Result<
        Result<StagedAuctionRecord<Self::StagedId, Self::DateTime>, StagingFailure>,
        Self::Error,
    > {
        // Malformed extractions never make it into the review queue.
        if Confidence::new(confidence).is_err() {
            return Ok(Err(StagingFailure::InvalidConfidence));
        }
        if !data.schedule.is_ordered() {
            return Ok(Err(StagingFailure::InvalidScheduleOrdering));
        }

        let row = sqlx::query_as::<_, StagedRow>(
            r#"
            insert into
                staged_auction (id, tender_number, data, confidence, extracted_at, status)
            values
                ($1, $2, $3, $4, $5, 'pending_review')
            returning
                id, data, confidence, extracted_at, status,
                reviewer, reviewed_at, rejection_reason
            "#,
        )
        .bind(staged_id)
        .bind(data.tender_number.clone())
        .bind(sqlx::types::Json(&data))
        .bind(confidence)
        .bind(as_of)
        .fetch_one(&self.writer)
        .await;

        match row {
            Ok(row) => Ok(Ok(row.into_record()?)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(Err(StagingFailure::DuplicateTenderReference))
            }
            Err(other) => Err(other),
        }
    }

    async fn get_staged(
        &self,
        staged_id: Self::StagedId,
    ) -> Result<Option<StagedAuctionRecord<Self::StagedId, Self::DateTime>>, Self::Error> {
        sqlx::query_as::<_, StagedRow>(
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
        .fetch_optional(&self.reader)
        .await?
        .map(StagedRow::into_record)
        .transpose()
    }

    async fn list_staged(
        &self,
        status: Option<ReviewStatus>,
        search: Option<&str>,
    ) -> Result<Vec<StagedAuctionRecord<Self::StagedId, Self::DateTime>>, Self::Error> {
        let pattern = search.map(|s| format!("%{s}%"));
        sqlx::query_as::<_, StagedRow>(
            r#"
            select
                id, data, confidence, extracted_at, status,
                reviewer, reviewed_at, rejection_reason
            from
                staged_auction
            where
                ($1 is null or status = $1)
            and
                ($2 is null or tender_number like $2 or data like $2)
            order by
                extracted_at desc
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(pattern)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(StagedRow::into_record)
        .collect()
    }
}
