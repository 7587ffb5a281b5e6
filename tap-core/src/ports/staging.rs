use super::Repository;
use crate::models::{ReviewStatus, StagedAuctionData, StagedAuctionRecord};
use thiserror::Error;

/// The ways staging an announcement can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StagingFailure {
    /// The referenced staged record does not exist
    #[error("does not exist")]
    DoesNotExist,
    /// The confidence score is outside [0, 1]
    #[error("confidence score outside [0, 1]")]
    InvalidConfidence,
    /// An active (pending or approved) record already carries this tender number
    #[error("duplicate tender reference")]
    DuplicateTenderReference,
    /// The extracted timetable does not run strictly forward
    #[error("schedule must order open < close < settlement")]
    InvalidScheduleOrdering,
}

/// Repository interface for the announcement staging area.
///
/// Candidates arrive from the external extraction collaborator and are held
/// for human review; nothing here mutates authoritative auction state.
pub trait StagingRepository: Repository {
    /// Hold an extracted candidate for review.
    ///
    /// Malformed payloads are rejected at this boundary: the confidence
    /// score must lie in [0, 1] and the extracted timetable must be ordered.
    /// A second active record with the same tender number fails with
    /// [`StagingFailure::DuplicateTenderReference`].
    fn stage_announcement(
        &self,
        staged_id: Self::StagedId,
        data: StagedAuctionData<Self::DateTime>,
        confidence: f64,
        as_of: Self::DateTime,
    ) -> impl Future<
        Output = Result<
            Result<StagedAuctionRecord<Self::StagedId, Self::DateTime>, StagingFailure>,
            Self::Error,
        >,
    > + Send;

    /// Look up a staged record.
    fn get_staged(
        &self,
        staged_id: Self::StagedId,
    ) -> impl Future<
        Output = Result<Option<StagedAuctionRecord<Self::StagedId, Self::DateTime>>, Self::Error>,
    > + Send;

    /// The staged records matching an optional status and search text,
    /// most recently extracted first. Read-only.
    fn list_staged(
        &self,
        status: Option<ReviewStatus>,
        search: Option<&str>,
    ) -> impl Future<
        Output = Result<Vec<StagedAuctionRecord<Self::StagedId, Self::DateTime>>, Self::Error>,
    > + Send;
}
