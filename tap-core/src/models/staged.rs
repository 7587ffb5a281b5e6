use super::{AuctionData, AuctionSchedule};
use thiserror::Error;

/// The review state of a staged announcement.
///
/// `PendingReview` is the only non-terminal state: approval and rejection
/// are one-way and a record can never take both edges.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    /// Awaiting a reviewer decision
    PendingReview,
    /// Promoted into an auction
    Approved,
    /// Discarded, retained for audit
    Rejected,
}

impl ReviewStatus {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::PendingReview => "pending_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_review" => Ok(ReviewStatus::PendingReview),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// A confidence score outside the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("confidence score {0} outside [0, 1]")]
pub struct InvalidConfidence(pub f64);

/// An extraction confidence score, guaranteed to lie in [0, 1].
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema), schemars(inline))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Validate a raw score.
    pub fn new(score: f64) -> Result<Self, InvalidConfidence> {
        if score.is_finite() && (0.0..=1.0).contains(&score) {
            Ok(Self(score))
        } else {
            Err(InvalidConfidence(score))
        }
    }

    /// The underlying score.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = InvalidConfidence;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> f64 {
        value.0
    }
}

/// A candidate auction extracted from an external announcement source.
///
/// The descriptive fields mirror [`AuctionData`]; loose extraction output
/// (free-text notes, optional eligibility metadata) is kept alongside the
/// validated values. Malformed payloads are rejected at the staging
/// boundary rather than propagated into allocation logic.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct StagedAuctionData<DateTime> {
    /// The source's tender reference number
    pub tender_number: String,
    /// Identifier of the extraction source
    pub source: String,
    /// The proposed auction terms
    pub auction: AuctionData<DateTime>,
    /// The proposed timetable
    pub schedule: AuctionSchedule<DateTime>,
    /// Eligibility metadata, as extracted
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub eligibility: Option<String>,
    /// Free-text notes from the announcement
    #[cfg_attr(feature = "serde", serde(default))]
    pub notes: Vec<String>,
}

/// A stored staged announcement.
///
/// Mutated only by the review workflow; approval spawns exactly one auction
/// and the record is never touched again.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct StagedAuctionRecord<StagedId, DateTime> {
    /// The staged record's unique id
    pub id: StagedId,
    /// The extracted candidate
    pub data: StagedAuctionData<DateTime>,
    /// The extractor's confidence in the candidate
    pub confidence: Confidence,
    /// When the candidate was extracted
    pub extracted_at: DateTime,
    /// Review state
    pub status: ReviewStatus,
    /// Who decided, once reviewed
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub reviewer: Option<String>,
    /// When the decision was made
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub reviewed_at: Option<DateTime>,
    /// Why the candidate was rejected; present iff rejected
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rejection_reason: Option<String>,
}
