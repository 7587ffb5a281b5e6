//! REST API endpoints for the announcement staging area.
//!
//! The extraction collaborator posts candidate announcements here; reviewers
//! browse the queue. Nothing in this module touches authoritative auction
//! state.

use crate::ApiApplication;
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tap_core::{
    models::{ReviewStatus, StagedAuctionData, StagedAuctionRecord},
    ports::{Repository, StagingFailure, StagingRepository as _},
};
use tracing::{Level, event};

/// Creates a router with staging endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_staged::<T>).post(stage_announcement::<T>),
            |route| route.security_requirement("jwt").tag("staging"),
        )
        .api_route_with("/{staged_id}", get(get_staged::<T>), |route| {
            route.security_requirement("jwt").tag("staging")
        })
}

/// Path parameter for staged-record endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique identifier of the staged announcement
    staged_id: T,
}

/// Request body for staging an extracted announcement.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct StageAnnouncementDto<DateTime> {
    /// The extracted candidate
    data: StagedAuctionData<DateTime>,
    /// The extractor's confidence in the candidate, in [0, 1]
    confidence: f64,
}

/// Filter parameters for browsing the staging queue.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct StagedFilter {
    /// Restrict to records in this review state
    status: Option<ReviewStatus>,
    /// Substring match over tender numbers and extracted payloads
    search: Option<String>,
}

/// Hold an extracted announcement for review.
///
/// # Authorization
///
/// Requires the extraction collaborator role (`can_stage_announcements`).
///
/// # Returns
///
/// - `201 Created`: The staged record, pending review
/// - `401 Unauthorized`: Not the extraction collaborator
/// - `409 Conflict`: An active record already carries this tender number
/// - `422 Unprocessable Entity`: Confidence outside [0, 1] or unordered timetable
/// - `500 Internal Server Error`: Database operation failed
async fn stage_announcement<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<StageAnnouncementDto<<T::Repository as Repository>::DateTime>>,
) -> Result<
    (
        StatusCode,
        Json<
            StagedAuctionRecord<
                <T::Repository as Repository>::StagedId,
                <T::Repository as Repository>::DateTime,
            >,
        >,
    ),
    StatusCode,
> {
    if !app.can_stage_announcements(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    let staged_id = app.generate_staged_id();
    let staged = db
        .stage_announcement(staged_id, body.data, body.confidence, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match staged {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(StagingFailure::DuplicateTenderReference) => Err(StatusCode::CONFLICT),
        Err(StagingFailure::InvalidConfidence | StagingFailure::InvalidScheduleOrdering) => {
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(StagingFailure::DoesNotExist) => Err(StatusCode::NOT_FOUND),
    }
}

/// Browse the staging queue.
///
/// # Authorization
///
/// Requires a reviewer identity (`can_review_announcements`).
///
/// # Returns
///
/// - `200 OK`: Matching staged records, most recently extracted first
/// - `401 Unauthorized`: Not a reviewer
/// - `500 Internal Server Error`: Database query failed
async fn list_staged<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(filter): Query<StagedFilter>,
) -> Result<
    Json<
        Vec<
            StagedAuctionRecord<
                <T::Repository as Repository>::StagedId,
                <T::Repository as Repository>::DateTime,
            >,
        >,
    >,
    StatusCode,
> {
    if app.can_review_announcements(&auth).await.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.list_staged(filter.status, filter.search.as_deref())
        .await
        .map(Json)
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Retrieve a single staged record.
///
/// # Authorization
///
/// Requires a reviewer identity (`can_review_announcements`).
///
/// # Returns
///
/// - `200 OK`: The staged record
/// - `401 Unauthorized`: Not a reviewer
/// - `404 Not Found`: No such record
/// - `500 Internal Server Error`: Database query failed
async fn get_staged<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { staged_id }): Path<Id<<T::Repository as Repository>::StagedId>>,
) -> Result<
    Json<
        StagedAuctionRecord<
            <T::Repository as Repository>::StagedId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    if app.can_review_announcements(&auth).await.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.get_staged(staged_id)
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
