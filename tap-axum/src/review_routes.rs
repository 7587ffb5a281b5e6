//! REST API endpoints for review decisions over staged announcements.
//!
//! Approval is the only path from the staging area into the auction
//! lifecycle; both decisions are one-way.

use crate::ApiApplication;
use aide::axum::{ApiRouter, routing::post};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tap_core::ports::{Repository, ReviewFailure, ReviewRepository as _};
use tracing::{Level, event};

/// Creates a router with review endpoints, merged into the staging router.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/{staged_id}/approve",
            post(approve_staged::<T>),
            |route| route.security_requirement("jwt").tag("review"),
        )
        .api_route_with("/{staged_id}/reject", post(reject_staged::<T>), |route| {
            route.security_requirement("jwt").tag("review")
        })
}

/// Path parameter for review endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique identifier of the staged announcement
    staged_id: T,
}

/// Response body for a successful approval.
#[derive(serde::Serialize, schemars::JsonSchema)]
#[schemars(inline)]
struct ApprovalResponse<T> {
    /// The id of the auction created from the staged terms
    auction_id: T,
}

/// Request body for a rejection.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct RejectionDto {
    /// Why the candidate is being discarded; must be non-empty
    reason: String,
}

/// Promote a pending candidate into an announced auction.
///
/// # Authorization
///
/// Requires a reviewer identity (`can_review_announcements`); the identity
/// is recorded on the decision.
///
/// # Returns
///
/// - `201 Created`: The id of the newly announced auction
/// - `401 Unauthorized`: Not a reviewer
/// - `404 Not Found`: No such staged record
/// - `409 Conflict`: The record has already been decided
/// - `500 Internal Server Error`: Database operation failed
async fn approve_staged<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { staged_id }): Path<Id<<T::Repository as Repository>::StagedId>>,
) -> Result<
    (
        StatusCode,
        Json<ApprovalResponse<<T::Repository as Repository>::AuctionId>>,
    ),
    StatusCode,
> {
    let Some(reviewer) = app.can_review_announcements(&auth).await else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let db = app.database();
    let auction_id = app.generate_auction_id();
    let approved = db
        .approve_staged(staged_id, auction_id, &reviewer, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match approved {
        Ok(auction_id) => Ok((StatusCode::CREATED, Json(ApprovalResponse { auction_id }))),
        Err(ReviewFailure::DoesNotExist) => Err(StatusCode::NOT_FOUND),
        Err(ReviewFailure::NotPendingReview) => Err(StatusCode::CONFLICT),
        Err(ReviewFailure::MissingReason) => Err(StatusCode::UNPROCESSABLE_ENTITY),
    }
}

/// Discard a pending candidate, retaining it for audit.
///
/// # Authorization
///
/// Requires a reviewer identity (`can_review_announcements`).
///
/// # Returns
///
/// - `204 No Content`: The candidate was rejected
/// - `401 Unauthorized`: Not a reviewer
/// - `404 Not Found`: No such staged record
/// - `409 Conflict`: The record has already been decided
/// - `422 Unprocessable Entity`: Empty rejection reason
/// - `500 Internal Server Error`: Database operation failed
async fn reject_staged<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { staged_id }): Path<Id<<T::Repository as Repository>::StagedId>>,
    Json(body): Json<RejectionDto>,
) -> Result<StatusCode, StatusCode> {
    let Some(reviewer) = app.can_review_announcements(&auth).await else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let db = app.database();
    let rejected = db
        .reject_staged(staged_id, &reviewer, &body.reason, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match rejected {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(ReviewFailure::DoesNotExist) => Err(StatusCode::NOT_FOUND),
        Err(ReviewFailure::NotPendingReview) => Err(StatusCode::CONFLICT),
        Err(ReviewFailure::MissingReason) => Err(StatusCode::UNPROCESSABLE_ENTITY),
    }
}
