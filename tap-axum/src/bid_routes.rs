//! REST API endpoints for the bid ledger.
//!
//! Bidders submit into open auctions and may cancel up to the close; the
//! authorization context determines which bidder a request acts for.

use crate::ApiApplication;
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tap_core::{
    models::{BidRecord, BidSubmission},
    ports::{BidFailure, BidRepository as _, Repository},
};
use tracing::{Level, event};

/// Creates a router with bid endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/", post(submit_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .api_route_with(
            "/{bid_id}",
            get(get_bid::<T>).delete(cancel_bid::<T>),
            |route| route.security_requirement("jwt").tag("bid"),
        )
}

/// Path parameter for bid-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique reference of the bid
    bid_id: T,
}

fn bid_status(failure: &BidFailure) -> StatusCode {
    match failure {
        BidFailure::DoesNotExist => StatusCode::NOT_FOUND,
        BidFailure::AccessDenied => StatusCode::UNAUTHORIZED,
        BidFailure::AuctionNotOpen => StatusCode::CONFLICT,
        BidFailure::InvalidBidAmount { .. }
        | BidFailure::MissingPrice
        | BidFailure::KindNotAllowed => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Submit a bid into an open auction.
///
/// # Authorization
///
/// The context must resolve to a bidder (`can_submit_bid`); the bid is
/// recorded against that bidder.
///
/// # Returns
///
/// - `201 Created`: The accepted bid
/// - `401 Unauthorized`: The context does not act for any bidder
/// - `404 Not Found`: No such auction
/// - `409 Conflict`: The auction is not accepting bids
/// - `422 Unprocessable Entity`: Invalid quantity, missing yield, or kind not admitted
/// - `500 Internal Server Error`: Database operation failed
async fn submit_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<BidSubmission<<T::Repository as Repository>::AuctionId>>,
) -> Result<
    (
        StatusCode,
        Json<
            BidRecord<
                <T::Repository as Repository>::BidId,
                <T::Repository as Repository>::AuctionId,
                <T::Repository as Repository>::BidderId,
                <T::Repository as Repository>::DateTime,
            >,
        >,
    ),
    StatusCode,
> {
    let Some(bidder_id) = app.can_submit_bid(&auth).await else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let db = app.database();
    let bid_id = app.generate_bid_id();
    db.submit_bid(bid_id, bidder_id, body, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(|record| (StatusCode::CREATED, Json(record)))
        .map_err(|failure| bid_status(&failure))
}

/// Retrieve a bid.
///
/// # Authorization
///
/// The context must be allowed to view the bid's bidder (`can_view_bid`).
///
/// # Returns
///
/// - `200 OK`: The bid, including its allocation once results publish
/// - `401 Unauthorized`: The bid belongs to another bidder
/// - `404 Not Found`: No such bid
/// - `500 Internal Server Error`: Database query failed
async fn get_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id<<T::Repository as Repository>::BidId>>,
) -> Result<
    Json<
        BidRecord<
            <T::Repository as Repository>::BidId,
            <T::Repository as Repository>::AuctionId,
            <T::Repository as Repository>::BidderId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    let db = app.database();
    let bid = db
        .get_bid(bid_id)
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    if app.can_view_bid(&auth, &bid.bidder_id).await {
        Ok(Json(bid))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Cancel a bid, removing it from allocation consideration.
///
/// # Authorization
///
/// The context must be allowed to view the bid's bidder (`can_view_bid`).
///
/// # Returns
///
/// - `204 No Content`: The bid is cancelled
/// - `401 Unauthorized`: The bid belongs to another bidder
/// - `404 Not Found`: No such bid
/// - `409 Conflict`: The owning auction has closed; the ledger is frozen
/// - `500 Internal Server Error`: Database operation failed
async fn cancel_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id<<T::Repository as Repository>::BidId>>,
) -> Result<StatusCode, StatusCode> {
    let db = app.database();
    let bid = db
        .get_bid(bid_id.clone())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !app.can_view_bid(&auth, &bid.bidder_id).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    db.cancel_bid(bid_id, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|failure| bid_status(&failure))
}
