//! REST API endpoints for the auction lifecycle.
//!
//! Mutations require the auction-manager role (or, for settlement, the
//! settlement collaborator); published auction state is readable without
//! authorization, since tender results are public information.

use crate::{ApiApplication, config::AxumConfig};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use tap_core::{
    models::{
        AuctionData, AuctionRecord, AuctionSchedule, BidRecord, DateTimeRangeQuery,
        DateTimeRangeResponse, SettlementInstruction,
    },
    ports::{
        AllocationRunFailure, AuctionRepository as _, BidRepository as _, LifecycleFailure,
        Repository,
    },
};
use tracing::{Level, event};

/// Creates a router with auction lifecycle endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_auctions::<T>).post(create_auction::<T>),
            |route| route.security_requirement("jwt").tag("auction"),
        )
        .api_route_with("/{auction_id}", get(get_auction::<T>), |route| {
            route.tag("auction")
        })
        .api_route_with("/code/{code}", get(get_auction_by_code::<T>), |route| {
            route.tag("auction")
        })
        .api_route_with("/{auction_id}/close", post(close_auction::<T>), |route| {
            route
                .security_requirement("jwt")
                .tag("auction")
                .tag("admin")
        })
        .api_route_with("/{auction_id}/bids", get(list_auction_bids::<T>), |route| {
            route
                .security_requirement("jwt")
                .tag("auction")
                .tag("admin")
        })
        .api_route_with(
            "/{auction_id}/settle",
            post(confirm_settlement::<T>),
            |route| {
                route
                    .security_requirement("jwt")
                    .tag("auction")
                    .tag("settlement")
            },
        )
        .api_route_with(
            "/{auction_id}/settlement",
            get(settlement_instructions::<T>),
            |route| {
                route
                    .security_requirement("jwt")
                    .tag("auction")
                    .tag("settlement")
            },
        )
}

/// Path parameter for auction-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique identifier of the auction
    auction_id: T,
}

/// Path parameter for code lookup.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Code {
    /// The auction code, e.g. a tender reference
    code: String,
}

/// Request body for creating an auction directly.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct CreateAuctionDto<DateTime> {
    /// The immutable auction terms
    data: AuctionData<DateTime>,
    /// The auction timetable
    schedule: AuctionSchedule<DateTime>,
}

/// Request body for confirming settlement.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct SettleDto<DateTime> {
    /// The settlement date confirmed by the depository
    settlement_date: DateTime,
}

fn lifecycle_status(failure: &LifecycleFailure) -> StatusCode {
    match failure {
        LifecycleFailure::DoesNotExist => StatusCode::NOT_FOUND,
        LifecycleFailure::InvalidScheduleOrdering | LifecycleFailure::SettlementDateMismatch => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LifecycleFailure::DuplicateAuctionCode
        | LifecycleFailure::InvalidStateTransition { .. }
        | LifecycleFailure::ResultsAlreadyPublished => StatusCode::CONFLICT,
    }
}

/// Create an auction in the announced state, bypassing the staging area.
///
/// # Authorization
///
/// Requires the auction-manager role (`can_manage_auctions`).
///
/// # Returns
///
/// - `201 Created`: The announced auction
/// - `401 Unauthorized`: Not an auction manager
/// - `409 Conflict`: The auction code is already taken
/// - `422 Unprocessable Entity`: The timetable does not run strictly forward
/// - `500 Internal Server Error`: Database operation failed
async fn create_auction<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<CreateAuctionDto<<T::Repository as Repository>::DateTime>>,
) -> Result<
    (
        StatusCode,
        Json<
            AuctionRecord<
                <T::Repository as Repository>::AuctionId,
                <T::Repository as Repository>::DateTime,
            >,
        >,
    ),
    StatusCode,
> {
    if !app.can_manage_auctions(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    let auction_id = app.generate_auction_id();
    db.create_auction(auction_id, body.data, body.schedule, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(|record| (StatusCode::CREATED, Json(record)))
        .map_err(|failure| lifecycle_status(&failure))
}

/// Page through auctions by closing time, most recent first.
///
/// # Returns
///
/// - `200 OK`: A page of auctions with an optional continuation query
/// - `401 Unauthorized`: Not an auction manager
/// - `500 Internal Server Error`: Database query failed
async fn list_auctions<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(query): Query<DateTimeRangeQuery<<T::Repository as Repository>::DateTime>>,
) -> Result<
    Json<
        DateTimeRangeResponse<
            AuctionRecord<
                <T::Repository as Repository>::AuctionId,
                <T::Repository as Repository>::DateTime,
            >,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    if !app.can_manage_auctions(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.list_auctions(query, config.page_limit)
        .await
        .map(Json)
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Retrieve an auction, its lifecycle state, and any published results.
///
/// # Returns
///
/// - `200 OK`: The auction record
/// - `404 Not Found`: No such auction
/// - `500 Internal Server Error`: Database query failed
async fn get_auction<T: ApiApplication>(
    State(app): State<T>,
    Path(Id { auction_id }): Path<Id<<T::Repository as Repository>::AuctionId>>,
) -> Result<
    Json<
        AuctionRecord<
            <T::Repository as Repository>::AuctionId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    let db = app.database();
    db.get_auction(auction_id)
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Retrieve an auction by its code.
///
/// Published results remain retrievable by code indefinitely, for audit.
///
/// # Returns
///
/// - `200 OK`: The auction record
/// - `404 Not Found`: No auction carries this code
/// - `500 Internal Server Error`: Database query failed
async fn get_auction_by_code<T: ApiApplication>(
    State(app): State<T>,
    Path(Code { code }): Path<Code>,
) -> Result<
    Json<
        AuctionRecord<
            <T::Repository as Repository>::AuctionId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    let db = app.database();
    db.get_auction_by_code(&code)
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Close bidding ahead of schedule and run the allocation.
///
/// If this call performs the close, the allocation engine runs immediately
/// over the frozen bid set. If the auction was already closed by the
/// scheduler, the call is a no-op and returns the current record.
///
/// # Authorization
///
/// Requires the auction-manager role (`can_manage_auctions`).
///
/// # Returns
///
/// - `200 OK`: The auction record after close and allocation
/// - `401 Unauthorized`: Not an auction manager
/// - `404 Not Found`: No such auction
/// - `409 Conflict`: The auction has not opened yet
/// - `500 Internal Server Error`: Database or engine failure
async fn close_auction<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { auction_id }): Path<Id<<T::Repository as Repository>::AuctionId>>,
) -> Result<
    Json<
        AuctionRecord<
            <T::Repository as Repository>::AuctionId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    if !app.can_manage_auctions(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.force_close(auction_id.clone(), app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|failure| lifecycle_status(&failure))?;

    // A redundant run observes the auction is no longer closed and reports
    // results-already-published, which is not an error here.
    let run = db
        .run_allocation(auction_id.clone(), app.allocator(), app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    match run {
        Ok(_) | Err(AllocationRunFailure::Lifecycle(LifecycleFailure::ResultsAlreadyPublished)) => {
        }
        Err(AllocationRunFailure::Lifecycle(failure)) => {
            return Err(lifecycle_status(&failure));
        }
        Err(AllocationRunFailure::Engine(err)) => {
            event!(Level::ERROR, err = err.to_string());
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    db.get_auction(auction_id)
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// The non-cancelled bids of an auction, in submission order.
///
/// # Authorization
///
/// Requires the auction-manager role (`can_manage_auctions`).
///
/// # Returns
///
/// - `200 OK`: The bid ledger for this auction
/// - `401 Unauthorized`: Not an auction manager
/// - `500 Internal Server Error`: Database query failed
async fn list_auction_bids<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { auction_id }): Path<Id<<T::Repository as Repository>::AuctionId>>,
) -> Result<
    Json<
        Vec<
            BidRecord<
                <T::Repository as Repository>::BidId,
                <T::Repository as Repository>::AuctionId,
                <T::Repository as Repository>::BidderId,
                <T::Repository as Repository>::DateTime,
            >,
        >,
    >,
    StatusCode,
> {
    if !app.can_manage_auctions(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.list_bids(auction_id).await.map(Json).map_err(|err| {
        event!(Level::ERROR, err = err.to_string());
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Record the depository's settlement confirmation.
///
/// # Authorization
///
/// Requires the settlement collaborator role (`can_confirm_settlement`).
///
/// # Returns
///
/// - `200 OK`: The settled auction record
/// - `401 Unauthorized`: Not the settlement collaborator
/// - `404 Not Found`: No such auction
/// - `409 Conflict`: Results are not published, or already settled
/// - `422 Unprocessable Entity`: Confirmed date precedes the bidding close
/// - `500 Internal Server Error`: Database operation failed
async fn confirm_settlement<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { auction_id }): Path<Id<<T::Repository as Repository>::AuctionId>>,
    Json(body): Json<SettleDto<<T::Repository as Repository>::DateTime>>,
) -> Result<
    Json<
        AuctionRecord<
            <T::Repository as Repository>::AuctionId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    if !app.can_confirm_settlement(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.confirm_settlement(auction_id, body.settlement_date, app.now())
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .map_err(|failure| lifecycle_status(&failure))
}

/// The per-bidder allocation export for the settlement collaborator.
///
/// # Authorization
///
/// Requires the settlement collaborator role (`can_confirm_settlement`).
///
/// # Returns
///
/// - `200 OK`: Total allocated quantity per bidder
/// - `401 Unauthorized`: Not the settlement collaborator
/// - `404 Not Found`: No such auction, or results not yet published
/// - `500 Internal Server Error`: Database query failed
async fn settlement_instructions<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { auction_id }): Path<Id<<T::Repository as Repository>::AuctionId>>,
) -> Result<
    Json<
        SettlementInstruction<
            <T::Repository as Repository>::BidderId,
            <T::Repository as Repository>::DateTime,
        >,
    >,
    StatusCode,
> {
    if !app.can_confirm_settlement(&auth).await {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let db = app.database();
    db.settlement_instructions(auction_id)
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
