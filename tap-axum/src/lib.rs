#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod auction_routes;
mod bid_routes;
mod review_routes;
mod staging_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Display, sync::Arc};
use tap_core::ports::{Application, Repository};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Construct a full API router with the given state and config
pub fn router<T: ApiApplication>(state: T, config: AxumConfig) -> axum::Router {
    router_with_api(state, config).0
}

/// Construct the API router alongside the generated OpenAPI document.
///
/// The document is also what `/docs/api.json` serves; having it in hand lets
/// a caller write the schema to disk without standing up the server.
pub fn router_with_api<T: ApiApplication>(state: T, config: AxumConfig) -> (axum::Router, OpenApi) {
    let mut api = OpenApi::default();
    let router = ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest(
            "/staged",
            staging_routes::router().merge(review_routes::router()),
        )
        .nest("/auction", auction_routes::router())
        .nest("/bid", bid_routes::router())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api.clone()))) // Arc is very important here or you will face massive memory and performance issues
        .layer(Extension(Arc::new(config)))
        .with_state(state);
    (router, api)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    if let Ok(address) = listener.local_addr() {
        tracing::info!("Listening for requests on {}", address);
    }

    // Here, we could apply additional config like timeouts, CORS, etc.
    let service = router(app, config);
    axum::serve(listener, service).await
}

/// Axum imposes all sorts of constraints on what can pass for state. This
/// trait, coupled with a blanket implementation, specifies it all upfront and
/// in one place. If a function takes a generic `T: ApiApplication`, then
/// everything one might reasonably want to do should work.
pub trait ApiApplication:
    Clone
    + Send
    + Sync
    + 'static
    + Application<
        Context = Authorization<Bearer>,
        Repository: Clone
                        + Send
                        + Sync
                        + 'static
                        + Repository<
            DateTime: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
            AuctionId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
            BidId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
            StagedId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
            BidderId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
        >,
    >
{
}

// this is the blanket implementation
impl<T: Clone + Send + Sync + 'static> ApiApplication for T where
    T: Application<
            Context = Authorization<Bearer>,
            Repository: Clone
                            + Send
                            + Sync
                            + 'static
                            + Repository<
                DateTime: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
                AuctionId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
                BidId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
                StagedId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
                BidderId: Clone + Display + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
            >,
        >
{
}
