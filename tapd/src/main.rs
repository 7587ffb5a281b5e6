use std::fs::File;

use tap_axum::{router_with_api, start_server};
use tap_core::ports::{AllocationRunFailure, AuctionRepository as _, LifecycleFailure};
use tap_engine::UniformPriceEngine;
use tap_sqlite::Db;
use tapd::{AppConfig, Cli, impls::PlatformApp};

use jwt_simple::prelude::HS256Key;
use time::OffsetDateTime;
use tokio::select;
use tracing::{Level, event};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // By convention, we leverage `tracing` to instrument and log various
    // operations throughout this project.
    // Accordingly, we likely want to subscribe to these events so we can
    // write them to stdio and possibly some durable location.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args and extract the JWT key
    let cli = Cli::import()?;
    let key = HS256Key::from_bytes(cli.secret.as_bytes());

    // Create config with proper layering of CLI args
    let AppConfig {
        server,
        database,
        schedule,
    } = AppConfig::load(&cli)?;

    // Open database with config
    let db = Db::open(&database).await?;
    let db2 = db.clone();
    let app = PlatformApp { db, key };

    // If requested, dump the schema and exit.
    if let Some(path) = cli.schema {
        let schema = router_with_api(app, server).1;
        serde_json::to_writer_pretty(File::create(path)?, &schema)?;
        return Ok(());
    }

    // We always run the server task.
    let server_task = tokio::spawn(async move { start_server(server, app).await });

    // However, we may or may not also run the lifecycle sweep
    if schedule.every.is_some() {
        let sweep_task = tokio::spawn(async move {
            let f = async move |now: OffsetDateTime| sweep(&db2, now.into()).await;
            schedule.schedule(f).await
        });

        select! {
            r = server_task => r??,
            r = sweep_task => r??,
        }
    } else {
        // Otherwise, we just run the server task to completion
        server_task.await??;
    }

    Ok(())
}

/// One pass of the time-based lifecycle transitions.
///
/// Opens every auction whose bidding window has arrived, closes every
/// auction whose window has passed, and runs the allocation for each auction
/// closed on this pass. Every step is idempotent, so overlapping or repeated
/// sweeps are harmless.
async fn sweep(db: &Db, now: tap_sqlite::types::DateTime) -> anyhow::Result<()> {
    let opened = db.open_due_auctions(now).await?;
    if !opened.is_empty() {
        event!(Level::INFO, count = opened.len(), "opened auctions");
    }

    let closed = db.close_due_auctions(now).await?;
    for auction_id in closed {
        let run = db
            .run_allocation(auction_id, UniformPriceEngine::default(), now)
            .await?;
        match run {
            Ok(results) => {
                event!(
                    Level::INFO,
                    auction_id = %auction_id,
                    total_accepted = results.total_accepted.0,
                    bid_to_cover = results.bid_to_cover,
                    "published auction results"
                );
            }
            // Someone beat us to it; nothing to do.
            Err(AllocationRunFailure::Lifecycle(LifecycleFailure::ResultsAlreadyPublished)) => {}
            Err(failure) => return Err(anyhow::Error::new(failure)),
        }
    }

    Ok(())
}
