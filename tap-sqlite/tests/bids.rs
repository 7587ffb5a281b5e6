mod common;

use common::{TestApp, bill_auction, open_schedule};
use tap_core::{
    models::{Amount, AuctionMode, BidKind, BidStatus, BidSubmission, Rate},
    ports::{Application, AuctionRepository as _, BidFailure, BidRepository as _},
};
use tap_sqlite::{Db, config::SqliteConfig, types::AuctionId};

async fn open_auction(app: &TestApp, code: &str) -> anyhow::Result<AuctionId> {
    let db = app.database();
    let auction_id = app.generate_auction_id();
    db.create_auction(auction_id, bill_auction(code, 1_000_000), open_schedule(), app.now())
        .await?
        .unwrap();
    db.open_due_auctions(app.now()).await?;
    Ok(auction_id)
}

#[tokio::test]
async fn bids_require_an_open_auction() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let auction_id = app.generate_auction_id();
    db.create_auction(auction_id, bill_auction("TB-B-001", 1_000_000), open_schedule(), app.now())
        .await?
        .unwrap();

    let bidder = app.can_submit_bid(&()).await.unwrap();
    let submission = BidSubmission {
        auction_id,
        kind: BidKind::Competitive,
        quantity: Amount(10_000),
        rate: Some(Rate(2400)),
    };

    // Announced, not yet open.
    let early = db
        .submit_bid(app.generate_bid_id(), bidder, submission.clone(), app.now())
        .await?;
    assert_eq!(early.unwrap_err(), BidFailure::AuctionNotOpen);

    db.open_due_auctions(app.now()).await?;
    db.submit_bid(app.generate_bid_id(), bidder, submission.clone(), app.now())
        .await?
        .unwrap();

    db.force_close(auction_id, app.now()).await?.unwrap();
    let late = db
        .submit_bid(app.generate_bid_id(), bidder, submission, app.now())
        .await?;
    assert_eq!(late.unwrap_err(), BidFailure::AuctionNotOpen);

    Ok(())
}

#[tokio::test]
async fn competitive_bids_require_a_yield() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();
    let auction_id = open_auction(&app, "TB-B-002").await?;
    let bidder = app.can_submit_bid(&()).await.unwrap();

    let result = db
        .submit_bid(
            app.generate_bid_id(),
            bidder,
            BidSubmission {
                auction_id,
                kind: BidKind::Competitive,
                quantity: Amount(10_000),
                rate: None,
            },
            app.now(),
        )
        .await?;
    assert_eq!(result.unwrap_err(), BidFailure::MissingPrice);

    Ok(())
}

#[tokio::test]
async fn quantity_bounds_are_enforced() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();
    let auction_id = open_auction(&app, "TB-B-003").await?;
    let bidder = app.can_submit_bid(&()).await.unwrap();

    // Below the minimum, off-denomination, and above the non-competitive
    // ceiling all come back as invalid amounts.
    let cases = [
        (BidKind::Competitive, 500, Some(Rate(2400))),
        (BidKind::Competitive, 10_500, Some(Rate(2400))),
        (BidKind::NonCompetitive, 300_000, None),
    ];
    for (kind, quantity, rate) in cases {
        let result = db
            .submit_bid(
                app.generate_bid_id(),
                bidder,
                BidSubmission {
                    auction_id,
                    kind,
                    quantity: Amount(quantity),
                    rate,
                },
                app.now(),
            )
            .await?;
        assert_eq!(
            result.unwrap_err(),
            BidFailure::InvalidBidAmount {
                quantity: Amount(quantity)
            }
        );
    }

    Ok(())
}

#[tokio::test]
async fn mode_gates_bid_kinds() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let mut data = bill_auction("TB-B-004", 1_000_000);
    data.mode = AuctionMode::Competitive;
    let auction_id = app.generate_auction_id();
    db.create_auction(auction_id, data, open_schedule(), app.now())
        .await?
        .unwrap();
    db.open_due_auctions(app.now()).await?;

    let bidder = app.can_submit_bid(&()).await.unwrap();
    let result = db
        .submit_bid(
            app.generate_bid_id(),
            bidder,
            BidSubmission {
                auction_id,
                kind: BidKind::NonCompetitive,
                quantity: Amount(10_000),
                rate: None,
            },
            app.now(),
        )
        .await?;
    assert_eq!(result.unwrap_err(), BidFailure::KindNotAllowed);

    Ok(())
}

#[tokio::test]
async fn cancellation_reverses_running_statistics() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();
    let auction_id = open_auction(&app, "TB-B-005").await?;
    let bidder = app.can_submit_bid(&()).await.unwrap();

    let keep = db
        .submit_bid(
            app.generate_bid_id(),
            bidder,
            BidSubmission {
                auction_id,
                kind: BidKind::NonCompetitive,
                quantity: Amount(50_000),
                rate: None,
            },
            app.now(),
        )
        .await?
        .unwrap();
    let drop = db
        .submit_bid(
            app.generate_bid_id(),
            bidder,
            BidSubmission {
                auction_id,
                kind: BidKind::Competitive,
                quantity: Amount(30_000),
                rate: Some(Rate(2400)),
            },
            app.now(),
        )
        .await?
        .unwrap();

    let auction = db.get_auction(auction_id).await?.unwrap();
    assert_eq!(auction.bid_count, 2);
    assert_eq!(auction.total_bid_amount, Amount(80_000));

    db.cancel_bid(drop.id, app.now()).await?.unwrap();
    // Re-cancelling is a no-op.
    db.cancel_bid(drop.id, app.now()).await?.unwrap();

    let auction = db.get_auction(auction_id).await?.unwrap();
    assert_eq!(auction.bid_count, 1);
    assert_eq!(auction.total_bid_amount, Amount(50_000));

    let bids = db.list_bids(auction_id).await?;
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].id, keep.id);

    let cancelled = db.get_bid(drop.id).await?.unwrap();
    assert_eq!(cancelled.status, BidStatus::Cancelled);

    // The ledger freezes at close.
    db.force_close(auction_id, app.now()).await?.unwrap();
    assert_eq!(
        db.cancel_bid(keep.id, app.now()).await?.unwrap_err(),
        BidFailure::AuctionNotOpen
    );

    Ok(())
}

#[tokio::test]
async fn unknown_references_are_reported() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();
    let bidder = app.can_submit_bid(&()).await.unwrap();

    let result = db
        .submit_bid(
            app.generate_bid_id(),
            bidder,
            BidSubmission {
                auction_id: app.generate_auction_id(),
                kind: BidKind::NonCompetitive,
                quantity: Amount(10_000),
                rate: None,
            },
            app.now(),
        )
        .await?;
    assert_eq!(result.unwrap_err(), BidFailure::DoesNotExist);

    assert_eq!(
        db.cancel_bid(app.generate_bid_id(), app.now())
            .await?
            .unwrap_err(),
        BidFailure::DoesNotExist
    );
    assert!(db.get_bid(app.generate_bid_id()).await?.is_none());

    Ok(())
}
