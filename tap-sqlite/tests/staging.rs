mod common;

use common::{TestApp, staged_candidate};
use tap_core::{
    models::{AuctionStatus, ReviewStatus},
    ports::{
        Application, AuctionRepository as _, ReviewFailure, ReviewRepository as _, StagingFailure,
        StagingRepository as _,
    },
};
use tap_sqlite::{Db, config::SqliteConfig};

#[tokio::test]
async fn staging_holds_candidates_for_review() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let staged_id = app.generate_staged_id();
    let staged = db
        .stage_announcement(staged_id, staged_candidate("T-1001", "TB-S-001"), 0.92, app.now())
        .await?
        .unwrap();
    assert_eq!(staged.status, ReviewStatus::PendingReview);
    assert_eq!(staged.confidence.value(), 0.92);
    assert!(staged.reviewer.is_none());

    let fetched = db.get_staged(staged_id).await?.unwrap();
    assert_eq!(fetched.data.tender_number, "T-1001");
    assert_eq!(fetched.data.auction.code, "TB-S-001");

    Ok(())
}

#[tokio::test]
async fn malformed_extractions_are_rejected_at_the_boundary() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let result = db
        .stage_announcement(app.generate_staged_id(), staged_candidate("T-1002", "TB-S-002"), 1.2, app.now())
        .await?;
    assert_eq!(result.unwrap_err(), StagingFailure::InvalidConfidence);

    let result = db
        .stage_announcement(
            app.generate_staged_id(),
            staged_candidate("T-1003", "TB-S-003"),
            f64::NAN,
            app.now(),
        )
        .await?;
    assert_eq!(result.unwrap_err(), StagingFailure::InvalidConfidence);

    let mut backwards = staged_candidate("T-1004", "TB-S-004");
    std::mem::swap(&mut backwards.schedule.open_at, &mut backwards.schedule.close_at);
    let result = db
        .stage_announcement(app.generate_staged_id(), backwards, 0.9, app.now())
        .await?;
    assert_eq!(result.unwrap_err(), StagingFailure::InvalidScheduleOrdering);

    Ok(())
}

#[tokio::test]
async fn tender_numbers_are_unique_while_active() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let first = app.generate_staged_id();
    db.stage_announcement(first, staged_candidate("T-1005", "TB-S-005"), 0.8, app.now())
        .await?
        .unwrap();

    let dup = db
        .stage_announcement(app.generate_staged_id(), staged_candidate("T-1005", "TB-S-006"), 0.8, app.now())
        .await?;
    assert_eq!(dup.unwrap_err(), StagingFailure::DuplicateTenderReference);

    // Once the original attempt is rejected, the reference may recur.
    db.reject_staged(first, "reviewer", "unreadable scan", app.now())
        .await?
        .unwrap();
    db.stage_announcement(app.generate_staged_id(), staged_candidate("T-1005", "TB-S-007"), 0.8, app.now())
        .await?
        .unwrap();

    Ok(())
}

#[tokio::test]
async fn approval_spawns_exactly_one_auction() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let staged_id = app.generate_staged_id();
    db.stage_announcement(staged_id, staged_candidate("T-1006", "TB-S-008"), 0.95, app.now())
        .await?
        .unwrap();

    let auction_id = app.generate_auction_id();
    let approved = db
        .approve_staged(staged_id, auction_id, "alice", app.now())
        .await?
        .unwrap();
    assert_eq!(approved, auction_id);

    let auction = db.get_auction(auction_id).await?.unwrap();
    assert_eq!(auction.status, AuctionStatus::Announced);
    assert_eq!(auction.data.code, "TB-S-008");

    let staged = db.get_staged(staged_id).await?.unwrap();
    assert_eq!(staged.status, ReviewStatus::Approved);
    assert_eq!(staged.reviewer.as_deref(), Some("alice"));
    assert!(staged.reviewed_at.is_some());

    // The decision is one-way and exclusive.
    let again = db
        .approve_staged(staged_id, app.generate_auction_id(), "bob", app.now())
        .await?;
    assert_eq!(again.unwrap_err(), ReviewFailure::NotPendingReview);
    assert_eq!(
        db.reject_staged(staged_id, "bob", "changed my mind", app.now())
            .await?
            .unwrap_err(),
        ReviewFailure::NotPendingReview
    );

    Ok(())
}

#[tokio::test]
async fn rejection_requires_a_reason() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let staged_id = app.generate_staged_id();
    db.stage_announcement(staged_id, staged_candidate("T-1007", "TB-S-009"), 0.5, app.now())
        .await?
        .unwrap();

    assert_eq!(
        db.reject_staged(staged_id, "alice", "   ", app.now())
            .await?
            .unwrap_err(),
        ReviewFailure::MissingReason
    );

    db.reject_staged(staged_id, "alice", "duplicate of last week's tender", app.now())
        .await?
        .unwrap();
    let staged = db.get_staged(staged_id).await?.unwrap();
    assert_eq!(staged.status, ReviewStatus::Rejected);
    assert_eq!(
        staged.rejection_reason.as_deref(),
        Some("duplicate of last week's tender")
    );

    assert_eq!(
        db.reject_staged(app.generate_staged_id(), "alice", "whatever", app.now())
            .await?
            .unwrap_err(),
        ReviewFailure::DoesNotExist
    );

    Ok(())
}

#[tokio::test]
async fn listing_filters_by_status_and_search() -> anyhow::Result<()> {
    let app = TestApp(Db::open(&SqliteConfig::default()).await?);
    let db = app.database();

    let pending = app.generate_staged_id();
    db.stage_announcement(pending, staged_candidate("T-2001", "TB-S-010"), 0.9, app.now())
        .await?
        .unwrap();
    let rejected = app.generate_staged_id();
    db.stage_announcement(rejected, staged_candidate("T-2002", "TB-S-011"), 0.3, app.now())
        .await?
        .unwrap();
    db.reject_staged(rejected, "alice", "low confidence", app.now())
        .await?
        .unwrap();

    let all = db.list_staged(None, None).await?;
    assert_eq!(all.len(), 2);

    let only_pending = db.list_staged(Some(ReviewStatus::PendingReview), None).await?;
    assert_eq!(only_pending.len(), 1);
    assert_eq!(only_pending[0].id, pending);

    let by_tender = db.list_staged(None, Some("T-2002")).await?;
    assert_eq!(by_tender.len(), 1);
    assert_eq!(by_tender[0].id, rejected);

    assert!(db.list_staged(None, Some("T-9999")).await?.is_empty());

    Ok(())
}
