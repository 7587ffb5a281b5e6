//! Application implementation with JWT-based authorization.
//!
//! This module provides the concrete implementation of the Application trait,
//! binding the SQLite repositories and the uniform-price engine together
//! under JWT-based authorization.

use headers::{Authorization, authorization::Bearer};
use jwt_simple::{
    claims::JWTClaims,
    prelude::{HS256Key, MACLike},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tap_core::ports::Application;
use tap_engine::UniformPriceEngine;
use tap_sqlite::{
    Db,
    types::{AuctionId, BidId, BidderId, DateTime, StagedId},
};
use uuid::Uuid;

/// Main application implementation combining all system components.
///
/// This struct implements the Application trait and provides the integration
/// point for the database, authorization, and the allocation engine. It uses
/// JWT tokens for authorization decisions.
#[derive(Clone)]
pub struct PlatformApp {
    /// Database connection for persistent storage
    pub db: Db,
    /// HMAC key for JWT token verification
    pub key: HS256Key,
}

impl PlatformApp {
    /// Extract and verify JWT claims from the authorization header.
    fn claims(&self, context: &Authorization<Bearer>) -> Option<JWTClaims<CustomJWTClaims>> {
        let token = context.0.token();
        self.key.verify_token::<CustomJWTClaims>(token, None).ok()
    }
}

/// Mint a v8 UUID carrying the current timestamp, a namespace nibble, and
/// 56 random bits.
///
/// The timestamp is partitioned into (48, 12, 4) bits and splatted into the
/// custom fields, so lexicographic id order tracks creation order while the
/// namespace nibble distinguishes the entity type.
fn v8_id(namespace: u64) -> Uuid {
    let rng56 = rand::rng().next_u64() >> 8; // 56 random bits

    let now = time::OffsetDateTime::now_utc().unix_timestamp() as u64;
    let now48 = 0xffff_ffff_ffff_0000 & now;
    let now12 = (0xfff0 & now) >> 4;
    let now04 = (0x000f & now) << 56;

    let hi = 0x0000_0000_0000_8000 | now48 | now12;
    let lo = (namespace << 60) | now04 | rng56;

    Uuid::from_u64_pair(hi, lo)
}

impl Application for PlatformApp {
    type Context = Authorization<Bearer>;
    type Repository = Db;
    type Allocator = UniformPriceEngine;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn allocator(&self) -> Self::Allocator {
        UniformPriceEngine::default()
    }

    fn now(&self) -> DateTime {
        time::OffsetDateTime::now_utc().into()
    }

    fn generate_auction_id(&self) -> AuctionId {
        v8_id(0x9).into()
    }

    fn generate_bid_id(&self) -> BidId {
        v8_id(0xa).into()
    }

    fn generate_staged_id(&self) -> StagedId {
        v8_id(0xb).into()
    }

    async fn can_submit_bid(&self, context: &Self::Context) -> Option<BidderId> {
        // The standard sub: claim is the bidder id
        self.claims(context)?.subject?.parse().ok()
    }

    async fn can_view_bid(&self, context: &Self::Context, bidder_id: &BidderId) -> bool {
        // A bidder sees their own bids; an admin sees all of them
        self.claims(context)
            .map(|claims| {
                claims.custom.admin
                    || claims
                        .subject
                        .as_deref()
                        .and_then(|sub| sub.parse::<BidderId>().ok())
                        .is_some_and(|claim_bidder| claim_bidder == *bidder_id)
            })
            .unwrap_or(false)
    }

    async fn can_stage_announcements(&self, context: &Self::Context) -> bool {
        self.claims(context)
            .map(|claims| claims.custom.extractor)
            .unwrap_or(false)
    }

    async fn can_review_announcements(&self, context: &Self::Context) -> Option<String> {
        // The recorded reviewer identity is the token subject
        let claims = self.claims(context)?;
        if claims.custom.reviewer {
            claims.subject.or_else(|| Some("reviewer".to_string()))
        } else {
            None
        }
    }

    async fn can_manage_auctions(&self, context: &Self::Context) -> bool {
        self.claims(context)
            .map(|claims| claims.custom.admin)
            .unwrap_or(false)
    }

    async fn can_confirm_settlement(&self, context: &Self::Context) -> bool {
        self.claims(context)
            .map(|claims| claims.custom.settlement)
            .unwrap_or(false)
    }
}

/// Custom claims structure for JWT tokens.
///
/// Contains application-specific claims beyond standard JWT claims.
#[derive(Serialize, Deserialize)]
pub struct CustomJWTClaims {
    /// May create, close, and inspect auctions.
    #[serde(default)]
    pub admin: bool,
    /// May decide staged announcements; the `sub` claim names the reviewer.
    #[serde(default)]
    pub reviewer: bool,
    /// The extraction collaborator; may stage announcements.
    #[serde(default)]
    pub extractor: bool,
    /// The settlement collaborator; may confirm settlement and export
    /// instructions.
    #[serde(default)]
    pub settlement: bool,
}

#[cfg(test)]
mod uuid_v8_tests {
    use super::*;

    // The id layout packs a unix timestamp into (48, 12, 4) bits around the
    // v8 version and RFC 4122 variant fields, with a namespace nibble
    // distinguishing auctions (0x9), bids (0xa), and staged records (0xb).

    fn extract_meta(uuid: Uuid) -> (u8, u8, u8) {
        let (hi, lo) = uuid.as_u64_pair();
        let version = ((hi >> 12) & 0xf) as u8;
        let variant = ((lo >> 62) & 0x3) as u8;
        let namespace = ((lo >> 60) & 0xf) as u8;
        (version, variant, namespace)
    }

    fn extract_timestamp(uuid: Uuid) -> u64 {
        let (hi, lo) = uuid.as_u64_pair();
        let high48 = hi & 0xffff_ffff_ffff_0000;
        let mid12 = hi & 0x0fff;
        let low4 = (lo >> 56) & 0x0f;
        high48 | (mid12 << 4) | low4
    }

    #[test]
    fn namespace_nibbles_distinguish_entity_types() {
        for (id, namespace) in [(v8_id(0x9), 0x9), (v8_id(0xa), 0xa), (v8_id(0xb), 0xb)] {
            let (version, variant, nibble) = extract_meta(id);
            assert_eq!(version, 8);
            assert_eq!(variant, 0b10);
            assert_eq!(nibble, namespace);
        }
    }

    #[test]
    fn timestamp_fragments_roundtrip() {
        let before = time::OffsetDateTime::now_utc().unix_timestamp() as u64;
        let id = v8_id(0x9);
        let after = time::OffsetDateTime::now_utc().unix_timestamp() as u64;

        let embedded = extract_timestamp(id);
        assert!(embedded >= before && embedded <= after);
    }
}
