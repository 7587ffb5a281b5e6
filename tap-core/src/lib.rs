#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Core domain models for the treasury auction platform.
///
/// The models in this module are primarily data structures with minimal
/// business logic; the invariants that can be enforced locally (schedule
/// ordering, confidence bounds, fixed-point arithmetic) live here, while
/// persistence and allocation are behind the traits in [`ports`].
pub mod models;

/// Interface traits for the treasury auction platform.
///
/// These traits are the "ports" of the hexagonal architecture: they define
/// the contract between the domain and its adapters (database, HTTP API,
/// allocation engine) without fixing an implementation. Repository methods
/// return a nested result: the outer `Result` carries infrastructure
/// errors, the inner one carries domain failures the caller is expected to
/// handle.
pub mod ports;
