#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod engine;
mod price;

pub use engine::{AllocationError, UniformPriceEngine};
pub use price::discount_price;
