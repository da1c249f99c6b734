//! Shared building blocks for the stock-take workflow.
//!
//! This crate contains **pure** primitives (identifiers, quantities, domain
//! errors) with no IO and no async runtime.

pub mod error;
pub mod id;
pub mod quantity;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, MaterialId, RequestId, WorkshopId};
pub use quantity::Quantity;
