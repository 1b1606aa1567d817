//! `retailerp-core` — shared building blocks for the retail ERP backend.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ItemId, LocationId};
