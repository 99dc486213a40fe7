//! HTTP client for the shift marketplace API.
//!
//! This crate provides a client for the worker side of the marketplace:
//! credential login, token refresh and revocation, and the listing of
//! jobs whose shifts have been offered to the account.
//!
//! The [`Marketplace`] trait is the seam the evaluation pipeline depends on,
//! so tests can substitute a scripted implementation.

mod client;
mod error;
mod types;

pub use client::{DEFAULT_OFFERED_PATH, Marketplace, MarketplaceClient};
pub use error::MarketplaceError;
pub use types::*;
