//! Client for the external card catalog.

pub mod client;
pub mod limiter;

pub use client::{BulkLookup, CatalogClient};
pub use limiter::RateLimiter;
