use std::time::Duration;

use crate::error::{DecklistError, Result};

pub const CATALOG_BASE: &str = "https://api.scryfall.com";
pub const BACKEND_BASE: &str = "http://localhost:8000";

/// Documented limit of the catalog's `/cards/collection` endpoint.
pub const MAX_BATCH_SIZE: usize = 75;
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_millis(1000);
pub const MAX_RETRIES: u32 = 2;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_CATALOG_URL: &str = "DECKLIST_CATALOG_URL";
pub const ENV_BACKEND_URL: &str = "DECKLIST_BACKEND_URL";
pub const ENV_TIMEOUT_SECS: &str = "DECKLIST_TIMEOUT_SECS";

/// Pacing and retry rules applied to every catalog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPolicy {
    /// Minimum gap between two consecutive catalog calls.
    pub interval: Duration,
    /// Wait imposed before the next call after an HTTP 429 or transport failure.
    pub cooldown: Duration,
    /// How many times a transiently failed request is re-issued.
    pub max_retries: u32,
    /// Identifiers per `/cards/collection` request.
    pub batch_size: usize,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            interval: MIN_REQUEST_INTERVAL,
            cooldown: RATE_LIMIT_COOLDOWN,
            max_retries: MAX_RETRIES,
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl CatalogPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(DecklistError::InvalidArgument(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        Ok(())
    }
}

/// Strip a trailing slash so paths can be appended with `format!("{base}/...")`.
pub fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
