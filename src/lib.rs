//! Deck-list import and card resolution for tournament clients.
//!
//! Turns free-form deck-list text, or a previously persisted canonical deck
//! string, into a validated and quantity-merged set of cards, resolved
//! against an external card catalog (Scryfall) within its rate limits.
//! Decks are persisted through the tournament backend as canonical
//! `"<quantity> <id>"` strings.
//!
//! # Quick start
//!
//! ```no_run
//! use decklist_resolver::{CancelToken, DeckAggregate, DecklistClient, ResolveMode};
//!
//! # async fn example() -> decklist_resolver::Result<()> {
//! let client = DecklistClient::builder().build()?;
//! let cancel = CancelToken::new();
//!
//! // Import a human-written list
//! let resolution = client
//!     .resolver()
//!     .resolve("4 Lightning Bolt\n2 Brainstorm (ICE)", ResolveMode::Import, &cancel)
//!     .await?;
//! if let Some(summary) = resolution.summary() {
//!     eprintln!("{summary}");
//! }
//!
//! let mut deck = DeckAggregate::new();
//! deck.merge_resolved(resolution.cards);
//! println!("{}", deck.serialize());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod backend;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod parser;
pub mod resolver;

pub use aggregate::DeckAggregate;
pub use backend::{DeckApi, DeckDraft};
pub use catalog::{BulkLookup, CatalogClient, RateLimiter};
pub use clock::{Clock, TokioClock};
pub use config::CatalogPolicy;
pub use error::{DecklistError, Result};
pub use http::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use models::{
    CardRef, Deck, DeckCardLine, DeckLineEntry, DeckPatch, DeckRecord, FailedQuery, FailureKind,
    NewDeck, ResolvedCard,
};
pub use resolver::{CancelToken, DeckResolver, Progress, Resolution, ResolveMode};

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// DecklistClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`DecklistClient`].
///
/// Use [`DecklistClient::builder()`] to obtain one, chain configuration
/// methods, and call [`build()`](DecklistClientBuilder::build).
pub struct DecklistClientBuilder {
    catalog_url: String,
    backend_url: String,
    timeout: Duration,
    policy: CatalogPolicy,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for DecklistClientBuilder {
    fn default() -> Self {
        Self {
            catalog_url: config::CATALOG_BASE.to_string(),
            backend_url: config::BACKEND_BASE.to_string(),
            timeout: config::REQUEST_TIMEOUT,
            policy: CatalogPolicy::default(),
            transport: None,
            clock: None,
        }
    }
}

impl DecklistClientBuilder {
    /// Start from the defaults, overridden by `DECKLIST_CATALOG_URL`,
    /// `DECKLIST_BACKEND_URL` and `DECKLIST_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::default();
        if let Some(url) = lookup(config::ENV_CATALOG_URL) {
            builder = builder.catalog_url(url);
        }
        if let Some(url) = lookup(config::ENV_BACKEND_URL) {
            builder = builder.backend_url(url);
        }
        if let Some(secs) = lookup(config::ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DecklistError::InvalidArgument(format!(
                    "{} must be a whole number of seconds, got '{secs}'",
                    config::ENV_TIMEOUT_SECS
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder)
    }

    /// Base URL of the card catalog. Defaults to `https://api.scryfall.com`.
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    /// Base URL of the tournament backend.
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Per-request HTTP timeout. Defaults to 10 seconds.
    ///
    /// Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request pacing, retry and batching rules for the catalog.
    pub fn policy(mut self, policy: CatalogPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the reqwest-backed transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the Tokio clock used for request pacing.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<DecklistClient> {
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.timeout)?),
        };
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(TokioClock));
        let catalog = CatalogClient::new(transport.clone(), clock, &self.catalog_url, self.policy)?;
        Ok(DecklistClient {
            catalog,
            transport,
            catalog_url: config::normalize_base(&self.catalog_url),
            backend_url: config::normalize_base(&self.backend_url),
        })
    }
}

// ---------------------------------------------------------------------------
// DecklistClient
// ---------------------------------------------------------------------------

/// A persisted deck loaded for display or editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDeck {
    pub deck: Deck,
    /// Identifiers in the stored list that the catalog no longer knows.
    pub failed: Vec<FailedQuery>,
}

/// Entry point: owns the catalog client (and its rate limiter) and the
/// HTTP transport, and hands out borrowing wrappers for each concern.
pub struct DecklistClient {
    catalog: CatalogClient,
    transport: Arc<dyn HttpTransport>,
    catalog_url: String,
    backend_url: String,
}

impl DecklistClient {
    pub fn builder() -> DecklistClientBuilder {
        DecklistClientBuilder::default()
    }

    /// The card catalog client.
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Resolution passes over deck-list text.
    pub fn resolver(&self) -> DeckResolver<'_> {
        DeckResolver::new(&self.catalog)
    }

    /// The backend's deck endpoints.
    pub fn decks(&self) -> DeckApi<'_> {
        DeckApi::new(self.transport.as_ref(), &self.backend_url)
    }

    /// Fetch a deck owned by `owner_id` and resolve its stored card list.
    ///
    /// Fails as a whole when the catalog is unreachable rather than
    /// returning a deck with cards silently missing.
    pub async fn open_deck(
        &self,
        deck_id: i64,
        owner_id: i64,
        cancel: &CancelToken,
    ) -> Result<LoadedDeck> {
        let record = self.decks().get_owned(deck_id, owner_id).await?;
        let (cards, failed) =
            DeckAggregate::load(&self.resolver(), &record.deck_list, cancel).await?;
        Ok(LoadedDeck {
            deck: Deck::from_record(record, cards),
            failed,
        })
    }

    /// Resolve an import file and merge it into `deck`.
    ///
    /// Takes the aggregate by `&mut` for the whole pass, so no other pass can
    /// merge into it concurrently. Nothing is merged if the pass fails or is
    /// cancelled.
    pub async fn import_into(
        &self,
        deck: &mut DeckAggregate,
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<FailedQuery>> {
        let resolution = self.resolver().import_file(path, cancel).await?;
        deck.merge_resolved(resolution.cards);
        Ok(resolution.failed)
    }

    /// Submit a draft as a new deck for `owner_id`.
    pub async fn create_deck(
        &self,
        draft: &DeckDraft,
        owner_id: i64,
        creation_date: &str,
    ) -> Result<DeckRecord> {
        let deck = draft.to_new_deck(owner_id, creation_date)?;
        self.decks().create(&deck).await
    }

    /// Save a draft over an existing deck owned by `owner_id`.
    pub async fn save_deck(
        &self,
        deck_id: i64,
        draft: &DeckDraft,
        owner_id: i64,
    ) -> Result<DeckRecord> {
        let patch = draft.to_patch(owner_id)?;
        self.decks().get_owned(deck_id, owner_id).await?;
        self.decks().update(deck_id, &patch).await
    }
}

impl fmt::Display for DecklistClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = self.catalog.policy();
        write!(
            f,
            "DecklistClient(catalog={}, backend={}, interval={:?}, batch_size={})",
            self.catalog_url, self.backend_url, policy.interval, policy.batch_size
        )
    }
}
