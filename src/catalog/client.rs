//! Card catalog lookups: fuzzy name resolution, bulk identifier resolution
//! and free-text search.
//!
//! Every request goes through one shared [`RateLimiter`] behind an async
//! mutex, so lookups are issued strictly one after another no matter how
//! many callers hold the client. Transient failures (HTTP 429, 5xx and
//! transport errors) cool the limiter down and re-issue the *same* request
//! up to `max_retries` times before being reported.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::catalog::limiter::RateLimiter;
use crate::clock::Clock;
use crate::config::{self, CatalogPolicy};
use crate::error::{DecklistError, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::models::{
    CatalogCard, CollectionResponse, FailedQuery, FailureKind, ResolvedCard, SearchResponse,
};
use crate::resolver::CancelToken;

const STATUS_NOT_FOUND: u16 = 404;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Result of one bulk identifier lookup.
#[derive(Debug, Clone, Default)]
pub struct BulkLookup {
    /// Resolved cards keyed by lowercased catalog identifier.
    pub found: HashMap<String, ResolvedCard>,
    /// Identifiers that did not resolve, in input order.
    pub failed: Vec<FailedQuery>,
    /// Number of `/cards/collection` requests that were issued.
    pub requests: usize,
}

impl BulkLookup {
    /// The resolved card for `id`, compared case-insensitively.
    pub fn get(&self, id: &str) -> Option<&ResolvedCard> {
        self.found.get(&id.to_ascii_lowercase())
    }

    /// Whether any identifier failed because of the catalog rather than
    /// being absent from a valid response.
    pub fn has_catalog_faults(&self) -> bool {
        self.failed.iter().any(|f| f.kind.is_catalog_fault())
    }
}

pub struct CatalogClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    policy: CatalogPolicy,
    limiter: Mutex<RateLimiter>,
}

impl CatalogClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        base_url: &str,
        policy: CatalogPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            transport,
            base_url: config::normalize_base(base_url),
            policy,
            limiter: Mutex::new(RateLimiter::new(clock, policy.interval)),
        })
    }

    pub fn policy(&self) -> &CatalogPolicy {
        &self.policy
    }

    /// Fuzzy-resolve one card name, optionally restricted to a set.
    pub async fn resolve_by_name(
        &self,
        name: &str,
        set_hint: Option<&str>,
    ) -> std::result::Result<ResolvedCard, FailureKind> {
        let mut request =
            HttpRequest::get(format!("{}/cards/named", self.base_url)).with_query("fuzzy", name);
        if let Some(set) = set_hint {
            request = request.with_query("set", set);
        }

        let mut limiter = self.limiter.lock().await;
        let resp = self.send_paced(&mut limiter, request, name).await?;
        drop(limiter);

        if resp.status == STATUS_NOT_FOUND {
            debug!(query = name, "card not found");
            return Err(FailureKind::NotFound);
        }
        if !resp.is_success() {
            warn!(query = name, status = resp.status, "name lookup rejected");
            return Err(FailureKind::Rejected);
        }
        match resp.json::<CatalogCard>() {
            Ok(card) => {
                debug!(query = name, id = %card.id, "resolved card by name");
                Ok(ResolvedCard::from(card))
            }
            Err(e) => {
                warn!(query = name, "undecodable catalog response: {e}");
                Err(FailureKind::InvalidResponse)
            }
        }
    }

    /// Resolve a set of identifiers through the collection endpoint.
    ///
    /// Identifiers are deduplicated case-insensitively, then sent in
    /// sequential chunks of at most `batch_size`. Only identifiers missing
    /// from a decoded response are `NotFound`; a chunk that keeps failing,
    /// is refused or cannot be decoded marks all of its identifiers with
    /// that failure, and the remaining chunks are still processed.
    pub async fn resolve_by_ids(&self, ids: &[String]) -> BulkLookup {
        match self.resolve_by_ids_until(ids, &CancelToken::new()).await {
            Ok(lookup) => lookup,
            // A fresh token is never cancelled.
            Err(_) => BulkLookup::default(),
        }
    }

    /// As [`resolve_by_ids`](Self::resolve_by_ids), abandoning the lookup with
    /// [`DecklistError::Cancelled`] once `cancel` fires. The chunk in flight
    /// completes but its result is discarded.
    pub async fn resolve_by_ids_until(
        &self,
        ids: &[String],
        cancel: &CancelToken,
    ) -> Result<BulkLookup> {
        let unique = dedup_preserving_order(ids);
        let mut lookup = BulkLookup::default();
        let url = format!("{}/cards/collection", self.base_url);

        let mut limiter = self.limiter.lock().await;
        for chunk in unique.chunks(self.policy.batch_size) {
            if cancel.is_cancelled() {
                return Err(DecklistError::Cancelled);
            }
            let identifiers: Vec<_> = chunk.iter().map(|id| json!({ "id": id })).collect();
            let request = HttpRequest::post(url.clone(), json!({ "identifiers": identifiers }));
            let label = format!("collection chunk of {}", chunk.len());
            lookup.requests += 1;

            let outcome = self.send_paced(&mut limiter, request, &label).await;
            if cancel.is_cancelled() {
                return Err(DecklistError::Cancelled);
            }

            let kind = match outcome {
                Ok(resp) if resp.is_success() => match resp.json::<CollectionResponse>() {
                    Ok(body) => {
                        if !body.not_found.is_empty() {
                            debug!(
                                count = body.not_found.len(),
                                "catalog reported unmatched identifiers"
                            );
                        }
                        for card in body.data {
                            let key = card.id.to_ascii_lowercase();
                            lookup.found.insert(key, ResolvedCard::from(card));
                        }
                        None
                    }
                    Err(e) => {
                        warn!("undecodable collection response: {e}");
                        Some(FailureKind::InvalidResponse)
                    }
                },
                Ok(resp) => {
                    warn!(status = resp.status, "collection request rejected");
                    Some(FailureKind::Rejected)
                }
                Err(kind) => Some(kind),
            };

            for id in chunk {
                if let Some(kind) = kind {
                    lookup.failed.push(FailedQuery::new(id.clone(), kind));
                } else if lookup.get(id).is_none() {
                    lookup.failed.push(FailedQuery::new(id.clone(), FailureKind::NotFound));
                }
            }
        }

        debug!(
            requested = unique.len(),
            resolved = lookup.found.len(),
            failed = lookup.failed.len(),
            requests = lookup.requests,
            "bulk lookup finished"
        );
        Ok(lookup)
    }

    /// Free-text card search, used to add single cards to a deck.
    ///
    /// A query with no matches returns an empty list.
    pub async fn search(&self, query: &str) -> Result<Vec<ResolvedCard>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DecklistError::InvalidArgument("empty search query".into()));
        }
        let request =
            HttpRequest::get(format!("{}/cards/search", self.base_url)).with_query("q", query);

        let mut limiter = self.limiter.lock().await;
        let resp = self
            .send_paced(&mut limiter, request, query)
            .await
            .map_err(|kind| {
                DecklistError::CatalogUnavailable(format!("search '{query}': {kind}"))
            })?;
        drop(limiter);

        if resp.status == STATUS_NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.is_success() {
            return Err(DecklistError::CatalogUnavailable(format!(
                "search '{query}' returned status {}",
                resp.status
            )));
        }
        let body: SearchResponse = resp.json()?;
        Ok(body.data.into_iter().map(ResolvedCard::from).collect())
    }

    /// Send one request on the shared schedule, retrying transient failures.
    ///
    /// Returns the first non-transient response, which may still carry a
    /// client-error status for the caller to interpret.
    async fn send_paced(
        &self,
        limiter: &mut RateLimiter,
        request: HttpRequest,
        label: &str,
    ) -> std::result::Result<HttpResponse, FailureKind> {
        let mut retries = 0;
        loop {
            limiter.acquire().await;
            let kind = match self.transport.send(request.clone()).await {
                Ok(resp) if resp.status == STATUS_TOO_MANY_REQUESTS => FailureKind::RateLimited,
                Ok(resp) if resp.status >= 500 => {
                    warn!(query = label, status = resp.status, "catalog server error");
                    FailureKind::Network
                }
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    warn!(query = label, "catalog request failed: {e}");
                    FailureKind::Network
                }
            };

            limiter.cool_down(self.policy.cooldown);
            if retries >= self.policy.max_retries {
                warn!(query = label, retries, "giving up after {kind}");
                return Err(kind);
            }
            retries += 1;
            warn!(
                query = label,
                attempt = retries,
                wait_ms = limiter.pending_delay().as_millis() as u64,
                "{kind}, retrying"
            );
        }
    }
}

fn dedup_preserving_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.to_ascii_lowercase()))
        .cloned()
        .collect()
}
