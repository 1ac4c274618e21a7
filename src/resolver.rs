//! Deck resolution passes.
//!
//! A pass takes a block of deck-list text, parses every line, resolves the
//! cards against the catalog and merges the results by card identifier.
//! Import text is name-based and resolved one fuzzy lookup at a time;
//! persisted (canonical) text is identifier-based and resolved in bulk.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::aggregate::DeckAggregate;
use crate::catalog::CatalogClient;
use crate::error::{DecklistError, Result};
use crate::models::{DeckCardLine, DeckLineEntry, FailedQuery, FailureKind, ResolvedCard};
use crate::parser;

type NameKey = (String, Option<String>);
type LookupOutcome = std::result::Result<ResolvedCard, FailureKind>;

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// Cooperative cancellation for a resolution pass.
///
/// Clones share state. The pass checks the token after every network call,
/// so a request already in flight completes but its result is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DecklistError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Human-authored `"<qty> <name> (SET) <number>"` lines.
    Import,
    /// Persisted `"<qty> <id>"` lines.
    CanonicalReload,
}

/// How far an import pass has got, in deck-list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Merged cards in first-seen order, one line per identifier.
    pub cards: Vec<DeckCardLine>,
    /// Every line or card that could not be resolved.
    pub failed: Vec<FailedQuery>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// One user-facing message listing every failed query, or `None` when
    /// nothing failed.
    pub fn summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let mut message = format!("Could not import {} card(s):", self.failed.len());
        for failure in &self.failed {
            message.push('\n');
            message.push_str(&failure.to_string());
        }
        Some(message)
    }
}

// ---------------------------------------------------------------------------
// DeckResolver
// ---------------------------------------------------------------------------

/// Runs resolution passes against a borrowed [`CatalogClient`].
pub struct DeckResolver<'a> {
    catalog: &'a CatalogClient,
}

impl<'a> DeckResolver<'a> {
    pub fn new(catalog: &'a CatalogClient) -> Self {
        Self { catalog }
    }

    /// Resolve a whole deck list.
    ///
    /// Per-line and per-card failures never abort the pass; they are
    /// collected into [`Resolution::failed`]. The pass itself fails only when
    /// cancelled, or in [`ResolveMode::CanonicalReload`] when the catalog
    /// could not be reached, refused the lookup or answered with an
    /// unreadable body ([`DecklistError::CatalogUnavailable`]).
    pub async fn resolve(
        &self,
        raw_text: &str,
        mode: ResolveMode,
        cancel: &CancelToken,
    ) -> Result<Resolution> {
        self.resolve_with_progress(raw_text, mode, cancel, |_| {}).await
    }

    /// As [`resolve`](Self::resolve), calling `on_progress` after each entry
    /// of an import, and once when a reload's bulk lookup has completed.
    pub async fn resolve_with_progress<F>(
        &self,
        raw_text: &str,
        mode: ResolveMode,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<Resolution>
    where
        F: FnMut(Progress) + Send,
    {
        cancel.check()?;
        let resolution = match mode {
            ResolveMode::Import => self.resolve_import(raw_text, cancel, &mut on_progress).await?,
            ResolveMode::CanonicalReload => {
                self.resolve_canonical(raw_text, cancel, &mut on_progress).await?
            }
        };

        info!(
            ?mode,
            resolved = resolution.cards.len(),
            failed = resolution.failed.len(),
            "resolution pass finished"
        );
        Ok(resolution)
    }

    /// Read a newline-delimited import file and resolve it.
    pub async fn import_file(&self, path: &Path, cancel: &CancelToken) -> Result<Resolution> {
        self.import_file_with_progress(path, cancel, |_| {}).await
    }

    pub async fn import_file_with_progress<F>(
        &self,
        path: &Path,
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<Resolution>
    where
        F: FnMut(Progress) + Send,
    {
        let text = tokio::fs::read_to_string(path).await?;
        if text.trim().is_empty() {
            return Err(DecklistError::Validation(format!(
                "deck list file {} is empty",
                path.display()
            )));
        }
        self.resolve_with_progress(&text, ResolveMode::Import, cancel, on_progress)
            .await
    }

    async fn resolve_import(
        &self,
        raw_text: &str,
        cancel: &CancelToken,
        on_progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<Resolution> {
        let mut merged = DeckAggregate::new();
        let mut failed = Vec::new();
        // Pass-local: identical name/set queries are fetched once.
        let mut seen: HashMap<NameKey, LookupOutcome> = HashMap::new();

        let lines: Vec<(&str, Result<DeckLineEntry>)> = raw_text
            .lines()
            .filter_map(|line| match parser::parse_import_line(line) {
                Ok(None) => None,
                Ok(Some(entry)) => Some((line, Ok(entry))),
                Err(e) => Some((line, Err(e))),
            })
            .collect();
        let total = lines.len();
        info!(total, "importing deck list");

        for (index, (line, parsed)) in lines.into_iter().enumerate() {
            let progress = Progress {
                processed: index + 1,
                total,
            };
            let entry = match parsed {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("{e}");
                    failed.push(FailedQuery::new(line.trim(), FailureKind::Parse));
                    on_progress(progress);
                    continue;
                }
            };

            let name = entry.card.as_str().to_string();
            let key = (name.to_lowercase(), entry.set_hint.clone());
            let outcome = match seen.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    cancel.check()?;
                    let outcome = self
                        .catalog
                        .resolve_by_name(&name, entry.set_hint.as_deref())
                        .await;
                    cancel.check()?;
                    seen.insert(key, outcome.clone());
                    outcome
                }
            };

            match outcome {
                Ok(card) => merged.add_or_merge_card(card_line(&card, entry.quantity)),
                Err(kind) => {
                    warn!(query = %name, "card not imported: {kind}");
                    failed.push(FailedQuery::new(name, kind));
                }
            }
            debug!(processed = progress.processed, total, "import progress");
            on_progress(progress);
        }

        Ok(Resolution {
            cards: merged.into_cards(),
            failed,
        })
    }

    async fn resolve_canonical(
        &self,
        raw_text: &str,
        cancel: &CancelToken,
        on_progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<Resolution> {
        let mut entries: Vec<DeckLineEntry> = Vec::new();
        let mut failed = Vec::new();

        for line in raw_text.lines() {
            match parser::parse_canonical_line(line) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => {
                    warn!("{e}");
                    failed.push(FailedQuery::new(line.trim(), FailureKind::Parse));
                }
            }
        }

        let ids: Vec<String> = entries.iter().map(|e| e.card.as_str().to_string()).collect();
        let lookup = self.catalog.resolve_by_ids_until(&ids, cancel).await?;
        cancel.check()?;

        if let Some(fault) = lookup.failed.iter().find(|f| f.kind.is_catalog_fault()) {
            let count = lookup.failed.iter().filter(|f| f.kind.is_catalog_fault()).count();
            return Err(DecklistError::CatalogUnavailable(format!(
                "{count} card identifier(s) could not be fetched ({})",
                fault.kind
            )));
        }

        let mut merged = DeckAggregate::new();
        for entry in &entries {
            if let Some(card) = lookup.get(entry.card.as_str()) {
                merged.add_or_merge_card(card_line(card, entry.quantity));
            }
        }
        let total = entries.len() + failed.len();
        on_progress(Progress {
            processed: total,
            total,
        });

        failed.extend(lookup.failed);

        Ok(Resolution {
            cards: merged.into_cards(),
            failed,
        })
    }
}

fn card_line(card: &ResolvedCard, quantity: u32) -> DeckCardLine {
    DeckCardLine {
        id: card.id.clone(),
        name: card.name.clone(),
        quantity,
        image: card.image().to_string(),
    }
}
