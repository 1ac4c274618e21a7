//! Deck persistence through the tournament backend's REST API.
//!
//! The backend stores a deck's contents as the canonical deck-list string;
//! every other field is plain metadata. The current player is always passed
//! in explicitly as an `owner_id`.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::aggregate::DeckAggregate;
use crate::error::{DecklistError, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::models::{DeckPatch, DeckRecord, NewDeck};

// ---------------------------------------------------------------------------
// DeckApi
// ---------------------------------------------------------------------------

/// Query interface for the backend's `/decks` endpoints.
pub struct DeckApi<'a> {
    transport: &'a dyn HttpTransport,
    base_url: &'a str,
}

impl<'a> DeckApi<'a> {
    pub fn new(transport: &'a dyn HttpTransport, base_url: &'a str) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// `GET /decks`
    pub async fn list(&self) -> Result<Vec<DeckRecord>> {
        let resp = self
            .transport
            .send(HttpRequest::get(format!("{}/decks", self.base_url)))
            .await?;
        decode(resp, "decks")
    }

    /// All decks owned by `owner_id`. The backend has no owner filter, so the
    /// full list is fetched and filtered here.
    pub async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<DeckRecord>> {
        let decks = self.list().await?;
        Ok(decks.into_iter().filter(|d| d.player_id == owner_id).collect())
    }

    /// `GET /decks/{id}`
    pub async fn get(&self, deck_id: i64) -> Result<DeckRecord> {
        let resp = self
            .transport
            .send(HttpRequest::get(format!("{}/decks/{}", self.base_url, deck_id)))
            .await?;
        decode(resp, &format!("deck {deck_id}"))
    }

    /// Fetch a deck for editing, refusing decks owned by another player.
    pub async fn get_owned(&self, deck_id: i64, owner_id: i64) -> Result<DeckRecord> {
        let record = self.get(deck_id).await?;
        if record.player_id != owner_id {
            return Err(DecklistError::NotOwner { deck_id, owner_id });
        }
        Ok(record)
    }

    /// `POST /decks`
    pub async fn create(&self, deck: &NewDeck) -> Result<DeckRecord> {
        let body = serde_json::to_value(deck)?;
        let resp = self
            .transport
            .send(HttpRequest::post(format!("{}/decks", self.base_url), body))
            .await?;
        debug!(status = resp.status, name = %deck.deck_name, "created deck");
        decode(resp, "new deck")
    }

    /// `PATCH /decks/{id}`
    pub async fn update(&self, deck_id: i64, patch: &DeckPatch) -> Result<DeckRecord> {
        let body = serde_json::to_value(patch)?;
        let resp = self
            .transport
            .send(HttpRequest::patch(
                format!("{}/decks/{}", self.base_url, deck_id),
                body,
            ))
            .await?;
        debug!(status = resp.status, deck_id, "updated deck");
        decode(resp, &format!("deck {deck_id}"))
    }
}

fn decode<T: DeserializeOwned>(resp: HttpResponse, what: &str) -> Result<T> {
    if resp.status == 404 {
        return Err(DecklistError::NotFound(what.to_string()));
    }
    if !resp.is_success() {
        return Err(DecklistError::Backend {
            status: resp.status,
            message: resp.body,
        });
    }
    resp.json()
}

// ---------------------------------------------------------------------------
// DeckDraft
// ---------------------------------------------------------------------------

/// A deck being edited, not yet submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckDraft {
    pub name: String,
    pub format: String,
    pub description: String,
    pub cards: DeckAggregate,
}

impl DeckDraft {
    /// Submission is refused for a deck with no cards or missing metadata.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DecklistError::Validation("deck name is required".into()));
        }
        if self.format.trim().is_empty() {
            return Err(DecklistError::Validation("deck format is required".into()));
        }
        if self.cards.is_empty() {
            return Err(DecklistError::Validation("deck has no cards".into()));
        }
        Ok(())
    }

    pub fn to_new_deck(&self, owner_id: i64, creation_date: &str) -> Result<NewDeck> {
        self.validate()?;
        Ok(NewDeck {
            deck_name: self.name.trim().to_string(),
            format: self.format.clone(),
            deck_description: self.description.clone(),
            deck_list: self.cards.serialize(),
            player_id: owner_id,
            creation_date: creation_date.to_string(),
        })
    }

    /// Patch for an existing deck. The creation date is never resent.
    pub fn to_patch(&self, owner_id: i64) -> Result<DeckPatch> {
        self.validate()?;
        Ok(DeckPatch {
            deck_name: Some(self.name.trim().to_string()),
            format: Some(self.format.clone()),
            deck_description: Some(self.description.clone()),
            deck_list: Some(self.cards.serialize()),
            player_id: Some(owner_id),
            creation_date: None,
        })
    }
}
