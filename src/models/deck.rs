use serde::{Deserialize, Serialize};

use crate::aggregate::DeckAggregate;

// ---------------------------------------------------------------------------
// DeckLineEntry — One parsed deck-list line
// ---------------------------------------------------------------------------

/// How a parsed line names its card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardRef {
    /// Human-authored card name, resolved by fuzzy lookup.
    Name(String),
    /// Catalog identifier from a persisted deck list.
    Id(String),
}

impl CardRef {
    pub fn as_str(&self) -> &str {
        match self {
            CardRef::Name(s) | CardRef::Id(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckLineEntry {
    pub quantity: u32,
    pub card: CardRef,
    /// Set code from a `(SET)` suffix. Never part of the card name.
    pub set_hint: Option<String>,
    pub collector_number: Option<String>,
}

// ---------------------------------------------------------------------------
// DeckCardLine — The unit held by a deck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCardLine {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub image: String,
}

impl DeckCardLine {
    /// The `normal`-sized rendition of the stored `small` image.
    pub fn normal_image(&self) -> String {
        self.image.replace("/small/", "/normal/")
    }
}

// ---------------------------------------------------------------------------
// Backend wire types
// ---------------------------------------------------------------------------

/// A deck as returned by `GET /decks` and `GET /decks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRecord {
    pub id: i64,
    pub deck_name: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub deck_description: String,
    #[serde(default)]
    pub deck_list: String,
    #[serde(rename = "player_id")]
    pub player_id: i64,
    #[serde(default)]
    pub creation_date: String,
}

/// Body of `POST /decks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeck {
    pub deck_name: String,
    pub format: String,
    pub deck_description: String,
    pub deck_list: String,
    #[serde(rename = "player_id")]
    pub player_id: i64,
    pub creation_date: String,
}

/// Body of `PATCH /decks/{id}`. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_list: Option<String>,
    #[serde(rename = "player_id", skip_serializing_if = "Option::is_none")]
    pub player_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Deck — Domain view of a persisted deck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub format: String,
    pub description: String,
    pub creation_date: String,
    pub owner_id: i64,
    pub cards: DeckAggregate,
}

impl Deck {
    pub fn from_record(record: DeckRecord, cards: DeckAggregate) -> Self {
        Self {
            id: record.id,
            name: record.deck_name,
            format: record.format,
            description: record.deck_description,
            creation_date: record.creation_date,
            owner_id: record.player_id,
            cards,
        }
    }
}
