use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CatalogCard — Card object as returned by the card catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    pub name: Option<String>,
    pub mana_cost: Option<String>,
    pub image_uris: Option<ImageUris>,
}

/// The subset of the catalog's card object this crate consumes.
///
/// Single-faced cards carry `image_uris` at the top level. Multi-faced
/// cards (transform, modal double-faced) omit it and put one `image_uris`
/// per entry in `card_faces` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCard {
    pub id: String,
    pub name: String,
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub set_name: String,
    pub image_uris: Option<ImageUris>,
    pub card_faces: Option<Vec<CardFace>>,
}

impl CatalogCard {
    fn front_face(&self) -> Option<&CardFace> {
        self.card_faces.as_ref().and_then(|faces| faces.first())
    }
}

// ---------------------------------------------------------------------------
// ResolvedCard — Normalized lookup result
// ---------------------------------------------------------------------------

/// A card successfully resolved against the catalog, with its image
/// references flattened out of the single/multi-faced shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCard {
    pub id: String,
    pub name: String,
    pub mana_cost: Option<String>,
    pub type_line: String,
    pub rarity: String,
    pub set_name: String,
    pub image_url: Option<String>,
    pub alternate_face_image_url: Option<String>,
}

impl ResolvedCard {
    /// The renderable image: the primary image, else the front face's.
    /// Empty when the catalog provided neither.
    pub fn image(&self) -> &str {
        self.image_url
            .as_deref()
            .or(self.alternate_face_image_url.as_deref())
            .unwrap_or("")
    }
}

impl From<CatalogCard> for ResolvedCard {
    fn from(card: CatalogCard) -> Self {
        let image_url = card.image_uris.as_ref().and_then(|uris| uris.small.clone());
        let face = card.front_face();
        let alternate_face_image_url = face
            .and_then(|f| f.image_uris.as_ref())
            .and_then(|uris| uris.small.clone());
        let mana_cost = card
            .mana_cost
            .clone()
            .or_else(|| face.and_then(|f| f.mana_cost.clone()));

        Self {
            id: card.id,
            name: card.name,
            mana_cost,
            type_line: card.type_line,
            rarity: card.rarity,
            set_name: card.set_name,
            image_url,
            alternate_face_image_url,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog response envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    #[serde(default)]
    pub data: Vec<CatalogCard>,
    #[serde(default)]
    pub not_found: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<CatalogCard>,
}
