#[derive(Debug, thiserror::Error)]
pub enum DecklistError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unparsable deck line '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("Invalid quantity {0}: quantities must be at least 1")]
    InvalidQuantity(u32),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Card catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Deck {deck_id} is not owned by player {owner_id}")]
    NotOwner { deck_id: i64, owner_id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resolution pass was cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, DecklistError>;
