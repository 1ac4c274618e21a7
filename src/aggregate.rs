//! In-memory deck contents and their canonical text encoding.
//!
//! A [`DeckAggregate`] holds at most one [`DeckCardLine`] per card
//! identifier, in insertion order. Its canonical form is one
//! `"<quantity> <id>"` record per line; that string is what gets persisted.

use crate::error::{DecklistError, Result};
use crate::models::{DeckCardLine, FailedQuery, ResolvedCard};
use crate::resolver::{CancelToken, DeckResolver, ResolveMode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckAggregate {
    cards: Vec<DeckCardLine>,
}

impl DeckAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an aggregate from its canonical string.
    ///
    /// Identifiers the catalog does not know are returned alongside the
    /// aggregate. An unreachable catalog fails the whole load.
    pub async fn load(
        resolver: &DeckResolver<'_>,
        canonical: &str,
        cancel: &CancelToken,
    ) -> Result<(Self, Vec<FailedQuery>)> {
        let resolution = resolver
            .resolve(canonical, ResolveMode::CanonicalReload, cancel)
            .await?;
        let mut aggregate = Self::new();
        aggregate.merge_resolved(resolution.cards);
        Ok((aggregate, resolution.failed))
    }

    /// Append `line`, or add its quantity to the existing line with the same id.
    pub fn add_or_merge_card(&mut self, line: DeckCardLine) {
        match self.cards.iter_mut().find(|c| c.id == line.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.cards.push(line),
        }
    }

    /// Add one copy of a card picked from a search.
    pub fn add_card(&mut self, card: &ResolvedCard) {
        self.add_or_merge_card(DeckCardLine {
            id: card.id.clone(),
            name: card.name.clone(),
            quantity: 1,
            image: card.image().to_string(),
        });
    }

    /// Remove the line for `id`. Returns whether a line was removed.
    pub fn remove_card(&mut self, id: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        self.cards.len() != before
    }

    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Err(DecklistError::InvalidQuantity(quantity));
        }
        let line = self
            .cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DecklistError::NotFound(format!("card {id} is not in the deck")))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn merge_resolved<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = DeckCardLine>,
    {
        for line in lines {
            self.add_or_merge_card(line);
        }
    }

    /// The canonical deck-list string, in current order.
    pub fn serialize(&self) -> String {
        self.cards
            .iter()
            .map(|c| format!("{} {}", c.quantity, c.id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn get(&self, id: &str) -> Option<&DeckCardLine> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn cards(&self) -> &[DeckCardLine] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<DeckCardLine> {
        self.cards
    }

    /// Number of distinct cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u32 {
        self.cards.iter().map(|c| c.quantity).sum()
    }
}

impl FromIterator<DeckCardLine> for DeckAggregate {
    fn from_iter<T: IntoIterator<Item = DeckCardLine>>(iter: T) -> Self {
        let mut aggregate = Self::new();
        aggregate.merge_resolved(iter);
        aggregate
    }
}
