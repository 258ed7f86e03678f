//! Board Entity Store
//!
//! Single owner of the board's working set. Array position is rendering
//! order, so a column's order is the order its cards appear in `cards`.

use std::collections::HashMap;

use crate::models::{Card, CardId, Column};

/// Everything fetched for one board load
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardSnapshot {
    pub columns: Vec<Column>,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardStore {
    /// Every live card, all columns interleaved
    cards: Vec<Card>,
    /// Status catalog, sorted by `order`
    columns: Vec<Column>,
    /// Soft-deleted cards
    trash: Vec<Card>,
    /// Committed moves per card; never reset by reloads
    revisions: HashMap<CardId, u64>,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn trash(&self) -> &[Card] {
        &self.trash
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    /// Column name and index within that column's view
    pub fn locate(&self, card_id: &str) -> Option<(&str, usize)> {
        let card = self.card(card_id)?;
        let index = self
            .cards
            .iter()
            .filter(|c| c.column == card.column)
            .position(|c| c.id == card_id)?;
        Some((card.column.as_str(), index))
    }

    /// How many moves have been committed for `card_id`
    pub fn revision(&self, card_id: &str) -> u64 {
        self.revisions.get(card_id).copied().unwrap_or(0)
    }

    /// Record a committed move and return the card's new revision
    pub fn bump_revision(&mut self, card_id: &str) -> u64 {
        let revision = self.revisions.entry(card_id.to_string()).or_insert(0);
        *revision += 1;
        *revision
    }

    pub fn column_len(&self, name: &str) -> usize {
        self.cards.iter().filter(|c| c.column == name).count()
    }

    /// Swap in a freshly loaded card list in one step
    pub fn replace_all(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }

    pub fn replace_columns(&mut self, mut columns: Vec<Column>) {
        columns.sort_by_key(|c| c.order);
        self.columns = columns;
    }

    pub fn apply_snapshot(&mut self, snapshot: BoardSnapshot) {
        log::info!(
            "[STORE] Loaded {} columns, {} cards",
            snapshot.columns.len(),
            snapshot.cards.len()
        );
        self.replace_columns(snapshot.columns);
        self.replace_all(snapshot.cards);
    }

    /// Move a card to `destination_index` within the destination column.
    ///
    /// The index counts the destination column's cards *without* the moving
    /// card and is clamped to the end. Unknown ids leave the store untouched.
    pub fn move_card(
        &mut self,
        card_id: &str,
        destination_column: &str,
        destination_index: usize,
    ) -> &[Card] {
        let Some((current_column, current_index)) = self.locate(card_id) else {
            log::debug!("[STORE] move_card: no card {}", card_id);
            return &self.cards;
        };

        if current_column == destination_column {
            let last = self.column_len(destination_column) - 1;
            if destination_index.min(last) == current_index {
                return &self.cards;
            }
        }

        let Some(from) = self.cards.iter().position(|c| c.id == card_id) else {
            return &self.cards;
        };
        let mut card = self.cards.remove(from);
        card.column = destination_column.to_string();

        let at = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.column == destination_column)
            .nth(destination_index)
            .map(|(pos, _)| pos)
            .unwrap_or(self.cards.len());
        self.cards.insert(at, card);

        &self.cards
    }

    /// Add a new card, or replace an existing one in place
    pub fn insert_card(&mut self, card: Card) {
        match self.cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card,
            None => self.cards.push(card),
        }
    }

    /// Soft-delete: the card leaves every column but is kept in the trash
    pub fn trash_card(&mut self, card_id: &str) -> bool {
        let Some(pos) = self.cards.iter().position(|c| c.id == card_id) else {
            return false;
        };
        let card = self.cards.remove(pos);
        self.trash.push(card);
        true
    }

    /// Bring a trashed card back at the end of its column
    pub fn restore_card(&mut self, card_id: &str) -> bool {
        let Some(pos) = self.trash.iter().position(|c| c.id == card_id) else {
            return false;
        };
        let card = self.trash.remove(pos);
        self.cards.push(card);
        true
    }
}
