//! Column Projection
//!
//! Per-column views derived from the store on demand. Views borrow cards,
//! they never copy them.

use crate::models::{Card, Column};
use crate::store::BoardStore;

/// Cards of one column in store order
pub fn project_column<'a>(cards: &'a [Card], column: &str) -> Vec<&'a Card> {
    cards.iter().filter(|c| c.column == column).collect()
}

#[derive(Debug)]
pub struct ColumnView<'a> {
    pub column: &'a Column,
    pub cards: Vec<&'a Card>,
}

#[derive(Debug)]
pub struct BoardView<'a> {
    /// Catalog order
    pub columns: Vec<ColumnView<'a>>,
    /// Cards whose `column` names no catalog entry
    pub orphans: Vec<&'a Card>,
}

impl<'a> BoardView<'a> {
    pub fn column(&self, name: &str) -> Option<&ColumnView<'a>> {
        self.columns.iter().find(|v| v.column.name == name)
    }
}

pub fn project_board(store: &BoardStore) -> BoardView<'_> {
    let columns: Vec<ColumnView<'_>> = store
        .columns()
        .iter()
        .map(|column| ColumnView {
            column,
            cards: project_column(store.cards(), &column.name),
        })
        .collect();

    let orphans: Vec<&Card> = store
        .cards()
        .iter()
        .filter(|c| store.column(&c.column).is_none())
        .collect();
    if !orphans.is_empty() {
        log::warn!("[BOARD] {} card(s) reference unknown columns", orphans.len());
    }

    BoardView { columns, orphans }
}
