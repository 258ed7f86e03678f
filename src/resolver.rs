//! Insertion-Point Resolver
//!
//! Turns a pointer Y coordinate into a drop slot within one column. Works on
//! plain numbers supplied by whatever renders the board.
//!
//! A column of N cards has N+1 markers: one in front of each card (its top is
//! the card's top edge) and one after the last card (its top is the column
//! bottom). The pointer lands on the first marker whose bias line
//! (`top + bias`) is still below it; past every bias line it lands on the
//! last marker.

use crate::models::CardId;

/// What a marker sits in front of
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSlot {
    Before(CardId),
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertionMarker {
    pub slot: MarkerSlot,
    /// Vertical screen position
    pub top: f64,
}

/// Marker chosen for a pointer position
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMarker {
    /// Index in the column's current view (the dragged card included)
    pub index: usize,
    pub slot: MarkerSlot,
}

/// Marker geometry of one column, as last measured
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub column: String,
    markers: Vec<InsertionMarker>,
}

impl ColumnLayout {
    /// Build from card tops in display order plus the column's bottom edge.
    /// An empty column still gets its single end marker.
    pub fn from_card_tops<I>(column: impl Into<String>, cards: I, column_bottom: f64) -> Self
    where
        I: IntoIterator<Item = (CardId, f64)>,
    {
        let mut markers: Vec<InsertionMarker> = cards
            .into_iter()
            .map(|(id, top)| InsertionMarker {
                slot: MarkerSlot::Before(id),
                top,
            })
            .collect();
        markers.push(InsertionMarker {
            slot: MarkerSlot::End,
            top: column_bottom,
        });
        Self {
            column: column.into(),
            markers,
        }
    }

    pub fn markers(&self) -> &[InsertionMarker] {
        &self.markers
    }

    pub fn resolve(&self, pointer_y: f64, bias: f64) -> ResolvedMarker {
        let tops: Vec<f64> = self.markers.iter().map(|m| m.top).collect();
        let index = resolve_insertion_index(&tops, pointer_y, bias);
        let slot = self
            .markers
            .get(index)
            .map(|m| m.slot.clone())
            .unwrap_or(MarkerSlot::End);
        ResolvedMarker { index, slot }
    }
}

/// Index of the marker a pointer at `pointer_y` selects.
///
/// Among markers whose offset `pointer_y - (top + bias)` is negative, the one
/// closest to zero wins; ties keep the earlier marker. No qualifying marker
/// (or a NaN pointer) selects the last one.
pub fn resolve_insertion_index(marker_tops: &[f64], pointer_y: f64, bias: f64) -> usize {
    let last = marker_tops.len().saturating_sub(1);
    let (_, best) = marker_tops
        .iter()
        .enumerate()
        .fold((f64::NEG_INFINITY, last), |(best_offset, best), (i, top)| {
            let offset = pointer_y - (top + bias);
            if offset < 0.0 && offset > best_offset {
                (offset, i)
            } else {
                (best_offset, best)
            }
        });
    best
}
