//! Drag Session State Machine
//!
//! `Idle -> Dragging -> (Hovering)* -> Dropped | Cancelled -> Idle`
//!
//! One gesture at a time, board-wide. Nothing here touches the store: a drop
//! only produces a [`DropIntent`] for the reconciler to commit.

use crate::config::DEFAULT_DROP_BIAS_PX;
use crate::models::DragPayload;
use crate::resolver::{ColumnLayout, ResolvedMarker};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload: DragPayload,
    },
    /// Over a column; `marker` is the one highlighted board-wide
    Hovering {
        payload: DragPayload,
        column: String,
        marker: ResolvedMarker,
    },
}

/// A completed drop, ready to be reconciled
#[derive(Debug, Clone, PartialEq)]
pub struct DropIntent {
    pub payload: DragPayload,
    pub column: String,
    pub marker: ResolvedMarker,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Dropped(DropIntent),
    Cancelled,
    /// Release without a drag in progress (a plain click)
    NoSession,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    state: DragState,
    bias: f64,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(DEFAULT_DROP_BIAS_PX)
    }
}

impl DragSession {
    pub fn new(bias: f64) -> Self {
        Self {
            state: DragState::Idle,
            bias,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { payload } | DragState::Hovering { payload, .. } => Some(payload),
        }
    }

    /// Lift a card. Ignored while another drag is in progress.
    pub fn begin(&mut self, payload: DragPayload) -> bool {
        if self.is_dragging() {
            log::debug!("[DND] begin({}) ignored, drag already active", payload.card_id);
            return false;
        }
        log::debug!("[DND] Drag start: card={} from={}", payload.card_id, payload.source_column);
        self.state = DragState::Dragging { payload };
        true
    }

    /// Pointer moved inside a column: recompute that column's marker
    pub fn hover(&mut self, layout: &ColumnLayout, pointer_y: f64) -> Option<&ResolvedMarker> {
        let payload = self.payload()?.clone();
        let marker = layout.resolve(pointer_y, self.bias);
        self.state = DragState::Hovering {
            payload,
            column: layout.column.clone(),
            marker,
        };
        self.active_marker().map(|(_, marker)| marker)
    }

    /// Pointer left a column; the drag itself continues
    pub fn leave(&mut self, column: &str) {
        let payload = match &self.state {
            DragState::Hovering {
                payload,
                column: hovered,
                ..
            } if hovered == column => payload.clone(),
            _ => return,
        };
        self.state = DragState::Dragging { payload };
    }

    pub fn active_marker(&self) -> Option<(&str, &ResolvedMarker)> {
        match &self.state {
            DragState::Hovering { column, marker, .. } => Some((column.as_str(), marker)),
            _ => None,
        }
    }

    pub fn is_column_active(&self, column: &str) -> bool {
        self.active_marker().is_some_and(|(hovered, _)| hovered == column)
    }

    /// Release over `layout`'s column, resolving the slot at the release point
    pub fn drop_on(&mut self, layout: &ColumnLayout, pointer_y: f64) -> DragOutcome {
        if self.hover(layout, pointer_y).is_none() {
            return DragOutcome::NoSession;
        }
        self.release()
    }

    /// Release wherever the pointer is: commits the active marker if any,
    /// otherwise the drag is cancelled
    pub fn release(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::NoSession,
            DragState::Dragging { payload } => {
                log::debug!("[DND] Drag cancelled: card={}", payload.card_id);
                DragOutcome::Cancelled
            }
            DragState::Hovering { payload, column, marker } => {
                log::debug!(
                    "[DND] Drop: card={} column={} marker={}",
                    payload.card_id,
                    column,
                    marker.index
                );
                DragOutcome::Dropped(DropIntent { payload, column, marker })
            }
        }
    }

    pub fn cancel(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::NoSession,
            _ => DragOutcome::Cancelled,
        }
    }
}
