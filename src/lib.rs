//! Task Board Engine
//!
//! Drag-and-drop reordering for a Kanban board:
//! - models: cards, columns, drag payloads (match backend entities)
//! - store: the single owned working set
//! - resolver: pointer Y -> insertion marker
//! - drag: drag gesture state machine
//! - reconcile: optimistic apply + backend write
//! - projection: per-column views
//! - commands: REST backend bindings

pub mod commands;
pub mod config;
pub mod drag;
pub mod error;
pub mod models;
pub mod projection;
pub mod reconcile;
pub mod resolver;
pub mod store;

pub use commands::{fetch_snapshot, BoardApi, HttpBoardApi};
pub use config::BoardConfig;
pub use drag::{DragOutcome, DragSession, DragState, DropIntent};
pub use error::{BoardError, BoardResult};
pub use models::{Card, CardId, Column, DragPayload, Priority};
pub use projection::{project_board, project_column, BoardView, ColumnView};
pub use reconcile::{
    settle, Commit, NoOpReason, PendingPersist, ReconcileOutcome, Reconciler, Revert,
};
pub use resolver::{
    resolve_insertion_index, ColumnLayout, InsertionMarker, MarkerSlot, ResolvedMarker,
};
pub use store::{BoardSnapshot, BoardStore};
