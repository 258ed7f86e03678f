//! Reconciliation Layer
//!
//! Commits a drop to the store right away and hands back the persistence
//! call as a future for the caller to spawn. Drag handling never waits on the
//! network.
//!
//! Failures are logged to the operator channel. With rollback enabled the
//! failed outcome also carries a [`Revert`] that [`settle`] applies, unless a
//! a later commit has moved the card since.

use std::sync::Arc;

use crate::commands::BoardApi;
use crate::config::BoardConfig;
use crate::drag::DropIntent;
use crate::error::BoardError;
use crate::models::CardId;
use crate::resolver::MarkerSlot;
use crate::store::BoardStore;

/// Why a drop did not change anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Payload refers to a card no longer on the board
    UnknownCard,
    /// Drop target is not in the status catalog
    UnknownColumn,
    /// Card dropped next to where it already is
    SamePosition,
}

/// Where a card was before an optimistic move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    pub card_id: CardId,
    /// Column the failed move put the card in
    pub moved_to: String,
    /// Card revision right after the failed move
    pub revision: u64,
    pub column: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Persisted { card_id: CardId },
    Failed {
        card_id: CardId,
        error: BoardError,
        revert: Option<Revert>,
    },
}

/// An applied move whose backend write has not been sent yet
pub struct PendingPersist<A: ?Sized> {
    api: Arc<A>,
    card_id: CardId,
    column: String,
    revert: Option<Revert>,
}

impl<A: BoardApi + ?Sized> PendingPersist<A> {
    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub async fn persist(self) -> ReconcileOutcome {
        match self.api.update_card_column(&self.card_id, &self.column).await {
            Ok(()) => {
                log::debug!("[SYNC] Card {} saved in {}", self.card_id, self.column);
                ReconcileOutcome::Persisted { card_id: self.card_id }
            }
            Err(error) => {
                let _ = rolling_logger::error(&format!(
                    "Failed to move card {} to {}: {}",
                    self.card_id, self.column, error
                ));
                ReconcileOutcome::Failed {
                    card_id: self.card_id,
                    error,
                    revert: self.revert,
                }
            }
        }
    }
}

pub enum Commit<A: ?Sized> {
    Applied(PendingPersist<A>),
    Skipped(NoOpReason),
}

impl<A: ?Sized> Commit<A> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Commit::Applied(_))
    }

    pub fn skipped(&self) -> Option<NoOpReason> {
        match self {
            Commit::Skipped(reason) => Some(*reason),
            Commit::Applied(_) => None,
        }
    }
}

pub struct Reconciler<A: ?Sized> {
    api: Arc<A>,
    rollback_on_failure: bool,
}

impl<A: ?Sized> Clone for Reconciler<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            rollback_on_failure: self.rollback_on_failure,
        }
    }
}

impl<A: BoardApi + ?Sized> Reconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            rollback_on_failure: false,
        }
    }

    pub fn from_config(api: Arc<A>, config: &BoardConfig) -> Self {
        Self::new(api).with_rollback(config.rollback_on_failure)
    }

    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_on_failure = enabled;
        self
    }

    /// Apply a drop to the store and return the write still to be sent
    pub fn commit(&self, store: &mut BoardStore, intent: &DropIntent) -> Commit<A> {
        let card_id = intent.payload.card_id.as_str();

        let Some((current_column, current_index)) = store.locate(card_id) else {
            log::debug!("[SYNC] Drop of unknown card {} ignored", card_id);
            return Commit::Skipped(NoOpReason::UnknownCard);
        };
        let current_column = current_column.to_string();

        if store.column(&intent.column).is_none() {
            log::warn!("[SYNC] Drop onto unknown column {} ignored", intent.column);
            return Commit::Skipped(NoOpReason::UnknownColumn);
        }

        if current_column == intent.column
            && lands_in_place(store, card_id, &intent.column, &intent.marker.slot)
        {
            return Commit::Skipped(NoOpReason::SamePosition);
        }

        let index = destination_index(store, card_id, intent);

        log::info!(
            "[SYNC] Move card {}: {}[{}] -> {}[{}]",
            card_id,
            current_column,
            current_index,
            intent.column,
            index
        );
        store.move_card(card_id, &intent.column, index);
        let revision = store.bump_revision(card_id);
        let revert = self.rollback_on_failure.then(|| Revert {
            card_id: card_id.to_string(),
            moved_to: intent.column.clone(),
            revision,
            column: current_column.clone(),
            index: current_index,
        });

        Commit::Applied(PendingPersist {
            api: Arc::clone(&self.api),
            card_id: card_id.to_string(),
            column: intent.column.clone(),
            revert,
        })
    }
}

/// Feed a finished persistence call back into the store.
/// Returns true when a revert was applied.
pub fn settle(store: &mut BoardStore, outcome: &ReconcileOutcome) -> bool {
    let ReconcileOutcome::Failed { revert: Some(revert), .. } = outcome else {
        return false;
    };
    let in_place = matches!(
        store.locate(&revert.card_id),
        Some((column, _)) if column == revert.moved_to
    );
    if !in_place || store.revision(&revert.card_id) != revert.revision {
        log::debug!("[SYNC] Revert of card {} superseded", revert.card_id);
        return false;
    }
    log::info!("[SYNC] Reverting card {} to {}[{}]", revert.card_id, revert.column, revert.index);
    store.move_card(&revert.card_id, &revert.column, revert.index);
    store.bump_revision(&revert.card_id);
    true
}

/// Same-column drop onto the card's own slot or its successor's
fn lands_in_place(store: &BoardStore, card_id: &str, column: &str, slot: &MarkerSlot) -> bool {
    let mut members = store.cards().iter().filter(|c| c.column == column).map(|c| c.id.as_str());
    let successor = members.by_ref().find(|id| *id == card_id).and_then(|_| members.next());
    match slot {
        MarkerSlot::Before(id) => id == card_id || Some(id.as_str()) == successor,
        MarkerSlot::End => successor.is_none(),
    }
}

/// Index in the destination column once the moving card is taken out
fn destination_index(store: &BoardStore, card_id: &str, intent: &DropIntent) -> usize {
    let mut others = store
        .cards()
        .iter()
        .filter(|c| c.column == intent.column && c.id != card_id);

    match &intent.marker.slot {
        MarkerSlot::Before(before) => match others.position(|c| &c.id == before) {
            Some(index) => index,
            None => {
                // stale layout: fall back to the marker's position
                let shifted = match store.locate(card_id) {
                    Some((column, index))
                        if column == intent.column && index < intent.marker.index =>
                    {
                        intent.marker.index - 1
                    }
                    _ => intent.marker.index,
                };
                shifted.min(store.column_len(&intent.column))
            }
        },
        MarkerSlot::End => others.count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::BoardApi;
    use crate::drag::{DragOutcome, DragSession};
    use crate::error::BoardResult;
    use crate::models::{Card, Column, DragPayload};
    use crate::projection::project_column;
    use crate::resolver::{ColumnLayout, ResolvedMarker};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory backend recording column updates
    #[derive(Default)]
    struct MemoryApi {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
        /// Fail only this many leading calls
        fail_first: usize,
    }

    impl MemoryApi {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn failing_once() -> Self {
            Self {
                fail_first: 1,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BoardApi for MemoryApi {
        async fn list_columns(&self) -> BoardResult<Vec<Column>> {
            Ok(Vec::new())
        }

        async fn list_cards(&self, _user_id: Option<&str>) -> BoardResult<Vec<Card>> {
            Ok(Vec::new())
        }

        async fn update_card_column(&self, card_id: &str, column: &str) -> BoardResult<()> {
            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((card_id.to_string(), column.to_string()));
                calls.len()
            };
            if self.fail || attempt <= self.fail_first {
                return Err(BoardError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    fn board() -> BoardStore {
        let mut store = BoardStore::new();
        store.replace_columns(vec![Column::new("s1", "TODO", 1), Column::new("s2", "Done", 2)]);
        store.replace_all(vec![
            Card::new("A", "a", "TODO"),
            Card::new("B", "b", "TODO"),
            Card::new("C", "c", "TODO"),
        ]);
        store
    }

    fn ids(store: &BoardStore, column: &str) -> Vec<String> {
        project_column(store.cards(), column).iter().map(|c| c.id.clone()).collect()
    }

    /// TODO cards 100px tall from y=0
    fn todo_layout(store: &BoardStore) -> ColumnLayout {
        let cards = project_column(store.cards(), "TODO");
        let bottom = cards.len() as f64 * 100.0;
        ColumnLayout::from_card_tops(
            "TODO",
            cards.iter().enumerate().map(|(i, c)| (c.id.clone(), i as f64 * 100.0)),
            bottom,
        )
    }

    fn payload(card: &str) -> DragPayload {
        DragPayload {
            card_id: card.to_string(),
            source_column: "TODO".to_string(),
        }
    }

    fn intent(card: &str, column: &str, index: usize, slot: MarkerSlot) -> DropIntent {
        DropIntent {
            payload: payload(card),
            column: column.to_string(),
            marker: ResolvedMarker { index, slot },
        }
    }

    fn before(id: &str) -> MarkerSlot {
        MarkerSlot::Before(id.to_string())
    }

    async fn drop_and_persist(
        reconciler: &Reconciler<MemoryApi>,
        store: &mut BoardStore,
        intent: &DropIntent,
    ) -> Option<ReconcileOutcome> {
        match reconciler.commit(store, intent) {
            Commit::Applied(pending) => Some(pending.persist().await),
            Commit::Skipped(_) => None,
        }
    }

    #[tokio::test]
    async fn test_drag_c_between_a_and_b() {
        let api = Arc::new(MemoryApi::default());
        let reconciler = Reconciler::new(api.clone());
        let mut store = board();

        let mut session = DragSession::default();
        session.begin(payload("C"));
        // between A's bias line (50) and B's (150)
        let DragOutcome::Dropped(intent) = session.drop_on(&todo_layout(&store), 120.0) else {
            panic!("expected a drop");
        };

        let outcome = drop_and_persist(&reconciler, &mut store, &intent).await;
        assert_eq!(ids(&store, "TODO"), vec!["A", "C", "B"]);
        assert_eq!(outcome, Some(ReconcileOutcome::Persisted { card_id: "C".to_string() }));
        assert_eq!(api.calls(), vec![("C".to_string(), "TODO".to_string())]);
    }

    #[tokio::test]
    async fn test_drag_into_empty_column() {
        let api = Arc::new(MemoryApi::default());
        let reconciler = Reconciler::new(api.clone());
        let mut store = board();

        let layout = ColumnLayout::from_card_tops("Done", Vec::new(), 0.0);
        let resolved = layout.resolve(300.0, 50.0);
        let intent = DropIntent {
            payload: payload("B"),
            column: "Done".to_string(),
            marker: resolved,
        };

        drop_and_persist(&reconciler, &mut store, &intent).await;
        assert_eq!(ids(&store, "TODO"), vec!["A", "C"]);
        assert_eq!(ids(&store, "Done"), vec!["B"]);
        assert_eq!(store.card("B").unwrap().column, "Done");
        assert_eq!(store.cards().iter().filter(|c| c.id == "B").count(), 1);
    }

    #[tokio::test]
    async fn test_deleted_card_drop_changes_nothing() {
        let api = Arc::new(MemoryApi::default());
        let reconciler = Reconciler::new(api.clone());
        let mut store = board();
        store.trash_card("B");
        let before_todo = ids(&store, "TODO");

        let commit = reconciler.commit(&mut store, &intent("B", "Done", 0, MarkerSlot::End));
        assert_eq!(commit.skipped(), Some(NoOpReason::UnknownCard));
        assert_eq!(ids(&store, "TODO"), before_todo);
        assert!(ids(&store, "Done").is_empty());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_drop_next_to_itself_is_noop() {
        let reconciler = Reconciler::new(Arc::new(MemoryApi::default()));
        let mut store = board();
        let snapshot = store.cards().to_vec();

        // own slot, successor slot, and end-of-column for the last card
        let cases = [
            intent("B", "TODO", 1, before("B")),
            intent("B", "TODO", 2, before("C")),
            intent("C", "TODO", 3, MarkerSlot::End),
            intent("A", "TODO", 0, before("A")),
        ];
        for case in &cases {
            let commit = reconciler.commit(&mut store, case);
            assert_eq!(commit.skipped(), Some(NoOpReason::SamePosition), "{:?}", case);
        }
        assert_eq!(store.cards(), snapshot.as_slice());
    }

    #[test]
    fn test_unknown_column_is_skipped() {
        let reconciler = Reconciler::new(Arc::new(MemoryApi::default()));
        let mut store = board();
        let commit = reconciler.commit(&mut store, &intent("A", "Archive", 0, MarkerSlot::End));
        assert_eq!(commit.skipped(), Some(NoOpReason::UnknownColumn));
        assert_eq!(ids(&store, "TODO"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_move_down_within_column() {
        let reconciler = Reconciler::new(Arc::new(MemoryApi::default()));
        let mut store = board();

        let commit = reconciler.commit(&mut store, &intent("A", "TODO", 2, before("C")));
        assert!(commit.is_applied());
        assert_eq!(ids(&store, "TODO"), vec!["B", "A", "C"]);

        let commit = reconciler.commit(&mut store, &intent("B", "TODO", 3, MarkerSlot::End));
        assert!(commit.is_applied());
        assert_eq!(ids(&store, "TODO"), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_stale_marker_falls_back_to_index() {
        let reconciler = Reconciler::new(Arc::new(MemoryApi::default()));
        let mut store = board();
        // marker measured before card "Q" vanished
        reconciler.commit(&mut store, &intent("A", "TODO", 2, before("Q")));
        assert_eq!(ids(&store, "TODO"), vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn test_failure_keeps_optimistic_move_and_logs() {
        let api = Arc::new(MemoryApi::failing());
        let reconciler = Reconciler::new(api.clone());
        let mut store = board();

        let drop = intent("A", "Done", 0, MarkerSlot::End);
        let outcome = drop_and_persist(&reconciler, &mut store, &drop)
            .await
            .unwrap();

        assert!(matches!(&outcome, ReconcileOutcome::Failed { revert: None, .. }));
        assert!(!settle(&mut store, &outcome));
        assert_eq!(ids(&store, "Done"), vec!["A"]);

        let logged = rolling_logger::recent_entries()
            .iter()
            .any(|e| e.message.contains("Failed to move card A to Done"));
        assert!(logged);
    }

    #[tokio::test]
    async fn test_failure_with_rollback_restores_position() {
        let api = Arc::new(MemoryApi::failing());
        let reconciler = Reconciler::new(api).with_rollback(true);
        let mut store = board();

        let drop = intent("B", "Done", 0, MarkerSlot::End);
        let outcome = drop_and_persist(&reconciler, &mut store, &drop)
            .await
            .unwrap();
        assert_eq!(ids(&store, "Done"), vec!["B"]);

        assert!(settle(&mut store, &outcome));
        assert_eq!(ids(&store, "TODO"), vec!["A", "B", "C"]);
        assert!(ids(&store, "Done").is_empty());
    }

    #[tokio::test]
    async fn test_later_move_supersedes_revert() {
        let api = Arc::new(MemoryApi::failing());
        let reconciler = Reconciler::new(api).with_rollback(true);
        let mut store = board();

        let drop = intent("B", "Done", 0, MarkerSlot::End);
        let pending = match reconciler.commit(&mut store, &drop) {
            Commit::Applied(pending) => pending,
            Commit::Skipped(reason) => panic!("skipped: {:?}", reason),
        };
        // user drags B back before the first write fails
        reconciler.commit(&mut store, &intent("B", "TODO", 0, before("A")));

        let outcome = pending.persist().await;
        assert!(!settle(&mut store, &outcome));
        assert_eq!(ids(&store, "TODO"), vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn test_return_to_same_column_supersedes_revert() {
        let api = Arc::new(MemoryApi::failing_once());
        let reconciler = Reconciler::new(api).with_rollback(true);
        let mut store = board();
        store.insert_card(Card::new("D", "d", "Done"));

        let mut pending = Vec::new();
        for drop in [
            intent("A", "Done", 1, MarkerSlot::End),
            intent("A", "TODO", 0, before("B")),
            intent("A", "Done", 0, before("D")),
        ] {
            match reconciler.commit(&mut store, &drop) {
                Commit::Applied(p) => pending.push(p),
                Commit::Skipped(reason) => panic!("skipped: {:?}", reason),
            }
        }
        assert_eq!(ids(&store, "Done"), vec!["A", "D"]);

        let mut outcomes = Vec::new();
        for p in pending {
            outcomes.push(p.persist().await);
        }
        assert!(matches!(outcomes[0], ReconcileOutcome::Failed { revert: Some(_), .. }));

        // the later writes landed first, then the first one failed
        assert!(!settle(&mut store, &outcomes[1]));
        assert!(!settle(&mut store, &outcomes[2]));
        assert!(!settle(&mut store, &outcomes[0]));
        assert_eq!(ids(&store, "Done"), vec!["A", "D"]);
        assert_eq!(ids(&store, "TODO"), vec!["B", "C"]);
    }

    #[tokio::test]
    async fn test_move_within_destination_supersedes_revert() {
        let api = Arc::new(MemoryApi::failing_once());
        let reconciler = Reconciler::new(api).with_rollback(true);
        let mut store = board();
        store.insert_card(Card::new("D", "d", "Done"));

        let first = match reconciler.commit(&mut store, &intent("A", "Done", 1, MarkerSlot::End)) {
            Commit::Applied(p) => p,
            Commit::Skipped(reason) => panic!("skipped: {:?}", reason),
        };
        assert!(reconciler.commit(&mut store, &intent("A", "Done", 0, before("D"))).is_applied());

        let outcome = first.persist().await;
        assert!(!settle(&mut store, &outcome));
        assert_eq!(ids(&store, "Done"), vec!["A", "D"]);
    }

    #[tokio::test]
    async fn test_revert_applies_once() {
        let api = Arc::new(MemoryApi::failing());
        let reconciler = Reconciler::new(api).with_rollback(true);
        let mut store = board();

        let drop = intent("C", "Done", 0, MarkerSlot::End);
        let outcome = drop_and_persist(&reconciler, &mut store, &drop)
            .await
            .unwrap();
        assert!(settle(&mut store, &outcome));
        assert!(!settle(&mut store, &outcome));
        assert_eq!(ids(&store, "TODO"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_from_config() {
        let config = BoardConfig {
            rollback_on_failure: true,
            ..Default::default()
        };
        let reconciler = Reconciler::from_config(Arc::new(MemoryApi::default()), &config);
        assert!(reconciler.rollback_on_failure);
    }
}
