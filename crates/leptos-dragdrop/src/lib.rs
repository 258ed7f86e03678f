//! Leptos DragDrop Utilities
//!
//! Mouse-driven drag-and-drop for the task board.
//! Uses a movement threshold to distinguish click from drag, measures card
//! positions from the DOM and hands them to the board's resolver.
//!
//! Markup contract: each column's card list carries `data-column="<name>"`,
//! each card inside it carries `data-card-id="<id>"`.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use taskboard::{
    settle, BoardApi, BoardStore, ColumnLayout, Commit, DragOutcome, DragPayload, DragSession,
    Reconciler,
};
use wasm_bindgen::JsCast;
use web_sys::MouseEvent;

pub const CARD_ATTR: &str = "data-card-id";
pub const COLUMN_ATTR: &str = "data-column";

/// DnD state signals
#[derive(Clone, Copy)]
pub struct DndSignals {
    pub session: RwSignal<DragSession>,
    /// Pressed card (mousedown but not yet dragging)
    pub pending: RwSignal<Option<DragPayload>>,
    /// Press position for movement detection
    pub start: RwSignal<(i32, i32)>,
    /// Set briefly after a drop so the trailing click can be ignored
    pub drag_just_ended: RwSignal<bool>,
    threshold_px: i32,
}

pub fn create_dnd_signals(drag_threshold_px: i32, drop_bias_px: f64) -> DndSignals {
    DndSignals {
        session: RwSignal::new(DragSession::new(drop_bias_px)),
        pending: RwSignal::new(None),
        start: RwSignal::new((0, 0)),
        drag_just_ended: RwSignal::new(false),
        threshold_px: drag_threshold_px,
    }
}

/// Pointer moved far enough from the press point to count as a drag
pub fn exceeds_threshold(start: (i32, i32), current: (i32, i32), threshold_px: i32) -> bool {
    let dx = (current.0 - start.0).abs();
    let dy = (current.1 - start.1).abs();
    dx > threshold_px || dy > threshold_px
}

/// Read marker geometry for one column from the rendered list element
pub fn measure_column(list: &web_sys::Element, column: &str) -> ColumnLayout {
    let mut cards = Vec::new();
    if let Ok(nodes) = list.query_selector_all(&format!("[{}]", CARD_ATTR)) {
        for i in 0..nodes.length() {
            let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) else {
                continue;
            };
            if let Some(id) = el.get_attribute(CARD_ATTR) {
                cards.push((id, el.get_bounding_client_rect().top()));
            }
        }
    }
    let bottom = list.get_bounding_client_rect().bottom();
    ColumnLayout::from_card_tops(column, cards, bottom)
}

/// Card list of the column under the pointer
fn column_at(x: i32, y: i32) -> Option<(web_sys::Element, String)> {
    let doc = web_sys::window()?.document()?;
    let list = doc
        .element_from_point(x as f32, y as f32)?
        .closest(&format!("[{}]", COLUMN_ATTR))
        .ok()??;
    let column = list.get_attribute(COLUMN_ATTR)?;
    Some((list, column))
}

fn event_element(ev: &web_sys::MouseEvent) -> Option<web_sys::Element> {
    ev.current_target()?.dyn_into::<web_sys::Element>().ok()
}

/// End drag operation
pub fn end_drag(dnd: &DndSignals) {
    dnd.pending.set(None);
    dnd.drag_just_ended.set(true);

    if let Some(win) = web_sys::window() {
        let clear = dnd.drag_just_ended;
        let cb = wasm_bindgen::closure::Closure::<dyn FnMut()>::new(move || {
            clear.set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            100,
        );
        cb.forget();
    }
}

/// Create mousedown handler for a card
/// Records a pending drag with start position
pub fn make_on_card_mousedown(
    dnd: DndSignals,
    card_id: String,
    column: String,
) -> impl Fn(web_sys::MouseEvent) + Clone + 'static {
    move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        // Controls inside a card keep their own behaviour
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some() {
                return;
            }
            if target.dyn_ref::<web_sys::HtmlButtonElement>().is_some() {
                return;
            }
        }
        dnd.pending.set(Some(DragPayload {
            card_id: card_id.clone(),
            source_column: column.clone(),
        }));
        dnd.start.set((ev.client_x(), ev.client_y()));
    }
}

/// Create mousemove handler for a column's card list
pub fn make_on_column_mousemove(
    dnd: DndSignals,
    column: String,
) -> impl Fn(web_sys::MouseEvent) + Clone + 'static {
    move |ev: web_sys::MouseEvent| {
        if !dnd.session.with_untracked(|s| s.is_dragging()) {
            return;
        }
        let Some(list) = event_element(&ev) else { return };
        let layout = measure_column(&list, &column);
        let pointer_y = ev.client_y() as f64;
        dnd.session.update(|s| {
            s.hover(&layout, pointer_y);
        });
    }
}

/// Create mouseleave handler for a column's card list
pub fn make_on_column_mouseleave(
    dnd: DndSignals,
    column: String,
) -> impl Fn(web_sys::MouseEvent) + Clone + 'static {
    move |_ev: web_sys::MouseEvent| {
        if dnd.session.with_untracked(|s| s.is_column_active(&column)) {
            dnd.session.update(|s| s.leave(&column));
        }
    }
}

/// Highlighted marker index in `column`, tracked
pub fn active_marker_index(dnd: DndSignals, column: &str) -> Option<usize> {
    dnd.session.with(|s| {
        s.active_marker()
            .filter(|(hovered, _)| *hovered == column)
            .map(|(_, marker)| marker.index)
    })
}

/// Document mousemove: starts the drag once the pointer leaves the threshold
pub fn bind_global_mousemove(dnd: DndSignals) {
    use wasm_bindgen::closure::Closure;

    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: MouseEvent| {
        let Some(payload) = dnd.pending.get_untracked() else { return };
        if dnd.session.with_untracked(|s| s.is_dragging()) {
            return;
        }
        let current = (ev.client_x(), ev.client_y());
        if exceeds_threshold(dnd.start.get_untracked(), current, dnd.threshold_px) {
            dnd.session.update(|s| {
                s.begin(payload);
            });
        }
    });

    if let Some(win) = web_sys::window() {
        if let Some(doc) = win.document() {
            let listener = on_mousemove.as_ref().unchecked_ref();
            let _ = doc.add_event_listener_with_callback("mousemove", listener);
        }
    }
    on_mousemove.forget();
}

/// Bind global mouseup: drops on the highlighted marker or cancels.
/// `on_release` sees every finished drag, not plain clicks.
pub fn bind_global_mouseup<F>(dnd: DndSignals, on_release: F)
where
    F: Fn(DragOutcome) + 'static,
{
    use wasm_bindgen::closure::Closure;

    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: MouseEvent| {
        // re-resolve at the release point when it is over a column
        let outcome = match column_at(ev.client_x(), ev.client_y()) {
            Some((list, column)) => {
                let layout = measure_column(&list, &column);
                let pointer_y = ev.client_y() as f64;
                dnd.session.try_update(|s| s.drop_on(&layout, pointer_y))
            }
            None => dnd.session.try_update(|s| s.release()),
        }
        .unwrap_or(DragOutcome::NoSession);
        if outcome == DragOutcome::NoSession {
            // Not dragging - click event will fire naturally on the element
            dnd.pending.set(None);
            return;
        }
        end_drag(&dnd);
        on_release(outcome);
    });

    if let Some(win) = web_sys::window() {
        if let Some(doc) = win.document() {
            let listener = on_mouseup.as_ref().unchecked_ref();
            let _ = doc.add_event_listener_with_callback("mouseup", listener);
        }
    }
    on_mouseup.forget();

    bind_global_mousemove(dnd);
}

/// Apply a drop to the store now and persist it in the background
pub fn commit_drop<A>(store: RwSignal<BoardStore>, reconciler: &Reconciler<A>, outcome: DragOutcome)
where
    A: BoardApi + ?Sized + 'static,
{
    let DragOutcome::Dropped(intent) = outcome else { return };

    let commit = store.try_update(|s| reconciler.commit(s, &intent));
    match commit {
        Some(Commit::Applied(pending)) => {
            spawn_local(async move {
                let outcome = pending.persist().await;
                store.update(|s| {
                    settle(s, &outcome);
                });
            });
        }
        Some(Commit::Skipped(reason)) => {
            log::debug!("[DND] Drop of {} skipped: {:?}", intent.payload.card_id, reason);
        }
        None => {}
    }
}

/// Wire the board: global handlers commit every drop through `reconciler`
pub fn bind_board<A>(dnd: DndSignals, store: RwSignal<BoardStore>, reconciler: Arc<Reconciler<A>>)
where
    A: BoardApi + ?Sized + 'static,
{
    bind_global_mouseup(dnd, move |outcome| commit_drop(store, &reconciler, outcome));
}
