//! Interaction state: gesture mode, hover, selection, and the per-gesture
//! transaction.
//!
//! This module holds the state the editor's tick loop drives. It has no
//! geometry of its own; everything here is bookkeeping over element ids and
//! cloned hover snapshots.

use crate::elements::{Element, ElementId};
use indexmap::IndexSet;
use kurbo::Point;

/// Pointer displacement that promotes a held gesture to a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Which button started the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Inactive,
    /// Primary-button gesture: move and select existing geometry.
    Edit,
    /// Secondary-button gesture: synthesize new auxiliary geometry.
    Construction,
}

/// Orthogonal to [`Mode`]: has the pointer moved far enough yet?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Button down, displacement under the threshold.
    Holding,
    /// Displacement crossed the threshold; drag setup has run.
    Dragging,
}

/// The provisional link created mid-drag whose dependency may be rebound to
/// a hover target when the drag ends.
#[derive(Debug, Clone, Copy)]
pub struct Victim {
    /// The element whose link may be reassigned.
    pub element: ElementId,
    /// The dependency currently filling the slot.
    pub dependency: ElementId,
}

/// Everything provisional about one button-down, committed or unwound
/// atomically at gesture end.
#[derive(Debug, Default)]
pub struct GestureTx {
    /// Elements whose positions follow the pointer each frame.
    pub drag_queue: Vec<ElementId>,
    /// Provisional registrations, unwound in reverse on Escape.
    pub cancel_queue: Vec<ElementId>,
    /// Candidate for reassignment at drag end.
    pub victim: Option<Victim>,
}

impl GestureTx {
    pub fn is_empty(&self) -> bool {
        self.drag_queue.is_empty() && self.cancel_queue.is_empty() && self.victim.is_none()
    }
}

/// The interaction state machine's data.
#[derive(Debug, Default)]
pub struct Interaction {
    pub mode: Mode,
    pub phase: Option<GesturePhase>,
    /// Snapshot of `hover` at button-down. May be a synthetic transient.
    pub held: Option<Element>,
    /// Snapped pointer position at button-down.
    pub drag_origin: Point,
    /// This frame's filtered hover answer.
    pub hover: Option<Element>,
    /// This frame's unfiltered answer; always registered.
    pub over: Option<Element>,
    /// Multi-selection, in toggle order.
    pub selection: IndexSet<ElementId>,
    pub gesture: GestureTx,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture.
    pub fn begin(&mut self, mode: Mode, held: Option<Element>, origin: Point) {
        self.mode = mode;
        self.phase = Some(GesturePhase::Holding);
        self.held = held;
        self.drag_origin = origin;
        self.gesture = GestureTx::default();
    }

    /// Should this pointer position promote a hold to a drag?
    pub fn past_drag_threshold(&self, pointer: Point) -> bool {
        self.phase == Some(GesturePhase::Holding)
            && (pointer - self.drag_origin).hypot() > DRAG_THRESHOLD
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == Some(GesturePhase::Dragging)
    }

    pub fn is_holding(&self) -> bool {
        self.phase == Some(GesturePhase::Holding)
    }

    /// The held element's id, if any.
    pub fn held_id(&self) -> Option<ElementId> {
        self.held.as_ref().map(|e| e.id())
    }

    /// Ids the hover filter must additionally suppress: tentative gesture
    /// geometry is only under the pointer because the gesture put it there.
    pub fn suppressed(&self) -> Vec<ElementId> {
        let mut ids = self.gesture.cancel_queue.clone();
        for id in &self.gesture.drag_queue {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    /// Toggle an element's membership in the multi-selection.
    pub fn toggle_selected(&mut self, id: ElementId) {
        if !self.selection.shift_remove(&id) {
            self.selection.insert(id);
        }
    }

    /// End the gesture, keeping the selection.
    pub fn release(&mut self) {
        self.mode = Mode::Inactive;
        self.phase = None;
        self.held = None;
        self.gesture = GestureTx::default();
    }
}
