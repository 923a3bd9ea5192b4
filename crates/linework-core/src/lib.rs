//! Linework Core Library
//!
//! Platform-agnostic core for an interactive construction-geometry editor:
//! a dependency registry of geometric elements over polygon shape providers,
//! pointer-driven hit resolution, and the gesture state machine that edits
//! and synthesizes construction geometry. Hosts feed input frames in and
//! draw the emitted primitives; nothing here touches a window or a canvas.

pub mod boundary;
pub mod editor;
pub mod elements;
pub mod hit;
pub mod input;
pub mod interaction;
pub mod registry;
pub mod render;

pub use boundary::{BoundaryError, Polygon, ShapeProvider, ShapeRef, ShapeSet};
pub use editor::Editor;
pub use elements::{
    Anchor, Axis, Element, ElementClass, ElementId, FreePoint, GeomCtx, Intersection,
    ParallelLine, ParamMode, PointOnLine, Segment, ShapeBody,
};
pub use hit::{cast_hover, despecify, overlap_all, specify, HoverResolution, LINE_RADIUS, POINT_RADIUS};
pub use input::{
    EditKey, GestureButton, InputFrame, InputState, KeyEvent, Modifiers, PointerEvent,
};
pub use interaction::{GesturePhase, Interaction, Mode, DRAG_THRESHOLD};
pub use registry::{ReassignOutcome, Registry};
pub use render::{render, DrawCmd, DrawSink, Frame, Layer, LineStyle, MarkerKind};
