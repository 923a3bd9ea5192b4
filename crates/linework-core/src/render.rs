//! Backend-independent drawing primitives.
//!
//! The core emits [`DrawCmd`]s grouped into [`Layer`]s; a host embedding the
//! editor implements [`DrawSink`] and maps the primitives onto its own canvas.
//! Nothing here touches pixels.

use crate::editor::Editor;
use crate::elements::{Element, ElementClass, ElementId, GeomCtx};
use crate::hit::despecify;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Marker glyphs for point-like geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// A plain point.
    Point,
    /// The point currently under the cursor.
    Hover,
    /// The remembered grab position of an active drag.
    DragOrigin,
    /// A point sitting outside its carrier line's finite span.
    OutOfBounds,
}

/// Stroke styles for line-like geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    /// Hint geometry: carrier lines, offset ties, gesture previews.
    Dashed,
}

/// One drawing primitive in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCmd {
    Marker {
        at: Point,
        kind: MarkerKind,
    },
    Line {
        from: Point,
        to: Point,
        style: LineStyle,
    },
    /// A line with no finite bound; the sink clips it to its viewport.
    Unbounded {
        origin: Point,
        direction: Vec2,
        style: LineStyle,
    },
    /// A closed filled boundary.
    Polygon {
        vertices: Vec<Point>,
    },
    /// The free cursor marker, emitted when nothing is hovered.
    Cursor {
        at: Point,
    },
}

/// Back-to-front draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    /// Shape fills.
    Shapes,
    /// Persistent construction geometry.
    Construction,
    /// Committed boundary vertices and edges.
    Boundary,
    /// Hover highlights, drag previews, inspection hints.
    Overlay,
}

/// One rendered frame: every primitive the core wants drawn, tagged with its
/// layer. Commands within a layer are already in draw order.
#[derive(Debug, Default)]
pub struct Frame {
    cmds: Vec<(Layer, DrawCmd)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: Layer, cmd: DrawCmd) {
        self.cmds.push((layer, cmd));
    }

    pub fn extend(&mut self, layer: Layer, cmds: impl IntoIterator<Item = DrawCmd>) {
        for cmd in cmds {
            self.cmds.push((layer, cmd));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Submit to a sink in back-to-front layer order.
    pub fn submit(&self, sink: &mut dyn DrawSink) {
        let mut ordered: Vec<&(Layer, DrawCmd)> = self.cmds.iter().collect();
        ordered.sort_by_key(|(layer, _)| *layer);
        for (layer, cmd) in ordered {
            sink.draw(*layer, cmd);
        }
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &(Layer, DrawCmd)> {
        self.cmds.iter()
    }
}

/// Host-side receiver for drawing primitives.
pub trait DrawSink {
    fn draw(&mut self, layer: Layer, cmd: &DrawCmd);
}

/// Build the frame for the editor's current state: every registered element
/// on its base layer, then overlay hints for the selection, the active
/// gesture, and the hover answer.
pub fn render(editor: &Editor) -> Frame {
    let ctx = GeomCtx::new(&editor.registry, &editor.shapes);
    let mut frame = Frame::new();

    for element in editor.registry.elements() {
        let layer = match element.class() {
            ElementClass::Shape => match element {
                Element::Shape(_) => Layer::Shapes,
                _ => Layer::Boundary,
            },
            _ => Layer::Construction,
        };
        frame.extend(layer, element.draw(ctx));
    }

    // The drag origin sits under everything else in the overlay.
    if editor.interaction.is_dragging() {
        frame.push(
            Layer::Overlay,
            DrawCmd::Marker {
                at: editor.interaction.drag_origin,
                kind: MarkerKind::DragOrigin,
            },
        );
    }

    // One overlay inspection per despecified representation: a transient
    // hover standing for an already-inspected persistent element stays quiet.
    let mut inspected: HashSet<ElementId> = HashSet::new();
    for id in &editor.interaction.selection {
        if let Some(element) = editor.registry.get(*id) {
            if inspected.insert(*id) {
                frame.extend(Layer::Overlay, element.inspect(ctx));
            }
        }
    }
    if let Some(held) = &editor.interaction.held {
        if inspected.insert(despecify(&editor.registry, held).id()) {
            frame.extend(Layer::Overlay, held.inspect(ctx));
        }
    }

    match &editor.interaction.hover {
        Some(hover) => {
            if inspected.insert(despecify(&editor.registry, hover).id()) {
                frame.extend(Layer::Overlay, hover.inspect(ctx));
            }
            if hover.is_point_like() {
                if let Some(at) = hover.position(ctx) {
                    frame.push(
                        Layer::Overlay,
                        DrawCmd::Marker {
                            at,
                            kind: MarkerKind::Hover,
                        },
                    );
                }
            }
        }
        None => frame.push(
            Layer::Overlay,
            DrawCmd::Cursor {
                at: editor.pointer(),
            },
        ),
    }

    frame
}
