//! Free points: absolute, frame-relative, or views of committed polygon
//! vertices.

use super::{ElementClass, ElementId, GeomCtx};
use crate::render::{DrawCmd, MarkerKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a point's position is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    /// Absolute world position.
    World(Point),
    /// Position stored in a shape body's local frame and transformed through
    /// its live frame transform.
    Frame { shape: ElementId, local: Point },
    /// View of a committed boundary vertex; storage stays with the shape
    /// provider.
    Vertex { shape: ElementId, index: usize },
}

/// A 2D point with no geometric dependencies beyond an optional frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreePoint {
    pub id: ElementId,
    pub class: ElementClass,
    pub anchor: Anchor,
}

impl FreePoint {
    /// World-anchored point.
    pub fn new(at: Point, class: ElementClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            anchor: Anchor::World(at),
        }
    }

    /// Point stored in a shape body's local frame.
    pub fn in_frame(shape: ElementId, local: Point, class: ElementClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            anchor: Anchor::Frame { shape, local },
        }
    }

    /// View of a committed boundary vertex.
    pub fn vertex(shape: ElementId, index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            class: ElementClass::Shape,
            anchor: Anchor::Vertex { shape, index },
        }
    }

    pub fn dependencies(&self) -> Vec<ElementId> {
        match self.anchor {
            Anchor::World(_) => Vec::new(),
            Anchor::Frame { shape, .. } | Anchor::Vertex { shape, .. } => vec![shape],
        }
    }

    pub fn position(&self, ctx: GeomCtx) -> Option<Point> {
        match self.anchor {
            Anchor::World(p) => Some(p),
            Anchor::Frame { shape, local } => Some(ctx.frame_of(shape)? * local),
            Anchor::Vertex { shape, index } => {
                let frame_shape = match ctx.registry.get(shape)? {
                    super::Element::Shape(body) => body.shape,
                    _ => return None,
                };
                let provider = ctx.shapes.get(frame_shape);
                if index < provider.vertex_count() {
                    Some(provider.vertex(index))
                } else {
                    None
                }
            }
        }
    }

    /// Re-anchor onto a different shape frame, keeping the world position.
    pub(crate) fn handover(&mut self, ctx: GeomCtx, inheritor: ElementId) {
        let world = self.position(ctx);
        match (&mut self.anchor, world) {
            (Anchor::Frame { shape, local }, Some(w)) => {
                *shape = inheritor;
                if let Some(frame) = ctx.frame_of(inheritor) {
                    *local = frame.inverse() * w;
                }
            }
            (Anchor::Frame { shape, .. }, None) => *shape = inheritor,
            _ => {}
        }
    }

    /// Drop any frame or vertex anchor, pinning the point at its current
    /// world position. Used by the registry's null hand-over repair.
    pub(crate) fn detach(&mut self, world: Point) {
        self.anchor = Anchor::World(world);
    }

    pub fn draw(&self, ctx: GeomCtx) -> Vec<DrawCmd> {
        match self.position(ctx) {
            Some(at) => vec![DrawCmd::Marker {
                at,
                kind: MarkerKind::Point,
            }],
            None => Vec::new(),
        }
    }
}
