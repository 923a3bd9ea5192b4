//! Line segments between two point references.

use super::{Axis, ElementClass, ElementId, GeomCtx};
use crate::render::{DrawCmd, LineStyle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line through two point references. With `infinite` set the finite bound
/// is removed: containment and intersection treat the carrier as unbounded
/// while origin and direction stay anchored at `a`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: ElementId,
    pub class: ElementClass,
    pub a: ElementId,
    pub b: ElementId,
    pub infinite: bool,
    /// Shape body this edge belongs to, for committed boundary edges.
    pub parent: Option<ElementId>,
}

impl Segment {
    pub fn new(a: ElementId, b: ElementId, class: ElementClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            a,
            b,
            infinite: false,
            parent: None,
        }
    }

    /// A committed boundary edge of a polygon.
    pub fn edge(a: ElementId, b: ElementId, parent: ElementId) -> Self {
        Self {
            id: Uuid::new_v4(),
            class: ElementClass::Shape,
            a,
            b,
            infinite: false,
            parent: Some(parent),
        }
    }

    pub fn axis(&self, ctx: GeomCtx) -> Option<Axis> {
        let a = ctx.position_of(self.a)?;
        let b = ctx.position_of(self.b)?;
        let mut axis = Axis::through(a, b);
        // The span a-b stays the parametrization anchor; only the bound goes.
        axis.bounded = !self.infinite;
        Some(axis)
    }

    pub(crate) fn handover(&mut self, original: ElementId, inheritor: ElementId) {
        if self.a == original {
            self.a = inheritor;
        } else {
            self.b = inheritor;
        }
    }

    pub fn draw(&self, ctx: GeomCtx) -> Vec<DrawCmd> {
        let Some(axis) = self.axis(ctx) else {
            return Vec::new();
        };
        let cmd = if axis.bounded {
            DrawCmd::Line {
                from: axis.origin,
                to: axis.point_at(axis.length),
                style: LineStyle::Solid,
            }
        } else {
            DrawCmd::Unbounded {
                origin: axis.origin,
                direction: axis.direction,
                style: LineStyle::Solid,
            }
        };
        vec![cmd]
    }
}
