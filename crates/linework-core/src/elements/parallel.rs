//! Lines running parallel to a reference line at a perpendicular offset.

use super::{Axis, ElementClass, ElementId, GeomCtx};
use crate::render::{DrawCmd, LineStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line derived from a reference line: same direction, origin shifted by a
/// signed perpendicular offset. Rotation and translation of the reference are
/// honored live because the axis is derived on every access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelLine {
    pub id: ElementId,
    pub class: ElementClass,
    pub reference: ElementId,
    pub offset: f64,
    pub infinite: bool,
}

impl ParallelLine {
    pub fn new(reference: ElementId, offset: f64, class: ElementClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            reference,
            offset,
            infinite: false,
        }
    }

    pub fn axis(&self, ctx: GeomCtx) -> Option<Axis> {
        let mut axis = ctx.axis_of(self.reference)?.offset_by(self.offset);
        if self.infinite {
            axis.bounded = false;
        }
        Some(axis)
    }

    /// Recompute the offset as the perpendicular distance from the reference
    /// line's origin to the requested point.
    pub fn set_position(&mut self, reference_axis: &Axis, world: Point) {
        self.offset = (world - reference_axis.origin).dot(reference_axis.perpendicular());
    }

    /// Move onto a different reference line, preserving the current origin.
    pub(crate) fn handover(&mut self, ctx: GeomCtx, inheritor: ElementId) {
        let origin = self.axis(ctx).map(|a| a.origin);
        self.reference = inheritor;
        if let (Some(origin), Some(reference)) = (origin, ctx.axis_of(inheritor)) {
            self.set_position(&reference, origin);
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

    /// Hint geometry: a dashed tie from the reference origin to the parallel
    /// origin, showing the offset.
    pub(crate) fn inspect_into(&self, ctx: GeomCtx, cmds: &mut Vec<DrawCmd>) {
        let Some(reference) = ctx.axis_of(self.reference) else {
            return;
        };
        let shifted = reference.offset_by(self.offset);
        cmds.push(DrawCmd::Line {
            from: reference.origin,
            to: shifted.origin,
            style: LineStyle::Dashed,
        });
    }
}
