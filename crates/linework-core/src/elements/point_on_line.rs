//! Points parametrized along a reference line.

use super::{Axis, ElementClass, ElementId, GeomCtx};
use crate::render::{DrawCmd, LineStyle, MarkerKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the stored parameter of a [`PointOnLine`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamMode {
    /// Fraction of the line's defining span (0 at the origin, 1 at the end).
    Ratio,
    /// Signed distance from the line's origin.
    Absolute,
}

/// A point pinned to a line-like element by a scalar parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOnLine {
    pub id: ElementId,
    pub class: ElementClass,
    pub line: ElementId,
    pub param: f64,
    pub mode: ParamMode,
}

impl PointOnLine {
    pub fn new(line: ElementId, param: f64, mode: ParamMode, class: ElementClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            line,
            param,
            mode,
        }
    }

    /// Point on `line` at the projection of a world position, stored as a
    /// ratio of the line's defining span. The span anchors the parameter
    /// whether or not the line is currently bounded.
    pub fn at_projection(
        ctx: GeomCtx,
        line: ElementId,
        world: Point,
        class: ElementClass,
    ) -> Option<Self> {
        let axis = ctx.axis_of(line)?;
        let param = axis.project(world) / axis.length;
        Some(Self::new(line, param, ParamMode::Ratio, class))
    }

    /// Signed distance from the line origin under the current interpretation.
    pub fn distance_along(&self, axis: &Axis) -> f64 {
        match self.mode {
            ParamMode::Ratio => self.param * axis.length,
            ParamMode::Absolute => self.param,
        }
    }

    pub fn position(&self, ctx: GeomCtx) -> Option<Point> {
        let axis = ctx.axis_of(self.line)?;
        Some(axis.point_at(self.distance_along(&axis)))
    }

    /// Project a requested world position onto the line and store it under
    /// the current interpretation. Only the parameter changes, never the
    /// underlying line.
    pub fn set_position(&mut self, axis: &Axis, world: Point) {
        let t = axis.project(world);
        self.param = match self.mode {
            ParamMode::Ratio => t / axis.length,
            ParamMode::Absolute => t,
        };
    }

    /// Switch between ratio and absolute interpretation, preserving the
    /// current world position.
    pub fn toggle_mode(&mut self, axis: &Axis) {
        let t = self.distance_along(axis);
        self.mode = match self.mode {
            ParamMode::Ratio => ParamMode::Absolute,
            ParamMode::Absolute => ParamMode::Ratio,
        };
        self.param = match self.mode {
            ParamMode::Ratio => t / axis.length,
            ParamMode::Absolute => t,
        };
    }

    /// True when the point sits outside the span of a bounded line. An
    /// unbounded line has no outside.
    pub fn out_of_bounds(&self, axis: &Axis) -> bool {
        if !axis.bounded {
            return false;
        }
        let t = self.distance_along(axis);
        t < 0.0 || t > axis.length
    }

    /// Move onto a different line, preserving the current world position.
    pub(crate) fn handover(&mut self, ctx: GeomCtx, inheritor: ElementId) {
        let world = self.position(ctx);
        self.line = inheritor;
        if let (Some(world), Some(axis)) = (world, ctx.axis_of(inheritor)) {
            self.set_position(&axis, world);
        }
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

    /// Hint geometry: the dashed carrier line, and an out-of-bounds marker
    /// when the parameter leaves the finite span.
    pub(crate) fn inspect_into(&self, ctx: GeomCtx, cmds: &mut Vec<DrawCmd>) {
        let Some(axis) = ctx.axis_of(self.line) else {
            return;
        };
        cmds.push(DrawCmd::Unbounded {
            origin: axis.origin,
            direction: axis.direction,
            style: LineStyle::Dashed,
        });
        if self.out_of_bounds(&axis) {
            if let Some(at) = self.position(ctx) {
                cmds.push(DrawCmd::Marker {
                    at,
                    kind: MarkerKind::OutOfBounds,
                });
            }
        }
    }
}
