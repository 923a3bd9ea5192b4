//! Geometric element definitions.
//!
//! Every piece of editable geometry is one [`Element`] variant. Elements
//! reference each other by id and never cache derived geometry: positions and
//! axes are recomputed from the current dependency state on every access, so
//! moving a point immediately moves everything built on top of it.

mod intersection;
mod parallel;
mod point;
mod point_on_line;
mod segment;
mod shape;

pub use intersection::Intersection;
pub use parallel::ParallelLine;
pub use point::{Anchor, FreePoint};
pub use point_on_line::{ParamMode, PointOnLine};
pub use segment::Segment;
pub use shape::ShapeBody;

use crate::boundary::ShapeSet;
use crate::registry::Registry;
use crate::render::DrawCmd;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Persistence class of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementClass {
    /// A committed vertex or edge of a polygon boundary, or the polygon body.
    Shape,
    /// A persistent, user-created auxiliary element.
    Construction,
    /// An ephemeral element synthesized for the current frame or gesture;
    /// never a registry key.
    Transient,
}

/// Read access elements need to resolve their references while computing
/// geometry.
#[derive(Clone, Copy)]
pub struct GeomCtx<'a> {
    pub registry: &'a Registry,
    pub shapes: &'a ShapeSet,
}

impl<'a> GeomCtx<'a> {
    pub fn new(registry: &'a Registry, shapes: &'a ShapeSet) -> Self {
        Self { registry, shapes }
    }

    /// World position of a registered point-like element.
    pub fn position_of(&self, id: ElementId) -> Option<Point> {
        self.registry.get(id)?.position(*self)
    }

    /// Carrier axis of a registered line-like element.
    pub fn axis_of(&self, id: ElementId) -> Option<Axis> {
        self.registry.get(id)?.axis(*self)
    }

    /// Local-to-world frame transform of a registered shape body.
    pub fn frame_of(&self, id: ElementId) -> Option<Affine> {
        match self.registry.get(id)? {
            Element::Shape(body) => Some(self.shapes.get(body.shape).transform()),
            _ => None,
        }
    }
}

/// Carrier line of a line-like element: an origin, a unit direction, and the
/// finite span between its defining points. `bounded: false` makes
/// containment and closest-point clamping treat the line as unbounded;
/// `length` stays the defining span either way, so parametrizations anchored
/// to it are unaffected by the flag.
#[derive(Debug, Clone, Copy)]
pub struct Axis {
    pub origin: Point,
    pub direction: Vec2,
    pub length: f64,
    pub bounded: bool,
}

impl Axis {
    /// Axis through two points. A zero-length span yields a NaN direction,
    /// which is deliberately left to propagate.
    pub fn through(a: Point, b: Point) -> Self {
        let v = b - a;
        let len = v.hypot();
        Self {
            origin: a,
            direction: v / len,
            length: len,
            bounded: true,
        }
    }

    /// Unit perpendicular (direction rotated a quarter turn).
    pub fn perpendicular(&self) -> Vec2 {
        Vec2::new(-self.direction.y, self.direction.x)
    }

    /// Point at signed distance `t` from the origin.
    pub fn point_at(&self, t: f64) -> Point {
        self.origin + self.direction * t
    }

    /// Signed distance of the projection of `p` onto the axis.
    pub fn project(&self, p: Point) -> f64 {
        (p - self.origin).dot(self.direction)
    }

    fn clamp_param(&self, t: f64) -> f64 {
        if self.bounded {
            t.clamp(0.0, self.length.max(0.0))
        } else {
            t
        }
    }

    /// Closest point on the axis, respecting the finite bound.
    pub fn closest(&self, p: Point) -> Point {
        self.point_at(self.clamp_param(self.project(p)))
    }

    /// Distance from `p` to the axis, respecting the finite bound.
    pub fn distance_to(&self, p: Point) -> f64 {
        (p - self.closest(p)).hypot()
    }

    /// Axis shifted sideways by a signed perpendicular offset.
    pub fn offset_by(&self, offset: f64) -> Axis {
        Axis {
            origin: self.origin + self.perpendicular() * offset,
            direction: self.direction,
            length: self.length,
            bounded: self.bounded,
        }
    }
}

/// A geometric element: the closed sum of everything the editor can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Element {
    FreePoint(FreePoint),
    Segment(Segment),
    PointOnLine(PointOnLine),
    ParallelLine(ParallelLine),
    Intersection(Intersection),
    Shape(ShapeBody),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::FreePoint(e) => e.id,
            Element::Segment(e) => e.id,
            Element::PointOnLine(e) => e.id,
            Element::ParallelLine(e) => e.id,
            Element::Intersection(e) => e.id,
            Element::Shape(e) => e.id,
        }
    }

    pub fn class(&self) -> ElementClass {
        match self {
            Element::FreePoint(e) => e.class,
            Element::Segment(e) => e.class,
            Element::PointOnLine(e) => e.class,
            Element::ParallelLine(e) => e.class,
            Element::Intersection(e) => e.class,
            Element::Shape(_) => ElementClass::Shape,
        }
    }

    /// Promote a transient element to a persistent construction. Registration
    /// calls this; other classes are left untouched.
    pub(crate) fn promote(&mut self) {
        let class = match self {
            Element::FreePoint(e) => &mut e.class,
            Element::Segment(e) => &mut e.class,
            Element::PointOnLine(e) => &mut e.class,
            Element::ParallelLine(e) => &mut e.class,
            Element::Intersection(e) => &mut e.class,
            Element::Shape(_) => return,
        };
        if *class == ElementClass::Transient {
            *class = ElementClass::Construction;
        }
    }

    /// Fixed hit-testing rank: points beat lines beat shapes, so overlapping
    /// hits resolve to the most specific geometry.
    pub fn priority(&self) -> u8 {
        match self {
            Element::FreePoint(_) | Element::PointOnLine(_) | Element::Intersection(_) => 3,
            Element::Segment(_) | Element::ParallelLine(_) => 2,
            Element::Shape(_) => 1,
        }
    }

    pub fn is_point_like(&self) -> bool {
        matches!(
            self,
            Element::FreePoint(_) | Element::PointOnLine(_) | Element::Intersection(_)
        )
    }

    pub fn is_line_like(&self) -> bool {
        matches!(self, Element::Segment(_) | Element::ParallelLine(_))
    }

    /// Whether the element accepts a direct position assignment.
    pub fn is_positionable(&self) -> bool {
        matches!(
            self,
            Element::FreePoint(_) | Element::PointOnLine(_) | Element::ParallelLine(_)
        )
    }

    /// Direct dependencies, in declaration order. Empty for shape bodies and
    /// unattached free points.
    pub fn dependencies(&self) -> Vec<ElementId> {
        match self {
            Element::FreePoint(e) => e.dependencies(),
            Element::Segment(e) => vec![e.a, e.b],
            Element::PointOnLine(e) => vec![e.line],
            Element::ParallelLine(e) => vec![e.reference],
            Element::Intersection(e) => vec![e.a, e.b],
            Element::Shape(_) => Vec::new(),
        }
    }

    /// Structural parent: the shape body a committed vertex or edge belongs
    /// to. Not a dependency.
    pub fn parent(&self) -> Option<ElementId> {
        match self {
            Element::FreePoint(e) => match e.anchor {
                Anchor::Vertex { shape, .. } => Some(shape),
                _ => None,
            },
            Element::Segment(e) => e.parent,
            _ => None,
        }
    }

    /// World position of a point-like element; also defined for line-like
    /// elements as their axis origin.
    pub fn position(&self, ctx: GeomCtx) -> Option<Point> {
        match self {
            Element::FreePoint(e) => e.position(ctx),
            Element::PointOnLine(e) => e.position(ctx),
            Element::Intersection(e) => e.position(ctx),
            Element::Segment(e) => e.axis(ctx).map(|a| a.origin),
            Element::ParallelLine(e) => e.axis(ctx).map(|a| a.origin),
            Element::Shape(_) => None,
        }
    }

    /// Carrier axis of a line-like element.
    pub fn axis(&self, ctx: GeomCtx) -> Option<Axis> {
        match self {
            Element::Segment(e) => e.axis(ctx),
            Element::ParallelLine(e) => e.axis(ctx),
            _ => None,
        }
    }

    /// May this element legally swap its reference to `original` for
    /// `inheritor`? `None` (losing the dependency outright) is always legal;
    /// otherwise the inheritor must carry the capability the reference slot
    /// requires.
    pub fn typecheck_handover(&self, _original: ElementId, inheritor: Option<&Element>) -> bool {
        let Some(inheritor) = inheritor else {
            return true;
        };
        match self {
            Element::Segment(_) => inheritor.is_point_like(),
            Element::PointOnLine(_) | Element::ParallelLine(_) | Element::Intersection(_) => {
                inheritor.is_line_like()
            }
            Element::FreePoint(_) => matches!(inheritor, Element::Shape(_)),
            Element::Shape(_) => false,
        }
    }

    /// Swap the reference to `original` for `inheritor`, preserving the
    /// current world position where geometrically meaningful.
    ///
    /// Callers must have verified that `original` is an actual dependency and
    /// that the inheritor passes [`Element::typecheck_handover`]; the registry
    /// is the only intended caller.
    pub(crate) fn handover(&mut self, ctx: GeomCtx, original: ElementId, inheritor: ElementId) {
        match self {
            Element::Segment(e) => e.handover(original, inheritor),
            Element::PointOnLine(e) => e.handover(ctx, inheritor),
            Element::ParallelLine(e) => e.handover(ctx, inheritor),
            Element::Intersection(e) => {
                if e.a == original {
                    e.a = inheritor;
                } else {
                    e.b = inheritor;
                }
            }
            Element::FreePoint(e) => e.handover(ctx, inheritor),
            Element::Shape(_) => unreachable!("shape bodies have no dependencies"),
        }
    }

    /// Drawing primitives for the element itself.
    pub fn draw(&self, ctx: GeomCtx) -> Vec<DrawCmd> {
        match self {
            Element::FreePoint(e) => e.draw(ctx),
            Element::Segment(e) => e.draw(ctx),
            Element::PointOnLine(e) => e.draw(ctx),
            Element::ParallelLine(e) => e.draw(ctx),
            Element::Intersection(e) => e.draw(ctx),
            Element::Shape(e) => e.draw(ctx),
        }
    }

    /// Drawing primitives plus auxiliary hint geometry (dashed carrier lines,
    /// out-of-bounds markers). Suppressing duplicates of an already-drawn
    /// despecified representation is the caller's job.
    pub fn inspect(&self, ctx: GeomCtx) -> Vec<DrawCmd> {
        let mut cmds = self.draw(ctx);
        match self {
            Element::PointOnLine(e) => e.inspect_into(ctx, &mut cmds),
            Element::ParallelLine(e) => e.inspect_into(ctx, &mut cmds),
            _ => {}
        }
        cmds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_through() {
        let axis = Axis::through(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(axis.origin, Point::new(0.0, 0.0));
        assert!((axis.direction.x - 1.0).abs() < 1e-12);
        assert!((axis.length - 10.0).abs() < 1e-12);
        assert!(axis.bounded);
        assert_eq!(axis.point_at(4.0), Point::new(4.0, 0.0));
    }

    #[test]
    fn test_axis_perpendicular_distance() {
        let axis = Axis::through(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((axis.distance_to(Point::new(5.0, 3.0)) - 3.0).abs() < 1e-12);
        // Beyond the finite bound the closest point clamps to the endpoint.
        assert!((axis.distance_to(Point::new(13.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_unbounded() {
        let mut axis = Axis::through(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        axis.bounded = false;
        assert!((axis.distance_to(Point::new(100.0, 2.0)) - 2.0).abs() < 1e-12);
        // The defining span survives unbounding.
        assert!((axis.length - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_offset() {
        let axis = Axis::through(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let shifted = axis.offset_by(5.0);
        assert_eq!(shifted.origin, Point::new(0.0, 5.0));
        assert!((shifted.length - 10.0).abs() < 1e-12);
    }
}
