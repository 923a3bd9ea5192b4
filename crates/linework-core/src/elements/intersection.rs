//! Intersection points of two line references.

use super::{ElementClass, ElementId, GeomCtx};
use crate::render::{DrawCmd, MarkerKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The crossing point of two line-like elements, computed by solving the 2x2
/// linear system of their parametric equations. Parallel lines produce
/// non-finite coordinates, which are left to propagate: the point renders and
/// hit-tests as nothing until the configuration changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intersection {
    pub id: ElementId,
    pub class: ElementClass,
    pub a: ElementId,
    pub b: ElementId,
}

impl Intersection {
    pub fn new(a: ElementId, b: ElementId, class: ElementClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            a,
            b,
        }
    }

    pub fn position(&self, ctx: GeomCtx) -> Option<Point> {
        let la = ctx.axis_of(self.a)?;
        let lb = ctx.axis_of(self.b)?;
        // origin_a + t * dir_a == origin_b + s * dir_b, solved for t by
        // Cramer's rule. denom == 0 for parallel input.
        let d = la.direction;
        let e = lb.direction;
        let w = lb.origin - la.origin;
        let denom = d.x * e.y - d.y * e.x;
        let t = (w.x * e.y - w.y * e.x) / denom;
        Some(la.point_at(t))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::ShapeSet;
    use crate::elements::{Element, FreePoint, Segment};
    use crate::registry::Registry;
    use approx::assert_abs_diff_eq;

    fn segment(registry: &mut Registry, a: Point, b: Point) -> ElementId {
        let p1 = FreePoint::new(a, ElementClass::Construction);
        let p2 = FreePoint::new(b, ElementClass::Construction);
        let seg = Segment::new(p1.id, p2.id, ElementClass::Construction);
        let id = seg.id;
        registry.register(vec![
            Element::FreePoint(p1),
            Element::FreePoint(p2),
            Element::Segment(seg),
        ]);
        id
    }

    #[test]
    fn test_crossing_lines() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let l1 = segment(&mut registry, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let l2 = segment(&mut registry, Point::new(5.0, -5.0), Point::new(5.0, 5.0));

        let x = Intersection::new(l1, l2, ElementClass::Transient);
        let ctx = GeomCtx::new(&registry, &shapes);
        let pos = x.position(ctx).unwrap();
        assert_abs_diff_eq!(pos.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pos.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_lines_degenerate() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let l1 = segment(&mut registry, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let l2 = segment(&mut registry, Point::new(0.0, 5.0), Point::new(10.0, 5.0));

        let x = Intersection::new(l1, l2, ElementClass::Transient);
        let ctx = GeomCtx::new(&registry, &shapes);
        // Degenerate input is not an error; it yields non-finite coordinates.
        let pos = x.position(ctx).unwrap();
        assert!(!pos.x.is_finite() || !pos.y.is_finite());
    }
}
