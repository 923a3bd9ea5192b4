//! Hit resolution: which element is the pointer interacting with?
//!
//! Overlap testing collects every registered element within its
//! type-specific tolerance of the pointer, ranking resolves the winner
//! (points beat lines beat shapes), and specify/despecify convert between
//! abstract hits and the concrete transient points used for snapping.

use crate::boundary::ShapeSet;
use crate::elements::{
    Anchor, Element, ElementClass, ElementId, FreePoint, GeomCtx, Intersection, PointOnLine,
};
use crate::registry::Registry;
use kurbo::Point;
use std::collections::HashSet;

/// Pick-up tolerance for point-like elements, in world units.
pub const POINT_RADIUS: f64 = 4.0;
/// Pick-up tolerance for line-like elements, in world units.
pub const LINE_RADIUS: f64 = 3.0;

/// Every registered element whose geometry contains `point` within its
/// tolerance, in registration order. Degenerate (non-finite) geometry fails
/// every comparison and drops out naturally.
pub fn overlap_all(registry: &Registry, shapes: &ShapeSet, point: Point) -> Vec<ElementId> {
    let ctx = GeomCtx::new(registry, shapes);
    registry
        .elements()
        .filter(|element| {
            if element.is_point_like() {
                element
                    .position(ctx)
                    .map(|at| (at - point).hypot() <= POINT_RADIUS)
                    .unwrap_or(false)
            } else if element.is_line_like() {
                element
                    .axis(ctx)
                    .map(|axis| axis.distance_to(point) <= LINE_RADIUS)
                    .unwrap_or(false)
            } else if let Element::Shape(body) = element {
                body.contains(ctx, point)
            } else {
                false
            }
        })
        .map(|element| element.id())
        .collect()
}

/// The two answers of a hover cast.
#[derive(Debug, Clone, Default)]
pub struct HoverResolution {
    /// Best candidate passing the validity filter; may be a synthetic
    /// transient intersection with no registry entry.
    pub hover: Option<Element>,
    /// Best registered candidate regardless of filter. Always something the
    /// registry actually holds, so it is safe to delete.
    pub over: Option<Element>,
}

/// Resolve the pointer against the registry.
///
/// The validity filter drops the held element, everything it transitively
/// depends on, everything transitively depending on it, its structural
/// parent, and any explicitly suppressed ids (tentative gesture geometry).
/// This keeps a drag from hovering onto geometry that is only under the
/// pointer because it is being dragged.
///
/// When exactly two lines survive the filter, a synthetic transient
/// [`Intersection`] of the two joins the candidates, letting the user snap
/// onto crossings that have no persistent representation.
pub fn cast_hover(
    registry: &Registry,
    shapes: &ShapeSet,
    point: Point,
    held: Option<ElementId>,
    suppressed: &[ElementId],
) -> HoverResolution {
    let overlap = overlap_all(registry, shapes, point);

    let mut excluded: HashSet<ElementId> = suppressed.iter().copied().collect();
    if let Some(held) = held {
        excluded.insert(held);
        excluded.extend(registry.transitive_dependencies(held));
        excluded.extend(registry.transitive_dependents(held));
        if let Some(parent) = registry.get(held).and_then(|e| e.parent()) {
            excluded.insert(parent);
        }
    }

    let mut unfiltered: Vec<Element> = overlap
        .iter()
        .filter_map(|&id| registry.get(id).cloned())
        .collect();
    let mut filtered: Vec<Element> = unfiltered
        .iter()
        .filter(|e| !excluded.contains(&e.id()))
        .cloned()
        .collect();

    let lines: Vec<ElementId> = filtered
        .iter()
        .filter(|e| e.is_line_like())
        .map(|e| e.id())
        .collect();
    if let [l1, l2] = lines[..] {
        let crossing = Intersection::new(l1, l2, ElementClass::Transient);
        let ctx = GeomCtx::new(registry, shapes);
        let near = crossing
            .position(ctx)
            .map(|at| (at - point).hypot() <= POINT_RADIUS)
            .unwrap_or(false);
        if near {
            filtered.push(Element::Intersection(crossing));
        }
    }

    // Highest priority wins; stable sort keeps registration order within a
    // rank.
    unfiltered.sort_by(|a, b| b.priority().cmp(&a.priority()));
    filtered.sort_by(|a, b| b.priority().cmp(&a.priority()));

    HoverResolution {
        hover: filtered.into_iter().next(),
        over: unfiltered.into_iter().next(),
    }
}

/// Convert an abstract hit into a concrete point usable for snapping: a line
/// yields a transient point-on-line at the projected parameter, a shape a
/// transient point in its frame, a point is returned unchanged, and anything
/// unresolvable becomes an unattached point at `point`.
pub fn specify(ctx: GeomCtx, element: &Element, point: Point) -> Element {
    if element.is_point_like() {
        return element.clone();
    }
    if element.is_line_like() {
        if let Some(pol) =
            PointOnLine::at_projection(ctx, element.id(), point, ElementClass::Transient)
        {
            return Element::PointOnLine(pol);
        }
    }
    if let Element::Shape(body) = element {
        let local = body.frame(ctx).inverse() * point;
        return Element::FreePoint(FreePoint::in_frame(
            body.id,
            local,
            ElementClass::Transient,
        ));
    }
    Element::FreePoint(FreePoint::new(point, ElementClass::Transient))
}

/// Reduce a transient element to the persistent element it stands for: a
/// transient point in a shape frame despecifies to that shape, a transient
/// point-on-line to its line. Persistent elements, and transients with no
/// persistent representation, despecify to themselves. Idempotent.
pub fn despecify(registry: &Registry, element: &Element) -> Element {
    if element.class() != ElementClass::Transient {
        return element.clone();
    }
    let represented = match element {
        Element::FreePoint(p) => match p.anchor {
            Anchor::Frame { shape, .. } | Anchor::Vertex { shape, .. } => registry.get(shape),
            Anchor::World(_) => None,
        },
        Element::PointOnLine(p) => registry.get(p.line),
        _ => None,
    };
    match represented {
        Some(target) => despecify(registry, target),
        None => element.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Polygon, ShapeSet};
    use crate::elements::{ParamMode, Segment, ShapeBody};
    use approx::assert_abs_diff_eq;

    fn segment_between(
        registry: &mut Registry,
        a: Point,
        b: Point,
    ) -> (ElementId, ElementId, ElementId) {
        let p1 = FreePoint::new(a, ElementClass::Construction);
        let p2 = FreePoint::new(b, ElementClass::Construction);
        let seg = Segment::new(p1.id, p2.id, ElementClass::Construction);
        let (p1_id, p2_id, seg_id) = (p1.id, p2.id, seg.id);
        registry.register(vec![
            Element::FreePoint(p1),
            Element::FreePoint(p2),
            Element::Segment(seg),
        ]);
        (p1_id, p2_id, seg_id)
    }

    #[test]
    fn test_overlap_tolerances() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (p1, _p2, seg) =
            segment_between(&mut registry, Point::ZERO, Point::new(100.0, 0.0));

        let near_point = overlap_all(&registry, &shapes, Point::new(1.0, 1.0));
        assert!(near_point.contains(&p1));
        assert!(near_point.contains(&seg));

        let mid_line = overlap_all(&registry, &shapes, Point::new(50.0, 2.0));
        assert!(!mid_line.contains(&p1));
        assert!(mid_line.contains(&seg));

        let far = overlap_all(&registry, &shapes, Point::new(50.0, 20.0));
        assert!(far.is_empty());
    }

    #[test]
    fn test_hover_ranks_point_over_line() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (p1, _p2, _seg) =
            segment_between(&mut registry, Point::ZERO, Point::new(100.0, 0.0));

        let res = cast_hover(&registry, &shapes, Point::new(1.0, 1.0), None, &[]);
        assert_eq!(res.hover.map(|e| e.id()), Some(p1));
    }

    #[test]
    fn test_hover_filters_transitive_dependency_of_held() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (p1, _p2, seg) =
            segment_between(&mut registry, Point::ZERO, Point::new(100.0, 0.0));
        let pol = PointOnLine::new(seg, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);

        // Holding the point-on-line and hovering an endpoint it transitively
        // depends on: the filter blanks hover, over still resolves.
        let res = cast_hover(&registry, &shapes, Point::new(1.0, 1.0), Some(pol_id), &[]);
        assert!(res.hover.is_none());
        assert_eq!(res.over.map(|e| e.id()), Some(p1));
    }

    #[test]
    fn test_hover_synthesizes_intersection_of_two_lines() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (_, _, l1) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let (_, _, l2) =
            segment_between(&mut registry, Point::new(5.0, -5.0), Point::new(5.0, 5.0));

        let res = cast_hover(&registry, &shapes, Point::new(5.0, 0.5), None, &[]);
        let Some(Element::Intersection(x)) = res.hover else {
            panic!("expected a synthetic intersection");
        };
        assert_eq!(x.class, ElementClass::Transient);
        assert!((x.a == l1 && x.b == l2) || (x.a == l2 && x.b == l1));
        // The unfiltered answer stays a deletable registered element.
        assert!(matches!(res.over, Some(Element::Segment(_))));
    }

    #[test]
    fn test_specify_line_yields_projected_point() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (_, _, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let ctx = GeomCtx::new(&registry, &shapes);

        let element = registry.get(seg).unwrap().clone();
        let Element::PointOnLine(pol) = specify(ctx, &element, Point::new(7.0, 2.0)) else {
            panic!("expected a point-on-line");
        };
        assert_eq!(pol.class, ElementClass::Transient);
        assert_eq!(pol.line, seg);
        let at = pol.position(ctx).unwrap();
        assert_abs_diff_eq!(at.x, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(at.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_specify_shape_yields_frame_point() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let sref = shapes.push(Box::new(Polygon::triangle()));
        let body = ShapeBody::new(sref);
        let body_id = body.id;
        registry.register(vec![Element::Shape(body)]);
        let ctx = GeomCtx::new(&registry, &shapes);

        let element = registry.get(body_id).unwrap().clone();
        let hit = Point::new(0.0, 10.0);
        let Element::FreePoint(p) = specify(ctx, &element, hit) else {
            panic!("expected a free point");
        };
        assert_eq!(p.class, ElementClass::Transient);
        assert!(matches!(p.anchor, Anchor::Frame { shape, .. } if shape == body_id));
        assert_eq!(p.position(ctx), Some(hit));
    }

    #[test]
    fn test_despecify_idempotent() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (_, _, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let ctx = GeomCtx::new(&registry, &shapes);

        let element = registry.get(seg).unwrap().clone();
        let transient = specify(ctx, &element, Point::new(7.0, 2.0));

        let once = despecify(&registry, &transient);
        assert_eq!(once.id(), seg);
        let twice = despecify(&registry, &once);
        assert_eq!(twice.id(), once.id());

        // Transients with no persistent representation reduce to themselves.
        let loose = Element::FreePoint(FreePoint::new(Point::ZERO, ElementClass::Transient));
        assert_eq!(despecify(&registry, &loose).id(), loose.id());
    }
}
