//! Dependency registry: the single source of truth for which elements are
//! live and who depends on whom.
//!
//! The registry owns every registered [`Element`] and maintains the inverse
//! dependency relation (dependents). All graph mutation goes through it:
//! registration, deregistration with hand-over repair, whole-element
//! transformation, and single-edge reassignment with type and cycle checks.
//!
//! Contract violations (deregistering or transforming an element that is not
//! registered, reassigning a dependency the element does not hold) panic.
//! Illegal user-driven reassignments are not errors: they come back as a
//! [`ReassignOutcome`] and the graph stays untouched.

use crate::boundary::{ShapeRef, ShapeSet};
use crate::elements::{Anchor, Axis, Element, ElementClass, ElementId, FreePoint, GeomCtx, Segment};
use indexmap::{IndexMap, IndexSet};
use kurbo::{Affine, Point};
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

/// Fallback span given to the replacement segment when a parallel line loses
/// its reference and carries no usable span to inherit.
const ORPHAN_SEGMENT_SPAN: f64 = 10.0;

/// Result of a user-driven dependency reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassignOutcome {
    /// The link was moved and both dependent sets are up to date.
    Accepted,
    /// The target cannot fill the reference slot (wrong capability).
    RejectedType,
    /// The target's dependency chain reaches back to the element.
    RejectedCycle,
}

/// Live elements plus the inverse dependency relation.
///
/// Insertion order is preserved so that iteration (rendering, overlap
/// testing) is deterministic.
#[derive(Default)]
pub struct Registry {
    elements: IndexMap<ElementId, Element>,
    dependents: IndexMap<ElementId, IndexSet<ElementId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Registered elements in registration order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    /// Mutable walk used by the editor's boundary bookkeeping. Callers must
    /// not change ids or dependency lists through this.
    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.values_mut()
    }

    /// Elements currently listing `id` as a dependency.
    pub fn dependents_of(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.dependents.get(&id).into_iter().flatten().copied()
    }

    /// Register a batch of elements. Dependencies may be satisfied by already
    /// registered elements or by other members of the same batch; anything
    /// else is a contract violation and panics. Transient elements are
    /// promoted to Construction on the way in.
    pub fn register(&mut self, elements: Vec<Element>) -> Vec<ElementId> {
        let mut ids = Vec::with_capacity(elements.len());
        let mut edges = Vec::with_capacity(elements.len());
        for mut element in elements {
            element.promote();
            let id = element.id();
            trace!("register {id}");
            edges.push((id, element.dependencies()));
            self.elements.insert(id, element);
            ids.push(id);
        }
        // Wire the inverse relation once the whole batch is present.
        for (id, deps) in edges {
            self.dependents.entry(id).or_default();
            for dep in deps {
                assert!(
                    self.elements.contains_key(&dep),
                    "element {id} depends on unregistered element {dep}"
                );
                self.dependents.entry(dep).or_default().insert(id);
            }
        }
        ids
    }

    /// Remove a registered element, repairing or cascading its dependents.
    ///
    /// A sole dependent whose only dependency is the vanishing element (and
    /// on which nothing else builds) is deregistered first: it is auxiliary
    /// geometry that existed only to support this element. Every other
    /// dependent is offered a null hand-over and self-repairs into a
    /// free-standing form at its last position.
    ///
    /// Panics if `id` is not registered.
    pub fn deregister(&mut self, shapes: &mut ShapeSet, id: ElementId) {
        assert!(
            self.elements.contains_key(&id),
            "deregister of unregistered element {id}"
        );
        debug!("deregister {id}");

        let dependents: Vec<ElementId> = self.dependents_of(id).collect();
        if let [sole] = dependents[..] {
            let useless = self.dependents_of(sole).next().is_none()
                && self
                    .elements
                    .get(&sole)
                    .is_some_and(|e| e.dependencies() == [id]);
            if useless {
                self.deregister(shapes, sole);
            }
        }

        let dependents: Vec<ElementId> = self.dependents_of(id).collect();
        for dependent in dependents {
            if self.elements.contains_key(&dependent) {
                self.repair_orphan(shapes, dependent, id);
            }
        }

        if let Some(element) = self.elements.shift_remove(&id) {
            for dep in element.dependencies() {
                if let Some(set) = self.dependents.get_mut(&dep) {
                    set.shift_remove(&id);
                }
            }
        }
        let leftover = self.dependents.shift_remove(&id);
        debug_assert!(
            leftover.is_none_or(|s| s.is_empty()),
            "deregistered element {id} still has dependents"
        );
    }

    /// Null hand-over: `dependent` loses its reference to `vanishing` and
    /// repairs itself into a self-sufficient form. `vanishing` is still
    /// registered here so last positions resolve.
    fn repair_orphan(&mut self, shapes: &mut ShapeSet, dependent: ElementId, vanishing: ElementId) {
        let Some(element) = self.elements.get(&dependent) else {
            return;
        };
        trace!("null hand-over: {dependent} loses {vanishing}");
        match element {
            // A point anchored to a vanishing shape pins itself to its
            // current world position.
            Element::FreePoint(_) => {
                let world = {
                    let ctx = GeomCtx::new(self, shapes);
                    ctx.position_of(dependent).unwrap_or(Point::ZERO)
                };
                if let Some(Element::FreePoint(p)) = self.elements.get_mut(&dependent) {
                    p.detach(world);
                }
                if let Some(set) = self.dependents.get_mut(&vanishing) {
                    set.shift_remove(&dependent);
                }
            }
            // A segment losing an endpoint materializes a replacement free
            // point at the old location.
            Element::Segment(_) => {
                let world = {
                    let ctx = GeomCtx::new(self, shapes);
                    ctx.position_of(vanishing).unwrap_or(Point::ZERO)
                };
                let replacement = FreePoint::new(world, ElementClass::Construction);
                let replacement_id = replacement.id;
                self.register(vec![Element::FreePoint(replacement)]);
                self.reassign_link(shapes, dependent, vanishing, replacement_id);
            }
            // A point on a vanishing line becomes a plain free point at its
            // last position.
            Element::PointOnLine(p) => {
                let class = p.class;
                let world = {
                    let ctx = GeomCtx::new(self, shapes);
                    ctx.position_of(dependent).unwrap_or(Point::ZERO)
                };
                self.transform_element(
                    shapes,
                    dependent,
                    Element::FreePoint(FreePoint::new(world, class)),
                );
            }
            // A parallel of a vanishing line freezes into an independent
            // segment along its current carrier.
            Element::ParallelLine(par) => {
                let class = par.class;
                let infinite = par.infinite;
                let span = {
                    let ctx = GeomCtx::new(self, shapes);
                    self.elements
                        .get(&dependent)
                        .and_then(|e| e.axis(ctx))
                        .map(|axis| {
                            let len = if axis.length.is_finite() && axis.length > 0.0 {
                                axis.length
                            } else {
                                ORPHAN_SEGMENT_SPAN
                            };
                            (axis.origin, axis.point_at(len))
                        })
                };
                let (a, b) =
                    span.unwrap_or((Point::ZERO, Point::new(ORPHAN_SEGMENT_SPAN, 0.0)));
                let pa = FreePoint::new(a, ElementClass::Construction);
                let pb = FreePoint::new(b, ElementClass::Construction);
                let mut seg = Segment::new(pa.id, pb.id, class);
                seg.infinite = infinite;
                self.register(vec![Element::FreePoint(pa), Element::FreePoint(pb)]);
                self.transform_element(shapes, dependent, Element::Segment(seg));
            }
            // An intersection losing either line freezes at its last
            // position. A degenerate (non-finite) position is carried as-is.
            Element::Intersection(x) => {
                let class = x.class;
                let world = {
                    let ctx = GeomCtx::new(self, shapes);
                    ctx.position_of(dependent).unwrap_or(Point::ZERO)
                };
                self.transform_element(
                    shapes,
                    dependent,
                    Element::FreePoint(FreePoint::new(world, class)),
                );
            }
            Element::Shape(_) => unreachable!("shape bodies have no dependencies"),
        }
    }

    /// Replace `resignee` with `inheritor`: register the inheritor, relink
    /// every dependent of the resignee onto it, then deregister the resignee.
    /// Returns the inheritor's id.
    ///
    /// Panics if `resignee` is not registered. The inheritor's own
    /// dependencies must already be registered.
    pub fn transform_element(
        &mut self,
        shapes: &mut ShapeSet,
        resignee: ElementId,
        inheritor: Element,
    ) -> ElementId {
        assert!(
            self.elements.contains_key(&resignee),
            "transform of unregistered element {resignee}"
        );
        let inheritor_id = inheritor.id();
        debug!("transform {resignee} -> {inheritor_id}");
        if !self.elements.contains_key(&inheritor_id) {
            self.register(vec![inheritor]);
        }
        let dependents: Vec<ElementId> = self.dependents_of(resignee).collect();
        for dependent in dependents {
            self.reassign_link(shapes, dependent, resignee, inheritor_id);
        }
        self.deregister(shapes, resignee);
        inheritor_id
    }

    /// The single-edge primitive: swap `element`'s reference to `original`
    /// for `inheritor` and keep both dependent sets in lock-step.
    ///
    /// Panics if `element` is not registered or does not actually depend on
    /// `original`. No type or cycle checking happens here; use
    /// [`Registry::try_reassign`] for user-driven reassignment.
    pub fn reassign_link(
        &mut self,
        shapes: &ShapeSet,
        element: ElementId,
        original: ElementId,
        inheritor: ElementId,
    ) {
        let Some(current) = self.elements.get(&element) else {
            panic!("reassign_link on unregistered element {element}");
        };
        assert!(
            current.dependencies().contains(&original),
            "element {element} does not depend on {original}"
        );
        trace!("reassign {element}: {original} -> {inheritor}");
        // Hand-over reads old geometry through the registry, so mutate a
        // copy and write it back.
        let mut moved = current.clone();
        {
            let ctx = GeomCtx::new(self, shapes);
            moved.handover(ctx, original, inheritor);
        }
        if let Some(slot) = self.elements.get_mut(&element) {
            *slot = moved;
        }
        if let Some(set) = self.dependents.get_mut(&original) {
            set.shift_remove(&element);
        }
        self.dependents.entry(inheritor).or_default().insert(element);
    }

    /// User-driven reassignment: type-check, cycle-check, then relink. On
    /// rejection the graph is left exactly as it was.
    pub fn try_reassign(
        &mut self,
        shapes: &ShapeSet,
        element: ElementId,
        original: ElementId,
        target: ElementId,
    ) -> ReassignOutcome {
        let compatible = match (self.elements.get(&element), self.elements.get(&target)) {
            (Some(e), Some(t)) => e.typecheck_handover(original, Some(t)),
            _ => false,
        };
        if !compatible {
            return ReassignOutcome::RejectedType;
        }
        if self.would_create_cycle(element, target) {
            return ReassignOutcome::RejectedCycle;
        }
        self.reassign_link(shapes, element, original, target);
        ReassignOutcome::Accepted
    }

    /// Would making `dependent` depend on `candidate` close a cycle?
    /// Breadth-first walk of `candidate`'s dependency chain.
    pub fn would_create_cycle(&self, dependent: ElementId, candidate: ElementId) -> bool {
        if dependent == candidate {
            return true;
        }
        let mut queue = VecDeque::from([candidate]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(element) = self.elements.get(&current) {
                for dep in element.dependencies() {
                    if dep == dependent {
                        return true;
                    }
                    queue.push_back(dep);
                }
            }
        }
        false
    }

    /// Everything `id` transitively depends on.
    pub fn transitive_dependencies(&self, id: ElementId) -> HashSet<ElementId> {
        let mut out = HashSet::new();
        let mut queue: VecDeque<ElementId> = self
            .elements
            .get(&id)
            .map(|e| e.dependencies().into())
            .unwrap_or_default();
        while let Some(current) = queue.pop_front() {
            if !out.insert(current) {
                continue;
            }
            if let Some(element) = self.elements.get(&current) {
                queue.extend(element.dependencies());
            }
        }
        out
    }

    /// Everything that transitively depends on `id`.
    pub fn transitive_dependents(&self, id: ElementId) -> HashSet<ElementId> {
        let mut out = HashSet::new();
        let mut queue: VecDeque<ElementId> = self.dependents_of(id).collect();
        while let Some(current) = queue.pop_front() {
            if !out.insert(current) {
                continue;
            }
            queue.extend(self.dependents_of(current));
        }
        out
    }

    /// Longest dependency chain below `id`. Leaves have depth 0.
    pub fn dependency_depth(&self, id: ElementId) -> usize {
        let Some(element) = self.elements.get(&id) else {
            return 0;
        };
        element
            .dependencies()
            .into_iter()
            .map(|dep| 1 + self.dependency_depth(dep))
            .max()
            .unwrap_or(0)
    }

    /// Assign a world position to a positionable element. Free points move
    /// their anchor, points-on-line reproject, parallels re-offset; anything
    /// else is ignored.
    ///
    /// Panics if `id` is not registered.
    pub fn set_position(&mut self, shapes: &mut ShapeSet, id: ElementId, world: Point) {
        enum Plan {
            World,
            Frame(Affine),
            Vertex(ShapeRef, usize),
            OnAxis(Axis),
            Skip,
        }

        let plan = {
            let ctx = GeomCtx::new(self, shapes);
            match self.elements.get(&id) {
                Some(Element::FreePoint(p)) => match p.anchor {
                    Anchor::World(_) => Plan::World,
                    Anchor::Frame { shape, .. } => {
                        ctx.frame_of(shape).map(Plan::Frame).unwrap_or(Plan::Skip)
                    }
                    Anchor::Vertex { shape, index } => match ctx.registry.get(shape) {
                        Some(Element::Shape(body)) => Plan::Vertex(body.shape, index),
                        _ => Plan::Skip,
                    },
                },
                Some(Element::PointOnLine(p)) => {
                    ctx.axis_of(p.line).map(Plan::OnAxis).unwrap_or(Plan::Skip)
                }
                Some(Element::ParallelLine(p)) => ctx
                    .axis_of(p.reference)
                    .map(Plan::OnAxis)
                    .unwrap_or(Plan::Skip),
                Some(_) => Plan::Skip,
                None => panic!("set_position on unregistered element {id}"),
            }
        };

        match (plan, self.elements.get_mut(&id)) {
            (Plan::World, Some(Element::FreePoint(p))) => p.anchor = Anchor::World(world),
            (Plan::Frame(frame), Some(Element::FreePoint(p))) => {
                if let Anchor::Frame { local, .. } = &mut p.anchor {
                    *local = frame.inverse() * world;
                }
            }
            (Plan::Vertex(shape, index), Some(Element::FreePoint(_))) => {
                let provider = shapes.get_mut(shape);
                if index < provider.vertex_count() {
                    provider.set_vertex(index, world);
                }
            }
            (Plan::OnAxis(axis), Some(Element::PointOnLine(p))) => p.set_position(&axis, world),
            (Plan::OnAxis(axis), Some(Element::ParallelLine(p))) => p.set_position(&axis, world),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Polygon, ShapeSet};
    use crate::elements::{ParallelLine, ParamMode, PointOnLine, ShapeBody};
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
    fn test_register_promotes_transient() {
        let mut registry = Registry::new();
        let p = FreePoint::new(Point::ZERO, ElementClass::Transient);
        let ids = registry.register(vec![Element::FreePoint(p)]);
        assert_eq!(
            registry.get(ids[0]).unwrap().class(),
            ElementClass::Construction
        );
    }

    #[test]
    fn test_register_wires_dependents() {
        let mut registry = Registry::new();
        let (p1, p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(registry.dependents_of(p1).collect::<Vec<_>>(), vec![seg]);
        assert_eq!(registry.dependents_of(p2).collect::<Vec<_>>(), vec![seg]);
        assert_eq!(registry.dependents_of(seg).count(), 0);
    }

    #[test]
    fn test_deregister_endpoint_repairs_segment() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let (p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));

        registry.deregister(&mut shapes, p1);

        assert!(!registry.contains(p1));
        assert!(registry.contains(seg));
        // The segment self-repaired onto a fresh point at the old location.
        let Some(Element::Segment(s)) = registry.get(seg) else {
            panic!("segment missing");
        };
        assert_ne!(s.a, p1);
        let ctx = GeomCtx::new(&registry, &shapes);
        let axis = ctx.axis_of(seg).unwrap();
        assert_abs_diff_eq!(axis.origin.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(axis.origin.y, 0.0, epsilon = 1e-12);
        // Completeness: nothing still lists the removed id.
        for element in registry.elements() {
            assert!(!element.dependencies().contains(&p1));
        }
    }

    #[test]
    fn test_deregister_cascades_sole_auxiliary_dependent() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let (p1, p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let pol = PointOnLine::new(seg, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);

        // The point existed only to sit on this line; it goes with it.
        registry.deregister(&mut shapes, seg);
        assert!(!registry.contains(seg));
        assert!(!registry.contains(pol_id));
        assert!(registry.contains(p1));
        assert!(registry.contains(p2));
        assert_eq!(registry.dependents_of(p1).count(), 0);
    }

    #[test]
    fn test_deregister_line_transforms_supported_point() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let (_p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let pol = PointOnLine::new(seg, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);
        // Give the point a dependent so the cascade leaves it alone.
        let far = FreePoint::new(Point::new(0.0, 7.0), ElementClass::Construction);
        let leg = Segment::new(pol_id, far.id, ElementClass::Construction);
        let leg_id = leg.id;
        registry.register(vec![Element::FreePoint(far), Element::Segment(leg)]);

        registry.deregister(&mut shapes, seg);

        assert!(!registry.contains(seg));
        assert!(!registry.contains(pol_id));
        // The point-on-line became a free point at (5, 0) and the dependent
        // segment follows it.
        let Some(Element::Segment(s)) = registry.get(leg_id) else {
            panic!("segment missing");
        };
        let replacement = s.a;
        assert_ne!(replacement, pol_id);
        assert!(matches!(
            registry.get(replacement),
            Some(Element::FreePoint(_))
        ));
        let ctx = GeomCtx::new(&registry, &shapes);
        let at = ctx.position_of(replacement).unwrap();
        assert_abs_diff_eq!(at.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(at.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deregister_reference_freezes_parallel() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let (_p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let par = ParallelLine::new(seg, 5.0, ElementClass::Construction);
        let par_id = par.id;
        registry.register(vec![Element::ParallelLine(par)]);
        let pol = PointOnLine::new(par_id, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);

        let ctx = GeomCtx::new(&registry, &shapes);
        let before = ctx.position_of(pol_id).unwrap();

        registry.deregister(&mut shapes, seg);

        assert!(!registry.contains(par_id));
        assert!(registry.contains(pol_id));
        // The point now rides a frozen segment along the old carrier, at the
        // same world position.
        let Some(Element::PointOnLine(p)) = registry.get(pol_id) else {
            panic!("point-on-line missing");
        };
        assert!(matches!(registry.get(p.line), Some(Element::Segment(_))));
        let ctx = GeomCtx::new(&registry, &shapes);
        let after = ctx.position_of(pol_id).unwrap();
        assert_abs_diff_eq!(before.x, after.x, epsilon = 1e-9);
        assert_abs_diff_eq!(before.y, after.y, epsilon = 1e-9);
    }

    #[test]
    fn test_deregister_shape_detaches_frame_point() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let sref = shapes.push(Box::new(
            Polygon::triangle().translated(kurbo::Vec2::new(100.0, 50.0)),
        ));
        let body = ShapeBody::new(sref);
        let body_id = body.id;
        registry.register(vec![Element::Shape(body)]);
        let p = FreePoint::in_frame(body_id, Point::new(1.0, 2.0), ElementClass::Construction);
        let p_id = p.id;
        registry.register(vec![Element::FreePoint(p)]);
        // A second attached point keeps the cascade from eating the first.
        let q = FreePoint::in_frame(body_id, Point::ZERO, ElementClass::Construction);
        registry.register(vec![Element::FreePoint(q)]);

        let ctx = GeomCtx::new(&registry, &shapes);
        let before = ctx.position_of(p_id).unwrap();

        registry.deregister(&mut shapes, body_id);

        let Some(Element::FreePoint(p)) = registry.get(p_id) else {
            panic!("point missing");
        };
        assert!(matches!(p.anchor, Anchor::World(_)));
        let ctx = GeomCtx::new(&registry, &shapes);
        let after = ctx.position_of(p_id).unwrap();
        assert_abs_diff_eq!(before.x, after.x, epsilon = 1e-9);
        assert_abs_diff_eq!(before.y, after.y, epsilon = 1e-9);
    }

    #[test]
    fn test_reassign_accepted_updates_both_sides() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let free = FreePoint::new(Point::new(2.0, 3.0), ElementClass::Construction);
        let free_id = free.id;
        registry.register(vec![Element::FreePoint(free)]);

        let outcome = registry.try_reassign(&shapes, seg, p1, free_id);
        assert_eq!(outcome, ReassignOutcome::Accepted);

        let Some(Element::Segment(s)) = registry.get(seg) else {
            panic!("segment missing");
        };
        assert_eq!(s.a, free_id);
        assert_eq!(registry.dependents_of(p1).count(), 0);
        assert!(registry.dependents_of(free_id).any(|d| d == seg));
    }

    #[test]
    fn test_reassign_rejects_wrong_type() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        let (p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let (_, _, other) = segment_between(&mut registry, Point::ZERO, Point::new(0.0, 10.0));

        // A segment endpoint must be point-like; another segment is not.
        let outcome = registry.try_reassign(&shapes, seg, p1, other);
        assert_eq!(outcome, ReassignOutcome::RejectedType);
        let Some(Element::Segment(s)) = registry.get(seg) else {
            panic!("segment missing");
        };
        assert_eq!(s.a, p1);
    }

    #[test]
    fn test_reassign_rejects_cycle() {
        let mut registry = Registry::new();
        let shapes = ShapeSet::new();
        // Chain: segment <- parallel <- point-on-parallel.
        let (p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let par = ParallelLine::new(seg, 5.0, ElementClass::Construction);
        let par_id = par.id;
        registry.register(vec![Element::ParallelLine(par)]);
        let pol = PointOnLine::new(par_id, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);

        // Re-anchoring the segment's endpoint onto the end of the chain
        // would close the loop.
        let outcome = registry.try_reassign(&shapes, seg, p1, pol_id);
        assert_eq!(outcome, ReassignOutcome::RejectedCycle);

        // Graph untouched.
        let Some(Element::Segment(s)) = registry.get(seg) else {
            panic!("segment missing");
        };
        assert_eq!(s.a, p1);
        assert!(registry.dependents_of(p1).any(|d| d == seg));
        assert!(!registry.dependents_of(pol_id).any(|d| d == seg));
    }

    #[test]
    fn test_dependency_depth() {
        let mut registry = Registry::new();
        let (p1, _p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let pol = PointOnLine::new(seg, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);

        assert_eq!(registry.dependency_depth(p1), 0);
        assert_eq!(registry.dependency_depth(seg), 1);
        assert_eq!(registry.dependency_depth(pol_id), 2);
    }

    #[test]
    fn test_transitive_queries() {
        let mut registry = Registry::new();
        let (p1, p2, seg) = segment_between(&mut registry, Point::ZERO, Point::new(10.0, 0.0));
        let pol = PointOnLine::new(seg, 0.5, ParamMode::Ratio, ElementClass::Construction);
        let pol_id = pol.id;
        registry.register(vec![Element::PointOnLine(pol)]);

        let deps = registry.transitive_dependencies(pol_id);
        assert!(deps.contains(&seg) && deps.contains(&p1) && deps.contains(&p2));
        let dependents = registry.transitive_dependents(p1);
        assert!(dependents.contains(&seg) && dependents.contains(&pol_id));
    }

    #[test]
    fn test_set_position_moves_free_point() {
        let mut registry = Registry::new();
        let mut shapes = ShapeSet::new();
        let p = FreePoint::new(Point::ZERO, ElementClass::Construction);
        let p_id = p.id;
        registry.register(vec![Element::FreePoint(p)]);

        registry.set_position(&mut shapes, p_id, Point::new(4.0, 5.0));
        let ctx = GeomCtx::new(&registry, &shapes);
        assert_eq!(ctx.position_of(p_id), Some(Point::new(4.0, 5.0)));
    }
}
