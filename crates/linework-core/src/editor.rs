//! The editor context: registry, shape set, and interaction state, driven
//! one tick at a time.
//!
//! [`Editor::tick`] runs the fixed per-frame sequence: hover resolution
//! first, so every decision sees a consistent snapshot, then click and
//! double-click handling, delete, escape rollback, and finally drag
//! application. Polygon boundary edits (break edge, delete vertex, delete
//! edge, reset) live here too, because they need registry bookkeeping on
//! both sides of the provider mutation.

use crate::boundary::{BoundaryError, Polygon, ShapeRef, ShapeSet};
use crate::elements::{
    Anchor, Element, ElementClass, ElementId, FreePoint, GeomCtx, ParallelLine, Segment, ShapeBody,
};
use crate::hit::{cast_hover, despecify, specify};
use crate::input::InputFrame;
use crate::interaction::{GesturePhase, Interaction, Mode, Victim};
use crate::registry::{ReassignOutcome, Registry};
use kurbo::Point;
use log::debug;

/// Scroll-to-rotate step, radians per scroll unit.
const ROTATE_STEP: f64 = 0.05;

/// The whole editor state. Constructed once and threaded explicitly; there
/// are no globals.
pub struct Editor {
    pub registry: Registry,
    pub shapes: ShapeSet,
    pub interaction: Interaction,
    pointer: Point,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            shapes: ShapeSet::new(),
            interaction: Interaction::new(),
            pointer: Point::ZERO,
        }
    }

    /// Last pointer position seen by [`Editor::tick`].
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// Run one interaction step.
    pub fn tick(&mut self, frame: &InputFrame) {
        self.pointer = frame.pointer;

        // Hover first: all decisions below run against this snapshot.
        let suppressed = self.interaction.suppressed();
        let held_id = self.interaction.held_id();
        let res = cast_hover(
            &self.registry,
            &self.shapes,
            frame.pointer,
            held_id,
            &suppressed,
        );
        self.interaction.hover = res.hover;
        self.interaction.over = res.over;

        self.handle_buttons(frame);

        if frame.delete {
            self.delete_current();
        }
        if frame.escape {
            self.cancel_gesture();
        }
        self.apply_drag(frame);
        self.apply_scroll(frame);
    }

    fn handle_buttons(&mut self, frame: &InputFrame) {
        if self.interaction.mode == Mode::Inactive {
            if frame.primary.just_pressed {
                if frame.double_click {
                    self.handle_double_click(frame.pointer);
                } else {
                    self.begin_gesture(Mode::Edit, frame.pointer);
                }
            } else if frame.secondary.just_pressed {
                self.begin_gesture(Mode::Construction, frame.pointer);
            }
            return;
        }

        if self.interaction.past_drag_threshold(frame.pointer) {
            self.interaction.phase = Some(GesturePhase::Dragging);
            self.setup_drag();
        }

        let released = match self.interaction.mode {
            Mode::Edit => frame.primary.just_released,
            Mode::Construction => frame.secondary.just_released,
            Mode::Inactive => false,
        };
        if released {
            if self.interaction.is_dragging() {
                self.end_drag(frame.pointer);
            } else {
                self.click(frame);
            }
            self.interaction.release();
        }
    }

    fn begin_gesture(&mut self, mode: Mode, pointer: Point) {
        let held = self.interaction.hover.clone();
        // Snap the gesture origin onto the hit.
        let origin = {
            let ctx = GeomCtx::new(&self.registry, &self.shapes);
            held.as_ref()
                .map(|h| specify(ctx, h, pointer))
                .and_then(|s| s.position(ctx))
                .unwrap_or(pointer)
        };
        self.interaction.begin(mode, held, origin);
    }

    fn setup_drag(&mut self) {
        match self.interaction.mode {
            Mode::Edit => self.setup_edit_drag(),
            Mode::Construction => self.setup_construction_drag(),
            Mode::Inactive => {}
        }
    }

    /// Positionable elements that moving `id` means moving.
    fn drag_targets(&self, id: ElementId) -> Vec<ElementId> {
        let Some(element) = self.registry.get(id) else {
            return Vec::new();
        };
        if element.is_positionable() {
            return vec![id];
        }
        element
            .dependencies()
            .into_iter()
            .filter(|dep| self.registry.get(*dep).is_some_and(|e| e.is_positionable()))
            .collect()
    }

    fn setup_edit_drag(&mut self) {
        let Some(held) = self.interaction.held.clone() else {
            return;
        };
        let anchor = despecify(&self.registry, &held).id();
        // Dragging a selected element drags the whole selection.
        let seeds: Vec<ElementId> = if self.interaction.selection.contains(&anchor) {
            self.interaction.selection.iter().copied().collect()
        } else {
            vec![anchor]
        };
        let mut queue = Vec::new();
        for seed in seeds {
            for target in self.drag_targets(seed) {
                if !queue.contains(&target) {
                    queue.push(target);
                }
            }
        }
        self.interaction.gesture.drag_queue = queue;
    }

    fn setup_construction_drag(&mut self) {
        let held = self.interaction.held.clone();
        let origin = self.interaction.drag_origin;

        // A hit line gets echoed as a parallel.
        if let Some(line) = held
            .as_ref()
            .filter(|h| h.is_line_like() && self.registry.contains(h.id()))
        {
            let line_id = line.id();
            let par = ParallelLine::new(line_id, 0.0, ElementClass::Construction);
            let par_id = par.id;
            self.registry.register(vec![Element::ParallelLine(par)]);
            self.interaction.gesture.cancel_queue.push(par_id);
            self.interaction.gesture.drag_queue.push(par_id);
            self.interaction.gesture.victim = Some(Victim {
                element: par_id,
                dependency: line_id,
            });
            return;
        }

        // Otherwise a point+line pair: anchored at the (specified) hit, or
        // free-floating from the gesture origin.
        let anchor_id = match held {
            Some(hit) if hit.is_point_like() && self.registry.contains(hit.id()) => hit.id(),
            Some(hit) => {
                let spec = {
                    let ctx = GeomCtx::new(&self.registry, &self.shapes);
                    specify(ctx, &hit, origin)
                };
                let ids = self.registry.register(vec![spec]);
                self.interaction.gesture.cancel_queue.push(ids[0]);
                ids[0]
            }
            None => {
                let p = FreePoint::new(origin, ElementClass::Construction);
                let id = p.id;
                self.registry.register(vec![Element::FreePoint(p)]);
                self.interaction.gesture.cancel_queue.push(id);
                id
            }
        };
        let free = FreePoint::new(origin, ElementClass::Construction);
        let free_id = free.id;
        let seg = Segment::new(anchor_id, free_id, ElementClass::Construction);
        let seg_id = seg.id;
        self.registry
            .register(vec![Element::FreePoint(free), Element::Segment(seg)]);
        self.interaction.gesture.cancel_queue.push(free_id);
        self.interaction.gesture.cancel_queue.push(seg_id);
        self.interaction.gesture.drag_queue.push(free_id);
        self.interaction.gesture.victim = Some(Victim {
            element: seg_id,
            dependency: free_id,
        });
    }

    /// Drag end: adopt the hover target for the victim's provisional link,
    /// if there is one and it survives the type and cycle checks. Tentative
    /// geometry that was not superseded stays as a committed construction.
    fn end_drag(&mut self, pointer: Point) {
        let Some(victim) = self.interaction.gesture.victim else {
            return;
        };
        if !self.registry.contains(victim.element) {
            return;
        }
        let Some(hover) = self.interaction.hover.clone() else {
            return;
        };

        let wants_line = matches!(
            self.registry.get(victim.element),
            Some(Element::ParallelLine(_))
        );
        let adopted = if wants_line {
            // Rebind the parallel onto the hovered persistent line.
            let target = despecify(&self.registry, &hover).id();
            self.registry.contains(target)
                && target != victim.dependency
                && self
                    .registry
                    .try_reassign(&self.shapes, victim.element, victim.dependency, target)
                    == ReassignOutcome::Accepted
        } else {
            // Rebind the free endpoint onto the specified hover point.
            let spec = {
                let ctx = GeomCtx::new(&self.registry, &self.shapes);
                specify(ctx, &hover, pointer)
            };
            let target = spec.id();
            if self.registry.contains(target) {
                target != victim.dependency
                    && self
                        .registry
                        .try_reassign(&self.shapes, victim.element, victim.dependency, target)
                        == ReassignOutcome::Accepted
            } else {
                // A transient target is only worth registering if adopted.
                let ids = self.registry.register(vec![spec]);
                match self.registry.try_reassign(
                    &self.shapes,
                    victim.element,
                    victim.dependency,
                    ids[0],
                ) {
                    ReassignOutcome::Accepted => true,
                    outcome => {
                        debug!("victim adoption rejected: {outcome:?}");
                        self.registry.deregister(&mut self.shapes, ids[0]);
                        false
                    }
                }
            }
        };

        if adopted {
            // The superseded provisional dependency goes with the gesture.
            let queue = &mut self.interaction.gesture.cancel_queue;
            if let Some(at) = queue.iter().position(|&id| id == victim.dependency) {
                queue.remove(at);
                if self.registry.contains(victim.dependency) {
                    self.registry.deregister(&mut self.shapes, victim.dependency);
                }
            }
        }
    }

    fn click(&mut self, frame: &InputFrame) {
        let Some(held) = self.interaction.held.clone() else {
            if self.interaction.mode == Mode::Edit && !frame.modifiers.toggle_select() {
                self.interaction.selection.clear();
            }
            return;
        };
        let id = despecify(&self.registry, &held).id();

        if frame.modifiers.toggle_select() {
            if self.registry.contains(id) {
                self.interaction.toggle_selected(id);
            }
            return;
        }
        match self.interaction.mode {
            Mode::Edit => {
                self.interaction.selection.clear();
                if self.registry.contains(id) {
                    self.interaction.selection.insert(id);
                }
            }
            Mode::Construction => self.toggle_element_mode(id),
            Mode::Inactive => {}
        }
    }

    /// Construction-mode click: flip a line's unbounded flag, or a
    /// point-on-line's parameter interpretation (position preserved).
    fn toggle_element_mode(&mut self, id: ElementId) {
        let carrier_axis = {
            let ctx = GeomCtx::new(&self.registry, &self.shapes);
            match self.registry.get(id) {
                Some(Element::PointOnLine(p)) => ctx.axis_of(p.line),
                _ => None,
            }
        };
        match self.registry.get_mut(id) {
            Some(Element::Segment(s)) => s.infinite = !s.infinite,
            Some(Element::ParallelLine(p)) => p.infinite = !p.infinite,
            Some(Element::PointOnLine(p)) => {
                if let Some(axis) = carrier_axis {
                    p.toggle_mode(&axis);
                }
            }
            _ => {}
        }
    }

    /// Edit-mode double-click: delete a boundary vertex, or break a boundary
    /// edge at the pointer. Both route to the shape provider.
    fn handle_double_click(&mut self, pointer: Point) {
        let Some(hover) = self.interaction.hover.clone() else {
            return;
        };
        match &hover {
            Element::FreePoint(p) if matches!(p.anchor, Anchor::Vertex { .. }) => {
                if let Err(err) = self.delete_vertex(p.id) {
                    debug!("delete vertex rejected: {err}");
                }
            }
            Element::Segment(s) if s.parent.is_some() => {
                let t = {
                    let ctx = GeomCtx::new(&self.registry, &self.shapes);
                    s.axis(ctx)
                        .map(|axis| (axis.project(pointer) / axis.length).clamp(0.0, 1.0))
                };
                if let Some(t) = t {
                    if let Err(err) = self.break_edge(s.id, t) {
                        debug!("break edge rejected: {err}");
                    }
                }
            }
            _ => {}
        }
    }

    /// Delete the selection, or the element under the pointer. Children go
    /// before parents; boundary elements route to the shape provider.
    fn delete_current(&mut self) {
        let mut targets: Vec<ElementId> = if self.interaction.selection.is_empty() {
            self.interaction
                .over
                .as_ref()
                .map(|e| vec![e.id()])
                .unwrap_or_default()
        } else {
            self.interaction.selection.iter().copied().collect()
        };
        self.interaction.selection.clear();
        targets.sort_by_key(|&id| std::cmp::Reverse(self.registry.dependency_depth(id)));

        for id in targets {
            // An earlier deletion may have cascaded this one away.
            if !self.registry.contains(id) {
                continue;
            }
            match self.registry.get(id) {
                Some(e) if e.class() == ElementClass::Shape => self.delete_boundary_element(id),
                Some(_) => self.registry.deregister(&mut self.shapes, id),
                None => {}
            }
        }
    }

    fn delete_boundary_element(&mut self, id: ElementId) {
        let outcome = match self.registry.get(id) {
            Some(Element::FreePoint(p)) if matches!(p.anchor, Anchor::Vertex { .. }) => {
                self.delete_vertex(id)
            }
            Some(Element::Segment(s)) if s.parent.is_some() => self.delete_edge(id),
            // The polygon body itself is not deletable from the core.
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            debug!("boundary delete rejected: {err}");
        }
    }

    /// Escape: unwind the cancel queue in reverse registration order and
    /// drop the gesture and selection.
    fn cancel_gesture(&mut self) {
        let queue: Vec<ElementId> = self
            .interaction
            .gesture
            .cancel_queue
            .drain(..)
            .rev()
            .collect();
        for id in queue {
            if self.registry.contains(id) {
                self.registry.deregister(&mut self.shapes, id);
            }
        }
        self.interaction.selection.clear();
        self.interaction.release();
    }

    /// Feed this frame's pointer delta into every drag-queue element.
    fn apply_drag(&mut self, frame: &InputFrame) {
        if !self.interaction.is_dragging() {
            return;
        }
        let queue = self.interaction.gesture.drag_queue.clone();
        for id in queue {
            if !self.registry.contains(id) {
                continue;
            }
            let current = {
                let ctx = GeomCtx::new(&self.registry, &self.shapes);
                ctx.position_of(id)
            };
            if let Some(current) = current {
                self.registry
                    .set_position(&mut self.shapes, id, current + frame.pointer_delta);
            }
        }
    }

    /// Scroll while hovering rotates the frame of the shape behind the
    /// hovered element.
    fn apply_scroll(&mut self, frame: &InputFrame) {
        if frame.scroll.y == 0.0 {
            return;
        }
        let Some(hover) = self.interaction.hover.clone() else {
            return;
        };
        if let Some(sref) = self.shape_of(&hover) {
            self.shapes.get_mut(sref).rotate(frame.scroll.y * ROTATE_STEP);
        }
    }

    fn shape_of(&self, element: &Element) -> Option<ShapeRef> {
        let body_id = match element {
            Element::Shape(body) => return Some(body.shape),
            Element::FreePoint(p) => match p.anchor {
                Anchor::Frame { shape, .. } | Anchor::Vertex { shape, .. } => Some(shape),
                Anchor::World(_) => None,
            },
            _ => element.parent(),
        }?;
        match self.registry.get(body_id) {
            Some(Element::Shape(body)) => Some(body.shape),
            _ => None,
        }
    }

    // ---- polygon management ----------------------------------------------

    /// Adopt a polygon provider and register its committed boundary: a shape
    /// body, vertex views, and parented edges.
    pub fn add_polygon(&mut self, polygon: Polygon) -> ElementId {
        let sref = self.shapes.push(Box::new(polygon));
        let body = ShapeBody::new(sref);
        let body_id = body.id;
        self.registry.register(vec![Element::Shape(body)]);
        self.commit_boundary(body_id, sref);
        body_id
    }

    fn commit_boundary(&mut self, body_id: ElementId, sref: ShapeRef) {
        let n = self.shapes.get(sref).vertex_count();
        let mut vertex_ids = Vec::with_capacity(n);
        let mut batch = Vec::with_capacity(2 * n);
        for index in 0..n {
            let v = FreePoint::vertex(body_id, index);
            vertex_ids.push(v.id);
            batch.push(Element::FreePoint(v));
        }
        for index in 0..n {
            let edge = Segment::edge(vertex_ids[index], vertex_ids[(index + 1) % n], body_id);
            batch.push(Element::Segment(edge));
        }
        self.registry.register(batch);
    }

    /// Split a committed edge at parametric position `t`, inserting a new
    /// vertex. Constructions on the edge follow its first half.
    ///
    /// Panics if `edge` is not a committed boundary edge.
    pub fn break_edge(&mut self, edge: ElementId, t: f64) -> Result<(), BoundaryError> {
        let Some(Element::Segment(seg)) = self.registry.get(edge) else {
            panic!("break_edge on a non-edge element {edge}");
        };
        let (a_id, b_id) = (seg.a, seg.b);
        let Some(body_id) = seg.parent else {
            panic!("break_edge on a non-boundary segment {edge}");
        };
        let sref = self.body_shape(body_id);
        let (_, j) = self.vertex_context(a_id);

        self.shapes.get_mut(sref).break_edge(j, t)?;
        // Views at or past the insertion point shift up one.
        self.shift_vertex_indices(body_id, j + 1, 1);

        let new_vertex = FreePoint::vertex(body_id, j + 1);
        let new_vertex_id = new_vertex.id;
        let second = Segment::edge(new_vertex_id, b_id, body_id);
        self.registry
            .register(vec![Element::FreePoint(new_vertex), Element::Segment(second)]);
        // The old edge becomes the first half; its dependents follow.
        let first = Segment::edge(a_id, new_vertex_id, body_id);
        self.registry
            .transform_element(&mut self.shapes, edge, Element::Segment(first));
        Ok(())
    }

    /// Delete a committed vertex, merging its two adjacent edges.
    /// Constructions on the vertex or either edge repair onto the merged
    /// geometry before the provider mutates.
    ///
    /// Panics if `vertex` is not a committed boundary vertex.
    pub fn delete_vertex(&mut self, vertex: ElementId) -> Result<(), BoundaryError> {
        let (body_id, index) = self.vertex_context(vertex);
        let sref = self.body_shape(body_id);
        let have = self.shapes.get(sref).vertex_count();
        if have < 4 {
            return Err(BoundaryError::TooFewVertices { min: 4, have });
        }

        let edge_in = self.find_edge(body_id, |s| s.b == vertex);
        let edge_out = self.find_edge(body_id, |s| s.a == vertex);
        if let (Some(edge_in), Some(edge_out)) = (edge_in, edge_out) {
            let prev = match self.registry.get(edge_in) {
                Some(Element::Segment(s)) => s.a,
                _ => vertex,
            };
            let next = match self.registry.get(edge_out) {
                Some(Element::Segment(s)) => s.b,
                _ => vertex,
            };
            let merged = Element::Segment(Segment::edge(prev, next, body_id));
            self.registry
                .transform_element(&mut self.shapes, edge_in, merged.clone());
            self.registry
                .transform_element(&mut self.shapes, edge_out, merged);
        }
        // Constructions pinned to the vertex repair while its position still
        // reads from the provider.
        self.registry.deregister(&mut self.shapes, vertex);

        self.shapes.get_mut(sref).delete_vertex(index)?;
        self.shift_vertex_indices(body_id, index + 1, -1);
        Ok(())
    }

    /// Delete a committed edge together with both endpoints, bridging the
    /// surviving neighbors.
    ///
    /// Panics if `edge` is not a committed boundary edge.
    pub fn delete_edge(&mut self, edge: ElementId) -> Result<(), BoundaryError> {
        let Some(Element::Segment(seg)) = self.registry.get(edge) else {
            panic!("delete_edge on a non-edge element {edge}");
        };
        let Some(body_id) = seg.parent else {
            panic!("delete_edge on a non-boundary segment {edge}");
        };
        let (va, vb) = (seg.a, seg.b);
        let sref = self.body_shape(body_id);
        let have = self.shapes.get(sref).vertex_count();
        if have < 5 {
            return Err(BoundaryError::TooFewVertices { min: 5, have });
        }
        let (_, ja) = self.vertex_context(va);
        let jb = (ja + 1) % have;

        let edge_in = self.find_edge(body_id, |s| s.b == va);
        let edge_out = self.find_edge(body_id, |s| s.a == vb);
        if let (Some(edge_in), Some(edge_out)) = (edge_in, edge_out) {
            let prev = match self.registry.get(edge_in) {
                Some(Element::Segment(s)) => s.a,
                _ => va,
            };
            let next = match self.registry.get(edge_out) {
                Some(Element::Segment(s)) => s.b,
                _ => vb,
            };
            let bridge = Element::Segment(Segment::edge(prev, next, body_id));
            self.registry
                .transform_element(&mut self.shapes, edge_in, bridge.clone());
            self.registry
                .transform_element(&mut self.shapes, edge, bridge.clone());
            self.registry
                .transform_element(&mut self.shapes, edge_out, bridge);
        }
        self.registry.deregister(&mut self.shapes, va);
        self.registry.deregister(&mut self.shapes, vb);

        self.shapes.get_mut(sref).delete_edge(ja)?;
        self.remap_vertex_indices(body_id, |i| {
            i - usize::from(ja < i) - usize::from(jb < i)
        });
        Ok(())
    }

    /// Reset a polygon to the default triangle, rebuilding its committed
    /// boundary. Constructions on the old boundary repair to free geometry.
    pub fn reset_shape(&mut self, body_id: ElementId) {
        let sref = self.body_shape(body_id);
        let boundary: Vec<ElementId> = self
            .registry
            .elements()
            .filter(|e| e.parent() == Some(body_id))
            .map(|e| e.id())
            .collect();
        // Edges first, so they do not repair onto replacement points when
        // their vertices vanish.
        let (edges, vertices): (Vec<ElementId>, Vec<ElementId>) = boundary
            .into_iter()
            .partition(|&id| self.registry.get(id).is_some_and(|e| e.is_line_like()));
        for id in edges.into_iter().chain(vertices) {
            if self.registry.contains(id) {
                self.registry.deregister(&mut self.shapes, id);
            }
        }
        self.shapes.get_mut(sref).reset();
        self.commit_boundary(body_id, sref);
    }

    // ---- boundary lookups ------------------------------------------------

    fn body_shape(&self, body_id: ElementId) -> ShapeRef {
        match self.registry.get(body_id) {
            Some(Element::Shape(body)) => body.shape,
            _ => panic!("element {body_id} is not a shape body"),
        }
    }

    fn vertex_context(&self, vertex: ElementId) -> (ElementId, usize) {
        match self.registry.get(vertex) {
            Some(Element::FreePoint(p)) => match p.anchor {
                Anchor::Vertex { shape, index } => (shape, index),
                _ => panic!("element {vertex} is not a boundary vertex"),
            },
            _ => panic!("element {vertex} is not a boundary vertex"),
        }
    }

    fn find_edge(&self, body_id: ElementId, pred: impl Fn(&Segment) -> bool) -> Option<ElementId> {
        self.registry.elements().find_map(|e| match e {
            Element::Segment(s) if s.parent == Some(body_id) && pred(s) => Some(s.id),
            _ => None,
        })
    }

    fn shift_vertex_indices(&mut self, body_id: ElementId, from: usize, delta: isize) {
        self.remap_vertex_indices(body_id, |i| {
            if i >= from {
                (i as isize + delta) as usize
            } else {
                i
            }
        });
    }

    fn remap_vertex_indices(&mut self, body_id: ElementId, remap: impl Fn(usize) -> usize) {
        for element in self.registry.elements_mut() {
            if let Element::FreePoint(p) = element {
                if let Anchor::Vertex { shape, index } = &mut p.anchor {
                    if *shape == body_id {
                        *index = remap(*index);
                    }
                }
            }
        }
    }
}
