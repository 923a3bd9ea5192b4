//! Shape boundary providers: externally owned polygons the element graph
//! attaches to.
//!
//! The core never stores polygon vertices itself. Vertex- and edge-class
//! elements are thin views over a provider, and all structural edits (break
//! edge, delete vertex, delete edge, reset) go through the provider so it
//! stays the single owner of the boundary data.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a shape provider inside a [`ShapeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeRef(pub usize);

/// Errors reported by boundary edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("polygon needs at least {min} vertices, has {have}")]
    TooFewVertices { min: usize, have: usize },
    #[error("index {index} out of bounds for polygon with {len} vertices")]
    OutOfBounds { index: usize, len: usize },
}

/// Contract for an externally owned polygon boundary.
///
/// Vertex indices are positions in the ordered boundary; edge `j` runs from
/// vertex `j` to vertex `(j + 1) % n`. All positions passed in or out are in
/// world coordinates; the provider owns the local-to-world frame transform.
pub trait ShapeProvider {
    /// Number of boundary vertices.
    fn vertex_count(&self) -> usize;

    /// Ordered boundary vertex positions in world coordinates.
    fn vertices(&self) -> Vec<Point>;

    /// World position of one vertex.
    fn vertex(&self, index: usize) -> Point;

    /// Move one vertex to a world position.
    fn set_vertex(&mut self, index: usize, world: Point);

    /// Local-to-world frame transform.
    fn transform(&self) -> Affine;

    /// Rotate the frame around its local origin.
    fn rotate(&mut self, radians: f64);

    /// Interior containment test.
    fn contains(&self, world: Point) -> bool;

    /// Edge closest to a world point: `(edge index, parameter in 0..=1,
    /// distance)`. `None` for degenerate boundaries.
    fn closest_edge(&self, world: Point) -> Option<(usize, f64, f64)>;

    /// Insert a vertex on edge `edge` at parametric position `t`, splitting
    /// the edge in two. The new vertex lands at index `edge + 1`.
    fn break_edge(&mut self, edge: usize, t: f64) -> Result<(), BoundaryError>;

    /// Delete a vertex, merging its two adjacent edges into one.
    fn delete_vertex(&mut self, index: usize) -> Result<(), BoundaryError>;

    /// Delete an edge together with both of its endpoints, bridging the gap
    /// between the surviving neighbors.
    fn delete_edge(&mut self, edge: usize) -> Result<(), BoundaryError>;

    /// Reset the boundary to the default triangle.
    fn reset(&mut self);
}

/// The set of live shape providers, indexed by [`ShapeRef`].
#[derive(Default)]
pub struct ShapeSet {
    providers: Vec<Box<dyn ShapeProvider>>,
}

impl ShapeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, returning its handle.
    pub fn push(&mut self, provider: Box<dyn ShapeProvider>) -> ShapeRef {
        self.providers.push(provider);
        ShapeRef(self.providers.len() - 1)
    }

    pub fn get(&self, shape: ShapeRef) -> &dyn ShapeProvider {
        self.providers[shape.0].as_ref()
    }

    pub fn get_mut(&mut self, shape: ShapeRef) -> &mut dyn ShapeProvider {
        self.providers[shape.0].as_mut()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// A concrete polygon provider with a movable local frame.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Boundary vertices in local coordinates.
    local: Vec<Point>,
    /// Local-to-world transform.
    frame: Affine,
}

impl Polygon {
    /// Default triangle, centered on the frame origin.
    pub fn triangle() -> Self {
        Self {
            local: default_triangle(),
            frame: Affine::IDENTITY,
        }
    }

    /// Polygon from world-space points, with an identity frame.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            local: points,
            frame: Affine::IDENTITY,
        }
    }

    /// Move the frame origin to a world position.
    pub fn translated(mut self, offset: kurbo::Vec2) -> Self {
        self.frame = Affine::translate(offset) * self.frame;
        self
    }

    fn check_index(&self, index: usize) -> Result<(), BoundaryError> {
        if index >= self.local.len() {
            return Err(BoundaryError::OutOfBounds {
                index,
                len: self.local.len(),
            });
        }
        Ok(())
    }
}

fn default_triangle() -> Vec<Point> {
    vec![
        Point::new(0.0, -60.0),
        Point::new(52.0, 30.0),
        Point::new(-52.0, 30.0),
    ]
}

impl ShapeProvider for Polygon {
    fn vertex_count(&self) -> usize {
        self.local.len()
    }

    fn vertices(&self) -> Vec<Point> {
        self.local.iter().map(|&p| self.frame * p).collect()
    }

    fn vertex(&self, index: usize) -> Point {
        self.frame * self.local[index]
    }

    fn set_vertex(&mut self, index: usize, world: Point) {
        let inv = self.frame.inverse();
        self.local[index] = inv * world;
    }

    fn transform(&self) -> Affine {
        self.frame
    }

    fn rotate(&mut self, radians: f64) {
        self.frame = self.frame * Affine::rotate(radians);
    }

    fn contains(&self, world: Point) -> bool {
        let pts = self.vertices();
        if pts.len() < 3 {
            return false;
        }
        // Even-odd ray cast along +x.
        let mut inside = false;
        let n = pts.len();
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            if (a.y > world.y) != (b.y > world.y) {
                let x = a.x + (world.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if world.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn closest_edge(&self, world: Point) -> Option<(usize, f64, f64)> {
        let pts = self.vertices();
        if pts.len() < 2 {
            return None;
        }
        let n = pts.len();
        let mut best: Option<(usize, f64, f64)> = None;
        for j in 0..n {
            let a = pts[j];
            let b = pts[(j + 1) % n];
            let seg = b - a;
            let len_sq = seg.hypot2();
            let t = if len_sq < f64::EPSILON {
                0.0
            } else {
                ((world - a).dot(seg) / len_sq).clamp(0.0, 1.0)
            };
            let proj = a + seg * t;
            let dist = (world - proj).hypot();
            if best.map(|(_, _, d)| dist < d).unwrap_or(true) {
                best = Some((j, t, dist));
            }
        }
        best
    }

    fn break_edge(&mut self, edge: usize, t: f64) -> Result<(), BoundaryError> {
        self.check_index(edge)?;
        let n = self.local.len();
        let a = self.local[edge];
        let b = self.local[(edge + 1) % n];
        let new = a + (b - a) * t.clamp(0.0, 1.0);
        self.local.insert(edge + 1, new);
        Ok(())
    }

    fn delete_vertex(&mut self, index: usize) -> Result<(), BoundaryError> {
        self.check_index(index)?;
        if self.local.len() < 4 {
            return Err(BoundaryError::TooFewVertices {
                min: 4,
                have: self.local.len(),
            });
        }
        self.local.remove(index);
        Ok(())
    }

    fn delete_edge(&mut self, edge: usize) -> Result<(), BoundaryError> {
        self.check_index(edge)?;
        if self.local.len() < 5 {
            return Err(BoundaryError::TooFewVertices {
                min: 5,
                have: self.local.len(),
            });
        }
        // Both endpoints of the edge go; the surviving neighbors bridge the gap.
        let n = self.local.len();
        let second = (edge + 1) % n;
        if second > edge {
            self.local.remove(second);
            self.local.remove(edge);
        } else {
            self.local.remove(edge);
            self.local.remove(second);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.local = default_triangle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
    }

    #[test]
    fn test_contains() {
        let p = square();
        assert!(p.contains(Point::new(5.0, 5.0)));
        assert!(!p.contains(Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_break_edge_inserts_vertex() {
        let mut p = square();
        p.break_edge(0, 0.5).unwrap();
        assert_eq!(p.vertex_count(), 5);
        assert_eq!(p.vertex(1), Point::new(5.0, 0.0));
    }

    #[test]
    fn test_delete_vertex_min_count() {
        let mut p = Polygon::triangle();
        assert_eq!(
            p.delete_vertex(0),
            Err(BoundaryError::TooFewVertices { min: 4, have: 3 })
        );
    }

    #[test]
    fn test_delete_edge_removes_both_endpoints() {
        let mut p = square();
        p.break_edge(0, 0.5).unwrap(); // five vertices
        p.delete_edge(0).unwrap();
        assert_eq!(p.vertex_count(), 3);
    }

    #[test]
    fn test_closest_edge() {
        let p = square();
        let (edge, t, dist) = p.closest_edge(Point::new(5.0, -1.0)).unwrap();
        assert_eq!(edge, 0);
        assert!((t - 0.5).abs() < 1e-9);
        assert!((dist - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_moves_vertices() {
        let mut p = Polygon::from_points(vec![
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(-10.0, 0.0),
        ]);
        p.rotate(std::f64::consts::FRAC_PI_2);
        let v = p.vertex(0);
        assert!((v.x - 0.0).abs() < 1e-9);
        assert!((v.y - 10.0).abs() < 1e-9);
    }
}
