//! Shape bodies: the element-graph face of a boundary provider.

use super::{ElementId, GeomCtx};
use crate::boundary::ShapeRef;
use crate::render::DrawCmd;
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The registered stand-in for one boundary provider. Committed vertices and
/// edges name the body as their structural parent; the vertex data itself
/// stays with the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeBody {
    pub id: ElementId,
    pub shape: ShapeRef,
}

impl ShapeBody {
    pub fn new(shape: ShapeRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape,
        }
    }

    pub fn contains(&self, ctx: GeomCtx, world: Point) -> bool {
        ctx.shapes.get(self.shape).contains(world)
    }

    pub fn frame(&self, ctx: GeomCtx) -> Affine {
        ctx.shapes.get(self.shape).transform()
    }

    pub fn draw(&self, ctx: GeomCtx) -> Vec<DrawCmd> {
        let vertices = ctx.shapes.get(self.shape).vertices();
        if vertices.len() < 3 {
            return Vec::new();
        }
        vec![DrawCmd::Polygon { vertices }]
    }
}
