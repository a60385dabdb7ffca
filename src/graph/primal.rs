use std::collections::HashSet;
use std::rc::Rc;

use cgmath::InnerSpace;

use crate::graph::{GraphError, TileRef, VertexRef};
use crate::symmetry::{Color, Element, SymmetryContext, SymmetryMap};
use crate::util::Vec3;

/// A corner of the tiling.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position of the stored image. Only this one is kept; the rest of the orbit is computed.
    pub pos: Vec3,
    /// Neighbors in this vertex's own frame.
    pub neighbors: Vec<VertexRef>,
    /// Tiles this vertex is a corner of, in its own frame.
    pub tiles: Vec<TileRef>,
    pub symmetry: Rc<SymmetryMap>,
}

/// A colored polygon of the tiling.
#[derive(Debug, Clone)]
pub struct Tile {
    pub color: Color,
    /// Boundary cycle in the tile's frame.
    pub vertices: Vec<VertexRef>,
    pub symmetry: Rc<SymmetryMap>,
}

/// A symmetric tiling of the sphere, stored as one fundamental domain of vertices and tiles.
#[derive(Debug, Clone)]
pub struct Graph<'a> {
    ctx: &'a SymmetryContext,
    vertices: Vec<Vertex>,
    tiles: Vec<Tile>,
}

impl<'a> Graph<'a> {
    pub fn new(ctx: &'a SymmetryContext) -> Self {
        Self {
            ctx,
            vertices: Vec::new(),
            tiles: Vec::new(),
        }
    }

    pub fn ctx(&self) -> &'a SymmetryContext {
        self.ctx
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn add_vertex(&mut self, pos: Vec3, symmetry: Rc<SymmetryMap>) -> usize {
        self.vertices.push(Vertex {
            pos,
            neighbors: Vec::new(),
            tiles: Vec::new(),
            symmetry,
        });
        self.vertices.len() - 1
    }

    /// Adds a tile bounded by `vertices`, registering it with each corner and linking
    /// consecutive corners.
    pub fn add_tile(
        &mut self,
        color: Color,
        symmetry: Rc<SymmetryMap>,
        vertices: Vec<VertexRef>,
    ) -> Result<usize, GraphError> {
        if vertices.len() < 3 {
            return Err(GraphError::DegeneratePolygon {
                vertex: self.tiles.len(),
                length: vertices.len(),
            });
        }
        let index = self.tiles.len();
        for &v in &vertices {
            let membership = TileRef::new(index, self.ctx.inverse(v.element));
            let real = symmetry.to_real(membership.element);
            let tiles = &mut self.vertices[v.index].tiles;
            if !tiles
                .iter()
                .any(|t| t.index == index && symmetry.to_real(t.element) == real)
            {
                tiles.push(membership);
            }
        }
        for (i, &a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            self.add_neighbor(a, b);
        }
        self.tiles.push(Tile {
            color,
            vertices,
            symmetry,
        });
        Ok(index)
    }

    pub fn pos_of(&self, v: VertexRef) -> Vec3 {
        self.ctx.transform(v.element, self.vertices[v.index].pos)
    }

    /// Identifies the full-sphere vertex `v` refers to.
    pub fn vertex_key(&self, v: VertexRef) -> (usize, Element) {
        (v.index, self.vertices[v.index].symmetry.to_real(v.element))
    }

    /// Identifies the full-sphere tile `t` refers to.
    pub fn tile_key(&self, t: TileRef) -> (usize, Element) {
        (t.index, self.tiles[t.index].symmetry.to_real(t.element))
    }

    pub fn same_vertex(&self, a: VertexRef, b: VertexRef) -> bool {
        self.vertex_key(a) == self.vertex_key(b)
    }

    pub fn same_tile(&self, a: TileRef, b: TileRef) -> bool {
        self.tile_key(a) == self.tile_key(b)
    }

    /// Records `b` as a neighbor of `a`, in `a`'s frame.
    pub fn add_neighbor(&mut self, a: VertexRef, b: VertexRef) {
        if self.same_vertex(a, b) {
            return;
        }
        let b = b.premul(self.ctx, self.ctx.inverse(a.element));
        if self.vertices[a.index]
            .neighbors
            .iter()
            .any(|&n| self.same_vertex(n, b))
        {
            return;
        }
        self.vertices[a.index].neighbors.push(b);
    }

    pub fn neighbors_of(&self, v: VertexRef) -> Vec<VertexRef> {
        let vertex = &self.vertices[v.index];
        let mut seen = HashSet::new();
        let mut ret = Vec::new();
        for &e in vertex.symmetry.symmetric_elements(v.element) {
            for &n in &vertex.neighbors {
                let r = n.premul(self.ctx, e);
                if seen.insert(self.vertex_key(r)) {
                    ret.push(r);
                }
            }
        }
        ret
    }

    /// Vertices at most `depth` edges from `v`, nearest first, excluding `v` itself.
    pub fn neighbors_within(&self, v: VertexRef, depth: usize) -> Vec<VertexRef> {
        let mut seen = HashSet::from([self.vertex_key(v)]);
        let mut ret = Vec::new();
        let mut frontier = vec![v];
        for _ in 0..depth {
            let mut next = Vec::new();
            for &x in &frontier {
                for n in self.neighbors_of(x) {
                    if seen.insert(self.vertex_key(n)) {
                        ret.push(n);
                        next.push(n);
                    }
                }
            }
            frontier = next;
        }
        ret
    }

    pub fn tiles_at(&self, v: VertexRef) -> Vec<TileRef> {
        let vertex = &self.vertices[v.index];
        let mut seen = HashSet::new();
        let mut ret = Vec::new();
        for &e in vertex.symmetry.symmetric_elements(v.element) {
            for &t in &vertex.tiles {
                let r = t.premul(self.ctx, e);
                if seen.insert(self.tile_key(r)) {
                    ret.push(r);
                }
            }
        }
        ret
    }

    pub fn color_of(&self, t: TileRef) -> Color {
        self.ctx.color_of(t.element, self.tiles[t.index].color)
    }

    pub fn colors_at(&self, v: VertexRef) -> Vec<Color> {
        self.tiles_at(v).into_iter().map(|t| self.color_of(t)).collect()
    }

    pub fn tile_with_color(&self, v: VertexRef, color: Color) -> Option<TileRef> {
        self.tiles_at(v).into_iter().find(|&t| self.color_of(t) == color)
    }

    /// The corners of `t`, as full-sphere refs.
    pub fn vertices_of(&self, t: TileRef) -> Vec<VertexRef> {
        self.tiles[t.index]
            .vertices
            .iter()
            .map(|&v| v.premul(self.ctx, t.element))
            .collect()
    }

    /// Tiles having both `a` and `b` as corners.
    pub fn tiles_at_edge(&self, a: VertexRef, b: VertexRef) -> Vec<TileRef> {
        let at_b = self.tiles_at(b);
        self.tiles_at(a)
            .into_iter()
            .filter(|&t| at_b.iter().any(|&u| self.same_tile(t, u)))
            .collect()
    }

    pub fn raw_vertices(&self) -> Vec<VertexRef> {
        (0..self.vertices.len()).map(VertexRef::raw).collect()
    }

    /// Every image of every vertex, duplicates on axes included.
    pub fn all_vertices(&self) -> Vec<VertexRef> {
        self.ctx
            .elements()
            .flat_map(|e| (0..self.vertices.len()).map(move |i| VertexRef::new(i, e)))
            .collect()
    }

    /// Every image of every tile, duplicates on axes included.
    pub fn all_tiles(&self) -> Vec<TileRef> {
        self.ctx
            .elements()
            .flat_map(|e| (0..self.tiles.len()).map(move |i| TileRef::new(i, e)))
            .collect()
    }

    pub fn is_axis_fixed(&self, index: usize) -> bool {
        self.vertices[index].symmetry.has_symmetry()
    }

    /// Moves the stored position of vertex `index` by `delta`, in the vertex's own frame.
    pub fn nudge(&mut self, index: usize, delta: Vec3) {
        self.vertices[index].pos += delta;
    }

    pub fn normalize(&mut self, radius: f64) {
        for vertex in self.vertices.iter_mut() {
            if vertex.pos.magnitude2() > 0.0 {
                vertex.pos = vertex.pos.normalize() * radius;
            }
        }
    }

    /// Stored tile edges whose endpoints both also touch some other image of a tile.
    pub fn calc_perimeter(&self) -> Vec<(VertexRef, VertexRef)> {
        let on_perimeter = |v: VertexRef| {
            self.tiles_at(v)
                .iter()
                .any(|t| t.element != Element::IDENTITY)
        };
        let mut ret = Vec::new();
        for tile in &self.tiles {
            for (i, &a) in tile.vertices.iter().enumerate() {
                let b = tile.vertices[(i + 1) % tile.vertices.len()];
                if on_perimeter(a) && on_perimeter(b) {
                    ret.push((a, b));
                }
            }
        }
        ret
    }
}
