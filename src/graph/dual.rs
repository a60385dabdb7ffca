use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use cgmath::InnerSpace;

use crate::graph::{DualRef, GraphError};
use crate::symmetry::{Color, Element, SymmetryContext, SymmetryMap};
use crate::util::{angle_around, Vec3};

/// A colored point of the dual graph. Its faces become the tiles' corners.
#[derive(Debug, Clone)]
pub struct DualVertex {
    /// Position of the stored image.
    pub pos: Vec3,
    /// Color of the stored image.
    pub color: Color,
    /// Neighbors in this vertex's own frame, each reduced to its representative element.
    pub neighbors: Vec<DualRef>,
    pub symmetry: Rc<SymmetryMap>,
}

/// Points and edges whose faces define a tiling, stored as one fundamental domain.
#[derive(Debug, Clone)]
pub struct Dual<'a> {
    ctx: &'a SymmetryContext,
    vertices: Vec<DualVertex>,
}

impl<'a> Dual<'a> {
    pub fn new(ctx: &'a SymmetryContext) -> Self {
        Self {
            ctx,
            vertices: Vec::new(),
        }
    }

    pub fn ctx(&self) -> &'a SymmetryContext {
        self.ctx
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[DualVertex] {
        &self.vertices
    }

    pub fn vertex(&self, index: usize) -> Result<&DualVertex, GraphError> {
        self.vertices
            .get(index)
            .ok_or(GraphError::VertexNotFound { index })
    }

    fn check_color(&self, color: Color) -> Result<(), GraphError> {
        if (color as usize) < self.ctx.color_count() {
            Ok(())
        } else {
            Err(GraphError::InvalidColor { color })
        }
    }

    pub fn add_vertex(&mut self, color: Color, pos: Vec3) -> Result<usize, GraphError> {
        self.check_color(color)?;
        self.vertices.push(DualVertex {
            pos,
            color,
            neighbors: Vec::new(),
            symmetry: self.ctx.symmetry_map_for(pos),
        });
        Ok(self.vertices.len() - 1)
    }

    /// Moves the image `r` to `pos`. Vertices on an axis stay where they are.
    pub fn set_pos(&mut self, r: DualRef, pos: Vec3) -> Result<(), GraphError> {
        let inverse = self.ctx.inverse(r.element);
        let ctx = self.ctx;
        let vertex = self
            .vertices
            .get_mut(r.index)
            .ok_or(GraphError::VertexNotFound { index: r.index })?;
        if vertex.symmetry.has_symmetry() {
            return Err(GraphError::AxisFixed { index: r.index });
        }
        vertex.pos = ctx.transform(inverse, pos);
        Ok(())
    }

    /// Recolors the image `r`, and with it the whole orbit.
    pub fn set_color(&mut self, r: DualRef, color: Color) -> Result<(), GraphError> {
        self.check_color(color)?;
        let base = self.ctx.color_of(self.ctx.inverse(r.element), color);
        self.vertices
            .get_mut(r.index)
            .ok_or(GraphError::VertexNotFound { index: r.index })?
            .color = base;
        Ok(())
    }

    /// Removes a vertex and every edge to it. Later vertices move down one index.
    pub fn delete_vertex(&mut self, index: usize) -> Result<(), GraphError> {
        self.vertex(index)?;
        self.vertices.remove(index);
        for vertex in self.vertices.iter_mut() {
            vertex.neighbors.retain(|n| n.index != index);
            for n in vertex.neighbors.iter_mut() {
                if n.index > index {
                    n.index -= 1;
                }
            }
        }
        Ok(())
    }

    /// Adds a vertex on the `slot`th symmetry axis, or removes the one already there.
    /// Slots past the group's axis kinds are ignored.
    pub fn toggle_symmetry_vertex(&mut self, slot: usize, radius: f64) -> Result<(), GraphError> {
        let Some(&p) = self.ctx.symmetry_points(radius).get(slot) else {
            return Ok(());
        };
        match self
            .vertices
            .iter()
            .position(|v| (v.pos - p).magnitude2() < 1e-12)
        {
            Some(index) => self.delete_vertex(index),
            None => self.add_vertex(0, p).map(|_| ()),
        }
    }

    pub fn is_axis_fixed(&self, index: usize) -> Result<bool, GraphError> {
        Ok(self.vertex(index)?.symmetry.has_symmetry())
    }

    pub fn to_real(&self, r: DualRef) -> DualRef {
        r.with_element(self.vertices[r.index].symmetry.to_real(r.element))
    }

    /// The image of `r` under `g`, reduced to its representative.
    pub fn premul(&self, r: DualRef, g: Element) -> DualRef {
        self.to_real(r.premul(self.ctx, g))
    }

    /// A number identifying the full-sphere vertex `r` refers to.
    pub fn id(&self, r: DualRef) -> usize {
        self.to_real(r).element.index() * self.vertices.len() + r.index
    }

    pub fn pos_of(&self, r: DualRef) -> Vec3 {
        self.ctx.transform(r.element, self.vertices[r.index].pos)
    }

    pub fn color_of(&self, r: DualRef) -> Color {
        self.ctx.color_of(r.element, self.vertices[r.index].color)
    }

    /// Links `a` and `b` across the whole orbit, or unlinks them if they already are.
    pub fn toggle_edge(&mut self, a: DualRef, b: DualRef, only_add: bool) -> Result<(), GraphError> {
        self.vertex(a.index)?;
        self.vertex(b.index)?;
        let (a, b) = (self.to_real(a), self.to_real(b));
        if self.id(a) == self.id(b) {
            return Ok(());
        }
        let bb = self.premul(b, self.ctx.inverse(a.element));
        let aa = self.premul(a, self.ctx.inverse(b.element));
        let linked = self.stored_as(a.index, bb).next().is_some()
            || self.stored_as(b.index, aa).next().is_some();
        if linked {
            if !only_add {
                self.unlink(a.index, bb);
                self.unlink(b.index, aa);
            }
        } else {
            self.vertices[a.index].neighbors.push(bb);
            if self.id(aa) != self.id(bb) {
                self.vertices[b.index].neighbors.push(aa);
            }
        }
        Ok(())
    }

    /// Positions in the neighbor list of `index` naming `target` up to the vertex's own symmetry.
    fn stored_as(&self, index: usize, target: DualRef) -> impl Iterator<Item = usize> + '_ {
        let vertex = &self.vertices[index];
        let id = self.id(target);
        vertex
            .neighbors
            .iter()
            .enumerate()
            .filter(move |&(_, &n)| {
                vertex
                    .symmetry
                    .symmetric_elements(Element::IDENTITY)
                    .iter()
                    .any(|&s| self.id(self.premul(n, s)) == id)
            })
            .map(|(i, _)| i)
    }

    fn unlink(&mut self, index: usize, target: DualRef) {
        let stale: Vec<usize> = self.stored_as(index, target).collect();
        for i in stale.into_iter().rev() {
            self.vertices[index].neighbors.remove(i);
        }
    }

    /// The neighbors of the full-sphere vertex `a`, each listed once.
    pub fn neighbors_of(&self, a: DualRef) -> Vec<DualRef> {
        let vertex = &self.vertices[a.index];
        let mut seen = HashSet::new();
        let mut ret = Vec::new();
        for &g in vertex.symmetry.symmetric_elements(a.element) {
            for &n in &vertex.neighbors {
                let r = self.premul(n, g);
                if seen.insert(self.id(r)) {
                    ret.push(r);
                }
            }
        }
        ret
    }

    /// [`Dual::neighbors_of`] in angular order around `a`.
    pub fn sorted_neighbors_of(&self, a: DualRef) -> Vec<DualRef> {
        let center = self.pos_of(a);
        let mut keyed: Vec<(f64, DualRef)> = self
            .neighbors_of(a)
            .into_iter()
            .map(|r| (angle_around(center, self.pos_of(r)), r))
            .collect();
        keyed.sort_by(|x, y| x.0.total_cmp(&y.0));
        keyed.into_iter().map(|(_, r)| r).collect()
    }

    /// The neighbor of `a` that follows `b` around `a`.
    pub fn next(&self, a: DualRef, b: DualRef) -> Option<DualRef> {
        let sorted = self.sorted_neighbors_of(a);
        let id = self.id(b);
        let i = sorted.iter().position(|&c| self.id(c) == id)?;
        Some(sorted[(i + 1) % sorted.len()])
    }

    /// The face to the side of the edge `a`-`b`, as the cycle `b, a, ...` of its corners.
    pub fn polygon(&self, a: DualRef, b: DualRef) -> Result<Vec<DualRef>, GraphError> {
        let mut ret = vec![b, a];
        let start = self.id(b);
        for _ in 0..self.ctx.order() * self.vertices.len() + 2 {
            let len = ret.len();
            let c = self
                .next(ret[len - 1], ret[len - 2])
                .ok_or(GraphError::DanglingEdge { vertex: ret[len - 1].index })?;
            if self.id(c) == start {
                if ret.len() < 3 {
                    return Err(GraphError::DegeneratePolygon {
                        vertex: a.index,
                        length: ret.len(),
                    });
                }
                return Ok(ret);
            }
            ret.push(c);
        }
        Err(GraphError::OpenPolygon { vertex: a.index })
    }

    /// Every image of every vertex, duplicates on axes included.
    pub fn all_vertices(&self) -> Vec<DualRef> {
        self.ctx
            .elements()
            .flat_map(|e| (0..self.vertices.len()).map(move |i| DualRef::new(i, e)))
            .collect()
    }

    /// Stored edges as `(a, b)` with `a` at the identity, listed from the lower index.
    pub fn edges(&self) -> Vec<(usize, DualRef)> {
        self.vertices
            .iter()
            .enumerate()
            .flat_map(|(a, v)| {
                v.neighbors
                    .iter()
                    .filter(move |b| a <= b.index)
                    .map(move |&b| (a, b))
            })
            .collect()
    }

    /// Ids of the full-sphere neighbors of the stored vertex `index`.
    pub fn neighbor_ids(&self, index: usize) -> BTreeSet<usize> {
        self.neighbors_of(DualRef::raw(index))
            .into_iter()
            .map(|r| self.id(r))
            .collect()
    }

    pub fn normalize(&mut self, radius: f64) {
        for vertex in self.vertices.iter_mut() {
            if vertex.pos.magnitude2() > 0.0 {
                vertex.pos = vertex.pos.normalize() * radius;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::*;
    use crate::symmetry::ico::point;
    use crate::symmetry::BLANK;

    const EPSILON: f64 = 1e-9;

    fn two_generic<'a>(ctx: &'a SymmetryContext) -> Dual<'a> {
        let mut dual = Dual::new(ctx);
        dual.add_vertex(0, Vec3::new(0.3, 0.2, 0.9)).unwrap();
        dual.add_vertex(1, Vec3::new(0.35, 0.1, 0.9)).unwrap();
        dual
    }

    fn adjacency(dual: &Dual) -> Vec<BTreeSet<usize>> {
        (0..dual.len()).map(|i| dual.neighbor_ids(i)).collect()
    }

    #[test]
    fn add_vertex_detects_axes() {
        let ctx = ctx();
        let mut dual = Dual::new(&ctx);
        dual.add_vertex(0, point(0)).unwrap();
        dual.add_vertex(1, Vec3::new(0.1, 0.2, 0.3)).unwrap();
        assert_eq!(dual.is_axis_fixed(0), Ok(true));
        assert_eq!(dual.is_axis_fixed(1), Ok(false));
        assert_eq!(
            dual.add_vertex(BLANK + 1, point(1)),
            Err(GraphError::InvalidColor { color: BLANK + 1 })
        );
        assert_eq!(dual.len(), 2);
    }

    #[test]
    fn toggle_edge_twice_restores() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        let g = ctx.element(17).unwrap();
        let before = adjacency(&dual);
        dual.toggle_edge(DualRef::raw(0), DualRef::new(1, g), false)
            .unwrap();
        assert_eq!(dual.neighbors_of(DualRef::raw(0)).len(), 1);
        assert_eq!(dual.neighbors_of(DualRef::new(1, g)), vec![DualRef::raw(0)]);
        assert_ne!(adjacency(&dual), before);
        dual.toggle_edge(DualRef::new(1, g), DualRef::raw(0), false)
            .unwrap();
        assert_eq!(adjacency(&dual), before);
    }

    #[test]
    fn toggle_through_axis_aliases_restores() {
        let ctx = ctx();
        let mut dual = Dual::new(&ctx);
        dual.add_vertex(0, Vec3::new(0.3, 0.2, 0.9)).unwrap();
        dual.add_vertex(1, point(0)).unwrap();
        let g = ctx.element(17).unwrap();
        let aliases = dual.vertices()[1].symmetry.symmetric_elements(g).to_vec();
        assert_eq!(aliases.len(), 5);
        let before = adjacency(&dual);
        for (&on, &off) in aliases.iter().zip(aliases.iter().skip(1)) {
            assert_eq!(dual.id(DualRef::new(1, on)), dual.id(DualRef::new(1, off)));
            dual.toggle_edge(DualRef::raw(0), DualRef::new(1, on), false)
                .unwrap();
            assert_eq!(dual.neighbor_ids(0).len(), 1);
            assert_eq!(dual.neighbor_ids(1).len(), 5);
            dual.toggle_edge(DualRef::raw(0), DualRef::new(1, off), false)
                .unwrap();
            assert_eq!(adjacency(&dual), before);
            assert!(dual.vertices().iter().all(|v| v.neighbors.is_empty()));

            dual.toggle_edge(DualRef::new(1, on), DualRef::raw(0), false)
                .unwrap();
            dual.toggle_edge(DualRef::new(1, off), DualRef::raw(0), true)
                .unwrap();
            assert_eq!(dual.vertices()[0].neighbors.len(), 1);
            assert_eq!(dual.vertices()[1].neighbors.len(), 1);
            dual.toggle_edge(DualRef::new(1, off), DualRef::raw(0), false)
                .unwrap();
            assert_eq!(adjacency(&dual), before);
        }
    }

    #[test]
    fn axis_query_checks_index() {
        let ctx = ctx();
        let dual = two_generic(&ctx);
        assert_eq!(
            dual.is_axis_fixed(2),
            Err(GraphError::VertexNotFound { index: 2 })
        );
    }

    #[test]
    fn only_add_keeps_existing_edge() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        dual.toggle_edge(DualRef::raw(0), DualRef::raw(1), false)
            .unwrap();
        dual.toggle_edge(DualRef::raw(0), DualRef::raw(1), true)
            .unwrap();
        assert_eq!(dual.vertices()[0].neighbors, vec![DualRef::raw(1)]);
        assert_eq!(dual.vertices()[1].neighbors, vec![DualRef::raw(0)]);
    }

    #[test]
    fn edge_to_self_is_ignored() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        dual.toggle_edge(DualRef::raw(0), DualRef::raw(0), false)
            .unwrap();
        assert!(dual.vertices()[0].neighbors.is_empty());
    }

    #[test]
    fn self_symmetric_edge_stored_once() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        let flip = ctx
            .elements()
            .find(|&e| e != Element::IDENTITY && ctx.compose(e, e) == Element::IDENTITY)
            .unwrap();
        dual.toggle_edge(DualRef::raw(0), DualRef::new(0, flip), false)
            .unwrap();
        assert_eq!(dual.vertices()[0].neighbors.len(), 1);
        assert_eq!(dual.neighbors_of(DualRef::raw(0)), vec![DualRef::new(0, flip)]);
        assert_eq!(dual.neighbors_of(DualRef::new(0, flip)), vec![DualRef::raw(0)]);
        dual.toggle_edge(DualRef::new(0, flip), DualRef::raw(0), false)
            .unwrap();
        assert!(dual.vertices()[0].neighbors.is_empty());
    }

    #[test]
    fn neighbors_fold_around_axis() {
        let ctx = ctx();
        let dual = dodecahedron(&ctx, 0.8);
        let around = dual.sorted_neighbors_of(DualRef::raw(0));
        assert_eq!(around.len(), 5);
        let center = dual.pos_of(DualRef::raw(0));
        let angles: Vec<f64> = around
            .iter()
            .map(|&r| angle_around(center, dual.pos_of(r)))
            .collect();
        assert!(angles.windows(2).all(|w| w[0] < w[1]));
        for &r in &around {
            assert!(((dual.pos_of(r) - center).magnitude() - (dual.pos_of(around[0]) - center).magnitude()).abs() < EPSILON);
            assert!(dual.neighbors_of(r).iter().any(|&n| dual.id(n) == dual.id(DualRef::raw(0))));
        }
    }

    #[test]
    fn polygon_closes() {
        let ctx = ctx();
        let dual = dodecahedron(&ctx, 0.8);
        let a = DualRef::raw(0);
        for b in dual.sorted_neighbors_of(a) {
            let poly = dual.polygon(a, b).unwrap();
            assert_eq!(poly.len(), 3);
            assert_eq!(dual.id(poly[0]), dual.id(b));
        }
    }

    #[test]
    fn digon_is_degenerate() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        dual.toggle_edge(DualRef::raw(0), DualRef::raw(1), false)
            .unwrap();
        assert_eq!(
            dual.polygon(DualRef::raw(0), DualRef::raw(1)),
            Err(GraphError::DegeneratePolygon { vertex: 0, length: 2 })
        );
    }

    #[test]
    fn recolor_and_move_images() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        let g = ctx.element(33).unwrap();
        let r = DualRef::new(1, g);
        dual.set_color(r, 4).unwrap();
        assert_eq!(dual.color_of(r), 4);
        let target = Vec3::new(-0.2, 0.5, 0.6);
        dual.set_pos(r, target).unwrap();
        assert!((dual.pos_of(r) - target).magnitude() < EPSILON);
        assert_eq!(dual.is_axis_fixed(1), Ok(false));

        dual.add_vertex(2, point(3)).unwrap();
        assert_eq!(
            dual.set_pos(DualRef::raw(2), point(4)),
            Err(GraphError::AxisFixed { index: 2 })
        );
        assert_eq!(
            dual.set_color(DualRef::raw(9), 0),
            Err(GraphError::VertexNotFound { index: 9 })
        );
    }

    #[test]
    fn delete_shifts_indices() {
        let ctx = ctx();
        let mut dual = two_generic(&ctx);
        dual.add_vertex(2, Vec3::new(-0.4, 0.4, 0.8)).unwrap();
        let g = ctx.element(5).unwrap();
        dual.toggle_edge(DualRef::raw(0), DualRef::raw(1), false)
            .unwrap();
        dual.toggle_edge(DualRef::raw(1), DualRef::raw(2), false)
            .unwrap();
        dual.toggle_edge(DualRef::raw(0), DualRef::new(2, g), false)
            .unwrap();
        dual.delete_vertex(1).unwrap();
        assert_eq!(dual.len(), 2);
        assert_eq!(dual.vertices()[0].neighbors, vec![DualRef::new(1, g)]);
        assert_eq!(dual.vertices()[1].neighbors.len(), 1);
        assert_eq!(dual.vertices()[1].neighbors[0].index, 0);
        assert_eq!(dual.vertices()[1].color, 2);
        assert_eq!(
            dual.delete_vertex(2),
            Err(GraphError::VertexNotFound { index: 2 })
        );
    }

    #[test]
    fn symmetry_vertex_toggles() {
        let ctx = ctx();
        let mut dual = Dual::new(&ctx);
        dual.toggle_symmetry_vertex(1, 5.0).unwrap();
        assert_eq!(dual.len(), 1);
        assert_eq!(dual.is_axis_fixed(0), Ok(true));
        assert!((dual.vertices()[0].pos.magnitude() - 5.0).abs() < EPSILON);
        assert_eq!(dual.vertices()[0].symmetry.orbit_size(), 20);
        dual.toggle_symmetry_vertex(1, 5.0).unwrap();
        assert!(dual.is_empty());
        dual.toggle_symmetry_vertex(3, 5.0).unwrap();
        assert!(dual.is_empty());
    }

    #[test]
    fn edges_listed_from_lower_index() {
        let ctx = ctx();
        let dual = soccer_ball(&ctx, 1.0);
        let edges = dual.edges();
        assert!(edges.iter().all(|&(a, b)| a <= b.index));
        assert_eq!(edges.len(), 2);
    }
}
