use log::info;

use crate::graph::{Graph, VertexRef};

/// How many edges away a vertex can be and still constrain another's distance.
pub const CLOSE_FAR_DEPTH: usize = 5;
/// How many edges away a vertex can be and still be kept off a boundary arc.
pub const LINE_VERTEX_DEPTH: usize = 6;

/// Distance requirement between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepCloseFar {
    pub a: VertexRef,
    pub b: VertexRef,
    /// No farther than unit distance.
    pub keep_close: bool,
    /// No nearer than unit distance.
    pub keep_far: bool,
}

/// Keeps `b` at least unit distance from the boundary arc `a0`-`a1`.
///
/// The arc is a great circle when `curve` is `None`, otherwise a unit circle centered
/// on the `curve` vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineVertexConstraint {
    pub a0: VertexRef,
    pub a1: VertexRef,
    pub curve: Option<VertexRef>,
    pub b: VertexRef,
}

impl<'a> Graph<'a> {
    /// Some tile at `a` and some tile at `b` share a color but are different tiles.
    pub fn must_be_far(&self, a: VertexRef, b: VertexRef) -> bool {
        self.tiles_at(a).into_iter().any(|ta| {
            self.tile_with_color(b, self.color_of(ta))
                .is_some_and(|tb| !self.same_tile(ta, tb))
        })
    }

    /// `a` and `b` are corners of the same tile.
    pub fn must_be_close(&self, a: VertexRef, b: VertexRef) -> bool {
        self.tiles_at(a).into_iter().any(|ta| {
            self.tile_with_color(b, self.color_of(ta))
                .is_some_and(|tb| self.same_tile(ta, tb))
        })
    }

    /// The center of the circular arc between `a` and `b`, if the edge is curved: a corner
    /// of one of the edge's two tiles that also touches the other tile's color.
    pub fn calc_curve(&self, a: VertexRef, b: VertexRef) -> Option<VertexRef> {
        let tiles = self.tiles_at_edge(a, b);
        if tiles.len() != 2 {
            return None;
        }
        for k in 0..2 {
            let other = self.color_of(tiles[1 - k]);
            for v in self.vertices_of(tiles[k]) {
                if self.same_vertex(v, a) || self.same_vertex(v, b) {
                    continue;
                }
                if self.colors_at(v).contains(&other) {
                    return Some(v);
                }
            }
        }
        None
    }

    pub fn calc_keep_close_fars(&self) -> Vec<KeepCloseFar> {
        let mut ret = Vec::new();
        for a in self.raw_vertices() {
            for b in self.neighbors_within(a, CLOSE_FAR_DEPTH) {
                let keep_close = self.must_be_close(a, b);
                let keep_far = self.must_be_far(a, b);
                if keep_close || keep_far {
                    ret.push(KeepCloseFar {
                        a,
                        b,
                        keep_close,
                        keep_far,
                    });
                }
            }
        }
        info!(
            "{} distance constraints ({} close, {} far)",
            ret.len(),
            ret.iter().filter(|k| k.keep_close).count(),
            ret.iter().filter(|k| k.keep_far).count()
        );
        ret
    }

    pub fn calc_line_vertex_constraints(&self) -> Vec<LineVertexConstraint> {
        let mut ret = Vec::new();
        for a0 in self.raw_vertices() {
            for a1 in self.neighbors_of(a0) {
                if a0.index > a1.index {
                    continue;
                }
                let curve = self.calc_curve(a0, a1);
                for tile in self.tiles_at_edge(a0, a1) {
                    let color = self.color_of(tile);
                    let concave = curve.and_then(|c| self.tile_with_color(c, color));
                    for b in self.neighbors_within(a0, LINE_VERTEX_DEPTH) {
                        let Some(other) = self.tile_with_color(b, color) else {
                            continue;
                        };
                        if self.same_tile(other, tile) {
                            continue;
                        }
                        if concave.is_some_and(|c| self.same_tile(other, c)) {
                            continue;
                        }
                        ret.push(LineVertexConstraint { a0, a1, curve, b });
                    }
                }
            }
        }
        info!(
            "{} arc constraints ({} curved)",
            ret.len(),
            ret.iter().filter(|c| c.curve.is_some()).count()
        );
        ret
    }
}
