use std::collections::HashMap;

use cgmath::InnerSpace;
use log::{debug, info};

use crate::graph::{Dual, DualRef, Graph, GraphError, VertexRef};
use crate::symmetry::Element;
use crate::util::Vec3;

/// The set of full-sphere dual vertices around a face, seen through `g`.
fn face_key(dual: &Dual, face: &[DualRef], g: Element) -> Vec<usize> {
    let mut ids: Vec<usize> = face.iter().map(|&c| dual.id(dual.premul(c, g))).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Builds the tiling whose tiles are the dual's vertices and whose corners are its faces.
///
/// Each stored dual vertex becomes one tile, colored like the vertex. Walking the faces
/// around it in angular order gives the tile's corners; a face already reached from another
/// tile, possibly through a different symmetry image, reuses that corner.
pub fn make_graph<'a>(dual: &Dual<'a>, radius: f64) -> Result<Graph<'a>, GraphError> {
    let ctx = dual.ctx();
    let mut graph = Graph::new(ctx);
    let mut corners_by_face: HashMap<Vec<usize>, usize> = HashMap::new();

    for k in 0..dual.len() {
        let a = DualRef::raw(k);
        let mut corners = Vec::new();
        for b in dual.sorted_neighbors_of(a) {
            let face = dual.polygon(a, b)?;
            let existing = ctx.elements().find_map(|g| {
                corners_by_face
                    .get(&face_key(dual, &face, g))
                    .map(|&index| VertexRef::new(index, ctx.inverse(g)))
            });
            let corner = match existing {
                Some(corner) => corner,
                None => {
                    let sum = face
                        .iter()
                        .fold(Vec3::new(0.0, 0.0, 0.0), |acc, &c| acc + dual.pos_of(c));
                    if sum.magnitude2() < 1e-18 {
                        return Err(GraphError::DegeneratePolygon {
                            vertex: k,
                            length: face.len(),
                        });
                    }
                    let index =
                        graph.add_vertex(sum.normalize() * radius, ctx.symmetry_map_for(sum));
                    corners_by_face.insert(face_key(dual, &face, Element::IDENTITY), index);
                    debug!(
                        "dual vertex {k}: new corner {index} from a {}-sided face",
                        face.len()
                    );
                    VertexRef::raw(index)
                }
            };
            corners.push(corner);
        }
        let symmetry = dual.vertex(k)?.symmetry.clone();
        graph.add_tile(dual.color_of(a), symmetry, corners)?;
    }

    info!(
        "built tiling: {} vertices, {} tiles from {} dual vertices",
        graph.vertices().len(),
        graph.tiles().len(),
        dual.len()
    );
    Ok(graph)
}
