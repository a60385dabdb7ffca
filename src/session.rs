use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;

use crate::graph::{make_graph, Dual, DualRef, Graph, GraphError};
use crate::preferences::Preferences;
use crate::simulation::Simulation;
use crate::symmetry::{Color, Element, IcoSymmetry, Symmetry, SymmetryContext};
use crate::util::Vec3;

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> eyre::Result<T> {
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> eyre::Result<()> {
    std::fs::write(path, serde_json::to_string(value)?)?;
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DualVertexRecord {
    pub color: Color,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A dual graph as stored on disk. Each edge is `[a, b, element]`: stored vertex `a` is
/// linked to the image of stored vertex `b` under `element`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DualFile {
    #[serde(default)]
    pub version: String,
    pub symmetry: String,
    pub vertices: Vec<DualVertexRecord>,
    pub edges: Vec<(usize, usize, usize)>,
}

impl Default for DualFile {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            symmetry: IcoSymmetry::default().name().to_string(),
            vertices: vec![],
            edges: vec![],
        }
    }
}

impl DualFile {
    pub fn from_dual(dual: &Dual) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            symmetry: dual.ctx().name().to_string(),
            vertices: dual
                .vertices()
                .iter()
                .map(|v| DualVertexRecord {
                    color: v.color,
                    x: v.pos.x,
                    y: v.pos.y,
                    z: v.pos.z,
                })
                .collect(),
            edges: dual
                .edges()
                .into_iter()
                .map(|(a, b)| (a, b.index, b.element.index()))
                .collect(),
        }
    }

    /// The group this file was drawn in. Unknown names fall back to the default palette.
    pub fn symmetry(&self) -> IcoSymmetry {
        IcoSymmetry::from_name(&self.symmetry).unwrap_or_else(|| {
            warn!("unknown symmetry {:?}, using the default palette", self.symmetry);
            IcoSymmetry::default()
        })
    }

    pub fn to_dual<'a>(&self, ctx: &'a SymmetryContext) -> Result<Dual<'a>, GraphError> {
        let mut dual = Dual::new(ctx);
        for v in &self.vertices {
            dual.add_vertex(v.color, Vec3::new(v.x, v.y, v.z))?;
        }
        for &(a, b, element) in &self.edges {
            let element = ctx.element(element)?;
            dual.toggle_edge(DualRef::raw(a), DualRef::new(b, element), true)?;
        }
        Ok(dual)
    }

    pub fn read(path: impl AsRef<Path>) -> eyre::Result<Self> {
        read_json(path)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        write_json(self, path)
    }

    /// This file with a vertex added on, or removed from, the `slot`th symmetry axis.
    pub fn with_axis_toggled(&self, slot: usize, radius: f64) -> eyre::Result<Self> {
        let ctx = SymmetryContext::new(&self.symmetry())?;
        let mut dual = self.to_dual(&ctx)?;
        dual.normalize(radius);
        dual.toggle_symmetry_vertex(slot, radius)?;
        Ok(Self::from_dual(&dual))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TilingVertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TilingTile {
    pub color: Color,
    /// Indices into the exported vertex list, in boundary order.
    pub vertices: Vec<usize>,
}

/// The whole-sphere tiling, each vertex and tile listed once.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TilingFile {
    pub vertices: Vec<TilingVertex>,
    pub tiles: Vec<TilingTile>,
}

impl TilingFile {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut indices: HashMap<(usize, Element), usize> = HashMap::new();
        let mut vertices = vec![];
        for v in graph.all_vertices() {
            if !graph.vertices()[v.index].symmetry.is_real(v.element) {
                continue;
            }
            indices.insert(graph.vertex_key(v), vertices.len());
            let pos = graph.pos_of(v);
            vertices.push(TilingVertex {
                x: pos.x,
                y: pos.y,
                z: pos.z,
            });
        }
        let tiles = graph
            .all_tiles()
            .into_iter()
            .filter(|t| graph.tiles()[t.index].symmetry.is_real(t.element))
            .map(|t| TilingTile {
                color: graph.color_of(t),
                vertices: graph
                    .vertices_of(t)
                    .into_iter()
                    .map(|v| indices[&graph.vertex_key(v)])
                    .collect(),
            })
            .collect();
        Self { vertices, tiles }
    }

    pub fn read(path: impl AsRef<Path>) -> eyre::Result<Self> {
        read_json(path)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        write_json(self, path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Round {
    pub error: f64,
    pub padding_error: f64,
}

/// A loaded dual graph being relaxed in rounds.
pub struct Session<'a> {
    pub simulation: Simulation<'a>,
    pub steps_per_round: usize,
    pub rounds: Vec<Round>,
}

impl<'a> Session<'a> {
    pub fn new(
        ctx: &'a SymmetryContext,
        file: &DualFile,
        prefs: &Preferences,
    ) -> eyre::Result<Self> {
        let mut dual = file.to_dual(ctx)?;
        dual.normalize(prefs.radius);
        let graph = make_graph(&dual, prefs.radius)?;
        let simulation = Simulation::new(dual, Some(graph), prefs.radius)
            .with_padding(prefs.padding)
            .with_gains(prefs.gains);
        Ok(Self {
            simulation,
            steps_per_round: prefs.steps_per_round,
            rounds: vec![],
        })
    }

    pub fn run_round(&mut self) -> Round {
        let error = self.simulation.step(self.steps_per_round);
        let round = Round {
            error,
            padding_error: self.simulation.padding_error(),
        };
        self.rounds.push(round);
        info!(
            "round {}: error {:.3e}, padding error {:.3e}",
            self.rounds.len(),
            round.error,
            round.padding_error
        );
        round
    }

    pub fn to_dual_file(&self) -> DualFile {
        DualFile::from_dual(self.simulation.dual())
    }

    /// The tiling at its current, relaxed positions.
    pub fn tiling(&self) -> Option<TilingFile> {
        self.simulation.graph().map(TilingFile::from_graph)
    }

    pub fn export(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        self.tiling()
            .ok_or_else(|| eyre::eyre!("no tiling to export"))?
            .write(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::*;
    use crate::symmetry::{Palette, SymmetryError, BLANK};
    use cgmath::InnerSpace;

    const EPSILON: f64 = 1e-9;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sphere_coloring_{}_{name}", std::process::id()))
    }

    #[test]
    fn dual_round_trip() {
        let ctx = ctx();
        let dual = soccer_ball(&ctx, 5.0);
        let file = DualFile::from_dual(&dual);
        assert_eq!(file.symmetry, "icosahedral");
        assert_eq!(file.edges.len(), 2);

        let text = serde_json::to_string(&file).unwrap();
        let loaded = serde_json::from_str::<DualFile>(&text)
            .unwrap()
            .to_dual(&ctx)
            .unwrap();
        assert_eq!(loaded.len(), dual.len());
        for i in 0..dual.len() {
            let (a, b) = (&dual.vertices()[i], &loaded.vertices()[i]);
            assert_eq!(a.color, b.color);
            assert!((a.pos - b.pos).magnitude() < EPSILON);
            assert_eq!(dual.neighbor_ids(i), loaded.neighbor_ids(i));
        }
    }

    #[test]
    fn reads_written_file() {
        let ctx = ctx();
        let file = DualFile::from_dual(&rhombic(&ctx, 5.0));
        let path = scratch("rhombic.json");
        file.write(&path).unwrap();
        assert_eq!(DualFile::read(&path).unwrap(), file);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn parses_plain_format() {
        let ctx = ctx();
        let text = r#"{
            "vertices": [{"color": 0, "x": 0.3, "y": 0.2, "z": 0.9}],
            "edges": [[0, 0, 5]],
            "symmetry": "icosahedral"
        }"#;
        let file: DualFile = serde_json::from_str(text).unwrap();
        assert_eq!(file.version, "");
        let dual = file.to_dual(&ctx).unwrap();
        assert_eq!(dual.len(), 1);
        assert!(!dual.neighbors_of(DualRef::raw(0)).is_empty());
    }

    #[test]
    fn rejects_bad_edges() {
        let ctx = ctx();
        let mut file = DualFile::from_dual(&rhombic(&ctx, 5.0));
        file.edges.push((0, 1, 60));
        assert_eq!(
            file.to_dual(&ctx).unwrap_err(),
            GraphError::Symmetry(SymmetryError::UnknownIndex(60))
        );
        file.edges.pop();
        file.edges.push((0, 2, 0));
        assert_eq!(
            file.to_dual(&ctx).unwrap_err(),
            GraphError::VertexNotFound { index: 2 }
        );
    }

    #[test]
    fn palette_follows_name() {
        let mut file = DualFile::default();
        assert_eq!(file.symmetry().palette, Palette::Axis);
        file.symmetry = "icosahedral_tetrahedral".to_string();
        assert_eq!(file.symmetry().palette, Palette::Tetrahedral);
        file.symmetry = "octahedral".to_string();
        assert_eq!(file.symmetry().palette, Palette::Axis);
    }

    #[test]
    fn exports_every_image_once() {
        let ctx = ctx();
        let dual = soccer_ball(&ctx, 1.0);
        let tiling = TilingFile::from_graph(&make_graph(&dual, 1.0).unwrap());
        assert_eq!(tiling.vertices.len(), 60);
        assert_eq!(tiling.tiles.len(), 32);
        let blank = tiling.tiles.iter().filter(|t| t.color == BLANK).count();
        assert_eq!(blank, 20);
        for tile in &tiling.tiles {
            let expected = if tile.color == BLANK { 6 } else { 5 };
            assert_eq!(tile.vertices.len(), expected);
            assert!(tile.vertices.iter().all(|&i| i < tiling.vertices.len()));
        }

        let dodeca = make_graph(&dodecahedron(&ctx, 0.8), 0.8).unwrap();
        let tiling = TilingFile::from_graph(&dodeca);
        assert_eq!(tiling.vertices.len(), 20);
        assert_eq!(tiling.tiles.len(), 12);
    }

    #[test]
    fn axis_toggle_adds_then_removes() {
        let file = DualFile::default();
        let added = file.with_axis_toggled(1, 5.0).unwrap();
        assert_eq!(added.vertices.len(), 1);
        let v = &added.vertices[0];
        assert!((Vec3::new(v.x, v.y, v.z).magnitude() - 5.0).abs() < EPSILON);
        let removed = added.with_axis_toggled(1, 5.0).unwrap();
        assert!(removed.vertices.is_empty());
        assert_eq!(file.with_axis_toggled(7, 5.0).unwrap().vertices.len(), 0);
    }

    #[test]
    fn session_relaxes_in_rounds() {
        let ctx = ctx();
        let file = DualFile::from_dual(&soccer_ball(&ctx, 1.0));
        let prefs = Preferences {
            steps_per_round: 20,
            ..Default::default()
        };
        let mut session = Session::new(&ctx, &file, &prefs).unwrap();
        let first = session.run_round();
        session.run_round();
        assert_eq!(session.rounds.len(), 2);
        assert_eq!(session.rounds[0], first);
        assert!(first.error >= 0.0);
        let tiling = session.tiling().unwrap();
        for v in &tiling.vertices {
            let r = Vec3::new(v.x, v.y, v.z).magnitude();
            assert!((r - prefs.radius).abs() < EPSILON);
        }
        assert_eq!(session.to_dual_file().edges, file.edges);
    }

    #[test]
    fn export_writes_relaxed_tiling() {
        let ctx = ctx();
        let file = DualFile::from_dual(&soccer_ball(&ctx, 1.0));
        let prefs = Preferences {
            radius: 1.15,
            ..Default::default()
        };
        let mut dual = file.to_dual(&ctx).unwrap();
        dual.normalize(prefs.radius);
        let unrelaxed = TilingFile::from_graph(&make_graph(&dual, prefs.radius).unwrap());
        let mut session = Session::new(&ctx, &file, &prefs).unwrap();
        session.run_round();

        let path = scratch("relaxed_tiling.json");
        session.export(&path).unwrap();
        let exported = TilingFile::read(&path).unwrap();
        std::fs::remove_file(path).unwrap();
        let relaxed = TilingFile::from_graph(session.simulation.graph().unwrap());
        assert_eq!(exported.tiles, unrelaxed.tiles);
        assert_eq!(exported.vertices.len(), relaxed.vertices.len());
        let offset = |a: &TilingVertex, b: &TilingVertex| {
            (Vec3::new(a.x, a.y, a.z) - Vec3::new(b.x, b.y, b.z)).magnitude()
        };
        for (e, r) in exported.vertices.iter().zip(&relaxed.vertices) {
            assert!(offset(e, r) < EPSILON);
        }
        let shift = exported
            .vertices
            .iter()
            .zip(&unrelaxed.vertices)
            .map(|(e, u)| offset(e, u))
            .fold(0.0, f64::max);
        assert!(shift > 0.05, "{shift}");
    }

    #[test]
    fn export_needs_a_tiling() {
        let ctx = ctx();
        let file = DualFile::from_dual(&soccer_ball(&ctx, 1.0));
        let mut session = Session::new(&ctx, &file, &Preferences::default()).unwrap();
        session.simulation = Simulation::new(Dual::new(&ctx), None, 5.0);
        assert!(session.export(scratch("no_tiling.json")).is_err());
    }

    #[test]
    fn session_reports_degenerate_duals() {
        let ctx = ctx();
        let mut dual = Dual::new(&ctx);
        dual.add_vertex(0, Vec3::new(0.3, 0.2, 0.9)).unwrap();
        let file = DualFile::from_dual(&dual);
        assert!(Session::new(&ctx, &file, &Preferences::default()).is_err());
    }
}
