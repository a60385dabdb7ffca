use cgmath::SquareMatrix;
use enum_map::{enum_map, Enum, EnumMap};
use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::symmetry::{Color, Config, Perm, Symmetry, SymmetryError, BLANK};
use crate::util::{enum_iter, from_points, Mat3, Vec3};

pub const PHI: f64 = 1.618_033_988_749_895;

/// The twelve vertices of the icosahedron. Vertex `i + 6` is opposite vertex `i`.
#[rustfmt::skip]
const POINTS: [[f64; 3]; 12] = [
    [-1.0,  0.0, -PHI],
    [ 1.0,  0.0, -PHI],
    [ 0.0,  PHI, -1.0],
    [-PHI,  1.0,  0.0],
    [-PHI, -1.0,  0.0],
    [ 0.0, -PHI, -1.0],
    [ 1.0,  0.0,  PHI],
    [-1.0,  0.0,  PHI],
    [ 0.0, -PHI,  1.0],
    [ PHI, -1.0,  0.0],
    [ PHI,  1.0,  0.0],
    [ 0.0,  PHI,  1.0],
];

/// Faces of the five inscribed tetrahedra. Row `c` holds the four faces of tetrahedron `c`;
/// the faces of the fifth tetrahedron are everything else.
const TETRAHEDRA: [[[usize; 3]; 4]; 4] = [
    [[0, 1, 2], [3, 7, 11], [6, 9, 10], [4, 5, 8]],
    [[0, 2, 3], [6, 10, 11], [1, 5, 9], [4, 7, 8]],
    [[0, 3, 4], [1, 2, 10], [5, 8, 9], [6, 7, 11]],
    [[0, 4, 5], [1, 9, 10], [2, 3, 11], [6, 7, 8]],
];

/// The faces around vertex 0, one per tetrahedron.
const TETRAHEDRA_HOME: [[usize; 3]; 5] = [[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 5], [0, 5, 1]];

/// Generators of the rotation group, each a map between two triangles of icosahedron vertices.
#[derive(Debug, Enum, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    A,
    B,
    C,
    D,
}

impl Generator {
    fn triangles(&self) -> ([usize; 3], [usize; 3]) {
        match self {
            Generator::A => ([0, 1, 2], [3, 0, 2]),
            Generator::B => ([0, 1, 2], [7, 6, 8]),
            Generator::C => ([0, 1, 2], [1, 0, 5]),
            Generator::D => ([0, 1, 2], [1, 2, 0]),
        }
    }
}

/// How the group's elements recolor the sphere.
#[derive(Debug, Enum, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// One color per pair of opposite vertices, plus blank.
    #[default]
    Axis,
    /// One color per inscribed tetrahedron, plus an unpermuted color and blank.
    Tetrahedral,
}

/// Rotational symmetries of the icosahedron.
#[derive(Debug, Clone, Default)]
pub struct IcoSymmetry {
    pub palette: Palette,
}

pub fn point(index: usize) -> Vec3 {
    let [x, y, z] = POINTS[index];
    Vec3::new(x, y, z)
}

fn power(m: Mat3, n: u8) -> Mat3 {
    (0..n).fold(Mat3::identity(), |acc, _| acc * m)
}

impl IcoSymmetry {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        enum_iter::<Palette>()
            .map(Self::new)
            .find(|sym| sym.name() == name)
    }

    /// The rotation taking the vertices `a` to the vertices `b`, in order.
    pub fn map(&self, a: [usize; 3], b: [usize; 3]) -> Mat3 {
        let from = from_points(a.map(point));
        let to = from_points(b.map(point));
        to * from
            .invert()
            .expect("icosahedron vertex triangles should be linearly independent")
    }

    /// Index of the icosahedron vertex at `p`.
    pub fn id(&self, p: Vec3) -> Option<usize> {
        (0..POINTS.len()).find(|&i| {
            let d = point(i) - p;
            d.x * d.x + d.y * d.y + d.z * d.z < 1e-10
        })
    }

    fn generators(&self) -> EnumMap<Generator, (Mat3, u8)> {
        let orders = enum_map! {
            Generator::A => 5,
            Generator::B => 2,
            Generator::C => 2,
            Generator::D => 3,
        };
        EnumMap::from_fn(|g: Generator| {
            let (a, b) = g.triangles();
            (self.map(a, b), orders[g])
        })
    }

    fn face_sum(face: [usize; 3]) -> Vec3 {
        point(face[0]) + point(face[1]) + point(face[2])
    }

    fn tetra_color_of(p: Vec3) -> Color {
        for (color, faces) in TETRAHEDRA.iter().enumerate() {
            for &face in faces {
                let d = Self::face_sum(face) - p;
                if d.x * d.x + d.y * d.y + d.z * d.z < 1e-9 {
                    return color as Color;
                }
            }
        }
        4
    }

    fn axis_perm_of(&self, matrix: &Mat3) -> Result<Perm, SymmetryError> {
        let mut images = (0..6)
            .map(|i| {
                self.id(*matrix * point(i))
                    .map(|j| (j % 6) as Color)
                    .ok_or(SymmetryError::NotAGroupPoint)
            })
            .collect::<Result<Vec<_>, _>>()?;
        images.push(BLANK);
        Ok(Perm::new(images))
    }

    fn tetra_perm_of(&self, matrix: &Mat3) -> Perm {
        let mut images: Vec<Color> = TETRAHEDRA_HOME
            .iter()
            .map(|&face| Self::tetra_color_of(*matrix * Self::face_sum(face)))
            .collect();
        images.push(5);
        images.push(BLANK);
        Perm::new(images)
    }
}

impl Symmetry for IcoSymmetry {
    fn name(&self) -> &'static str {
        match self.palette {
            Palette::Axis => "icosahedral",
            Palette::Tetrahedral => "icosahedral_tetrahedral",
        }
    }

    fn matrices(&self) -> Vec<Config> {
        let gens = self.generators();
        let (a, b, c, d) = (
            gens[Generator::A],
            gens[Generator::B],
            gens[Generator::C],
            gens[Generator::D],
        );
        iproduct!(0..d.1, 0..c.1, 0..b.1, 0..a.1)
            .map(|(s0, s1, s2, s3)| Config {
                matrix: power(a.0, s3) * power(b.0, s2) * power(c.0, s1) * power(d.0, s0),
                state: [s0, s1, s2, s3],
            })
            .collect()
    }

    fn color_perm_of(&self, matrix: &Mat3) -> Result<Perm, SymmetryError> {
        match self.palette {
            Palette::Axis => self.axis_perm_of(matrix),
            Palette::Tetrahedral => Ok(self.tetra_perm_of(matrix)),
        }
    }

    fn color_count(&self) -> usize {
        BLANK as usize + 1
    }

    fn symmetry_points(&self) -> Vec<Vec3> {
        vec![
            point(0),
            point(0) + point(1) + point(2),
            point(0) + point(1),
        ]
    }
}
