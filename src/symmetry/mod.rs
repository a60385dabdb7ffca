pub mod context;
pub mod ico;
pub mod invariance;

use std::fmt;

use crate::util::{Mat3, Vec3};

pub use context::{Element, SymmetryContext};
pub use ico::{IcoSymmetry, Palette};
pub use invariance::SymmetryMap;

/// Index into a palette. The last color of every palette is [`BLANK`].
pub type Color = u8;

/// The neutral color, fixed by every color permutation.
pub const BLANK: Color = 6;

/// A group element together with the generator exponents that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub matrix: Mat3,
    pub state: [u8; 4],
}

impl Config {
    pub fn is_home_state(&self) -> bool {
        self.state == [0; 4]
    }
}

/// A bijection on the colors of a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Perm(Vec<Color>);

impl Perm {
    pub fn new(images: Vec<Color>) -> Self {
        Self(images)
    }

    pub fn identity(len: usize) -> Self {
        Self((0..len as Color).collect())
    }

    pub fn apply(&self, color: Color) -> Color {
        self.0[color as usize]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &c)| i == c as usize)
    }

    /// `self ∘ other`: apply `other` first.
    pub fn compose(&self, other: &Perm) -> Perm {
        Perm(other.0.iter().map(|&c| self.apply(c)).collect())
    }

    pub fn inverse(&self) -> Perm {
        let mut images = vec![0; self.0.len()];
        for (i, &c) in self.0.iter().enumerate() {
            images[c as usize] = i as Color;
        }
        Perm(images)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymmetryError {
    /// The transform does not fall into the bucket of any group element.
    Unrecognized,
    /// No element has this canonical index.
    UnknownIndex(usize),
    /// The group has more elements than an element index can address.
    TooManyElements(usize),
    /// Two distinct elements quantize to the same digest.
    Collision { a: usize, b: usize },
    /// The first enumerated element is not the identity.
    IdentityNotFirst,
    /// A transformed reference point is not one of the palette's named points.
    NotAGroupPoint,
}

impl fmt::Display for SymmetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymmetryError::Unrecognized => write!(f, "Not a recognized symmetry"),
            SymmetryError::UnknownIndex(index) => write!(f, "No symmetry element with index {index}"),
            SymmetryError::TooManyElements(count) => {
                write!(f, "Symmetry group has {count} elements, at most 256 are supported")
            }
            SymmetryError::Collision { a, b } => {
                write!(f, "Symmetry elements {a} and {b} share a digest")
            }
            SymmetryError::IdentityNotFirst => write!(f, "First symmetry element is not the identity"),
            SymmetryError::NotAGroupPoint => write!(f, "Point is not a named point of the group"),
        }
    }
}

impl std::error::Error for SymmetryError {}

/// A finite rotation group acting on the sphere, with the coloring it induces.
pub trait Symmetry {
    /// Stable name, stored in saved files.
    fn name(&self) -> &'static str;
    /// Every element of the group, identity first.
    fn matrices(&self) -> Vec<Config>;
    /// How `matrix` permutes the palette. The result has [`Symmetry::color_count`] entries.
    fn color_perm_of(&self, matrix: &Mat3) -> Result<Perm, SymmetryError>;
    /// Number of colors including [`BLANK`].
    fn color_count(&self) -> usize;
    /// Representative points on each kind of rotation axis, at unit scale of the group.
    fn symmetry_points(&self) -> Vec<Vec3>;
}

pub mod symmetry_tests {
    use super::*;
    use cgmath::{InnerSpace, SquareMatrix};
    use itertools::Itertools;

    const EPSILON: f64 = 1e-9;

    fn max_entry_diff(a: &Mat3, b: &Mat3) -> f64 {
        let d = *a - *b;
        [d.x, d.y, d.z]
            .iter()
            .flat_map(|c| [c.x.abs(), c.y.abs(), c.z.abs()])
            .fold(0.0, f64::max)
    }

    fn identity_first<S: Symmetry>(sym: &S) {
        let configs = sym.matrices();
        assert!(configs[0].is_home_state(), "first state is {:?}", configs[0].state);
        assert!(max_entry_diff(&configs[0].matrix, &Mat3::identity()) < EPSILON);
        assert_eq!(
            configs.iter().filter(|c| c.is_home_state()).count(),
            1,
            "home state appears more than once"
        );
    }

    fn all_rotations<S: Symmetry>(sym: &S) {
        for config in sym.matrices() {
            let m = config.matrix;
            assert!((m.determinant() - 1.0).abs() < EPSILON, "{:?} is not proper", config.state);
            for col in [m.x, m.y, m.z] {
                assert!((col.magnitude() - 1.0).abs() < EPSILON);
            }
        }
    }

    fn elements_distinct<S: Symmetry>(sym: &S) {
        for pair in sym.matrices().iter().combinations(2) {
            assert!(
                max_entry_diff(&pair[0].matrix, &pair[1].matrix) > 0.5,
                "{:?} and {:?} coincide",
                pair[0].state,
                pair[1].state
            );
        }
    }

    fn closed_under_composition<S: Symmetry>(sym: &S) {
        let configs = sym.matrices();
        for a in &configs {
            for b in &configs {
                let product = a.matrix * b.matrix;
                assert!(
                    configs
                        .iter()
                        .any(|c| max_entry_diff(&c.matrix, &product) < 1e-6),
                    "{:?} * {:?} is not in the group",
                    a.state,
                    b.state
                );
            }
        }
    }

    fn color_perms_are_homomorphism<S: Symmetry>(sym: &S) {
        let configs = sym.matrices();
        assert!(sym.color_perm_of(&configs[0].matrix).unwrap().is_identity());
        for a in &configs {
            let pa = sym.color_perm_of(&a.matrix).unwrap();
            assert_eq!(pa.len(), sym.color_count());
            assert_eq!(pa.apply(BLANK), BLANK);
            for b in &configs {
                let pb = sym.color_perm_of(&b.matrix).unwrap();
                let pab = sym.color_perm_of(&(a.matrix * b.matrix)).unwrap();
                assert_eq!(pab, pa.compose(&pb), "{:?} {:?}", a.state, b.state);
            }
        }
    }

    fn symmetry_points_are_fixed<S: Symmetry>(sym: &S) {
        for p in sym.symmetry_points() {
            let fixing = sym
                .matrices()
                .iter()
                .filter(|c| (c.matrix * p - p).magnitude2() < EPSILON)
                .count();
            assert!(fixing > 1, "{p:?} is not on a rotation axis");
        }
    }

    pub fn validate_symmetry<S: Symmetry>(sym: &S) {
        identity_first(sym);
        all_rotations(sym);
        elements_distinct(sym);
        closed_under_composition(sym);
        color_perms_are_homomorphism(sym);
        symmetry_points_are_fixed(sym);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perm_inverse_and_compose() {
        let p = Perm::new(vec![2, 0, 1, 3]);
        assert!(p.compose(&p.inverse()).is_identity());
        assert!(p.inverse().compose(&p).is_identity());
        assert_eq!(p.compose(&p).apply(0), 1);
        assert!(!p.is_identity());
        assert!(Perm::identity(7).is_identity());
    }
}
