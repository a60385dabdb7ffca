use std::collections::HashMap;
use std::rc::Rc;

use cgmath::{InnerSpace, SquareMatrix};

use crate::symmetry::{Color, Config, Perm, Symmetry, SymmetryError, SymmetryMap};
use crate::util::{Mat3, Vec3};

/// Width of the buckets a matrix entry is rounded into when recognizing group elements.
///
/// Every entry of every icosahedral rotation is one of 0, ±0.309, ±0.5, ±0.809 or ±1.
/// Dividing by 0.24 and rounding sends each of these to its own digit with at least 0.03
/// of slack before the next bucket boundary, and distinct elements differ by at least
/// 0.8 in some entry, so rounding error below 0.03 never changes which element is found.
pub const QUANTUM: f64 = 0.24;

const DIGIT_OFFSET: i64 = 4;
const DIGIT_BASE: u64 = 16;

/// Quantized fingerprint of the first two columns of a rotation. The third column is
/// their cross product, so these six entries identify the rotation.
pub fn digest(m: &Mat3) -> Result<u64, SymmetryError> {
    let mut digest = 0;
    for column in [m.x, m.y] {
        for entry in [column.x, column.y, column.z] {
            if !entry.is_finite() {
                return Err(SymmetryError::Unrecognized);
            }
            let digit = (entry / QUANTUM).round() as i64 + DIGIT_OFFSET;
            if !(0..DIGIT_BASE as i64).contains(&digit) {
                return Err(SymmetryError::Unrecognized);
            }
            digest = digest * DIGIT_BASE + digit as u64;
        }
    }
    Ok(digest)
}

/// A group element, named by its canonical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const IDENTITY: Element = Element(0);

    pub(crate) fn from_index(index: usize) -> Element {
        Element(index as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything derived once from a [`Symmetry`]: the enumerated elements, their canonical
/// indices, multiplication and inverse tables, and the color permutation of each element.
/// Immutable after construction and shared by reference with every graph.
#[derive(Debug)]
pub struct SymmetryContext {
    name: &'static str,
    configs: Vec<Config>,
    digests: HashMap<u64, Element>,
    compose: Vec<Vec<Element>>,
    inverse: Vec<Element>,
    perms: Vec<Perm>,
    color_count: usize,
    symmetry_points: Vec<Vec3>,
    none: Rc<SymmetryMap>,
}

impl SymmetryContext {
    pub fn new<S: Symmetry>(symmetry: &S) -> Result<Self, SymmetryError> {
        let configs = symmetry.matrices();
        if configs.is_empty() || !configs[0].is_home_state() {
            return Err(SymmetryError::IdentityNotFirst);
        }
        if configs.len() > u8::MAX as usize + 1 {
            return Err(SymmetryError::TooManyElements(configs.len()));
        }

        let mut digests = HashMap::new();
        for (i, config) in configs.iter().enumerate() {
            if let Some(prev) = digests.insert(digest(&config.matrix)?, Element(i as u8)) {
                return Err(SymmetryError::Collision {
                    a: prev.index(),
                    b: i,
                });
            }
        }
        let lookup = |m: &Mat3| -> Result<Element, SymmetryError> {
            digests
                .get(&digest(m)?)
                .copied()
                .ok_or(SymmetryError::Unrecognized)
        };

        let compose = configs
            .iter()
            .map(|a| {
                configs
                    .iter()
                    .map(|b| lookup(&(a.matrix * b.matrix)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let inverse = configs
            .iter()
            .map(|c| {
                c.matrix
                    .invert()
                    .ok_or(SymmetryError::Unrecognized)
                    .and_then(|m| lookup(&m))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let perms = configs
            .iter()
            .map(|c| symmetry.color_perm_of(&c.matrix))
            .collect::<Result<Vec<_>, _>>()?;

        let none = Rc::new(SymmetryMap::new(&configs, Vec3::new(7.0, 8.0, 9.0)));

        Ok(Self {
            name: symmetry.name(),
            configs,
            digests,
            compose,
            inverse,
            perms,
            color_count: symmetry.color_count(),
            symmetry_points: symmetry.symmetry_points(),
            none,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of elements in the group.
    pub fn order(&self) -> usize {
        self.configs.len()
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> {
        (0..self.configs.len()).map(|i| Element(i as u8))
    }

    pub fn element(&self, index: usize) -> Result<Element, SymmetryError> {
        if index < self.configs.len() {
            Ok(Element(index as u8))
        } else {
            Err(SymmetryError::UnknownIndex(index))
        }
    }

    /// Recognizes a transform as a group element.
    pub fn index_of(&self, m: &Mat3) -> Result<Element, SymmetryError> {
        self.digests
            .get(&digest(m)?)
            .copied()
            .ok_or(SymmetryError::Unrecognized)
    }

    pub fn matrix(&self, e: Element) -> &Mat3 {
        &self.configs[e.index()].matrix
    }

    pub fn state(&self, e: Element) -> [u8; 4] {
        self.configs[e.index()].state
    }

    /// `a ∘ b`: apply `b` first.
    pub fn compose(&self, a: Element, b: Element) -> Element {
        self.compose[a.index()][b.index()]
    }

    pub fn inverse(&self, e: Element) -> Element {
        self.inverse[e.index()]
    }

    pub fn transform(&self, e: Element, p: Vec3) -> Vec3 {
        *self.matrix(e) * p
    }

    pub fn color_perm(&self, e: Element) -> &Perm {
        &self.perms[e.index()]
    }

    /// The color that `base` becomes under `e`.
    pub fn color_of(&self, e: Element, base: Color) -> Color {
        self.perms[e.index()].apply(base)
    }

    pub fn color_count(&self) -> usize {
        self.color_count
    }

    /// The group's representative axis points, scaled to `radius`.
    pub fn symmetry_points(&self, radius: f64) -> Vec<Vec3> {
        self.symmetry_points
            .iter()
            .map(|p| p.normalize() * radius)
            .collect()
    }

    /// The invariance map of `p`, or the shared trivial map if `p` lies on no axis.
    pub fn symmetry_map_for(&self, p: Vec3) -> Rc<SymmetryMap> {
        let map = SymmetryMap::new(&self.configs, p);
        if map.has_symmetry() {
            Rc::new(map)
        } else {
            self.none.clone()
        }
    }

    pub fn no_symmetry(&self) -> Rc<SymmetryMap> {
        self.none.clone()
    }
}
