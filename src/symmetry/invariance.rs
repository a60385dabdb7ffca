use cgmath::InnerSpace;

use crate::symmetry::{Config, Element};
use crate::util::Vec3;

/// For a point fixed by part of the group, which elements send it to the same place.
///
/// Each element maps to a representative, the lowest-indexed element with the same image
/// of the point. Elements with equal representatives describe the same entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetryMap {
    map_to_real: Vec<Element>,
    classes: Vec<Vec<Element>>,
}

impl SymmetryMap {
    pub fn new(configs: &[Config], p: Vec3) -> Self {
        let tolerance = 1e-8 * p.magnitude2().max(1.0);
        let images: Vec<Vec3> = configs.iter().map(|c| c.matrix * p).collect();
        let map_to_real: Vec<Element> = (0..images.len())
            .map(|a| {
                let real = (0..a)
                    .find(|&i| (images[a] - images[i]).magnitude2() < tolerance)
                    .unwrap_or(a);
                Element::from_index(real)
            })
            .collect();
        let classes = map_to_real
            .iter()
            .map(|&real| {
                (0..map_to_real.len())
                    .filter(|&b| map_to_real[b] == real)
                    .map(Element::from_index)
                    .collect()
            })
            .collect();
        Self {
            map_to_real,
            classes,
        }
    }

    pub fn is_real(&self, e: Element) -> bool {
        self.map_to_real[e.index()] == e
    }

    pub fn to_real(&self, e: Element) -> Element {
        self.map_to_real[e.index()]
    }

    pub fn matches(&self, a: Element, b: Element) -> bool {
        self.to_real(a) == self.to_real(b)
    }

    /// Every element with the same representative as `e`, `e` included, in index order.
    pub fn symmetric_elements(&self, e: Element) -> &[Element] {
        &self.classes[e.index()]
    }

    /// Whether some element other than the identity fixes the point.
    pub fn has_symmetry(&self) -> bool {
        self.classes[Element::IDENTITY.index()].len() > 1
    }

    /// Number of distinct images of the point.
    pub fn orbit_size(&self) -> usize {
        self.map_to_real
            .iter()
            .enumerate()
            .filter(|&(i, e)| i == e.index())
            .count()
    }
}
