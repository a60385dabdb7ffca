pub mod builder;
pub mod constraints;
pub mod dual;
pub mod error;
pub mod primal;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::symmetry::{Element, SymmetryContext};

pub use builder::make_graph;
pub use constraints::{KeepCloseFar, LineVertexConstraint};
pub use dual::{Dual, DualVertex};
pub use error::GraphError;
pub use primal::{Graph, Tile, Vertex};

#[derive(Debug)]
pub enum VertexKind {}
#[derive(Debug)]
pub enum TileKind {}
#[derive(Debug)]
pub enum DualKind {}

/// The image under `element` of the stored entity `index`.
pub struct Ref<Kind> {
    pub index: usize,
    pub element: Element,
    kind: PhantomData<Kind>,
}

pub type VertexRef = Ref<VertexKind>;
pub type TileRef = Ref<TileKind>;
pub type DualRef = Ref<DualKind>;

impl<Kind> Ref<Kind> {
    pub fn new(index: usize, element: Element) -> Self {
        Self {
            index,
            element,
            kind: PhantomData,
        }
    }

    /// The stored entity itself.
    pub fn raw(index: usize) -> Self {
        Self::new(index, Element::IDENTITY)
    }

    pub fn with_element(self, element: Element) -> Self {
        Self::new(self.index, element)
    }

    /// The image of this entity under `g`.
    pub fn premul(self, ctx: &SymmetryContext, g: Element) -> Self {
        Self::new(self.index, ctx.compose(g, self.element))
    }
}

impl<Kind> Clone for Ref<Kind> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Kind> Copy for Ref<Kind> {}

impl<Kind> PartialEq for Ref<Kind> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.element == other.element
    }
}

impl<Kind> Eq for Ref<Kind> {}

impl<Kind> Hash for Ref<Kind> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.element.hash(state);
    }
}

impl<Kind> fmt::Debug for Ref<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({}, {})", self.index, self.element.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetry::IcoSymmetry;

    #[test]
    fn premul_composes_on_the_left() {
        let ctx = SymmetryContext::new(&IcoSymmetry::default()).unwrap();
        let g = ctx.element(7).unwrap();
        let h = ctx.element(23).unwrap();
        let r = VertexRef::new(3, h);
        let moved = r.premul(&ctx, g);
        assert_eq!(moved.index, 3);
        assert_eq!(moved.element, ctx.compose(g, h));
        assert_eq!(VertexRef::raw(3).premul(&ctx, g), VertexRef::new(3, g));
        assert_ne!(r, moved.with_element(g));
    }
}
