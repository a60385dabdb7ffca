use std::fmt;

use crate::symmetry::{Color, SymmetryError};

/// Errors from editing a dual graph or building a tiling from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A face around a dual vertex closes after fewer than three steps
    DegeneratePolygon { vertex: usize, length: usize },
    /// A face walk reached a dual vertex that does not link back
    DanglingEdge { vertex: usize },
    /// A face walk never returned to its start
    OpenPolygon { vertex: usize },
    /// Color outside the palette
    InvalidColor { color: Color },
    /// Index past the end of the vertex list
    VertexNotFound { index: usize },
    /// The vertex sits on a rotation axis and cannot be moved off it
    AxisFixed { index: usize },
    Symmetry(SymmetryError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DegeneratePolygon { vertex, length } => write!(
                f,
                "Face around dual vertex {vertex} has only {length} corners"
            ),
            GraphError::DanglingEdge { vertex } => {
                write!(f, "Dangling edge at dual vertex {vertex}")
            }
            GraphError::OpenPolygon { vertex } => {
                write!(f, "Face walk from dual vertex {vertex} does not close")
            }
            GraphError::InvalidColor { color } => write!(f, "Invalid color {color}"),
            GraphError::VertexNotFound { index } => write!(f, "Vertex {index} not found"),
            GraphError::AxisFixed { index } => {
                write!(f, "Vertex {index} is fixed to a symmetry axis")
            }
            GraphError::Symmetry(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<SymmetryError> for GraphError {
    fn from(err: SymmetryError) -> Self {
        GraphError::Symmetry(err)
    }
}
