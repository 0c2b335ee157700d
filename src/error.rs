// src/error.rs

use thiserror::Error;

use crate::boundaries::Face;

/// Fatal errors raised while resolving a placement on the grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("index {index} out of bounds for axis {axis} with extent {extent}")]
    OutOfBounds {
        axis: usize,
        index: isize,
        extent: usize,
    },

    #[error("a periodic boundary must be placed at index 0 or the last index of exactly one axis")]
    InvalidPeriodicPlacement,

    #[error("an absorbing boundary must cover an edge-adjacent index range on exactly one axis")]
    InvalidAbsorbingPlacement,

    #[error("an object box accepts only unit-stride slices or single indices, got step {0}")]
    NonUnitStride(isize),

    #[error("an object box needs a slice or single index per axis, not an index list")]
    InvalidObjectIndex,

    #[error("a plane source must pin exactly one axis to a single index")]
    InvalidPlanePlacement,

    #[error("empty index range on axis {0}")]
    EmptyRange(usize),
}

/// Fatal errors raised at construction or registration time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid must extend along at least one axis")]
    ZeroDimensionalGrid,

    #[error("courant number {given} exceeds the stability bound {bound:.4} for a {dimensionality}D simulation")]
    CourantTooHigh {
        given: f64,
        bound: f64,
        dimensionality: usize,
    },

    #[error("the grid already has a collaborator named {0:?}")]
    DuplicateName(String),

    #[error("the {0} face of the grid already has a boundary")]
    FaceOccupied(Face),

    #[error("a point source must be placed on a single grid cell")]
    PointSourceExtent,

    #[error("a line source or detector must span at least two grid cells")]
    PathTooShort,

    #[error("explicit index lists must have equal lengths, got {x}/{y}/{z}")]
    MismatchedIndexLists { x: usize, y: usize, z: usize },

    #[error("source period must resolve to at least one time step")]
    InvalidSourcePeriod,

    #[error("per-cell material tensor has shape {got:?}, expected {expected:?}")]
    MaterialShape {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error(transparent)]
    Placement(#[from] PlacementError),
}
