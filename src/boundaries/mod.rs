// src/boundaries/mod.rs
//
// Domain-edge boundary conditions: a closed variant set sharing the
// per-phase update contract the grid engine drives (phi hooks before the
// bulk update, field hooks after it). Placement resolution happens here,
// before the concrete per-axis variant is constructed, so no variant ever
// changes its own kind after registration.

pub mod periodic;
pub mod pml;

use std::fmt;

use num_complex::Complex64;

use crate::coordinates::{AxisSpec, Placement};
use crate::error::PlacementError;
use crate::fields::FieldStore;
use crate::scalar::{FieldScalar, Promote};

pub use periodic::{Periodic, PeriodicBoundary};
pub use pml::{Pml, PmlBoundary};

/// Which end of an axis a face sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Low,
    High,
}

/// One of the six domain faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub axis: usize,
    pub side: Side,
}

impl Face {
    pub(crate) fn slot(self) -> usize {
        self.axis * 2 + matches!(self.side, Side::High) as usize
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = ["x", "y", "z"][self.axis];
        let side = match self.side {
            Side::Low => "low",
            Side::High => "high",
        };
        write!(f, "{axis}-{side}")
    }
}

/// How one axis of a boundary placement pins the domain.
enum AxisPin {
    Full,
    Single(usize),
    Edge { side: Side, thickness: usize },
}

fn classify(
    spec: &AxisSpec,
    axis: usize,
    extent: usize,
    grid_spacing: f64,
) -> Result<AxisPin, PlacementError> {
    if spec.is_full() {
        return Ok(AxisPin::Full);
    }
    let n = extent as isize;
    let resolve = |c: crate::coordinates::CellCoord| {
        let i = c.to_cell(grid_spacing);
        if i < 0 {
            i + n
        } else {
            i
        }
    };
    match spec {
        AxisSpec::Single(c) => {
            let i = resolve(*c);
            if i < 0 || i >= n {
                return Err(PlacementError::OutOfBounds {
                    axis,
                    index: i,
                    extent,
                });
            }
            Ok(AxisPin::Single(i as usize))
        }
        AxisSpec::Cells(cells) if cells.len() == 1 => {
            classify(&AxisSpec::Single(cells[0]), axis, extent, grid_spacing)
        }
        AxisSpec::Cells(_) => Err(PlacementError::InvalidAbsorbingPlacement),
        AxisSpec::Span { start, stop, .. } => {
            let lo = start.map_or(0, resolve);
            let hi = stop.map_or(n, resolve);
            if lo < 0 || hi > n || lo >= hi {
                return Err(PlacementError::EmptyRange(axis));
            }
            if hi - lo == 1 {
                // A one-cell slice pins a single index, like a bare index.
                return Ok(AxisPin::Single(lo as usize));
            }
            if lo == 0 && hi == n {
                Ok(AxisPin::Full)
            } else if lo == 0 {
                Ok(AxisPin::Edge {
                    side: Side::Low,
                    thickness: hi as usize,
                })
            } else if hi == n {
                Ok(AxisPin::Edge {
                    side: Side::High,
                    thickness: (n - lo) as usize,
                })
            } else {
                Err(PlacementError::InvalidAbsorbingPlacement)
            }
        }
    }
}

/// Resolve a periodic-boundary placement to its axis: a single index at 0
/// or the last index of exactly one axis, the other axes left full.
pub(crate) fn resolve_periodic_axis(
    placement: &Placement,
    extents: [usize; 3],
    grid_spacing: f64,
) -> Result<usize, PlacementError> {
    let mut axis = None;
    for (a, spec) in placement.axes().into_iter().enumerate() {
        match classify(spec, a, extents[a], grid_spacing)? {
            AxisPin::Full => {}
            AxisPin::Single(i) if i == 0 || i == extents[a] - 1 => {
                if axis.replace(a).is_some() {
                    return Err(PlacementError::InvalidPeriodicPlacement);
                }
            }
            _ => return Err(PlacementError::InvalidPeriodicPlacement),
        }
    }
    axis.ok_or(PlacementError::InvalidPeriodicPlacement)
}

/// Resolve an absorbing-boundary placement to its face and thickness: an
/// edge-adjacent index range on exactly one axis, the other axes full.
pub(crate) fn resolve_absorbing_face(
    placement: &Placement,
    extents: [usize; 3],
    grid_spacing: f64,
) -> Result<(Face, usize), PlacementError> {
    let mut found = None;
    for (a, spec) in placement.axes().into_iter().enumerate() {
        match classify(spec, a, extents[a], grid_spacing)? {
            AxisPin::Full => {}
            AxisPin::Edge { side, thickness } => {
                if found
                    .replace((Face { axis: a, side }, thickness))
                    .is_some()
                {
                    return Err(PlacementError::InvalidAbsorbingPlacement);
                }
            }
            AxisPin::Single(_) => {
                return Err(PlacementError::InvalidAbsorbingPlacement)
            }
        }
    }
    found.ok_or(PlacementError::InvalidAbsorbingPlacement)
}

/// A boundary registered on a grid.
#[derive(Debug, Clone)]
pub enum Boundary<T: FieldScalar> {
    Periodic(Periodic),
    Pml(Pml<T>),
}

impl<T: FieldScalar> Boundary<T> {
    /// The faces this boundary owns; a periodic boundary claims both ends
    /// of its axis.
    pub fn faces(&self) -> Vec<Face> {
        match self {
            Boundary::Periodic(p) => vec![
                Face {
                    axis: p.axis(),
                    side: Side::Low,
                },
                Face {
                    axis: p.axis(),
                    side: Side::High,
                },
            ],
            Boundary::Pml(p) => vec![p.face()],
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Boundary::Periodic(p) => p.name(),
            Boundary::Pml(p) => p.name(),
        }
    }

    pub(crate) fn update_phi_e(&mut self, fields: &FieldStore<T>) {
        if let Boundary::Pml(p) = self {
            p.update_phi_e(fields);
        }
    }

    pub(crate) fn update_phi_h(&mut self, fields: &FieldStore<T>) {
        if let Boundary::Pml(p) = self {
            p.update_phi_h(fields);
        }
    }

    pub(crate) fn update_e(&mut self, fields: &mut FieldStore<T>) {
        match self {
            Boundary::Periodic(p) => p.update_e(fields),
            Boundary::Pml(p) => p.update_e(fields),
        }
    }

    pub(crate) fn update_h(&mut self, fields: &mut FieldStore<T>) {
        match self {
            Boundary::Periodic(p) => p.update_h(fields),
            Boundary::Pml(p) => p.update_h(fields),
        }
    }
}

impl Promote for Boundary<f64> {
    type Promoted = Boundary<Complex64>;

    fn promote(self) -> Boundary<Complex64> {
        match self {
            Boundary::Periodic(p) => Boundary::Periodic(p),
            Boundary::Pml(p) => Boundary::Pml(p.promote()),
        }
    }
}

impl<T: FieldScalar> fmt::Display for Boundary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Periodic(p) => write!(
                f,
                "PeriodicBoundary(name={:?}) @ axis {}",
                p.name(),
                ["x", "y", "z"][p.axis()]
            ),
            Boundary::Pml(p) => write!(
                f,
                "PML(name={:?}) @ {}, {} cells",
                p.name(),
                p.face(),
                p.thickness()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_axis_resolves_from_either_end() {
        let extents = [16, 8, 1];
        let p: Placement = (0, .., ..).into();
        assert_eq!(resolve_periodic_axis(&p, extents, 1.0).unwrap(), 0);
        let p: Placement = (.., -1, ..).into();
        assert_eq!(resolve_periodic_axis(&p, extents, 1.0).unwrap(), 1);
    }

    #[test]
    fn periodic_rejects_interior_indices() {
        let p: Placement = (4, .., ..).into();
        assert!(resolve_periodic_axis(&p, [16, 8, 1], 1.0).is_err());
    }

    #[test]
    fn absorbing_face_resolves_thickness_from_the_slice() {
        let extents = [64, 8, 1];
        let p: Placement = (0..10, .., ..).into();
        let (face, thickness) = resolve_absorbing_face(&p, extents, 1.0).unwrap();
        assert_eq!(face, Face { axis: 0, side: Side::Low });
        assert_eq!(thickness, 10);

        let p: Placement = (-10.., .., ..).into();
        let (face, thickness) = resolve_absorbing_face(&p, extents, 1.0).unwrap();
        assert_eq!(face, Face { axis: 0, side: Side::High });
        assert_eq!(thickness, 10);
    }

    #[test]
    fn absorbing_face_must_touch_an_edge() {
        let p: Placement = (4..10, .., ..).into();
        assert!(matches!(
            resolve_absorbing_face(&p, [64, 8, 1], 1.0),
            Err(PlacementError::InvalidAbsorbingPlacement)
        ));
    }

    #[test]
    fn absorbing_layer_covering_the_whole_axis_is_rejected() {
        // A full-axis range pins nothing, so there is no face to claim.
        let p: Placement = (0..8, .., ..).into();
        assert!(matches!(
            resolve_absorbing_face(&p, [8, 8, 1], 1.0),
            Err(PlacementError::InvalidAbsorbingPlacement)
        ));
    }
}
