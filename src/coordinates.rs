// src/coordinates.rs
//
// Conversion between physical coordinates and grid indices, and the
// placement specifications used to attach collaborators to a grid.
//
// Every collaborator kind resolves a `Placement` with its own rules (cell
// for point sources, sampled path for line sources and detectors, box for
// objects, face for boundaries). The resolvers are kept as separate named
// functions because their rules differ; only the distance/time rounding is
// shared.

use crate::error::{ConfigError, PlacementError};

/// Convert a physical distance to a cell count, rounding half up.
#[inline]
pub fn distance_to_index(distance: f64, grid_spacing: f64) -> isize {
    (distance / grid_spacing + 0.5).floor() as isize
}

/// Convert a physical time to a step count, rounding half up.
#[inline]
pub fn time_to_steps(time: f64, time_step: f64) -> isize {
    (time / time_step + 0.5).floor() as isize
}

/// A single coordinate along one axis: either an integer cell index
/// (passed through unchanged, negatives resolved against the axis extent)
/// or a physical distance (converted via [`distance_to_index`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellCoord {
    Cell(isize),
    Distance(f64),
}

impl CellCoord {
    /// The coordinate as a (possibly negative) cell index.
    pub fn to_cell(self, grid_spacing: f64) -> isize {
        match self {
            CellCoord::Cell(i) => i,
            CellCoord::Distance(d) => distance_to_index(d, grid_spacing),
        }
    }
}

macro_rules! cell_coord_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for CellCoord {
            fn from(v: $t) -> Self {
                CellCoord::Cell(v as isize)
            }
        }
    )*};
}

cell_coord_from_int!(usize, isize, i32, i64, u32);

impl From<f64> for CellCoord {
    fn from(v: f64) -> Self {
        CellCoord::Distance(v)
    }
}

/// A duration: either an explicit step count or a physical time in seconds
/// (converted via [`time_to_steps`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSpec {
    Steps(u64),
    Seconds(f64),
}

impl TimeSpec {
    pub fn to_steps(self, time_step: f64) -> u64 {
        match self {
            TimeSpec::Steps(n) => n,
            TimeSpec::Seconds(t) => time_to_steps(t, time_step).max(0) as u64,
        }
    }

    /// The raw number as given, before any conversion. Used by the pulse
    /// waveform, whose carrier frequency is defined on the raw period.
    pub fn raw(self) -> f64 {
        match self {
            TimeSpec::Steps(n) => n as f64,
            TimeSpec::Seconds(t) => t,
        }
    }
}

macro_rules! time_spec_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for TimeSpec {
            fn from(v: $t) -> Self {
                TimeSpec::Steps(v as u64)
            }
        }
    )*};
}

time_spec_from_int!(u64, usize, u32, i32);

impl From<f64> for TimeSpec {
    fn from(v: f64) -> Self {
        TimeSpec::Seconds(v)
    }
}

/// Placement specification along one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisSpec {
    /// A single coordinate.
    Single(CellCoord),
    /// A half-open range; `None` bounds extend to the axis edge.
    Span {
        start: Option<CellCoord>,
        stop: Option<CellCoord>,
        step: Option<isize>,
    },
    /// An explicit list of coordinates.
    Cells(Vec<CellCoord>),
}

impl AxisSpec {
    pub fn full() -> Self {
        AxisSpec::Span {
            start: None,
            stop: None,
            step: None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(
            self,
            AxisSpec::Span {
                start: None,
                stop: None,
                step: None,
            }
        )
    }

    /// Span bounds as cell indices, negatives resolved against the extent.
    fn bounds(&self, extent: usize, grid_spacing: f64) -> (isize, isize) {
        let n = extent as isize;
        let resolve = |c: CellCoord| {
            let i = c.to_cell(grid_spacing);
            if i < 0 {
                i + n
            } else {
                i
            }
        };
        match self {
            AxisSpec::Single(c) => {
                let i = resolve(*c);
                (i, i)
            }
            AxisSpec::Span { start, stop, .. } => (
                start.map_or(0, resolve),
                stop.map_or(n, resolve),
            ),
            // Lists are reduced to the span between their endpoints when
            // mixed with slices, like the original path derivation.
            AxisSpec::Cells(cells) => match (cells.first(), cells.last()) {
                (Some(&a), Some(&b)) => (resolve(a), resolve(b)),
                _ => (0, 0),
            },
        }
    }
}

macro_rules! axis_spec_from_coord {
    ($($t:ty),*) => {$(
        impl From<$t> for AxisSpec {
            fn from(v: $t) -> Self {
                AxisSpec::Single(v.into())
            }
        }
    )*};
}

axis_spec_from_coord!(usize, isize, i32, i64, u32, f64);

impl From<std::ops::RangeFull> for AxisSpec {
    fn from(_: std::ops::RangeFull) -> Self {
        AxisSpec::full()
    }
}

macro_rules! axis_spec_from_range {
    ($($t:ty),*) => {$(
        impl From<std::ops::Range<$t>> for AxisSpec {
            fn from(r: std::ops::Range<$t>) -> Self {
                AxisSpec::Span {
                    start: Some(r.start.into()),
                    stop: Some(r.end.into()),
                    step: None,
                }
            }
        }

        impl From<std::ops::RangeFrom<$t>> for AxisSpec {
            fn from(r: std::ops::RangeFrom<$t>) -> Self {
                AxisSpec::Span {
                    start: Some(r.start.into()),
                    stop: None,
                    step: None,
                }
            }
        }

        impl From<std::ops::RangeTo<$t>> for AxisSpec {
            fn from(r: std::ops::RangeTo<$t>) -> Self {
                AxisSpec::Span {
                    start: None,
                    stop: Some(r.end.into()),
                    step: None,
                }
            }
        }

        impl From<Vec<$t>> for AxisSpec {
            fn from(v: Vec<$t>) -> Self {
                AxisSpec::Cells(v.into_iter().map(Into::into).collect())
            }
        }
    )*};
}

axis_spec_from_range!(usize, isize, i32, f64);

/// Placement along the three grid axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub x: AxisSpec,
    pub y: AxisSpec,
    pub z: AxisSpec,
}

impl<A, B, C> From<(A, B, C)> for Placement
where
    A: Into<AxisSpec>,
    B: Into<AxisSpec>,
    C: Into<AxisSpec>,
{
    fn from((x, y, z): (A, B, C)) -> Self {
        Placement {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }
}

impl Placement {
    pub fn axes(&self) -> [&AxisSpec; 3] {
        [&self.x, &self.y, &self.z]
    }
}

/// Requested grid extents: a physical distance or cell count per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent3(pub CellCoord, pub CellCoord, pub CellCoord);

impl<A, B, C> From<(A, B, C)> for Extent3
where
    A: Into<CellCoord>,
    B: Into<CellCoord>,
    C: Into<CellCoord>,
{
    fn from((x, y, z): (A, B, C)) -> Self {
        Extent3(x.into(), y.into(), z.into())
    }
}

/// Resolve a possibly negative cell index against an axis extent.
fn wrap_index(index: isize, extent: usize, axis: usize) -> Result<usize, PlacementError> {
    let n = extent as isize;
    let resolved = if index < 0 { index + n } else { index };
    if resolved < 0 || resolved >= n {
        return Err(PlacementError::OutOfBounds {
            axis,
            index,
            extent,
        });
    }
    Ok(resolved as usize)
}

/// Resolve a placement to a single grid cell (point sources).
pub fn resolve_cell(
    placement: &Placement,
    extents: [usize; 3],
    grid_spacing: f64,
) -> Result<[usize; 3], ConfigError> {
    let mut cell = [0usize; 3];
    for (axis, spec) in placement.axes().into_iter().enumerate() {
        let coord = match spec {
            AxisSpec::Single(c) => *c,
            AxisSpec::Cells(cells) if cells.len() == 1 => cells[0],
            _ => return Err(ConfigError::PointSourceExtent),
        };
        cell[axis] = wrap_index(coord.to_cell(grid_spacing), extents[axis], axis)
            .map_err(ConfigError::Placement)?;
    }
    Ok(cell)
}

/// Resolve a placement to an ordered cell path (line sources, detectors).
///
/// Three explicit index lists of equal length are taken verbatim. Any
/// other combination is reduced to per-axis spans and sampled with the
/// largest span as the cell count, endpoint-exclusive, so the path walks a
/// straight line between the two requested corners.
pub fn resolve_path(
    placement: &Placement,
    extents: [usize; 3],
    grid_spacing: f64,
) -> Result<Vec<[usize; 3]>, ConfigError> {
    let axes = placement.axes();

    if let (AxisSpec::Cells(x), AxisSpec::Cells(y), AxisSpec::Cells(z)) =
        (axes[0], axes[1], axes[2])
    {
        if x.len() != y.len() || y.len() != z.len() {
            return Err(ConfigError::MismatchedIndexLists {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        if x.len() < 2 {
            return Err(ConfigError::PathTooShort);
        }
        let mut cells = Vec::with_capacity(x.len());
        for ((&cx, &cy), &cz) in x.iter().zip(y).zip(z) {
            cells.push([
                wrap_index(cx.to_cell(grid_spacing), extents[0], 0)?,
                wrap_index(cy.to_cell(grid_spacing), extents[1], 1)?,
                wrap_index(cz.to_cell(grid_spacing), extents[2], 2)?,
            ]);
        }
        return Ok(cells);
    }

    let mut start = [0isize; 3];
    let mut stop = [0isize; 3];
    for axis in 0..3 {
        let (a, b) = axes[axis].bounds(extents[axis], grid_spacing);
        start[axis] = a;
        stop[axis] = b;
    }

    let m = (0..3)
        .map(|a| (stop[a] - start[a]).unsigned_abs())
        .max()
        .unwrap_or(0);
    if m < 2 {
        return Err(ConfigError::PathTooShort);
    }

    let mut cells = Vec::with_capacity(m);
    for i in 0..m {
        let mut cell = [0usize; 3];
        for axis in 0..3 {
            let v = start[axis] as f64
                + (i as f64) * (stop[axis] - start[axis]) as f64 / m as f64;
            cell[axis] = wrap_index(v as isize, extents[axis], axis)?;
        }
        cells.push(cell);
    }
    Ok(cells)
}

/// Resolve a placement to a half-open, unit-stride index box (objects).
///
/// Kept separate from the path resolution on purpose: object slices
/// resolve negative endpoints against the axis extent and reject strides,
/// while paths sample between their endpoints.
pub fn resolve_box(
    placement: &Placement,
    extents: [usize; 3],
    grid_spacing: f64,
) -> Result<[std::ops::Range<usize>; 3], PlacementError> {
    let mut bounds: [std::ops::Range<usize>; 3] = [0..0, 0..0, 0..0];
    for (axis, spec) in placement.axes().into_iter().enumerate() {
        let extent = extents[axis];
        bounds[axis] = match spec {
            AxisSpec::Single(c) => {
                let i = wrap_index(c.to_cell(grid_spacing), extent, axis)?;
                i..i + 1
            }
            AxisSpec::Cells(cells) if cells.len() == 1 => {
                let i = wrap_index(cells[0].to_cell(grid_spacing), extent, axis)?;
                i..i + 1
            }
            AxisSpec::Cells(_) => return Err(PlacementError::InvalidObjectIndex),
            AxisSpec::Span { start, stop, step } => {
                if let Some(s) = step {
                    if *s != 1 {
                        return Err(PlacementError::NonUnitStride(*s));
                    }
                }
                let lo = match start {
                    Some(c) => wrap_index(c.to_cell(grid_spacing), extent, axis)?,
                    None => 0,
                };
                let hi = match stop {
                    // The stop bound may equal the extent itself.
                    Some(c) => {
                        let i = c.to_cell(grid_spacing);
                        let n = extent as isize;
                        let resolved = if i < 0 { i + n } else { i };
                        if resolved < 0 || resolved > n {
                            return Err(PlacementError::OutOfBounds {
                                axis,
                                index: i,
                                extent,
                            });
                        }
                        resolved as usize
                    }
                    None => extent,
                };
                if lo >= hi {
                    return Err(PlacementError::EmptyRange(axis));
                }
                lo..hi
            }
        };
    }
    Ok(bounds)
}

/// Resolve a placement to a plane window: exactly one axis pinned to a
/// single index, the remaining axes covering index ranges.
pub fn resolve_plane(
    placement: &Placement,
    extents: [usize; 3],
    grid_spacing: f64,
) -> Result<([std::ops::Range<usize>; 3], usize), PlacementError> {
    let pinned: Vec<usize> = placement
        .axes()
        .into_iter()
        .enumerate()
        .filter(|(_, s)| matches!(s, AxisSpec::Single(_)))
        .map(|(a, _)| a)
        .collect();
    if pinned.len() != 1
        || placement
            .axes()
            .iter()
            .any(|s| matches!(s, AxisSpec::Cells(c) if c.len() != 1))
    {
        return Err(PlacementError::InvalidPlanePlacement);
    }
    let window = resolve_box(placement, extents, grid_spacing)?;
    Ok((window, pinned[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_rounding_is_half_up() {
        assert_eq!(distance_to_index(3.4, 1.0), 3);
        assert_eq!(distance_to_index(3.6, 1.0), 4);
        assert_eq!(distance_to_index(3.5, 1.0), 4);
        assert_eq!(distance_to_index(10e-6, 155e-9), 65);
    }

    #[test]
    fn integral_coordinates_pass_through() {
        let c: CellCoord = 7.into();
        assert_eq!(c.to_cell(155e-9), 7);
    }

    #[test]
    fn path_from_slices_samples_the_longest_span() {
        let p: Placement = (5, 0..8, 0).into();
        let cells = resolve_path(&p, [16, 8, 1], 1.0).unwrap();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[0], [5, 0, 0]);
        assert_eq!(cells[7], [5, 7, 0]);
    }

    #[test]
    fn path_from_equal_lists_is_taken_verbatim() {
        let p: Placement = (vec![1usize, 2, 3], vec![4usize, 5, 6], vec![0usize, 0, 0]).into();
        let cells = resolve_path(&p, [8, 8, 1], 1.0).unwrap();
        assert_eq!(cells, vec![[1, 4, 0], [2, 5, 0], [3, 6, 0]]);
    }

    #[test]
    fn mismatched_lists_are_rejected() {
        let p: Placement = (vec![1usize, 2], vec![4usize, 5, 6], vec![0usize, 0, 0]).into();
        assert!(matches!(
            resolve_path(&p, [8, 8, 1], 1.0),
            Err(ConfigError::MismatchedIndexLists { .. })
        ));
    }

    #[test]
    fn box_resolves_negative_endpoints_against_the_extent() {
        let p: Placement = (-4..-1, .., ..).into();
        let b = resolve_box(&p, [16, 8, 4], 1.0).unwrap();
        assert_eq!(b, [12..15, 0..8, 0..4]);
    }

    #[test]
    fn box_rejects_non_unit_stride() {
        let p = Placement {
            x: AxisSpec::Span {
                start: Some(0.into()),
                stop: Some(8.into()),
                step: Some(2),
            },
            y: AxisSpec::full(),
            z: AxisSpec::full(),
        };
        assert!(matches!(
            resolve_box(&p, [16, 8, 4], 1.0),
            Err(PlacementError::NonUnitStride(2))
        ));
    }

    #[test]
    fn single_cell_resolution_rejects_spans() {
        let p: Placement = (0..4, 2, 0).into();
        assert!(matches!(
            resolve_cell(&p, [8, 8, 1], 1.0),
            Err(ConfigError::PointSourceExtent)
        ));
    }
}
