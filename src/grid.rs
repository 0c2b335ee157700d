// src/grid.rs
//
// The root aggregate: owns the field store and every registered
// collaborator, and drives the leapfrog time stepping. One step runs the
// E phase and then the symmetric H phase, each in a fixed order: boundary
// phi hooks, bulk curl update, object overrides, boundary field hooks,
// source injection, detector sampling. Only the engine mutates the bulk
// arrays; collaborators mutate bounded sub-regions afterwards.

use std::collections::HashMap;
use std::fmt;

use ndarray::Array4;
use num_complex::Complex64;

use crate::boundaries::{
    resolve_absorbing_face, resolve_periodic_axis, Boundary, Face, Periodic, PeriodicBoundary,
    Pml, PmlBoundary, Side,
};
use crate::constants;
use crate::coordinates::{
    distance_to_index, resolve_box, resolve_cell, resolve_path, resolve_plane, time_to_steps,
    Extent3, Placement, TimeSpec,
};
use crate::curl::{curl_e, curl_h};
use crate::detectors::LineDetector;
use crate::error::ConfigError;
use crate::fields::{FieldStore, MaterialSpec};
use crate::objects::{DielectricObject, DielectricRegion};
use crate::scalar::{FieldScalar, Promote};
use crate::sources::{LineSource, PlaneSource, PointSource, Source};

/// Handle to a named collaborator on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorId {
    Boundary(usize),
    Source(usize),
    Detector(usize),
    Object(usize),
}

/// Optional construction parameters beyond shape and spacing.
#[derive(Debug, Clone)]
pub struct GridOptions {
    pub permittivity: MaterialSpec<f64>,
    pub permeability: MaterialSpec<f64>,
    /// Defaults to `0.99 * D^(-1/2)`; values above the stability bound
    /// are rejected.
    pub courant_number: Option<f64>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            permittivity: MaterialSpec::Uniform(1.0),
            permeability: MaterialSpec::Uniform(1.0),
            courant_number: None,
        }
    }
}

/// A Yee grid with its registered boundaries, sources, detectors and
/// objects.
#[derive(Debug, Clone)]
pub struct Grid<T: FieldScalar = f64> {
    grid_spacing: f64,
    time_step: f64,
    dimensionality: usize,
    time_steps_passed: u64,
    fields: FieldStore<T>,
    boundaries: Vec<Boundary<T>>,
    sources: Vec<Source>,
    detectors: Vec<LineDetector<T>>,
    objects: Vec<DielectricRegion<T>>,
    face_owners: [Option<usize>; 6],
    names: HashMap<String, CollaboratorId>,
}

impl Grid<f64> {
    /// A vacuum grid with the default Courant number.
    pub fn new(shape: impl Into<Extent3>, grid_spacing: f64) -> Result<Self, ConfigError> {
        Self::with_options(shape, grid_spacing, GridOptions::default())
    }

    pub fn with_options(
        shape: impl Into<Extent3>,
        grid_spacing: f64,
        options: GridOptions,
    ) -> Result<Self, ConfigError> {
        let Extent3(sx, sy, sz) = shape.into();
        let extents = [sx, sy, sz].map(|c| c.to_cell(grid_spacing));
        if extents.iter().any(|&n| n < 1) {
            return Err(ConfigError::ZeroDimensionalGrid);
        }
        let extents = extents.map(|n| n as usize);

        let dimensionality = extents.iter().filter(|&&n| n > 1).count();
        if dimensionality == 0 {
            return Err(ConfigError::ZeroDimensionalGrid);
        }

        let bound = (dimensionality as f64).powf(-0.5);
        let courant_number = match options.courant_number {
            None => 0.99 * bound,
            Some(c) if c > bound => {
                return Err(ConfigError::CourantTooHigh {
                    given: c,
                    bound,
                    dimensionality,
                })
            }
            Some(c) => c,
        };

        let fields = FieldStore::new(
            extents,
            &options.permittivity,
            &options.permeability,
            courant_number,
        )?;

        Ok(Self {
            grid_spacing,
            time_step: courant_number * grid_spacing / constants::C,
            dimensionality,
            time_steps_passed: 0,
            fields,
            boundaries: Vec::new(),
            sources: Vec::new(),
            detectors: Vec::new(),
            objects: Vec::new(),
            face_owners: [None; 6],
            names: HashMap::new(),
        })
    }

    /// Promote the element type to `Complex64`, irreversibly. The
    /// promotion cascades through every registered boundary's auxiliary
    /// state, every detector history and every object tensor. Complex
    /// object material can only be registered on the promoted grid.
    pub fn into_complex(self) -> Grid<Complex64> {
        self.promote()
    }
}

impl<T: FieldScalar> Grid<T> {
    // ------------------------------------------------------------------
    // Coordinate translation
    // ------------------------------------------------------------------

    /// Physical distance to a cell index (round half up).
    pub fn distance_to_index(&self, distance: f64) -> isize {
        distance_to_index(distance, self.grid_spacing)
    }

    /// Physical time to a step count (round half up).
    pub fn time_to_steps(&self, time: f64) -> isize {
        time_to_steps(time, self.time_step)
    }

    // ------------------------------------------------------------------
    // Topology and state accessors
    // ------------------------------------------------------------------

    pub fn shape(&self) -> [usize; 3] {
        self.fields.shape()
    }

    /// Physical size along x.
    pub fn x(&self) -> f64 {
        self.shape()[0] as f64 * self.grid_spacing
    }

    /// Physical size along y.
    pub fn y(&self) -> f64 {
        self.shape()[1] as f64 * self.grid_spacing
    }

    /// Physical size along z.
    pub fn z(&self) -> f64 {
        self.shape()[2] as f64 * self.grid_spacing
    }

    /// Number of axes with more than one cell.
    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    pub fn grid_spacing(&self) -> f64 {
        self.grid_spacing
    }

    pub fn courant_number(&self) -> f64 {
        self.fields.courant_number()
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn time_steps_passed(&self) -> u64 {
        self.time_steps_passed
    }

    pub fn time_passed(&self) -> f64 {
        self.time_steps_passed as f64 * self.time_step
    }

    pub fn e(&self) -> &Array4<T> {
        &self.fields.e
    }

    pub fn h(&self) -> &Array4<T> {
        &self.fields.h
    }

    /// Mutable access to E, e.g. for seeding an initial condition.
    pub fn e_mut(&mut self) -> &mut Array4<T> {
        &mut self.fields.e
    }

    /// Mutable access to H.
    pub fn h_mut(&mut self) -> &mut Array4<T> {
        &mut self.fields.h
    }

    pub fn fields(&self) -> &FieldStore<T> {
        &self.fields
    }

    pub fn boundaries(&self) -> &[Boundary<T>] {
        &self.boundaries
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn detectors(&self) -> &[LineDetector<T>] {
        &self.detectors
    }

    pub fn objects(&self) -> &[DielectricRegion<T>] {
        &self.objects
    }

    /// Look up a named collaborator.
    pub fn lookup(&self, name: &str) -> Option<CollaboratorId> {
        self.names.get(name).copied()
    }

    pub fn detector_named(&self, name: &str) -> Option<&LineDetector<T>> {
        match self.lookup(name)? {
            CollaboratorId::Detector(i) => self.detectors.get(i),
            _ => None,
        }
    }

    pub fn source_named(&self, name: &str) -> Option<&Source> {
        match self.lookup(name)? {
            CollaboratorId::Source(i) => self.sources.get(i),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    fn ensure_name_free(&self, name: &Option<String>) -> Result<(), ConfigError> {
        if let Some(n) = name {
            if self.names.contains_key(n) {
                return Err(ConfigError::DuplicateName(n.clone()));
            }
        }
        Ok(())
    }

    fn record_name(&mut self, name: Option<String>, id: CollaboratorId) {
        if let Some(n) = name {
            self.names.insert(n, id);
        }
    }

    /// Register a periodic boundary; the axis is resolved from a single
    /// index at 0 or the last index. The boundary claims both faces of
    /// its axis.
    pub fn add_periodic_boundary(
        &mut self,
        spec: PeriodicBoundary,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        self.ensure_name_free(&spec.name)?;
        let axis = resolve_periodic_axis(&placement, self.shape(), self.grid_spacing)?;

        let low = Face {
            axis,
            side: Side::Low,
        };
        let high = Face {
            axis,
            side: Side::High,
        };
        for face in [low, high] {
            if self.face_owners[face.slot()].is_some() {
                return Err(ConfigError::FaceOccupied(face));
            }
        }

        let index = self.boundaries.len();
        self.face_owners[low.slot()] = Some(index);
        self.face_owners[high.slot()] = Some(index);
        let name = spec.name.clone();
        self.boundaries
            .push(Boundary::Periodic(Periodic::new(spec, axis)));
        self.record_name(name, CollaboratorId::Boundary(index));
        Ok(())
    }

    /// Register an absorbing boundary over an edge-adjacent index range;
    /// the range's length becomes the layer thickness.
    pub fn add_pml(
        &mut self,
        spec: PmlBoundary,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        self.ensure_name_free(&spec.name)?;
        let (face, thickness) =
            resolve_absorbing_face(&placement, self.shape(), self.grid_spacing)?;
        if self.face_owners[face.slot()].is_some() {
            return Err(ConfigError::FaceOccupied(face));
        }

        let index = self.boundaries.len();
        self.face_owners[face.slot()] = Some(index);
        let name = spec.name.clone();
        let pml = Pml::new(
            spec,
            face,
            thickness,
            self.shape(),
            self.fields.courant_number(),
        );
        self.boundaries.push(Boundary::Pml(pml));
        self.record_name(name, CollaboratorId::Boundary(index));
        Ok(())
    }

    /// Register a point source on a single cell.
    pub fn add_point_source(
        &mut self,
        spec: PointSource,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        self.ensure_name_free(&spec.name)?;
        let cell = resolve_cell(&placement, self.shape(), self.grid_spacing)?;
        let source = Source::point(spec, cell, self.time_step)?;

        let index = self.sources.len();
        let name = source.name().map(str::to_string);
        self.sources.push(source);
        self.record_name(name, CollaboratorId::Source(index));
        Ok(())
    }

    /// Register a line source along a sampled cell path.
    pub fn add_line_source(
        &mut self,
        spec: LineSource,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        self.ensure_name_free(&spec.name)?;
        let cells = resolve_path(&placement, self.shape(), self.grid_spacing)?;
        let source = Source::line(spec, cells, self.time_step)?;

        let index = self.sources.len();
        let name = source.name().map(str::to_string);
        self.sources.push(source);
        self.record_name(name, CollaboratorId::Source(index));
        Ok(())
    }

    /// Register a plane source over a window with one pinned axis.
    pub fn add_plane_source(
        &mut self,
        spec: PlaneSource,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        self.ensure_name_free(&spec.name)?;
        let (window, _axis) = resolve_plane(&placement, self.shape(), self.grid_spacing)?;
        let source = Source::plane(spec, window, self.time_step)?;

        let index = self.sources.len();
        let name = source.name().map(str::to_string);
        self.sources.push(source);
        self.record_name(name, CollaboratorId::Source(index));
        Ok(())
    }

    /// Register a line detector along a sampled cell path or an explicit
    /// equal-length index list.
    pub fn add_line_detector(
        &mut self,
        name: Option<&str>,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        let owned = name.map(str::to_string);
        self.ensure_name_free(&owned)?;
        let cells = resolve_path(&placement, self.shape(), self.grid_spacing)?;

        let index = self.detectors.len();
        self.detectors
            .push(LineDetector::new(owned.clone(), cells));
        self.record_name(owned, CollaboratorId::Detector(index));
        Ok(())
    }

    /// Register an object over a half-open, unit-stride index box. The
    /// grid's inverse permittivity inside the box transfers to the object.
    pub fn add_object(
        &mut self,
        spec: DielectricObject<T>,
        at: impl Into<Placement>,
    ) -> Result<(), ConfigError> {
        let placement = at.into();
        self.ensure_name_free(&spec.name)?;
        let bounds = resolve_box(&placement, self.shape(), self.grid_spacing)?;
        let region = DielectricRegion::register(spec, bounds, &mut self.fields)?;

        let index = self.objects.len();
        let name = region.name().map(str::to_string);
        self.objects.push(region);
        self.record_name(name, CollaboratorId::Object(index));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Time stepping
    // ------------------------------------------------------------------

    /// The E phase of one step.
    pub fn update_e(&mut self) {
        for boundary in &mut self.boundaries {
            boundary.update_phi_e(&self.fields);
        }

        let curl = curl_h(&self.fields.h);
        self.fields.step_e(&curl);

        for object in &self.objects {
            object.update_e(&mut self.fields, &curl);
        }
        for boundary in &mut self.boundaries {
            boundary.update_e(&mut self.fields);
        }
        for source in &self.sources {
            source.inject_e(&mut self.fields, self.time_steps_passed);
        }
        for detector in &mut self.detectors {
            detector.sample_e(&self.fields);
        }
    }

    /// The H phase of one step.
    pub fn update_h(&mut self) {
        for boundary in &mut self.boundaries {
            boundary.update_phi_h(&self.fields);
        }

        let curl = curl_e(&self.fields.e);
        self.fields.step_h(&curl);

        for object in &self.objects {
            object.update_h(&mut self.fields, &curl);
        }
        for boundary in &mut self.boundaries {
            boundary.update_h(&mut self.fields);
        }
        for source in &self.sources {
            source.inject_h(&mut self.fields, self.time_steps_passed);
        }
        for detector in &mut self.detectors {
            detector.sample_h(&self.fields);
        }
    }

    /// Advance one full time step: E phase, H phase, step counter.
    pub fn step(&mut self) {
        self.update_e();
        self.update_h();
        self.time_steps_passed += 1;
    }

    /// Advance by a step count or a physical duration.
    pub fn run(&mut self, duration: impl Into<TimeSpec>) {
        let steps = duration.into().to_steps(self.time_step);
        for _ in 0..steps {
            self.step();
        }
    }

    /// Zero E, H and the step counter in place. Registered collaborators
    /// stay attached; detector histories are kept.
    pub fn reset(&mut self) {
        self.fields.zero_fields();
        self.time_steps_passed = 0;
    }
}

impl Promote for Grid<f64> {
    type Promoted = Grid<Complex64>;

    fn promote(self) -> Grid<Complex64> {
        Grid {
            grid_spacing: self.grid_spacing,
            time_step: self.time_step,
            dimensionality: self.dimensionality,
            time_steps_passed: self.time_steps_passed,
            fields: self.fields.promote(),
            boundaries: self
                .boundaries
                .into_iter()
                .map(Promote::promote)
                .collect(),
            sources: self.sources,
            detectors: self.detectors.into_iter().map(Promote::promote).collect(),
            objects: self.objects.into_iter().map(Promote::promote).collect(),
            face_owners: self.face_owners,
            names: self.names,
        }
    }
}

impl<T: FieldScalar> fmt::Display for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [nx, ny, nz] = self.shape();
        writeln!(
            f,
            "Grid(shape=({nx},{ny},{nz}), grid_spacing={:.2e}, courant_number={:.2})",
            self.grid_spacing,
            self.courant_number()
        )?;
        if !self.sources.is_empty() {
            writeln!(f, "sources:")?;
            for source in &self.sources {
                writeln!(f, "    {source}")?;
            }
        }
        if !self.detectors.is_empty() {
            writeln!(f, "detectors:")?;
            for detector in &self.detectors {
                writeln!(f, "    {detector}")?;
            }
        }
        if !self.boundaries.is_empty() {
            writeln!(f, "boundaries:")?;
            for boundary in &self.boundaries {
                writeln!(f, "    {boundary}")?;
            }
        }
        if !self.objects.is_empty() {
            writeln!(f, "objects:")?;
            for object in &self.objects {
                writeln!(f, "    {object}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacuum(shape: (usize, usize, usize)) -> Grid<f64> {
        Grid::new(shape, 1.0).unwrap()
    }

    #[test]
    fn shape_resolves_from_physical_distances() {
        let grid = Grid::new((20e-6, 16e-6, 1), 155e-9).unwrap();
        assert_eq!(grid.shape(), [129, 103, 1]);
        assert_eq!(grid.dimensionality(), 2);
    }

    #[test]
    fn default_courant_number_respects_the_bound() {
        let grid = vacuum((16, 16, 1));
        let bound = (2.0f64).powf(-0.5);
        assert!((grid.courant_number() - 0.99 * bound).abs() < 1e-12);
    }

    #[test]
    fn excessive_courant_number_is_rejected() {
        let result = Grid::with_options(
            (16, 16, 1),
            1.0,
            GridOptions {
                courant_number: Some(0.9),
                ..GridOptions::default()
            },
        );
        assert!(matches!(result, Err(ConfigError::CourantTooHigh { .. })));
    }

    #[test]
    fn single_cell_grid_is_rejected() {
        assert!(matches!(
            Grid::new((1, 1, 1), 1.0),
            Err(ConfigError::ZeroDimensionalGrid)
        ));
    }

    #[test]
    fn duplicate_names_fail_without_mutating_the_grid() {
        let mut grid = vacuum((32, 1, 1));
        grid.add_point_source(
            PointSource {
                name: Some("src".into()),
                ..PointSource::default()
            },
            (16, 0, 0),
        )
        .unwrap();

        let err = grid.add_point_source(
            PointSource {
                name: Some("src".into()),
                ..PointSource::default()
            },
            (8, 0, 0),
        );
        assert!(matches!(err, Err(ConfigError::DuplicateName(_))));
        assert_eq!(grid.sources().len(), 1);
    }

    #[test]
    fn two_boundaries_on_one_face_are_rejected() {
        let mut grid = vacuum((32, 1, 1));
        grid.add_periodic_boundary(PeriodicBoundary::new(), (0, .., ..))
            .unwrap();
        let err = grid.add_periodic_boundary(PeriodicBoundary::new(), (-1, .., ..));
        assert!(matches!(err, Err(ConfigError::FaceOccupied(_))));
        assert_eq!(grid.boundaries().len(), 1);
    }

    #[test]
    fn pml_and_periodic_conflict_on_a_shared_face() {
        let mut grid = vacuum((32, 1, 1));
        grid.add_pml(PmlBoundary::new(), (0..8, .., ..)).unwrap();
        let err = grid.add_periodic_boundary(PeriodicBoundary::new(), (0, .., ..));
        assert!(matches!(err, Err(ConfigError::FaceOccupied(_))));
    }

    #[test]
    fn reset_zeroes_fields_but_keeps_collaborators() {
        let mut grid = vacuum((32, 1, 1));
        grid.add_point_source(PointSource::default(), (16, 0, 0))
            .unwrap();
        grid.add_line_detector(Some("det"), (0..32, 0, 0)).unwrap();
        grid.run(5u64);
        assert_eq!(grid.time_steps_passed(), 5);

        grid.reset();
        assert_eq!(grid.time_steps_passed(), 0);
        assert!(grid.e().iter().all(|&v| v == 0.0));
        assert!(grid.h().iter().all(|&v| v == 0.0));
        assert_eq!(grid.sources().len(), 1);
        assert!(grid.detector_named("det").is_some());
    }

    #[test]
    fn run_accepts_a_physical_duration() {
        let mut grid = vacuum((32, 1, 1));
        let duration = 10.4 * grid.time_step();
        grid.run(duration);
        assert_eq!(grid.time_steps_passed(), 10);
    }

    #[test]
    fn named_lookup_distinguishes_collaborator_kinds() {
        let mut grid = vacuum((32, 1, 1));
        grid.add_line_detector(Some("probe"), (0..32, 0, 0))
            .unwrap();
        assert_eq!(grid.lookup("probe"), Some(CollaboratorId::Detector(0)));
        assert!(grid.detector_named("probe").is_some());
        assert!(grid.source_named("probe").is_none());
    }
}
