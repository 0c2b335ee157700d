use serde::Serialize;
use serde_json;
use std::fs::File;
use std::path::Path;

use crate::grid::Grid;
use crate::scalar::FieldScalar;

#[derive(Serialize)]
pub struct RunConfig {
    pub geometry: GeometryConfig,
    pub numerics: NumericsConfig,
    pub collaborators: CollaboratorConfig,
    pub run: RunInfo,
}

#[derive(Serialize)]
pub struct GeometryConfig {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub grid_spacing: f64,
}

#[derive(Serialize)]
pub struct NumericsConfig {
    pub courant_number: f64,
    /// Timestep (s), derived from the Courant number and grid spacing.
    pub time_step: f64,
    pub time_steps_passed: u64,
}

#[derive(Serialize)]
pub struct CollaboratorConfig {
    pub boundaries: usize,
    pub sources: usize,
    pub detectors: usize,
    pub objects: usize,
}

#[derive(Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,

    // Optional provenance (can be filled later)
    pub git_commit: Option<String>,
    pub timestamp_utc: Option<String>,
}

impl RunConfig {
    pub fn from_grid<T: FieldScalar>(grid: &Grid<T>, binary: &str, run_id: &str) -> Self {
        let [nx, ny, nz] = grid.shape();
        Self {
            geometry: GeometryConfig {
                nx,
                ny,
                nz,
                grid_spacing: grid.grid_spacing(),
            },
            numerics: NumericsConfig {
                courant_number: grid.courant_number(),
                time_step: grid.time_step(),
                time_steps_passed: grid.time_steps_passed(),
            },
            collaborators: CollaboratorConfig {
                boundaries: grid.boundaries().len(),
                sources: grid.sources().len(),
                detectors: grid.detectors().len(),
                objects: grid.objects().len(),
            },
            run: RunInfo {
                binary: binary.to_string(),
                run_id: run_id.to_string(),
                git_commit: None,
                timestamp_utc: None,
            },
        }
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> std::io::Result<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
