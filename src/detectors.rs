// src/detectors.rs

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;

use crate::fields::FieldStore;
use crate::scalar::{FieldScalar, Promote};

/// Records the field vectors along a cell path, one snapshot per step.
///
/// Histories grow for the run's duration and are never pruned; each entry
/// is an (n_cells × 3) tensor of the sampled vectors for one step.
#[derive(Debug, Clone)]
pub struct LineDetector<T: FieldScalar> {
    name: Option<String>,
    cells: Vec<[usize; 3]>,
    e_history: Vec<Array2<T>>,
    h_history: Vec<Array2<T>>,
}

impl<T: FieldScalar> LineDetector<T> {
    pub(crate) fn new(name: Option<String>, cells: Vec<[usize; 3]>) -> Self {
        Self {
            name,
            cells,
            e_history: Vec::new(),
            h_history: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn cells(&self) -> &[[usize; 3]] {
        &self.cells
    }

    /// Recorded E snapshots, one per sampled step.
    pub fn e_history(&self) -> &[Array2<T>] {
        &self.e_history
    }

    /// Recorded H snapshots, one per sampled step.
    pub fn h_history(&self) -> &[Array2<T>] {
        &self.h_history
    }

    fn snapshot(cells: &[[usize; 3]], field: &ndarray::Array4<T>) -> Array2<T> {
        let mut snap = Array2::zeros((cells.len(), 3));
        for (row, cell) in cells.iter().enumerate() {
            for comp in 0..3 {
                snap[[row, comp]] = field[[cell[0], cell[1], cell[2], comp]];
            }
        }
        snap
    }

    pub(crate) fn sample_e(&mut self, fields: &FieldStore<T>) {
        self.e_history.push(Self::snapshot(&self.cells, &fields.e));
    }

    pub(crate) fn sample_h(&mut self, fields: &FieldStore<T>) {
        self.h_history.push(Self::snapshot(&self.cells, &fields.h));
    }
}

impl Promote for LineDetector<f64> {
    type Promoted = LineDetector<Complex64>;

    fn promote(self) -> LineDetector<Complex64> {
        LineDetector {
            name: self.name,
            cells: self.cells,
            e_history: self
                .e_history
                .into_iter()
                .map(|a| a.mapv(FieldScalar::to_complex))
                .collect(),
            h_history: self
                .h_history
                .into_iter()
                .map(|a| a.mapv(FieldScalar::to_complex))
                .collect(),
        }
    }
}

impl<T: FieldScalar> fmt::Display for LineDetector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.cells.first().copied().unwrap_or_default();
        let last = self.cells.last().copied().unwrap_or_default();
        write!(
            f,
            "LineDetector(name={:?}) @ [{:?}, ... , {:?}]",
            self.name, first, last
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MaterialSpec;

    #[test]
    fn snapshots_follow_registration_order() {
        let mut fields = FieldStore::new(
            [4, 1, 1],
            &MaterialSpec::Uniform(1.0),
            &MaterialSpec::Uniform(1.0),
            0.5,
        )
        .unwrap();
        fields.e[[2, 0, 0, 2]] = 7.0;

        let mut det = LineDetector::new(None, vec![[0, 0, 0], [2, 0, 0]]);
        det.sample_e(&fields);
        det.sample_h(&fields);

        assert_eq!(det.e_history().len(), 1);
        assert_eq!(det.h_history().len(), 1);
        let snap = &det.e_history()[0];
        assert_eq!(snap.dim(), (2, 3));
        assert_eq!(snap[[0, 2]], 0.0);
        assert_eq!(snap[[1, 2]], 7.0);
    }
}
