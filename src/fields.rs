// src/fields.rs

use ndarray::{Array3, Array4, Zip};
use num_complex::Complex64;

use crate::error::ConfigError;
use crate::scalar::{FieldScalar, Promote};

/// Background or object material: a scalar broadcast over every cell and
/// component, a per-cell tensor broadcast over the component axis, or a
/// full per-component tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSpec<T: FieldScalar> {
    Uniform(T),
    PerCell(Array3<T>),
    PerComponent(Array4<T>),
}

impl From<f64> for MaterialSpec<f64> {
    fn from(v: f64) -> Self {
        MaterialSpec::Uniform(v)
    }
}

impl From<Complex64> for MaterialSpec<Complex64> {
    fn from(v: Complex64) -> Self {
        MaterialSpec::Uniform(v)
    }
}

impl<T: FieldScalar> From<Array3<T>> for MaterialSpec<T> {
    fn from(a: Array3<T>) -> Self {
        MaterialSpec::PerCell(a)
    }
}

impl<T: FieldScalar> From<Array4<T>> for MaterialSpec<T> {
    fn from(a: Array4<T>) -> Self {
        MaterialSpec::PerComponent(a)
    }
}

impl<T: FieldScalar> MaterialSpec<T> {
    /// Build the elementwise inverse of the material over the given shape.
    pub(crate) fn inverse(
        &self,
        shape: [usize; 3],
    ) -> Result<Array4<T>, ConfigError> {
        let dim = (shape[0], shape[1], shape[2], 3);
        match self {
            MaterialSpec::Uniform(v) => {
                Ok(Array4::from_elem(dim, T::one() / *v))
            }
            MaterialSpec::PerCell(a) => {
                if a.dim() != (shape[0], shape[1], shape[2]) {
                    return Err(ConfigError::MaterialShape {
                        expected: shape.to_vec(),
                        got: a.shape().to_vec(),
                    });
                }
                Ok(Array4::from_shape_fn(dim, |(i, j, k, _)| {
                    T::one() / a[[i, j, k]]
                }))
            }
            MaterialSpec::PerComponent(a) => {
                if a.dim() != dim {
                    return Err(ConfigError::MaterialShape {
                        expected: vec![shape[0], shape[1], shape[2], 3],
                        got: a.shape().to_vec(),
                    });
                }
                Ok(a.mapv(|v| T::one() / v))
            }
        }
    }
}

/// Owns the E and H tensors (shape Nx×Ny×Nz×3), the per-cell inverse
/// material tensors and the Courant number, and applies the bulk leapfrog
/// update. All collaborators mutate fields through this store.
#[derive(Debug, Clone)]
pub struct FieldStore<T: FieldScalar> {
    pub e: Array4<T>,
    pub h: Array4<T>,
    pub inverse_permittivity: Array4<T>,
    pub inverse_permeability: Array4<T>,
    courant_number: f64,
}

impl FieldStore<f64> {
    pub(crate) fn new(
        shape: [usize; 3],
        permittivity: &MaterialSpec<f64>,
        permeability: &MaterialSpec<f64>,
        courant_number: f64,
    ) -> Result<Self, ConfigError> {
        let dim = (shape[0], shape[1], shape[2], 3);
        Ok(Self {
            e: Array4::zeros(dim),
            h: Array4::zeros(dim),
            inverse_permittivity: permittivity.inverse(shape)?,
            inverse_permeability: permeability.inverse(shape)?,
            courant_number,
        })
    }
}

impl<T: FieldScalar> FieldStore<T> {
    pub fn shape(&self) -> [usize; 3] {
        let (nx, ny, nz, _) = self.e.dim();
        [nx, ny, nz]
    }

    pub fn courant_number(&self) -> f64 {
        self.courant_number
    }

    /// Bulk E update: `E += sc * inverse_permittivity * curl_H`.
    pub(crate) fn step_e(&mut self, curl_h: &Array4<T>) {
        let sc = T::from_re(self.courant_number);
        Zip::from(&mut self.e)
            .and(&self.inverse_permittivity)
            .and(curl_h)
            .par_for_each(|e, &ip, &c| *e += sc * ip * c);
    }

    /// Bulk H update: `H -= sc * inverse_permeability * curl_E`.
    pub(crate) fn step_h(&mut self, curl_e: &Array4<T>) {
        let sc = T::from_re(self.courant_number);
        Zip::from(&mut self.h)
            .and(&self.inverse_permeability)
            .and(curl_e)
            .par_for_each(|h, &im, &c| *h -= sc * im * c);
    }

    /// Zero E and H in place, keeping the material tensors.
    pub(crate) fn zero_fields(&mut self) {
        self.e.fill(T::zero());
        self.h.fill(T::zero());
    }
}

impl Promote for FieldStore<f64> {
    type Promoted = FieldStore<Complex64>;

    fn promote(self) -> FieldStore<Complex64> {
        FieldStore {
            e: self.e.mapv(FieldScalar::to_complex),
            h: self.h.mapv(FieldScalar::to_complex),
            inverse_permittivity: self.inverse_permittivity.mapv(FieldScalar::to_complex),
            inverse_permeability: self.inverse_permeability.mapv(FieldScalar::to_complex),
            courant_number: self.courant_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacuum_store(shape: [usize; 3]) -> FieldStore<f64> {
        FieldStore::new(
            shape,
            &MaterialSpec::Uniform(1.0),
            &MaterialSpec::Uniform(1.0),
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn uniform_material_inverts_elementwise() {
        let inv = MaterialSpec::Uniform(4.0).inverse([2, 2, 1]).unwrap();
        assert_eq!(inv[[0, 0, 0, 0]], 0.25);
        assert_eq!(inv.dim(), (2, 2, 1, 3));
    }

    #[test]
    fn per_cell_material_broadcasts_over_components() {
        let eps = Array3::from_elem((2, 1, 1), 2.0);
        let inv = MaterialSpec::PerCell(eps).inverse([2, 1, 1]).unwrap();
        for c in 0..3 {
            assert_eq!(inv[[1, 0, 0, c]], 0.5);
        }
    }

    #[test]
    fn wrong_material_shape_is_rejected() {
        let eps = Array3::from_elem((3, 1, 1), 2.0);
        assert!(matches!(
            MaterialSpec::PerCell(eps).inverse([2, 1, 1]),
            Err(ConfigError::MaterialShape { .. })
        ));
    }

    #[test]
    fn step_e_scales_by_courant_and_material() {
        let mut f = vacuum_store([2, 1, 1]);
        let mut curl = Array4::zeros((2, 1, 1, 3));
        curl[[1, 0, 0, 2]] = 2.0;
        f.step_e(&curl);
        assert_eq!(f.e[[1, 0, 0, 2]], 1.0); // 0.5 * 1.0 * 2.0
        assert_eq!(f.e[[0, 0, 0, 2]], 0.0);
    }

    #[test]
    fn promotion_preserves_values() {
        let mut f = vacuum_store([2, 1, 1]);
        f.e[[0, 0, 0, 1]] = 3.0;
        let c = f.promote();
        assert_eq!(c.e[[0, 0, 0, 1]].re, 3.0);
        assert_eq!(c.e[[0, 0, 0, 1]].im, 0.0);
        assert_eq!(c.courant_number(), 0.5);
    }
}
