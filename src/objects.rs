// src/objects.rs
//
// Embedded material objects. Registering an object transfers ownership of
// the material response inside its box from the grid to the object: the
// grid's inverse permittivity there is zeroed, so the bulk update leaves
// the region untouched and the object re-applies the E update with its own
// material, reusing the bulk curl. Far-face components keep the grid's
// boundary-adjacent values so the interface stays continuous with the
// surrounding cells.

use std::fmt;
use std::ops::Range;

use ndarray::{s, Array4, Zip};
use num_complex::Complex64;

use crate::error::ConfigError;
use crate::fields::{FieldStore, MaterialSpec};
use crate::scalar::{FieldScalar, Promote};

/// Object spec: a permittivity distribution to embed in a sub-box.
#[derive(Debug, Clone)]
pub struct DielectricObject<T: FieldScalar> {
    pub permittivity: MaterialSpec<T>,
    pub name: Option<String>,
}

impl<T: FieldScalar> DielectricObject<T> {
    pub fn new(permittivity: impl Into<MaterialSpec<T>>) -> Self {
        Self {
            permittivity: permittivity.into(),
            name: None,
        }
    }

    pub fn named(permittivity: impl Into<MaterialSpec<T>>, name: &str) -> Self {
        Self {
            permittivity: permittivity.into(),
            name: Some(name.to_string()),
        }
    }
}

/// An object registered on a grid. Its material tensor is immutable after
/// registration; only the field values inside the box change per step.
#[derive(Debug, Clone)]
pub struct DielectricRegion<T: FieldScalar> {
    name: Option<String>,
    bounds: [Range<usize>; 3],
    inverse_permittivity: Array4<T>,
}

impl<T: FieldScalar> DielectricRegion<T> {
    /// Build the region and take over its cells' material response.
    pub(crate) fn register(
        spec: DielectricObject<T>,
        bounds: [Range<usize>; 3],
        fields: &mut FieldStore<T>,
    ) -> Result<Self, ConfigError> {
        let shape = [
            bounds[0].len(),
            bounds[1].len(),
            bounds[2].len(),
        ];
        let mut inverse = spec.permittivity.inverse(shape)?;

        // Seed far-face components from the grid's boundary-adjacent
        // values along each extended axis, then zero the grid's material
        // over the whole box.
        let [bx, by, bz] = bounds.clone();
        let [nx, ny, nz] = fields.shape();
        if shape[0] > 1 {
            let seed = fields
                .inverse_permittivity
                .slice(s![nx - 1, by.clone(), bz.clone(), 0])
                .to_owned();
            inverse.slice_mut(s![-1, .., .., 0]).assign(&seed);
        }
        if shape[1] > 1 {
            let seed = fields
                .inverse_permittivity
                .slice(s![bx.clone(), ny - 1, bz.clone(), 1])
                .to_owned();
            inverse.slice_mut(s![.., -1, .., 1]).assign(&seed);
        }
        if shape[2] > 1 {
            let seed = fields
                .inverse_permittivity
                .slice(s![bx.clone(), by.clone(), nz - 1, 2])
                .to_owned();
            inverse.slice_mut(s![.., .., -1, 2]).assign(&seed);
        }

        fields
            .inverse_permittivity
            .slice_mut(s![bx, by, bz, ..])
            .fill(T::zero());

        Ok(Self {
            name: spec.name,
            bounds,
            inverse_permittivity: inverse,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bounds(&self) -> &[Range<usize>; 3] {
        &self.bounds
    }

    pub fn inverse_permittivity(&self) -> &Array4<T> {
        &self.inverse_permittivity
    }

    /// Re-apply the E update inside the box with the object's material,
    /// reusing the bulk curl computed by the grid engine this step.
    pub(crate) fn update_e(&self, fields: &mut FieldStore<T>, curl_h: &Array4<T>) {
        let sc = T::from_re(fields.courant_number());
        let [bx, by, bz] = self.bounds.clone();
        let e_box = fields
            .e
            .slice_mut(s![bx.clone(), by.clone(), bz.clone(), ..]);
        let curl_box = curl_h.slice(s![bx, by, bz, ..]);
        Zip::from(e_box)
            .and(&self.inverse_permittivity)
            .and(curl_box)
            .for_each(|e, &ip, &c| *e += sc * ip * c);
    }

    /// Objects do not override the H update.
    pub(crate) fn update_h(&self, _fields: &mut FieldStore<T>, _curl_e: &Array4<T>) {}
}

impl Promote for DielectricRegion<f64> {
    type Promoted = DielectricRegion<Complex64>;

    fn promote(self) -> DielectricRegion<Complex64> {
        DielectricRegion {
            name: self.name,
            bounds: self.bounds,
            inverse_permittivity: self.inverse_permittivity.mapv(FieldScalar::to_complex),
        }
    }
}

impl<T: FieldScalar> fmt::Display for DielectricRegion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object(name={:?}) @ x={:?}, y={:?}, z={:?}",
            self.name, self.bounds[0], self.bounds[1], self.bounds[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(shape: [usize; 3]) -> FieldStore<f64> {
        FieldStore::new(
            shape,
            &MaterialSpec::Uniform(1.0),
            &MaterialSpec::Uniform(1.0),
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn registration_zeroes_the_grid_material_inside_the_box() {
        let mut fields = store([8, 8, 1]);
        let region = DielectricRegion::register(
            DielectricObject::new(2.25),
            [2..6, 2..6, 0..1],
            &mut fields,
        )
        .unwrap();

        assert_eq!(fields.inverse_permittivity[[3, 3, 0, 0]], 0.0);
        assert_eq!(fields.inverse_permittivity[[1, 3, 0, 0]], 1.0);
        assert_eq!(fields.inverse_permittivity[[6, 3, 0, 0]], 1.0);
        // Interior of the object's own tensor holds 1/2.25.
        assert!((region.inverse_permittivity()[[1, 1, 0, 1]] - 1.0 / 2.25).abs() < 1e-15);
    }

    #[test]
    fn far_faces_keep_the_grid_values_for_continuity() {
        let mut fields = store([8, 8, 1]);
        let region = DielectricRegion::register(
            DielectricObject::new(4.0),
            [2..6, 2..6, 0..1],
            &mut fields,
        )
        .unwrap();
        // x-high face of the box, x component: grid value (vacuum, 1.0).
        assert_eq!(region.inverse_permittivity()[[3, 1, 0, 0]], 1.0);
        // y-high face, y component.
        assert_eq!(region.inverse_permittivity()[[1, 3, 0, 1]], 1.0);
        // Flat z axis keeps the object's own value.
        assert_eq!(region.inverse_permittivity()[[1, 1, 0, 2]], 0.25);
    }

    #[test]
    fn update_applies_the_object_material_to_the_bulk_curl() {
        let mut fields = store([4, 1, 1]);
        let region = DielectricRegion::register(
            DielectricObject::new(2.0),
            [1..2, 0..1, 0..1],
            &mut fields,
        )
        .unwrap();

        let mut curl = Array4::zeros((4, 1, 1, 3));
        curl[[1, 0, 0, 2]] = 1.0;
        curl[[2, 0, 0, 2]] = 1.0;
        fields.step_e(&curl);
        region.update_e(&mut fields, &curl);

        // Inside the box: 0.5 * (1/2) * 1; outside: 0.5 * 1 * 1.
        assert_eq!(fields.e[[1, 0, 0, 2]], 0.25);
        assert_eq!(fields.e[[2, 0, 0, 2]], 0.5);
    }
}
