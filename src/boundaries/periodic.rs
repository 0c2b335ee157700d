// src/boundaries/periodic.rs

use ndarray::Axis;

use crate::fields::FieldStore;
use crate::scalar::FieldScalar;

/// Periodic boundary spec: placed at index 0 or the last index of one
/// axis; the axis is resolved at registration time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodicBoundary {
    pub name: Option<String>,
}

impl PeriodicBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }
}

/// A periodic boundary registered along one axis. The first and last
/// slabs of the axis are identified with each other: after the E update
/// the low slab is overwritten from the high slab, after the H update the
/// high slab from the low one, matching the staggered update directions.
#[derive(Debug, Clone)]
pub struct Periodic {
    name: Option<String>,
    axis: usize,
}

impl Periodic {
    pub(crate) fn new(spec: PeriodicBoundary, axis: usize) -> Self {
        Self {
            name: spec.name,
            axis,
        }
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn update_e<T: FieldScalar>(&self, fields: &mut FieldStore<T>) {
        let n = fields.shape()[self.axis];
        let high = fields.e.index_axis(Axis(self.axis), n - 1).to_owned();
        fields.e.index_axis_mut(Axis(self.axis), 0).assign(&high);
    }

    pub(crate) fn update_h<T: FieldScalar>(&self, fields: &mut FieldStore<T>) {
        let n = fields.shape()[self.axis];
        let low = fields.h.index_axis(Axis(self.axis), 0).to_owned();
        fields.h.index_axis_mut(Axis(self.axis), n - 1).assign(&low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MaterialSpec;

    fn store() -> FieldStore<f64> {
        FieldStore::new(
            [4, 2, 1],
            &MaterialSpec::Uniform(1.0),
            &MaterialSpec::Uniform(1.0),
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn e_wraps_low_from_high_and_h_high_from_low() {
        let mut fields = store();
        fields.e[[3, 1, 0, 2]] = 2.0;
        fields.h[[0, 1, 0, 1]] = -1.5;

        let boundary = Periodic::new(PeriodicBoundary::new(), 0);
        boundary.update_e(&mut fields);
        boundary.update_h(&mut fields);

        assert_eq!(fields.e[[0, 1, 0, 2]], 2.0);
        assert_eq!(fields.h[[3, 1, 0, 1]], -1.5);
    }

    #[test]
    fn only_the_registered_axis_is_wrapped() {
        let mut fields = store();
        fields.e[[2, 1, 0, 0]] = 1.0;

        let boundary = Periodic::new(PeriodicBoundary::new(), 0);
        boundary.update_e(&mut fields);

        assert_eq!(fields.e[[2, 0, 0, 0]], 0.0);
        assert_eq!(fields.e[[2, 1, 0, 0]], 1.0);
    }
}
