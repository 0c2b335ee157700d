// src/boundaries/pml.rs
//
// Complex-frequency-shifted convolutional PML (recursive-convolution
// form). The layer keeps per-cell phi/psi accumulator tensors over its
// window; each step the psi accumulators are decayed and fed the
// stretched-axis field differences, the phi tensors collect them with the
// curl's sign structure, and the field update adds the phi contribution
// on top of the bulk update, damping outgoing waves.
//
// Coefficients: cubic conductivity grading sigma(x) = 40 x^3 / (N+1)^4
// over the layer depth x (staggered half a cell between E and H), kappa
// fixed at 1, and a small alpha for the shifted pole, giving
//   b = exp(-(sigma + alpha) * sc)
//   c = sigma * (b - 1) / (sigma + alpha)
// per layer cell, with sc the Courant number of the grid.

use std::ops::Range;

use ndarray::Array4;
use num_complex::Complex64;

use crate::boundaries::{Face, Side};
use crate::fields::FieldStore;
use crate::scalar::{FieldScalar, Promote};

/// Absorbing boundary spec: placed over an edge-adjacent index range on
/// one axis; the range's length becomes the layer thickness.
#[derive(Debug, Clone, PartialEq)]
pub struct PmlBoundary {
    pub name: Option<String>,
    /// Shift of the CFS pole away from zero frequency. Keeps the
    /// recursive-convolution coefficients finite where sigma vanishes.
    pub stability_alpha: f64,
}

impl Default for PmlBoundary {
    fn default() -> Self {
        Self {
            name: None,
            stability_alpha: 1e-8,
        }
    }
}

impl PmlBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

/// An absorbing layer registered on one domain face.
#[derive(Debug, Clone)]
pub struct Pml<T: FieldScalar> {
    name: Option<String>,
    face: Face,
    thickness: usize,
    window: [Range<usize>; 3],
    // Recursive-convolution coefficients per layer cell, graded along the
    // face axis. E and H sit half a cell apart in the grading.
    be: Vec<f64>,
    ce: Vec<f64>,
    bh: Vec<f64>,
    ch: Vec<f64>,
    // Auxiliary convolution state over the layer window.
    phi_e: Array4<T>,
    phi_h: Array4<T>,
    psi_e: Array4<T>,
    psi_h: Array4<T>,
}

fn sigma(x: f64, thickness: usize) -> f64 {
    let x = x.max(0.0);
    40.0 * x.powi(3) / (thickness as f64 + 1.0).powi(4)
}

impl<T: FieldScalar> Pml<T> {
    pub(crate) fn new(
        spec: PmlBoundary,
        face: Face,
        thickness: usize,
        shape: [usize; 3],
        courant_number: f64,
    ) -> Self {
        let mut window = [0..shape[0], 0..shape[1], 0..shape[2]];
        window[face.axis] = match face.side {
            Side::Low => 0..thickness,
            Side::High => shape[face.axis] - thickness..shape[face.axis],
        };

        let alpha = spec.stability_alpha;
        let mut be = Vec::with_capacity(thickness);
        let mut ce = Vec::with_capacity(thickness);
        let mut bh = Vec::with_capacity(thickness);
        let mut ch = Vec::with_capacity(thickness);
        for l in 0..thickness {
            // Depth into the layer, measured from the inner interface
            // toward the domain edge, at the staggered E and H positions.
            let (xe, xh) = match face.side {
                Side::Low => (thickness as f64 - l as f64 - 0.5, thickness as f64 - l as f64 - 1.0),
                Side::High => (l as f64 + 0.5, l as f64 + 1.0),
            };
            let se = sigma(xe, thickness);
            let sh = sigma(xh, thickness);
            let b_e = (-(se + alpha) * courant_number).exp();
            let b_h = (-(sh + alpha) * courant_number).exp();
            be.push(b_e);
            ce.push(se * (b_e - 1.0) / (se + alpha));
            bh.push(b_h);
            ch.push(sh * (b_h - 1.0) / (sh + alpha));
        }

        let dim = (
            window[0].len(),
            window[1].len(),
            window[2].len(),
            3,
        );
        Self {
            name: spec.name,
            face,
            thickness,
            window,
            be,
            ce,
            bh,
            ch,
            phi_e: Array4::zeros(dim),
            phi_h: Array4::zeros(dim),
            psi_e: Array4::zeros(dim),
            psi_h: Array4::zeros(dim),
        }
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn thickness(&self) -> usize {
        self.thickness
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn starts(&self) -> [usize; 3] {
        [
            self.window[0].start,
            self.window[1].start,
            self.window[2].start,
        ]
    }

    /// Advance the E-side convolution state from the current H field.
    ///
    /// Only differences along the stretched (face) axis accumulate: the
    /// transverse conductivities are zero, so their accumulators vanish
    /// identically. Backward differences match the bulk `curl_h`; the
    /// first window cell along the axis has no in-window neighbour and
    /// only decays.
    pub(crate) fn update_phi_e(&mut self, fields: &FieldStore<T>) {
        let a = self.face.axis;
        let u = (a + 1) % 3;
        let v = (a + 2) % 3;
        let starts = self.starts();
        for i in self.window[0].clone() {
            for j in self.window[1].clone() {
                for k in self.window[2].clone() {
                    let g = [i, j, k];
                    let l = g[a] - starts[a];
                    let (li, lj, lk) = (i - starts[0], j - starts[1], k - starts[2]);
                    let b = T::from_re(self.be[l]);
                    let c = T::from_re(self.ce[l]);
                    let (du, dv) = if l > 0 {
                        let mut p = g;
                        p[a] -= 1;
                        (
                            fields.h[[i, j, k, v]] - fields.h[[p[0], p[1], p[2], v]],
                            fields.h[[i, j, k, u]] - fields.h[[p[0], p[1], p[2], u]],
                        )
                    } else {
                        (T::zero(), T::zero())
                    };
                    let pu = b * self.psi_e[[li, lj, lk, u]] + c * du;
                    let pv = b * self.psi_e[[li, lj, lk, v]] + c * dv;
                    self.psi_e[[li, lj, lk, u]] = pu;
                    self.psi_e[[li, lj, lk, v]] = pv;
                    // Same sign structure as the curl: the u component
                    // carries -dH_v/da, the v component +dH_u/da.
                    self.phi_e[[li, lj, lk, u]] = -pu;
                    self.phi_e[[li, lj, lk, v]] = pv;
                }
            }
        }
    }

    /// Advance the H-side convolution state from the current E field.
    /// Forward differences match the bulk `curl_e`.
    pub(crate) fn update_phi_h(&mut self, fields: &FieldStore<T>) {
        let a = self.face.axis;
        let u = (a + 1) % 3;
        let v = (a + 2) % 3;
        let starts = self.starts();
        for i in self.window[0].clone() {
            for j in self.window[1].clone() {
                for k in self.window[2].clone() {
                    let g = [i, j, k];
                    let l = g[a] - starts[a];
                    let (li, lj, lk) = (i - starts[0], j - starts[1], k - starts[2]);
                    let b = T::from_re(self.bh[l]);
                    let c = T::from_re(self.ch[l]);
                    let (du, dv) = if l + 1 < self.thickness {
                        let mut nb = g;
                        nb[a] += 1;
                        (
                            fields.e[[nb[0], nb[1], nb[2], v]] - fields.e[[i, j, k, v]],
                            fields.e[[nb[0], nb[1], nb[2], u]] - fields.e[[i, j, k, u]],
                        )
                    } else {
                        (T::zero(), T::zero())
                    };
                    let pu = b * self.psi_h[[li, lj, lk, u]] + c * du;
                    let pv = b * self.psi_h[[li, lj, lk, v]] + c * dv;
                    self.psi_h[[li, lj, lk, u]] = pu;
                    self.psi_h[[li, lj, lk, v]] = pv;
                    self.phi_h[[li, lj, lk, u]] = -pu;
                    self.phi_h[[li, lj, lk, v]] = pv;
                }
            }
        }
    }

    /// Add the convolution contribution into E over the layer window.
    pub(crate) fn update_e(&mut self, fields: &mut FieldStore<T>) {
        let a = self.face.axis;
        let u = (a + 1) % 3;
        let v = (a + 2) % 3;
        let sc = T::from_re(fields.courant_number());
        let starts = self.starts();
        for i in self.window[0].clone() {
            for j in self.window[1].clone() {
                for k in self.window[2].clone() {
                    let (li, lj, lk) = (i - starts[0], j - starts[1], k - starts[2]);
                    for comp in [u, v] {
                        let contribution = sc
                            * fields.inverse_permittivity[[i, j, k, comp]]
                            * self.phi_e[[li, lj, lk, comp]];
                        fields.e[[i, j, k, comp]] += contribution;
                    }
                }
            }
        }
    }

    /// Subtract the convolution contribution from H over the layer window.
    pub(crate) fn update_h(&mut self, fields: &mut FieldStore<T>) {
        let a = self.face.axis;
        let u = (a + 1) % 3;
        let v = (a + 2) % 3;
        let sc = T::from_re(fields.courant_number());
        let starts = self.starts();
        for i in self.window[0].clone() {
            for j in self.window[1].clone() {
                for k in self.window[2].clone() {
                    let (li, lj, lk) = (i - starts[0], j - starts[1], k - starts[2]);
                    for comp in [u, v] {
                        let contribution = sc
                            * fields.inverse_permeability[[i, j, k, comp]]
                            * self.phi_h[[li, lj, lk, comp]];
                        fields.h[[i, j, k, comp]] -= contribution;
                    }
                }
            }
        }
    }
}

impl Promote for Pml<f64> {
    type Promoted = Pml<Complex64>;

    fn promote(self) -> Pml<Complex64> {
        Pml {
            name: self.name,
            face: self.face,
            thickness: self.thickness,
            window: self.window,
            be: self.be,
            ce: self.ce,
            bh: self.bh,
            ch: self.ch,
            phi_e: self.phi_e.mapv(FieldScalar::to_complex),
            phi_h: self.phi_h.mapv(FieldScalar::to_complex),
            psi_e: self.psi_e.mapv(FieldScalar::to_complex),
            psi_h: self.psi_h.mapv(FieldScalar::to_complex),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MaterialSpec;

    fn low_face() -> Face {
        Face {
            axis: 0,
            side: Side::Low,
        }
    }

    #[test]
    fn damping_grows_toward_the_domain_edge() {
        let pml: Pml<f64> =
            Pml::new(PmlBoundary::new(), low_face(), 10, [64, 1, 1], 0.5);
        // Cell 0 sits at the edge: strongest conductivity, smallest b.
        assert!(pml.be[0] < pml.be[9]);
        assert!(pml.be[0] > 0.0 && pml.be[9] < 1.0);
        // c is negative wherever sigma is nonzero.
        assert!(pml.ce[0] < 0.0);
    }

    #[test]
    fn high_face_mirrors_the_grading() {
        let low: Pml<f64> =
            Pml::new(PmlBoundary::new(), low_face(), 8, [64, 1, 1], 0.5);
        let high: Pml<f64> = Pml::new(
            PmlBoundary::new(),
            Face {
                axis: 0,
                side: Side::High,
            },
            8,
            [64, 1, 1],
            0.5,
        );
        for l in 0..8 {
            assert!((low.be[l] - high.be[7 - l]).abs() < 1e-15);
        }
        assert_eq!(high.window[0], 56..64);
    }

    #[test]
    fn accumulators_stay_zero_without_field_differences() {
        let mut pml: Pml<f64> =
            Pml::new(PmlBoundary::new(), low_face(), 4, [16, 1, 1], 0.5);
        let fields = FieldStore::new(
            [16, 1, 1],
            &MaterialSpec::Uniform(1.0),
            &MaterialSpec::Uniform(1.0),
            0.5,
        )
        .unwrap();
        pml.update_phi_e(&fields);
        pml.update_phi_h(&fields);
        assert!(pml.psi_e.iter().all(|&p| p == 0.0));
        assert!(pml.psi_h.iter().all(|&p| p == 0.0));
    }
}
