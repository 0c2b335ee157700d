// src/constants.rs

use std::f64::consts::PI;

/// Speed of light in vacuum (m/s).
pub const C: f64 = 299_792_458.0;

/// Vacuum permeability (H/m).
pub const MU0: f64 = 4e-7 * PI;

/// Vacuum permittivity (F/m).
pub const EPS0: f64 = 1.0 / (MU0 * C * C);

/// Free-space impedance (Ohm).
pub const ETA0: f64 = MU0 * C;

/// Component indices into the last axis of a field tensor.
pub const X: usize = 0;
pub const Y: usize = 1;
pub const Z: usize = 2;
