// src/scalar.rs
//
// Element-type policy for the field tensors. A grid starts out with `f64`
// elements and can be promoted, once and irreversibly, to `Complex64`.
// The policy is carried in the type system instead of a process-wide
// backend object: `FieldScalar` is implemented for exactly these two
// types, and `Promote` is the one-way transition every field-carrying
// collaborator implements.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex64;
use num_traits::{One, Zero};

/// Element type of the E/H field tensors and all auxiliary state.
pub trait FieldScalar:
    Copy
    + Debug
    + PartialEq
    + Zero
    + One
    + Neg<Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + Send
    + Sync
    + 'static
{
    /// Lift a real coefficient into the element type.
    fn from_re(re: f64) -> Self;

    /// Squared magnitude |x|², as a real number.
    fn abs_sq(self) -> f64;

    /// The value as a complex number.
    fn to_complex(self) -> Complex64;
}

impl FieldScalar for f64 {
    #[inline]
    fn from_re(re: f64) -> Self {
        re
    }

    #[inline]
    fn abs_sq(self) -> f64 {
        self * self
    }

    #[inline]
    fn to_complex(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }
}

impl FieldScalar for Complex64 {
    #[inline]
    fn from_re(re: f64) -> Self {
        Complex64::new(re, 0.0)
    }

    #[inline]
    fn abs_sq(self) -> f64 {
        self.norm_sqr()
    }

    #[inline]
    fn to_complex(self) -> Complex64 {
        self
    }
}

/// One-way promotion of real-valued state to complex-valued state.
///
/// Consuming the real-typed value makes the transition irreversible; every
/// collaborator that carries field-typed state (the field store, absorbing
/// boundaries, detectors, objects) implements this so the grid-level
/// promotion cascades through all of them.
pub trait Promote {
    type Promoted;

    fn promote(self) -> Self::Promoted;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_sq_matches_for_real_and_complex() {
        assert_eq!(3.0f64.abs_sq(), 9.0);
        let z = Complex64::new(3.0, 4.0);
        assert_eq!(z.abs_sq(), 25.0);
    }

    #[test]
    fn from_re_lifts_real_part_only() {
        let z = Complex64::from_re(2.5);
        assert_eq!(z, Complex64::new(2.5, 0.0));
    }
}
