// src/curl.rs
//
// Discrete curl operators on the staggered Yee grid. Each operator fills a
// zero-initialized tensor with the six directional finite differences of
// the right-hand curl; rows at the extreme index of each difference axis
// keep their zero fill, since a one-sided difference has no data there.
// Periodic and absorbing boundaries patch the edges after the bulk update.

use ndarray::{s, Array4, Zip};

use crate::scalar::FieldScalar;

/// Curl of an E-type field (forward differences).
pub fn curl_e<T: FieldScalar>(e: &Array4<T>) -> Array4<T> {
    let mut curl = Array4::<T>::zeros(e.raw_dim());

    // x-component: dEz/dy - dEy/dz
    Zip::from(curl.slice_mut(s![.., ..-1, .., 0]))
        .and(e.slice(s![.., 1.., .., 2]))
        .and(e.slice(s![.., ..-1, .., 2]))
        .par_for_each(|c, &hi, &lo| *c += hi - lo);
    Zip::from(curl.slice_mut(s![.., .., ..-1, 0]))
        .and(e.slice(s![.., .., 1.., 1]))
        .and(e.slice(s![.., .., ..-1, 1]))
        .par_for_each(|c, &hi, &lo| *c -= hi - lo);

    // y-component: dEx/dz - dEz/dx
    Zip::from(curl.slice_mut(s![.., .., ..-1, 1]))
        .and(e.slice(s![.., .., 1.., 0]))
        .and(e.slice(s![.., .., ..-1, 0]))
        .par_for_each(|c, &hi, &lo| *c += hi - lo);
    Zip::from(curl.slice_mut(s![..-1, .., .., 1]))
        .and(e.slice(s![1.., .., .., 2]))
        .and(e.slice(s![..-1, .., .., 2]))
        .par_for_each(|c, &hi, &lo| *c -= hi - lo);

    // z-component: dEy/dx - dEx/dy
    Zip::from(curl.slice_mut(s![..-1, .., .., 2]))
        .and(e.slice(s![1.., .., .., 1]))
        .and(e.slice(s![..-1, .., .., 1]))
        .par_for_each(|c, &hi, &lo| *c += hi - lo);
    Zip::from(curl.slice_mut(s![.., ..-1, .., 2]))
        .and(e.slice(s![.., 1.., .., 0]))
        .and(e.slice(s![.., ..-1, .., 0]))
        .par_for_each(|c, &hi, &lo| *c -= hi - lo);

    curl
}

/// Curl of an H-type field (backward differences).
pub fn curl_h<T: FieldScalar>(h: &Array4<T>) -> Array4<T> {
    let mut curl = Array4::<T>::zeros(h.raw_dim());

    // x-component: dHz/dy - dHy/dz
    Zip::from(curl.slice_mut(s![.., 1.., .., 0]))
        .and(h.slice(s![.., 1.., .., 2]))
        .and(h.slice(s![.., ..-1, .., 2]))
        .par_for_each(|c, &hi, &lo| *c += hi - lo);
    Zip::from(curl.slice_mut(s![.., .., 1.., 0]))
        .and(h.slice(s![.., .., 1.., 1]))
        .and(h.slice(s![.., .., ..-1, 1]))
        .par_for_each(|c, &hi, &lo| *c -= hi - lo);

    // y-component: dHx/dz - dHz/dx
    Zip::from(curl.slice_mut(s![.., .., 1.., 1]))
        .and(h.slice(s![.., .., 1.., 0]))
        .and(h.slice(s![.., .., ..-1, 0]))
        .par_for_each(|c, &hi, &lo| *c += hi - lo);
    Zip::from(curl.slice_mut(s![1.., .., .., 1]))
        .and(h.slice(s![1.., .., .., 2]))
        .and(h.slice(s![..-1, .., .., 2]))
        .par_for_each(|c, &hi, &lo| *c -= hi - lo);

    // z-component: dHy/dx - dHx/dy
    Zip::from(curl.slice_mut(s![1.., .., .., 2]))
        .and(h.slice(s![1.., .., .., 1]))
        .and(h.slice(s![..-1, .., .., 1]))
        .par_for_each(|c, &hi, &lo| *c += hi - lo);
    Zip::from(curl.slice_mut(s![.., 1.., .., 2]))
        .and(h.slice(s![.., 1.., .., 0]))
        .and(h.slice(s![.., ..-1, .., 0]))
        .par_for_each(|c, &hi, &lo| *c -= hi - lo);

    curl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curl_of_linear_ez_is_unit_x_component() {
        // Ez = j gives dEz/dy = 1 wherever the forward difference exists.
        let mut e = Array4::<f64>::zeros((4, 4, 4, 3));
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    e[[i, j, k, 2]] = j as f64;
                }
            }
        }
        let c = curl_e(&e);
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    let expected = if j < 3 { 1.0 } else { 0.0 };
                    assert_eq!(c[[i, j, k, 0]], expected, "at ({i},{j},{k})");
                    assert_eq!(c[[i, j, k, 1]], 0.0);
                    // dEz/dx = 0 so the y/z components vanish.
                    assert_eq!(c[[i, j, k, 2]], 0.0);
                }
            }
        }
    }

    #[test]
    fn curl_h_leaves_low_edge_rows_zeroed() {
        let mut h = Array4::<f64>::zeros((4, 4, 4, 3));
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    h[[i, j, k, 2]] = j as f64;
                }
            }
        }
        let c = curl_h(&h);
        // Backward differences start at index 1.
        for i in 0..4 {
            for k in 0..4 {
                assert_eq!(c[[i, 0, k, 0]], 0.0);
                assert_eq!(c[[i, 1, k, 0]], 1.0);
            }
        }
    }
}
