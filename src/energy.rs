// src/energy.rs

use std::ops::Range;

use ndarray::s;

use crate::grid::Grid;
use crate::scalar::FieldScalar;

/// Dimensionless diagnostic energy `sum(|E|^2 + |H|^2)` over the whole
/// grid. For a source-free, lossless, periodically closed grid this is
/// conserved up to the leapfrog's bounded oscillation.
pub fn total_field_energy<T: FieldScalar>(grid: &Grid<T>) -> f64 {
    let e: f64 = grid.e().iter().map(|&v| v.abs_sq()).sum();
    let h: f64 = grid.h().iter().map(|&v| v.abs_sq()).sum();
    e + h
}

/// The same diagnostic restricted to an index window, e.g. the interior
/// of an absorbing layer.
pub fn field_energy_in<T: FieldScalar>(grid: &Grid<T>, window: [Range<usize>; 3]) -> f64 {
    let [wx, wy, wz] = window;
    let e: f64 = grid
        .e()
        .slice(s![wx.clone(), wy.clone(), wz.clone(), ..])
        .iter()
        .map(|&v| v.abs_sq())
        .sum();
    let h: f64 = grid
        .h()
        .slice(s![wx, wy, wz, ..])
        .iter()
        .map(|&v| v.abs_sq())
        .sum();
    e + h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_counts_both_fields() {
        let mut grid = Grid::new((8, 1, 1), 1.0).unwrap();
        grid.e_mut()[[2, 0, 0, 2]] = 3.0;
        grid.h_mut()[[5, 0, 0, 1]] = 4.0;
        assert_eq!(total_field_energy(&grid), 25.0);
    }

    #[test]
    fn windowed_energy_sees_only_its_cells() {
        let mut grid = Grid::new((8, 1, 1), 1.0).unwrap();
        grid.e_mut()[[2, 0, 0, 2]] = 3.0;
        grid.e_mut()[[6, 0, 0, 2]] = 1.0;
        let windowed = field_energy_in(&grid, [0..4, 0..1, 0..1]);
        assert_eq!(windowed, 9.0);
    }
}
