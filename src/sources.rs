// src/sources.rs
//
// Excitation sources. Each variant injects a time-varying value into the
// z component of E at its registered cells during the E phase; no variant
// touches H. The waveform is stateless and evaluated from the grid's step
// counter, so sources survive a `reset` unchanged.

use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;

use crate::constants::Z;
use crate::coordinates::TimeSpec;
use crate::error::ConfigError;
use crate::fields::FieldStore;
use crate::scalar::FieldScalar;

/// Waveform parameters shared by every source variant.
///
/// Continuous-wave mode evaluates `amplitude * sin(2π q / period + phase)`.
/// Pulse mode multiplies a Hanning window onto the carrier and cuts off
/// after `t1 = ⌊2π / (f · hanning_dt / cycle)⌋` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    period: u64,
    frequency: f64,
    amplitude: f64,
    phase_shift: f64,
    pulse: bool,
    cycle: u32,
    hanning_dt: f64,
}

fn hanning(f: f64, t: f64, n: f64) -> f64 {
    0.5 * (1.0 - (f * t / n).cos()) * (f * t).sin()
}

impl Waveform {
    fn resolve(
        period: TimeSpec,
        amplitude: f64,
        phase_shift: f64,
        pulse: bool,
        cycle: u32,
        hanning_dt: f64,
        time_step: f64,
    ) -> Result<Self, ConfigError> {
        let steps = period.to_steps(time_step);
        if steps == 0 {
            return Err(ConfigError::InvalidSourcePeriod);
        }
        Ok(Self {
            period: steps,
            // The carrier frequency of the pulse window is defined on the
            // period as given, not on the resolved step count.
            frequency: 1.0 / period.raw(),
            amplitude,
            phase_shift,
            pulse,
            cycle,
            hanning_dt,
        })
    }

    /// Waveform value at time step `q`.
    pub fn value(&self, q: u64) -> f64 {
        if self.pulse {
            let t1 = (2.0 * PI / (self.frequency * self.hanning_dt / self.cycle as f64)) as u64;
            if q < t1 {
                self.amplitude
                    * hanning(self.frequency, q as f64 * self.hanning_dt, self.cycle as f64)
            } else {
                0.0
            }
        } else {
            self.amplitude
                * (2.0 * PI * q as f64 / self.period as f64 + self.phase_shift).sin()
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

/// Point source spec: excites a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSource {
    pub period: TimeSpec,
    pub amplitude: f64,
    pub phase_shift: f64,
    pub pulse: bool,
    pub cycle: u32,
    pub hanning_dt: f64,
    pub name: Option<String>,
}

impl Default for PointSource {
    fn default() -> Self {
        Self {
            period: TimeSpec::Steps(15),
            amplitude: 1.0,
            phase_shift: 0.0,
            pulse: false,
            cycle: 5,
            hanning_dt: 10.0,
            name: None,
        }
    }
}

/// Line source spec: excites a sampled cell path with a Gaussian profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSource {
    pub period: TimeSpec,
    pub amplitude: f64,
    pub phase_shift: f64,
    pub pulse: bool,
    pub cycle: u32,
    pub hanning_dt: f64,
    pub name: Option<String>,
}

impl Default for LineSource {
    fn default() -> Self {
        Self {
            period: TimeSpec::Steps(15),
            amplitude: 1.0,
            phase_shift: 0.0,
            pulse: false,
            cycle: 5,
            hanning_dt: 10.0,
            name: None,
        }
    }
}

/// Plane source spec: excites a plane window uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneSource {
    pub period: TimeSpec,
    pub amplitude: f64,
    pub phase_shift: f64,
    pub name: Option<String>,
}

impl Default for PlaneSource {
    fn default() -> Self {
        Self {
            period: TimeSpec::Steps(15),
            amplitude: 1.0,
            phase_shift: 0.0,
            name: None,
        }
    }
}

/// A source registered on a grid, with its placement resolved.
#[derive(Debug, Clone)]
pub enum Source {
    Point {
        cell: [usize; 3],
        waveform: Waveform,
        name: Option<String>,
    },
    Line {
        cells: Vec<[usize; 3]>,
        /// Gaussian weights centered on the path midpoint, summing to one.
        profile: Vec<f64>,
        waveform: Waveform,
        name: Option<String>,
    },
    Plane {
        window: [Range<usize>; 3],
        waveform: Waveform,
        name: Option<String>,
    },
}

/// Gaussian path profile: squared cell distance from the midpoint cell,
/// with the width set to a quarter of the path length.
fn gaussian_profile(cells: &[[usize; 3]]) -> Vec<f64> {
    let mid = cells[cells.len() / 2];
    let sigma = cells.len() as f64 / 4.0;
    let mut profile: Vec<f64> = cells
        .iter()
        .map(|c| {
            let d2: f64 = (0..3)
                .map(|a| {
                    let d = c[a] as f64 - mid[a] as f64;
                    d * d
                })
                .sum();
            (-d2 / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = profile.iter().sum();
    for p in &mut profile {
        *p /= total;
    }
    profile
}

impl Source {
    pub(crate) fn point(
        spec: PointSource,
        cell: [usize; 3],
        time_step: f64,
    ) -> Result<Self, ConfigError> {
        let waveform = Waveform::resolve(
            spec.period,
            spec.amplitude,
            spec.phase_shift,
            spec.pulse,
            spec.cycle,
            spec.hanning_dt,
            time_step,
        )?;
        Ok(Source::Point {
            cell,
            waveform,
            name: spec.name,
        })
    }

    pub(crate) fn line(
        spec: LineSource,
        cells: Vec<[usize; 3]>,
        time_step: f64,
    ) -> Result<Self, ConfigError> {
        let waveform = Waveform::resolve(
            spec.period,
            spec.amplitude,
            spec.phase_shift,
            spec.pulse,
            spec.cycle,
            spec.hanning_dt,
            time_step,
        )?;
        let profile = gaussian_profile(&cells);
        Ok(Source::Line {
            cells,
            profile,
            waveform,
            name: spec.name,
        })
    }

    pub(crate) fn plane(
        spec: PlaneSource,
        window: [Range<usize>; 3],
        time_step: f64,
    ) -> Result<Self, ConfigError> {
        let waveform = Waveform::resolve(
            spec.period,
            spec.amplitude,
            spec.phase_shift,
            false,
            5,
            10.0,
            time_step,
        )?;
        Ok(Source::Plane {
            window,
            waveform,
            name: spec.name,
        })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Source::Point { name, .. }
            | Source::Line { name, .. }
            | Source::Plane { name, .. } => name.as_deref(),
        }
    }

    pub fn waveform(&self) -> &Waveform {
        match self {
            Source::Point { waveform, .. }
            | Source::Line { waveform, .. }
            | Source::Plane { waveform, .. } => waveform,
        }
    }

    /// E-phase injection at time step `q`.
    pub(crate) fn inject_e<T: FieldScalar>(&self, fields: &mut FieldStore<T>, q: u64) {
        match self {
            Source::Point { cell, waveform, .. } => {
                let v = T::from_re(waveform.value(q));
                fields.e[[cell[0], cell[1], cell[2], Z]] += v;
            }
            Source::Line {
                cells,
                profile,
                waveform,
                ..
            } => {
                let v = waveform.value(q);
                for (cell, w) in cells.iter().zip(profile) {
                    fields.e[[cell[0], cell[1], cell[2], Z]] += T::from_re(w * v);
                }
            }
            Source::Plane {
                window, waveform, ..
            } => {
                let v = T::from_re(waveform.value(q));
                for i in window[0].clone() {
                    for j in window[1].clone() {
                        for k in window[2].clone() {
                            fields.e[[i, j, k, Z]] += v;
                        }
                    }
                }
            }
        }
    }

    /// H-phase injection: a no-op for every variant.
    pub(crate) fn inject_h<T: FieldScalar>(&self, _fields: &mut FieldStore<T>, _q: u64) {}
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Point { cell, waveform, name } => write!(
                f,
                "PointSource(period={}, amplitude={}, name={:?}) @ ({}, {}, {})",
                waveform.period, waveform.amplitude, name, cell[0], cell[1], cell[2]
            ),
            Source::Line { cells, waveform, name, .. } => write!(
                f,
                "LineSource(period={}, amplitude={}, name={:?}) @ {} cells",
                waveform.period,
                waveform.amplitude,
                name,
                cells.len()
            ),
            Source::Plane { window, waveform, name } => write!(
                f,
                "PlaneSource(period={}, amplitude={}, name={:?}) @ x={:?}, y={:?}, z={:?}",
                waveform.period, waveform.amplitude, name, window[0], window[1], window[2]
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cw(period: u64) -> Waveform {
        Waveform::resolve(TimeSpec::Steps(period), 1.0, 0.0, false, 5, 10.0, 1.0).unwrap()
    }

    #[test]
    fn continuous_wave_starts_at_zero_phase() {
        let w = cw(10);
        assert!(w.value(0).abs() < 1e-15);
        let expected = (2.0 * PI * 3.0 / 10.0).sin();
        assert!((w.value(3) - expected).abs() < 1e-15);
    }

    #[test]
    fn pulse_cuts_off_after_the_window() {
        let w = Waveform::resolve(TimeSpec::Steps(15), 1.0, 0.0, true, 5, 10.0, 1.0).unwrap();
        // t1 = floor(2π / (f * hanning_dt / cycle)) with f = 1/15.
        let t1 = (2.0 * PI / ((1.0 / 15.0) * 10.0 / 5.0)) as u64;
        assert_eq!(w.value(t1), 0.0);
        assert_eq!(w.value(t1 + 100), 0.0);
        assert!(w.value(t1 / 2).abs() > 0.0);
    }

    #[test]
    fn zero_period_is_a_config_error() {
        assert!(matches!(
            Waveform::resolve(TimeSpec::Steps(0), 1.0, 0.0, false, 5, 10.0, 1.0),
            Err(ConfigError::InvalidSourcePeriod)
        ));
    }

    #[test]
    fn gaussian_profile_sums_to_one_and_peaks_at_the_middle() {
        let cells: Vec<[usize; 3]> = (0..9).map(|i| [i, 0, 0]).collect();
        let profile = gaussian_profile(&cells);
        let total: f64 = profile.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(profile[4] > profile[0]);
        assert!(profile[4] > profile[8]);
    }
}
