//! # Piecewise Functions
//!
//! Closed-form piecewise arithmetic used by the shaft moment diagrams.
//!
//! The bending-moment and torque distributions along a shaft loaded only by
//! point forces are fixed-form: linear between consecutive key coordinates
//! (bending) or constant (torque). They are evaluated directly in floating
//! point; no symbolic machinery is involved.
//!
//! ## Interval convention
//!
//! Pieces cover `[b[i], b[i+1])` (left-closed, right-open) except the last
//! piece, which covers the closed interval `[b[n-1], b[n]]`. Outside the
//! domain a function evaluates to zero.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::piecewise::{Piece, PiecewiseFunction};
//!
//! let torque = PiecewiseFunction::new(
//!     vec![0.0, 200.0, 500.0],
//!     vec![Piece::Constant(0.0), Piece::Constant(500.0)],
//! ).unwrap();
//!
//! assert_eq!(torque.evaluate(100.0), 0.0);
//! assert_eq!(torque.evaluate(200.0), 500.0);
//! assert_eq!(torque.evaluate(500.0), 500.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Tolerance used when merging coincident sample positions (mm)
pub const POSITION_TOLERANCE: f64 = 1e-9;

/// One closed-form piece of a piecewise function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Piece {
    /// f(z) = value
    Constant(f64),
    /// f(z) = slope * z + intercept
    Linear { slope: f64, intercept: f64 },
}

impl Piece {
    pub fn evaluate(&self, z: f64) -> f64 {
        match self {
            Piece::Constant(value) => *value,
            Piece::Linear { slope, intercept } => slope * z + intercept,
        }
    }
}

/// Piecewise function over an ordered set of breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseFunction {
    breakpoints: Vec<f64>,
    pieces: Vec<Piece>,
}

impl PiecewiseFunction {
    /// Build a function from `n + 1` non-decreasing breakpoints and `n` pieces.
    ///
    /// Zero-width intervals are allowed; they never win an evaluation because
    /// their half-open range is empty.
    pub fn new(breakpoints: Vec<f64>, pieces: Vec<Piece>) -> CalcResult<Self> {
        if breakpoints.len() != pieces.len() + 1 {
            return Err(CalcError::invalid_input(
                "pieces",
                pieces.len().to_string(),
                format!("Expected {} pieces for {} breakpoints", breakpoints.len().saturating_sub(1), breakpoints.len()),
            ));
        }
        if breakpoints.iter().any(|b| !b.is_finite()) {
            return Err(CalcError::invalid_input("breakpoints", format!("{:?}", breakpoints), "Breakpoints must be finite"));
        }
        if breakpoints.windows(2).any(|w| w[1] < w[0]) {
            return Err(CalcError::invalid_load_order(format!(
                "Breakpoints must be non-decreasing: {:?}",
                breakpoints
            )));
        }
        Ok(PiecewiseFunction { breakpoints, pieces })
    }

    /// Identically zero function over `[start, end]`.
    pub fn zero(start: f64, end: f64) -> Self {
        PiecewiseFunction {
            breakpoints: vec![start, end.max(start)],
            pieces: vec![Piece::Constant(0.0)],
        }
    }

    /// Bending moment produced by signed point forces.
    ///
    /// Each piece accumulates the forces located at or left of its start:
    /// `M(z) = scale * Σ F_p (z - z_p)` for all `z_p <= z`. Forces outside
    /// `[start, end]` are ignored.
    pub fn from_point_forces(start: f64, end: f64, forces: &[(f64, f64)], scale: f64) -> CalcResult<Self> {
        let mut inside: Vec<(f64, f64)> = forces
            .iter()
            .copied()
            .filter(|(z, _)| *z >= start && *z <= end)
            .collect();
        inside.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut breakpoints = vec![start];
        for (z, _) in &inside {
            if (*z - start).abs() > POSITION_TOLERANCE && (*z - end).abs() > POSITION_TOLERANCE {
                breakpoints.push(*z);
            }
        }
        breakpoints.push(end);
        breakpoints.dedup_by(|a, b| (*a - *b).abs() <= POSITION_TOLERANCE);

        let pieces = breakpoints
            .windows(2)
            .map(|w| {
                let left = w[0];
                let (slope, intercept) = inside
                    .iter()
                    .filter(|(z, _)| *z <= left + POSITION_TOLERANCE)
                    .fold((0.0, 0.0), |(s, c), (z, f)| (s + f, c - f * z));
                Piece::Linear {
                    slope: slope * scale,
                    intercept: intercept * scale,
                }
            })
            .collect();

        PiecewiseFunction::new(breakpoints, pieces)
    }

    /// Constant `value` on the closed interval `[on_start, on_end]` and zero
    /// elsewhere in `[start, end]`.
    ///
    /// The trailing zero piece starts [`POSITION_TOLERANCE`] past `on_end`, so
    /// a sample taken exactly at `on_end` still carries the value.
    pub fn step(start: f64, end: f64, on_start: f64, on_end: f64, value: f64) -> CalcResult<Self> {
        let off = (on_end + POSITION_TOLERANCE).min(end).max(on_end);
        let breakpoints = vec![start, on_start, off, end];
        let pieces = vec![Piece::Constant(0.0), Piece::Constant(value), Piece::Constant(0.0)];
        PiecewiseFunction::new(breakpoints, pieces)
    }

    /// Evaluate at `z`; zero outside the domain.
    pub fn evaluate(&self, z: f64) -> f64 {
        // The closed piece is the last one with non-zero width, so trailing
        // zero-width pieces never hide the domain end.
        let closed = (0..self.pieces.len())
            .rev()
            .find(|&i| self.breakpoints[i] < self.breakpoints[i + 1])
            .unwrap_or(0);
        for (i, piece) in self.pieces.iter().enumerate() {
            let left = self.breakpoints[i];
            let right = self.breakpoints[i + 1];
            if z < left {
                break;
            }
            if z < right || (i == closed && z <= right) {
                return piece.evaluate(z);
            }
        }
        0.0
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// `(start, end)` of the domain
    pub fn domain(&self) -> (f64, f64) {
        let start = self.breakpoints.first().copied().unwrap_or(0.0);
        let end = self.breakpoints.last().copied().unwrap_or(start);
        (start, end)
    }
}

/// Round to a fixed number of decimals, ties to even.
///
/// `round_to(0.125, 2)` is `0.12` and `round_to(0.375, 2)` is `0.38`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round_ties_even() / factor;
    // Normalize -0.0 so printed diagrams never show "-0.00".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Uniform grid of `count` points over `[start, end]` merged with `key_points`.
///
/// The result is sorted and strictly increasing. A grid point closer than
/// [`POSITION_TOLERANCE`] to a key point is dropped so every key point appears
/// exactly once with its own value.
pub fn sample_grid(start: f64, end: f64, count: usize, key_points: &[f64]) -> Vec<f64> {
    let count = count.max(2);
    let mut keys: Vec<f64> = key_points.iter().copied().filter(|z| z.is_finite()).collect();
    keys.sort_by(|a, b| a.total_cmp(b));
    keys.dedup_by(|a, b| (*a - *b).abs() <= POSITION_TOLERANCE);

    let step = (end - start) / (count - 1) as f64;
    let grid = (0..count).map(|i| if i == count - 1 { end } else { start + step * i as f64 });

    let mut positions = keys.clone();
    for z in grid {
        let near_key = keys.iter().any(|k| (k - z).abs() <= POSITION_TOLERANCE);
        if !near_key {
            positions.push(z);
        }
    }
    positions.sort_by(|a, b| a.total_cmp(b));
    positions.dedup_by(|a, b| (*a - *b).abs() <= POSITION_TOLERANCE);
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_count_must_match() {
        let result = PiecewiseFunction::new(vec![0.0, 1.0, 2.0], vec![Piece::Constant(1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_breakpoints_must_be_ordered() {
        let result = PiecewiseFunction::new(
            vec![0.0, 2.0, 1.0],
            vec![Piece::Constant(1.0), Piece::Constant(2.0)],
        );
        assert_eq!(result.unwrap_err().error_code(), "INVALID_LOAD_ORDER");
    }

    #[test]
    fn test_left_closed_right_open() {
        let f = PiecewiseFunction::new(
            vec![0.0, 10.0, 20.0],
            vec![Piece::Constant(1.0), Piece::Constant(2.0)],
        )
        .unwrap();
        assert_eq!(f.evaluate(0.0), 1.0);
        assert_eq!(f.evaluate(9.999), 1.0);
        assert_eq!(f.evaluate(10.0), 2.0);
        assert_eq!(f.evaluate(20.0), 2.0);
        assert_eq!(f.evaluate(20.5), 0.0);
        assert_eq!(f.evaluate(-1.0), 0.0);
    }

    #[test]
    fn test_point_forces_simple_couple() {
        // Ra = 400 N at 0, -10 kN at 200, +10 kN at 220, closing couple at 500
        let forces = [(0.0, 400.0), (200.0, -10_000.0), (220.0, 10_000.0), (500.0, -400.0)];
        let mg = PiecewiseFunction::from_point_forces(0.0, 500.0, &forces, 0.001).unwrap();

        assert!((mg.evaluate(100.0) - 40.0).abs() < 1e-9);
        assert!((mg.evaluate(200.0) - 80.0).abs() < 1e-9);
        // 400*220 - 10000*20 = 88000 - 200000 N·mm
        assert!((mg.evaluate(220.0) - (-112.0)).abs() < 1e-9);
        assert!(mg.evaluate(500.0).abs() < 1e-9);
        assert_eq!(mg.breakpoints(), &[0.0, 200.0, 220.0, 500.0]);
    }

    #[test]
    fn test_step_function() {
        let ms = PiecewiseFunction::step(0.0, 400.0, 100.0, 300.0, 50.0).unwrap();
        assert_eq!(ms.evaluate(50.0), 0.0);
        assert_eq!(ms.evaluate(100.0), 50.0);
        assert_eq!(ms.evaluate(299.0), 50.0);
        assert_eq!(ms.evaluate(300.0), 50.0);
        assert_eq!(ms.evaluate(300.001), 0.0);
        assert_eq!(ms.evaluate(400.0), 0.0);

        let to_end = PiecewiseFunction::step(0.0, 500.0, 200.0, 500.0, 50.0).unwrap();
        assert_eq!(to_end.evaluate(500.0), 50.0);
    }

    #[test]
    fn test_zero_function() {
        let f = PiecewiseFunction::zero(0.0, 100.0);
        assert_eq!(f.evaluate(50.0), 0.0);
        assert_eq!(f.domain(), (0.0, 100.0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.235001, 2), 1.24);
        assert_eq!(round_to(-0.001, 2), 0.0);
        assert!(round_to(-0.001, 2).is_sign_positive());
    }

    #[test]
    fn test_round_to_ties_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(-0.5, 0), 0.0);
    }

    #[test]
    fn test_sample_grid_contains_keys_once() {
        let keys = [0.0, 200.0, 220.0, 500.0];
        let grid = sample_grid(0.0, 500.0, 100, &keys);

        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        for key in keys {
            assert_eq!(grid.iter().filter(|&&z| z == key).count(), 1);
        }
        assert_eq!(grid.first().copied(), Some(0.0));
        assert_eq!(grid.last().copied(), Some(500.0));
    }

    #[test]
    fn test_sample_grid_minimum_count() {
        let grid = sample_grid(0.0, 10.0, 0, &[]);
        assert_eq!(grid, vec![0.0, 10.0]);
    }
}
