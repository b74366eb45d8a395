//! # Plate Pattern Module
//!
//! Evaluates the standing wave of a square plate vibrating in two
//! degenerate modes at once. For mode numbers `(m, n)` on a plate of side
//! `L` the two terms are
//!
//! ```text
//! term1 = sin(m·π·x/L) · sin(n·π·y/L)
//! term2 = sin(n·π·x/L) · sin(m·π·y/L)
//! ```
//!
//! and the displacement is `term1 + term2` when `m + n` is even and
//! `term1 - term2` when it is odd. The nodal lines of this field are the
//! Chladni figure.

use serde::{Deserialize, Serialize};

use crate::error::{ChladniError, Result};
use crate::modes::ModePair;

/// Plate geometry and sampling density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    /// Side length `L` of the square plate.
    pub side_length: f64,
    /// Number of grid points along each axis.
    pub resolution: usize,
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self { side_length: 1.0, resolution: 300 }
    }
}

impl PlateConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.side_length.is_finite() || self.side_length <= 0.0 {
            return Err(ChladniError::InvalidConfig(format!(
                "side_length must be positive, got {}",
                self.side_length
            )));
        }
        if self.resolution < 2 {
            return Err(ChladniError::InvalidConfig(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        Ok(())
    }
}

/// Plate displacement sampled on a uniform `resolution × resolution` grid.
///
/// Grid point `(i, j)` sits at `x = i·L/(resolution-1)`, `y = j·L/(resolution-1)`,
/// so both edges of the plate are included.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub side_length: f64,
    pub resolution: usize,
    /// Row-major values, `values[j * resolution + i]` for column `i`, row `j`.
    pub values: Vec<f64>,
    /// Modes the field was sampled from; `None` for hand-built fields.
    pub modes: Option<ModePair>,
}

impl Field {
    /// Value at column `i`, row `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.resolution + i]
    }

    /// Coordinate of grid index `i` along either axis.
    pub fn coordinate(&self, i: usize) -> f64 {
        grid_coordinate(i, self.resolution, self.side_length)
    }

    /// Exact displacement at an arbitrary point, if the modes are known.
    pub fn sample(&self, x: f64, y: f64) -> Option<f64> {
        self.modes.map(|modes| displacement(modes, x, y, self.side_length))
    }
}

/// Displacement of the plate at a single point.
pub fn displacement(modes: ModePair, x: f64, y: f64, side_length: f64) -> f64 {
    let k = std::f64::consts::PI / side_length;
    let term = |p: ModePair| (p.m as f64 * k * x).sin() * (p.n as f64 * k * y).sin();
    let (term1, term2) = (term(modes), term(modes.swapped()));
    if modes.is_even() { term1 + term2 } else { term1 - term2 }
}

/// Samples the plate displacement over the whole grid.
///
/// Equal modes are accepted and simply produce the degenerate striped field.
/// A resolution below 2 is raised to 2 so that the grid always spans the plate.
pub fn synthesize(modes: ModePair, plate: &PlateConfig) -> Field {
    let resolution = plate.resolution.max(2);
    let side_length = plate.side_length;
    let coords: Vec<f64> = (0..resolution)
        .map(|i| grid_coordinate(i, resolution, side_length))
        .collect();

    let mut values = Vec::with_capacity(resolution * resolution);
    for &y in &coords {
        for &x in &coords {
            values.push(displacement(modes, x, y, side_length));
        }
    }

    Field { side_length, resolution, values, modes: Some(modes) }
}

fn grid_coordinate(i: usize, resolution: usize, side_length: f64) -> f64 {
    side_length * i as f64 / (resolution - 1) as f64
}
