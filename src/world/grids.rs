//! Dense grids: midge density fields and read-only daily weather
//!
//! Each field is a contiguous `ndarray` array so the per-cell passes in
//! the midge dynamics stay cache-friendly. Dimensions are construction
//! parameters; the algorithms only assume the grids have interior cells.

use ndarray::{Array2, Array3};

use crate::core::types::DAYS_PER_YEAR;

/// Mutable midge-density fields plus the diffusion inputs and scratch
/// accumulator the sub-day solver needs.
#[derive(Debug, Clone)]
pub struct MidgeGrids {
    rows: usize,
    cols: usize,
    num_eip_stages: usize,

    /// Latent (incubating) midge density per EIP stage, (row, col, stage)
    pub latent: Array3<f64>,
    /// Infectious midge density
    pub infectious: Array2<f64>,
    /// Diffusion coefficient per cell, loaded at setup
    pub diffusion: Array2<f64>,
    /// Scratch accumulator for diffusion sub-steps; zero between steps
    pub scratch: Array2<f64>,
}

impl MidgeGrids {
    pub fn new(rows: usize, cols: usize, num_eip_stages: usize) -> Self {
        Self {
            rows,
            cols,
            num_eip_stages,
            latent: Array3::zeros((rows, cols, num_eip_stages)),
            infectious: Array2::zeros((rows, cols)),
            diffusion: Array2::zeros((rows, cols)),
            scratch: Array2::zeros((rows, cols)),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn num_eip_stages(&self) -> usize {
        self.num_eip_stages
    }

    /// Total midge mass (latent plus infectious) over the whole grid
    pub fn total_mass(&self) -> f64 {
        self.latent.sum() + self.infectious.sum()
    }
}

/// Read-only daily weather, indexed by (row, col, day_of_year)
#[derive(Debug, Clone)]
pub struct WeatherGrids {
    pub temperature: Array3<f64>,
    pub rainfall: Array3<f64>,
}

impl WeatherGrids {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            temperature: Array3::zeros((rows, cols, DAYS_PER_YEAR)),
            rainfall: Array3::zeros((rows, cols, DAYS_PER_YEAR)),
        }
    }

    /// Weather that is the same everywhere on every day; test setups and
    /// sensitivity runs use this.
    pub fn constant(rows: usize, cols: usize, temperature: f64, rainfall: f64) -> Self {
        Self {
            temperature: Array3::from_elem((rows, cols, DAYS_PER_YEAR), temperature),
            rainfall: Array3::from_elem((rows, cols, DAYS_PER_YEAR), rainfall),
        }
    }

    pub fn rows(&self) -> usize {
        self.temperature.dim().0
    }

    pub fn cols(&self) -> usize {
        self.temperature.dim().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grids_are_zeroed() {
        let grids = MidgeGrids::new(4, 5, 3);
        assert_eq!(grids.total_mass(), 0.0);
        assert_eq!(grids.latent.dim(), (4, 5, 3));
        assert_eq!(grids.scratch.sum(), 0.0);
    }

    #[test]
    fn test_total_mass_counts_all_fields() {
        let mut grids = MidgeGrids::new(3, 3, 2);
        grids.latent[(1, 1, 0)] = 2.5;
        grids.latent[(1, 1, 1)] = 0.5;
        grids.infectious[(0, 2)] = 1.0;
        assert_eq!(grids.total_mass(), 4.0);
    }

    #[test]
    fn test_constant_weather() {
        let weather = WeatherGrids::constant(2, 2, 18.0, 3.0);
        assert_eq!(weather.temperature[(1, 0, 200)], 18.0);
        assert_eq!(weather.rainfall[(0, 1, 0)], 3.0);
        assert_eq!(weather.rows(), 2);
        assert_eq!(weather.cols(), 2);
    }
}
