//! Midge dynamics: temperature-driven mortality, staged EIP progression,
//! and sub-day explicit-Euler diffusion
//!
//! Mortality and incubation read one temperature cell per block of midge
//! cells (stride = midge width / temperature width) and touch only the
//! top-left midge cell of each block; unaligned cells are left as they
//! are. Diffusion then spreads every field over the day in sub-steps of
//! `dt`, depositing fluxes into a scratch grid so each sub-step is a
//! proper forward-Euler update.

use crate::core::config::{EpiParams, GridParams, SimulationParams};
use crate::entomology::VectorSpecies;
use crate::random;
use crate::world::{MidgeGrids, SimulationState};

/// Densities at or below this are treated as inactive and move no mass
const ACTIVE_DENSITY_FLOOR: f64 = 1e-5;

/// Apply one day of temperature-dependent mortality and EIP progression
/// to the midge fields in place.
///
/// Per cell: every field is scaled by the daily survival
/// `exp(-mortality(T))`; then, if the cell is warm enough to incubate,
/// latent mass is redistributed across stages by a staged-Poisson
/// transition and the mass clearing the final stage emerges as
/// infectious.
pub fn midge_mortality_and_incubation(
    state: &mut SimulationState,
    epi: &EpiParams,
    grids: &GridParams,
    species: &dyn VectorSpecies,
) {
    let stride = grids.temp_to_midge_stride();
    let num_eip = epi.num_eip_stages;
    let doy = state.day_of_year;
    let rows = state.midges.rows();
    let cols = state.midges.cols();
    let mut soln = vec![0.0; num_eip + 1];

    for i in (0..rows).step_by(stride) {
        for j in (0..cols).step_by(stride) {
            let temp = state.weather.temperature[(i, j, doy)];
            let survival = (-species.mortality_rate(temp)).exp();
            let incubation = num_eip as f64 * species.incubation_rate(temp);

            state.midges.infectious[(i, j)] *= survival;
            let mut latent_total = 0.0;
            for k in 0..num_eip {
                state.midges.latent[(i, j, k)] *= survival;
                latent_total += state.midges.latent[(i, j, k)];
            }

            if incubation <= 0.0 || latent_total <= 0.0 {
                continue;
            }

            // Staged-Poisson progression: mass in stage k advances n-k
            // stages with probability PoissonPMF(n-k | incubation), and
            // emerges as infectious once it clears the final stage.
            for n in 0..num_eip {
                soln[n] = 0.0;
                for k in 0..=n {
                    soln[n] +=
                        state.midges.latent[(i, j, k)] * random::poisson_pmf(n - k, incubation);
                }
            }
            soln[num_eip] = state.midges.infectious[(i, j)];
            for k in 0..num_eip {
                soln[num_eip] += state.midges.latent[(i, j, k)]
                    * random::poisson_sf(num_eip - k - 1, incubation);
            }
            for n in 0..num_eip {
                state.midges.latent[(i, j, n)] = soln[n];
            }
            state.midges.infectious[(i, j)] = soln[num_eip];
        }
    }
}

/// Diffuse the midge fields for one day.
///
/// Repeats explicit-Euler sub-steps of size `dt` until a full day has
/// elapsed, each pass covering every latent stage and then the
/// infectious field. Boundary cells are absorbing: they receive no flux
/// and emit none.
pub fn midge_diffusion_for_day(
    state: &mut SimulationState,
    sim: &SimulationParams,
    epi: &EpiParams,
    grids: &GridParams,
) {
    let dt = sim.dt;
    let h_sq = grids.midge_grid_width * grids.midge_grid_width;

    let mut elapsed = 0.0;
    while elapsed < 1.0 {
        for stage in 0..epi.num_eip_stages {
            diffuse_latent_stage(&mut state.midges, stage, dt, h_sq);
        }
        diffuse_infectious(&mut state.midges, dt, h_sq);
        elapsed += dt;
    }
}

fn diffuse_latent_stage(midges: &mut MidgeGrids, stage: usize, dt: f64, h_sq: f64) {
    let rows = midges.rows();
    let cols = midges.cols();
    if rows < 3 || cols < 3 {
        return;
    }

    for i in 1..rows - 1 {
        for j in 1..cols - 1 {
            let density = midges.latent[(i, j, stage)];
            if density > ACTIVE_DENSITY_FLOOR {
                let flux = midges.diffusion[(i, j)] * dt * density / h_sq;
                midges.scratch[(i, j)] -= 2.0 * flux;
                midges.scratch[(i + 1, j)] += 0.5 * flux;
                midges.scratch[(i - 1, j)] += 0.5 * flux;
                midges.scratch[(i, j + 1)] += 0.5 * flux;
                midges.scratch[(i, j - 1)] += 0.5 * flux;
            }
        }
    }
    for i in 1..rows - 1 {
        for j in 1..cols - 1 {
            let delta = midges.scratch[(i, j)];
            midges.latent[(i, j, stage)] += delta;
        }
    }
    midges.scratch.fill(0.0);
}

fn diffuse_infectious(midges: &mut MidgeGrids, dt: f64, h_sq: f64) {
    let rows = midges.rows();
    let cols = midges.cols();
    if rows < 3 || cols < 3 {
        return;
    }

    for i in 1..rows - 1 {
        for j in 1..cols - 1 {
            let density = midges.infectious[(i, j)];
            if density > ACTIVE_DENSITY_FLOOR {
                let flux = midges.diffusion[(i, j)] * dt * density / h_sq;
                midges.scratch[(i, j)] -= 2.0 * flux;
                midges.scratch[(i + 1, j)] += 0.5 * flux;
                midges.scratch[(i - 1, j)] += 0.5 * flux;
                midges.scratch[(i, j + 1)] += 0.5 * flux;
                midges.scratch[(i, j - 1)] += 0.5 * flux;
            }
        }
    }
    for i in 1..rows - 1 {
        for j in 1..cols - 1 {
            let delta = midges.scratch[(i, j)];
            midges.infectious[(i, j)] += delta;
        }
    }
    midges.scratch.fill(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;
    use crate::entomology::Culicoides;
    use crate::world::{MidgeGrids, WeatherGrids};

    /// A vector that neither dies nor incubates; the dynamics step must
    /// leave every field untouched under it.
    struct InertVector;

    impl VectorSpecies for InertVector {
        fn name(&self) -> &'static str {
            "inert"
        }
        fn biting_rate(&self, _temperature: f64) -> f64 {
            0.0
        }
        fn mortality_rate(&self, _temperature: f64) -> f64 {
            0.0
        }
        fn incubation_rate(&self, _temperature: f64) -> f64 {
            0.0
        }
    }

    fn state_with_temperature(rows: usize, cols: usize, stages: usize, temp: f64) -> SimulationState {
        SimulationState::new(
            MidgeGrids::new(rows, cols, stages),
            WeatherGrids::constant(rows, cols, temp, 0.0),
        )
    }

    #[test]
    fn test_zero_rate_vector_is_identity() {
        let mut config = ModelConfig::default();
        config.epi.num_eip_stages = 3;
        let mut state = state_with_temperature(5, 5, 3, 25.0);
        state.midges.infectious[(2, 2)] = 7.0;
        state.midges.latent[(2, 2, 0)] = 4.0;
        state.midges.latent[(3, 1, 2)] = 0.25;
        let latent_before = state.midges.latent.clone();
        let infectious_before = state.midges.infectious.clone();

        midge_mortality_and_incubation(&mut state, &config.epi, &config.grids, &InertVector);

        assert_eq!(state.midges.latent, latent_before);
        assert_eq!(state.midges.infectious, infectious_before);
    }

    #[test]
    fn test_cold_cell_mortality_only() {
        // At 0 C the Culicoides mortality rate is 0.009 and incubation
        // is inactive, so one day only scales densities by exp(-0.009).
        let mut config = ModelConfig::default();
        config.epi.num_eip_stages = 4;
        let mut state = state_with_temperature(5, 5, 4, 0.0);
        state.midges.infectious[(2, 2)] = 10.0;

        midge_mortality_and_incubation(&mut state, &config.epi, &config.grids, &Culicoides);

        let expected = 10.0 * (-0.009f64).exp();
        assert!((state.midges.infectious[(2, 2)] - expected).abs() < 1e-12);
        assert_eq!(state.midges.latent.sum(), 0.0);
    }

    #[test]
    fn test_hot_cell_staged_progression() {
        // At 20 C with 4 EIP stages: survival exp(-0.009 e^{3.2}),
        // incubation index 4 * 0.018 * 6.6.
        let mut config = ModelConfig::default();
        config.epi.num_eip_stages = 4;
        let mut state = state_with_temperature(5, 5, 4, 20.0);
        state.midges.latent[(2, 2, 0)] = 100.0;

        midge_mortality_and_incubation(&mut state, &config.epi, &config.grids, &Culicoides);

        let survival = (-0.009 * (0.16f64 * 20.0).exp()).exp();
        let incubation = 4.0 * 0.018 * (20.0 - 13.4);
        for n in 0..4 {
            let expected = 100.0 * survival * random::poisson_pmf(n, incubation);
            assert!(
                (state.midges.latent[(2, 2, n)] - expected).abs() < 1e-9,
                "stage {} was {}, expected {}",
                n,
                state.midges.latent[(2, 2, n)],
                expected
            );
        }
        let expected_inf = 100.0 * survival * random::poisson_sf(3, incubation);
        assert!((state.midges.infectious[(2, 2)] - expected_inf).abs() < 1e-9);
    }

    #[test]
    fn test_progression_conserves_survived_mass() {
        let mut config = ModelConfig::default();
        config.epi.num_eip_stages = 6;
        let mut state = state_with_temperature(5, 5, 6, 22.0);
        state.midges.latent[(2, 2, 0)] = 40.0;
        state.midges.latent[(2, 2, 3)] = 10.0;
        state.midges.infectious[(2, 2)] = 5.0;

        midge_mortality_and_incubation(&mut state, &config.epi, &config.grids, &Culicoides);

        let survival = (-0.009 * (0.16f64 * 22.0).exp()).exp();
        let expected_total = 55.0 * survival;
        assert!(
            (state.midges.total_mass() - expected_total).abs() < 1e-9,
            "total {} vs expected {}",
            state.midges.total_mass(),
            expected_total
        );
    }

    #[test]
    fn test_stride_touches_only_block_corners() {
        let mut config = ModelConfig::default();
        config.epi.num_eip_stages = 2;
        config.grids.midge_grid_width = 10_000.0;
        config.grids.temp_grid_width = 5_000.0;
        let mut state = state_with_temperature(4, 4, 2, 0.0);
        state.midges.infectious[(0, 0)] = 1.0;
        state.midges.infectious[(0, 1)] = 1.0;

        midge_mortality_and_incubation(&mut state, &config.epi, &config.grids, &Culicoides);

        // (0, 0) is stride-aligned, (0, 1) is not and stays untouched
        assert!(state.midges.infectious[(0, 0)] < 1.0);
        assert_eq!(state.midges.infectious[(0, 1)], 1.0);
    }

    #[test]
    fn test_diffusion_conserves_interior_mass() {
        let config = ModelConfig::default();
        let mut state = state_with_temperature(21, 21, config.epi.num_eip_stages, 0.0);
        state.midges.diffusion.fill(1.0e6);
        state.midges.latent[(10, 10, 0)] = 1000.0;
        state.midges.infectious[(10, 10)] = 500.0;
        let mass_before = state.midges.total_mass();

        midge_diffusion_for_day(&mut state, &config.sim, &config.epi, &config.grids);

        assert!(
            (state.midges.total_mass() - mass_before).abs() < 1e-9 * mass_before,
            "mass {} vs {}",
            state.midges.total_mass(),
            mass_before
        );
    }

    #[test]
    fn test_diffusion_spreads_to_orthogonal_neighbours() {
        let config = ModelConfig::default();
        let mut state = state_with_temperature(9, 9, config.epi.num_eip_stages, 0.0);
        state.midges.diffusion.fill(1.0e6);
        state.midges.infectious[(4, 4)] = 100.0;

        midge_diffusion_for_day(&mut state, &config.sim, &config.epi, &config.grids);

        assert!(state.midges.infectious[(4, 4)] < 100.0);
        for (i, j) in [(5, 4), (3, 4), (4, 5), (4, 3)] {
            assert!(
                state.midges.infectious[(i, j)] > 0.0,
                "neighbour ({}, {}) received no mass",
                i,
                j
            );
        }
        // Diagonal neighbours only receive mass via second-order spread
        assert!(state.midges.infectious[(5, 5)] < state.midges.infectious[(5, 4)]);
    }

    #[test]
    fn test_diffusion_leaves_scratch_zeroed() {
        let config = ModelConfig::default();
        let mut state = state_with_temperature(9, 9, config.epi.num_eip_stages, 0.0);
        state.midges.diffusion.fill(1.0e6);
        state.midges.latent[(4, 4, 1)] = 50.0;

        midge_diffusion_for_day(&mut state, &config.sim, &config.epi, &config.grids);

        assert_eq!(state.midges.scratch.sum(), 0.0);
    }

    #[test]
    fn test_tiny_densities_do_not_diffuse() {
        let config = ModelConfig::default();
        let mut state = state_with_temperature(9, 9, config.epi.num_eip_stages, 0.0);
        state.midges.diffusion.fill(1.0e6);
        state.midges.infectious[(4, 4)] = 1e-6;

        midge_diffusion_for_day(&mut state, &config.sim, &config.epi, &config.grids);

        assert_eq!(state.midges.infectious[(4, 4)], 1e-6);
        assert_eq!(state.midges.infectious[(4, 5)], 0.0);
    }
}
