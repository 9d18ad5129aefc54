//! Per-farm epidemic steps: weather, deaths/recoveries with embedded
//! detection, and bidirectional midge-host transmission
//!
//! The orchestrator runs these four steps for each farm in stored order.
//! Detection can fire mid-update (a dead sheep is noticed) or at the end
//! of the day (passive surveillance of clinical signs); either way it
//! routes through the same trigger that applies movement bans and
//! records the first observation of the outbreak.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::core::config::{ControlParams, EpiParams, FARM_SUBSTEP, SHEEP_MORT_RATE};
use crate::core::types::DAYS_PER_YEAR;
use crate::entomology::VectorSpecies;
use crate::random;
use crate::simulation::control;
use crate::world::SimulationState;

/// First and last day-of-year (exclusive) of the vector active season
const ACTIVE_SEASON_START: usize = 60;
const ACTIVE_SEASON_END: usize = 330;

/// Ceiling on the climate-regression estimate of bites per animal
const MAX_BITES_PER_ANIMAL: f64 = 5_000.0;

/// Copy today's weather onto the farm and resample its daily noise terms
pub fn farm_get_weather(state: &mut SimulationState, farm_idx: usize, rng: &mut ChaCha8Rng) {
    let doy = state.day_of_year;
    let noise: f64 = rng.sample(StandardNormal);

    let farm = &mut state.farms[farm_idx];
    let (r, c) = farm.temp_cell;
    farm.temp_today = state.weather.temperature[(r, c, doy)];
    let (r, c) = farm.rain_cell;
    farm.mean_rain_last_week = state.weather.rainfall[(r, c, doy)];
    farm.wind_today = 0.0;
    farm.autocorr = 0.0;
    farm.overdispersion = (1.08 + 0.3763) * noise;
}

/// Progress infected animals through their Erlang chains, apply sheep
/// mortality, and check for detection.
///
/// Runs 1/[`FARM_SUBSTEP`] sub-steps per day. Sheep recover out of the
/// final stage and die from any stage; a death on an undetected farm is
/// noticed immediately. Cattle recover identically but do not die.
/// Passive detection of clinical signs runs once at the end of the day.
pub fn farm_deaths_and_recoveries(
    state: &mut SimulationState,
    farm_idx: usize,
    epi: &EpiParams,
    ctrl: &ControlParams,
    rng: &mut ChaCha8Rng,
) {
    let substeps = (1.0 / FARM_SUBSTEP).round() as usize;

    // Sheep: recovery, mortality, and mortality-triggered detection
    if state.farms[farm_idx].num_inf_sheep() > 0.0 {
        let stages = epi.num_inf_stages_sheep;
        let progression_rate = stages as f64 * epi.rec_rate_sheep;
        let last = stages - 1;
        for _ in 0..substeps {
            // Final stage: recovery, then mortality
            let count = state.farms[farm_idx].i_sheep[last];
            let recovered =
                random::poisson_capped(rng, FARM_SUBSTEP * progression_rate * count, count);
            state.farms[farm_idx].i_sheep[last] -= recovered;
            state.farms[farm_idx].r_sheep += recovered;

            let count = state.farms[farm_idx].i_sheep[last];
            let died = random::poisson_capped(rng, FARM_SUBSTEP * SHEEP_MORT_RATE * count, count);
            if died > 0.0 && !state.farms[farm_idx].detected {
                trigger_detection(state, farm_idx, ctrl);
            }
            state.farms[farm_idx].i_sheep[last] -= died;
            state.num_sheep_deaths += died as u32;

            // Earlier stages: progression towards recovery, then mortality
            for n in (0..last).rev() {
                let count = state.farms[farm_idx].i_sheep[n];
                let advanced =
                    random::poisson_capped(rng, FARM_SUBSTEP * progression_rate * count, count);
                state.farms[farm_idx].i_sheep[n] -= advanced;
                state.farms[farm_idx].i_sheep[n + 1] += advanced;

                let count = state.farms[farm_idx].i_sheep[n];
                let died =
                    random::poisson_capped(rng, FARM_SUBSTEP * SHEEP_MORT_RATE * count, count);
                if died > 0.0 && !state.farms[farm_idx].detected {
                    trigger_detection(state, farm_idx, ctrl);
                }
                state.farms[farm_idx].i_sheep[n] -= died;
                state.num_sheep_deaths += died as u32;
            }
        }
    }

    // Cattle: recovery only, no mortality in this model
    if state.farms[farm_idx].num_inf_cattle() > 0.0 {
        let stages = epi.num_inf_stages_cattle;
        let progression_rate = stages as f64 * epi.rec_rate_cattle;
        let last = stages - 1;
        for _ in 0..substeps {
            let count = state.farms[farm_idx].i_cattle[last];
            let recovered =
                random::poisson_capped(rng, FARM_SUBSTEP * progression_rate * count, count);
            state.farms[farm_idx].i_cattle[last] -= recovered;
            state.farms[farm_idx].r_cattle += recovered;

            for n in (0..last).rev() {
                let count = state.farms[farm_idx].i_cattle[n];
                let advanced =
                    random::poisson_capped(rng, FARM_SUBSTEP * progression_rate * count, count);
                state.farms[farm_idx].i_cattle[n] -= advanced;
                state.farms[farm_idx].i_cattle[n + 1] += advanced;
            }
        }
    }

    // Passive detection: the chance that at least one of today's
    // infected animals shows signs and is reported
    if !state.farms[farm_idx].detected {
        let inf_cattle = state.farms[farm_idx].num_inf_cattle();
        let inf_sheep = state.farms[farm_idx].num_inf_sheep();
        if inf_cattle + inf_sheep > 0.0 {
            let none_detected = (inf_cattle * (1.0 - epi.detection_prob_cattle).ln()
                + inf_sheep * (1.0 - epi.detection_prob_sheep).ln())
            .exp();
            if random::uniform(rng) <= 1.0 - none_detected {
                trigger_detection(state, farm_idx, ctrl);
            }
        }
    }
}

/// Mark a farm detected and apply the immediate consequences: daily
/// counter, movement bans, and first-observation bookkeeping.
fn trigger_detection(state: &mut SimulationState, farm_idx: usize, ctrl: &ControlParams) {
    state.farms[farm_idx].detected = true;
    state.num_farms_detected_today += 1;

    if ctrl.no_control {
        return;
    }
    if !ctrl.no_farm_ban {
        state.farms[farm_idx].movement_banned = true;
    }
    control::implement_local_movement_ban(state, farm_idx, ctrl);
    if !state.btv_observed {
        state.btv_observed = true;
        state.first_detected_farm_id = Some(farm_idx);
        log::debug!(
            "first detection on farm {} (day {})",
            state.farms[farm_idx].id,
            state.simulation_day
        );
    }
}

/// Infect susceptible livestock from the local infectious midge field
pub fn farm_transmission_midges_to_hosts(
    state: &mut SimulationState,
    farm_idx: usize,
    epi: &EpiParams,
    species: &dyn VectorSpecies,
    rng: &mut ChaCha8Rng,
) {
    let farm = &state.farms[farm_idx];
    let biting_prob = 1.0 - (-species.biting_rate(farm.temp_today)).exp();
    let (r, c) = farm.midge_cell;
    let inf_density = state.midges.infectious[(r, c)];
    let force = farm.rel_local_weight * inf_density * biting_prob;
    state.farms[farm_idx].force = force;

    let eff_animals = state.farms[farm_idx].eff_num_animals(epi.preference_for_sheep);
    if eff_animals < 1.0 {
        return;
    }

    let prob_bite_sheep = epi.preference_for_sheep / eff_animals;
    let prob_bite_cattle = 1.0 / eff_animals;
    let prob_inf_sheep = 1.0 - (-force * prob_bite_sheep * epi.p_h).exp();
    let prob_inf_cattle = 1.0 - (-force * prob_bite_cattle * epi.p_h).exp();

    let new_sheep = draw_new_infections(rng, state.farms[farm_idx].s_sheep, prob_inf_sheep);
    let new_cattle = draw_new_infections(rng, state.farms[farm_idx].s_cattle, prob_inf_cattle);

    let farm = &mut state.farms[farm_idx];
    farm.s_sheep -= new_sheep;
    farm.i_sheep[0] += new_sheep;
    farm.s_cattle -= new_cattle;
    farm.i_cattle[0] += new_cattle;
    if new_sheep + new_cattle > 0.0 {
        farm.ever_been_infected = true;
    }
    state.num_sheep_infected_today += new_sheep as u32;
    state.num_cattle_infected_today += new_cattle as u32;
}

/// Binomial draw of new infections, with the Poisson shortcut for large
/// herds at small per-head probability
fn draw_new_infections(rng: &mut ChaCha8Rng, susceptible: f64, prob: f64) -> f64 {
    if susceptible > 100.0 && prob < 0.01 && susceptible * prob < 20.0 {
        random::poisson_capped(rng, susceptible * prob, susceptible)
    } else {
        random::binomial(rng, susceptible as u64, prob) as f64
    }
}

/// Seed the latent midge field from this farm's infected animals.
///
/// Only during the vector active season. The expected number of bites
/// per animal comes from the farm-level climate regression; the deposit
/// into the first EIP stage is `p_v * effective_infected * bites`.
pub fn farm_transmission_hosts_to_midges(
    state: &mut SimulationState,
    farm_idx: usize,
    epi: &EpiParams,
) {
    if state.day_of_year <= ACTIVE_SEASON_START || state.day_of_year >= ACTIVE_SEASON_END {
        return;
    }

    let farm = &state.farms[farm_idx];
    let day = state.simulation_day as f64;
    let year = DAYS_PER_YEAR as f64 + 0.25;
    use std::f64::consts::PI;

    let mut climate = farm.v_intercept;
    climate += farm.sin_yearly * (2.0 * PI * day / year).sin();
    climate += farm.cos_yearly * (2.0 * PI * day / year).cos();
    climate += farm.sin_6_month * (4.0 * PI * day / year).sin();
    climate += farm.cos_6_month * (4.0 * PI * day / year).cos();
    climate += farm.cos_4_month * (6.0 * PI * day / year).cos();
    climate += farm.temp_eff * farm.temp_today + farm.temp_eff_sq * farm.temp_today * farm.temp_today;
    climate += farm.overdispersion + farm.autocorr;

    let bites_per_animal = (epi.transmission_scalar * climate.exp()).min(MAX_BITES_PER_ANIMAL);
    let eff_inf = farm.eff_num_inf_animals(epi.preference_for_sheep);
    let new_latent = epi.p_v * eff_inf * bites_per_animal;

    let (r, c) = farm.midge_cell;
    state.midges.latent[(r, c, 0)] += new_latent;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;
    use crate::core::types::Vec2;
    use crate::entomology::Culicoides;
    use crate::world::{Farm, MidgeGrids, SimulationState, WeatherGrids};
    use rand::SeedableRng;

    fn one_farm_state(config: &ModelConfig, temperature: f64) -> SimulationState {
        let mut state = SimulationState::new(
            MidgeGrids::new(3, 3, config.epi.num_eip_stages),
            WeatherGrids::constant(3, 3, temperature, 0.0),
        );
        state.add_farm(Farm::new(
            0,
            Vec2::new(0.0, 0.0),
            config.epi.num_inf_stages_sheep,
            config.epi.num_inf_stages_cattle,
        ));
        state
    }

    #[test]
    fn test_weather_read_caches_grid_values() {
        let config = ModelConfig::default();
        let mut state = one_farm_state(&config, 17.5);
        state.weather.rainfall.fill(2.25);
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        farm_get_weather(&mut state, 0, &mut rng);

        let farm = &state.farms[0];
        assert_eq!(farm.temp_today, 17.5);
        assert_eq!(farm.mean_rain_last_week, 2.25);
        assert_eq!(farm.wind_today, 0.0);
        assert_eq!(farm.autocorr, 0.0);
        assert!(farm.overdispersion.is_finite());
    }

    #[test]
    fn test_cattle_conserved_through_recovery() {
        let config = ModelConfig::default();
        let mut state = one_farm_state(&config, 15.0);
        state.farms[0].number_of_cattle = 200.0;
        state.farms[0].s_cattle = 100.0;
        state.farms[0].i_cattle[0] = 100.0;
        let mut rng = ChaCha8Rng::seed_from_u64(22);

        for _ in 0..50 {
            farm_deaths_and_recoveries(&mut state, 0, &config.epi, &config.control, &mut rng);
        }

        assert_eq!(state.farms[0].num_cattle(), 200.0, "no cattle die or leave");
        assert!(state.farms[0].r_cattle > 0.0, "some cattle should have recovered");
        for stage in &state.farms[0].i_cattle {
            assert!(*stage >= 0.0);
        }
    }

    #[test]
    fn test_sheep_deaths_reduce_total_and_are_counted() {
        let mut config = ModelConfig::default();
        config.epi.rec_rate_sheep = 0.0; // isolate mortality
        let mut state = one_farm_state(&config, 15.0);
        state.farms[0].number_of_sheep = 1000.0;
        state.farms[0].i_sheep[0] = 1000.0;
        let mut rng = ChaCha8Rng::seed_from_u64(23);

        for _ in 0..100 {
            farm_deaths_and_recoveries(&mut state, 0, &config.epi, &config.control, &mut rng);
        }

        let deaths = state.num_sheep_deaths as f64;
        assert!(deaths > 0.0, "a kiloflock held for 100 days should lose sheep");
        assert_eq!(state.farms[0].num_sheep(), 1000.0 - deaths);
    }

    #[test]
    fn test_sheep_death_triggers_detection_and_ban() {
        let mut config = ModelConfig::default();
        config.epi.rec_rate_sheep = 0.0;
        config.epi.detection_prob_sheep = 0.0;
        config.epi.detection_prob_cattle = 0.0;
        let mut state = one_farm_state(&config, 15.0);
        state.farms[0].number_of_sheep = 5000.0;
        state.farms[0].i_sheep[0] = 5000.0;
        let mut rng = ChaCha8Rng::seed_from_u64(24);

        for _ in 0..200 {
            farm_deaths_and_recoveries(&mut state, 0, &config.epi, &config.control, &mut rng);
            if state.farms[0].detected {
                break;
            }
        }

        assert!(state.farms[0].detected, "mortality should eventually be noticed");
        assert!(state.farms[0].movement_banned);
        assert!(state.btv_observed);
        assert_eq!(state.first_detected_farm_id, Some(0));
    }

    #[test]
    fn test_certain_passive_detection() {
        let mut config = ModelConfig::default();
        config.epi.detection_prob_cattle = 1.0;
        let mut state = one_farm_state(&config, 15.0);
        state.farms[0].number_of_cattle = 50.0;
        state.farms[0].i_cattle[0] = 10.0;
        let mut rng = ChaCha8Rng::seed_from_u64(25);

        farm_deaths_and_recoveries(&mut state, 0, &config.epi, &config.control, &mut rng);

        assert!(state.farms[0].detected);
        assert_eq!(state.num_farms_detected_today, 1);
    }

    #[test]
    fn test_no_detection_without_infection() {
        let config = ModelConfig::default();
        let mut state = one_farm_state(&config, 15.0);
        state.farms[0].s_sheep = 100.0;
        state.farms[0].s_cattle = 100.0;
        let mut rng = ChaCha8Rng::seed_from_u64(26);

        farm_deaths_and_recoveries(&mut state, 0, &config.epi, &config.control, &mut rng);

        assert!(!state.farms[0].detected);
        assert_eq!(state.num_farms_detected_today, 0);
    }

    #[test]
    fn test_midges_to_hosts_infects_from_the_field() {
        let config = ModelConfig::default();
        let mut state = one_farm_state(&config, 20.0);
        state.farms[0] = state.farms[0].clone().with_stock(500.0, 500.0);
        state.farms[0].temp_today = 20.0;
        state.midges.infectious[(0, 0)] = 50_000.0;
        let mut rng = ChaCha8Rng::seed_from_u64(27);

        farm_transmission_midges_to_hosts(&mut state, 0, &config.epi, &Culicoides, &mut rng);

        let farm = &state.farms[0];
        assert!(farm.force > 0.0);
        let new_infections = farm.i_sheep[0] + farm.i_cattle[0];
        assert!(new_infections > 0.0, "a dense infectious field should infect");
        assert_eq!(farm.num_sheep(), 500.0);
        assert_eq!(farm.num_cattle(), 500.0);
        assert!(farm.ever_been_infected);
        assert_eq!(
            state.num_sheep_infected_today + state.num_cattle_infected_today,
            new_infections as u32
        );
    }

    #[test]
    fn test_zero_p_h_blocks_host_infection() {
        let mut config = ModelConfig::default();
        config.epi.p_h = 0.0;
        let mut state = one_farm_state(&config, 20.0);
        state.farms[0] = state.farms[0].clone().with_stock(500.0, 500.0);
        state.farms[0].temp_today = 20.0;
        state.midges.infectious[(0, 0)] = 50_000.0;
        let mut rng = ChaCha8Rng::seed_from_u64(28);

        farm_transmission_midges_to_hosts(&mut state, 0, &config.epi, &Culicoides, &mut rng);

        assert_eq!(state.farms[0].s_sheep, 500.0);
        assert_eq!(state.farms[0].s_cattle, 500.0);
        assert_eq!(state.num_sheep_infected_today, 0);
        assert_eq!(state.num_cattle_infected_today, 0);
    }

    #[test]
    fn test_empty_farm_is_skipped() {
        let config = ModelConfig::default();
        let mut state = one_farm_state(&config, 20.0);
        state.farms[0].temp_today = 20.0;
        state.midges.infectious[(0, 0)] = 50_000.0;
        let mut rng = ChaCha8Rng::seed_from_u64(29);

        farm_transmission_midges_to_hosts(&mut state, 0, &config.epi, &Culicoides, &mut rng);

        assert!(!state.farms[0].is_infected());
    }

    #[test]
    fn test_hosts_to_midges_gated_by_season() {
        let config = ModelConfig::default();
        let mut state = one_farm_state(&config, 20.0);
        state.farms[0].number_of_cattle = 10.0;
        state.farms[0].i_cattle[0] = 5.0;
        state.farms[0].v_intercept = 1.0;

        state.simulation_day = 30;
        state.day_of_year = 30;
        farm_transmission_hosts_to_midges(&mut state, 0, &config.epi);
        assert_eq!(state.midges.latent[(0, 0, 0)], 0.0, "out of season");

        state.simulation_day = 200;
        state.day_of_year = 200;
        farm_transmission_hosts_to_midges(&mut state, 0, &config.epi);
        assert!(state.midges.latent[(0, 0, 0)] > 0.0, "in season");
    }

    #[test]
    fn test_hosts_to_midges_deposit_matches_regression() {
        let mut config = ModelConfig::default();
        config.epi.p_v = 0.2;
        config.epi.transmission_scalar = 1.5;
        let mut state = one_farm_state(&config, 0.0);
        state.farms[0].number_of_cattle = 10.0;
        state.farms[0].i_cattle[0] = 4.0;
        state.farms[0].number_of_sheep = 10.0;
        state.farms[0].i_sheep[0] = 2.0;
        // Only the intercept contributes: temperature is 0 and every
        // other coefficient is left at zero.
        state.farms[0].v_intercept = 2.0;
        state.simulation_day = 200;
        state.day_of_year = 200;

        farm_transmission_hosts_to_midges(&mut state, 0, &config.epi);

        let bites = (1.5 * 2.0f64.exp()).min(5_000.0);
        let eff_inf = 4.0 + config.epi.preference_for_sheep * 2.0;
        let expected = 0.2 * eff_inf * bites;
        assert!(
            (state.midges.latent[(0, 0, 0)] - expected).abs() < 1e-9,
            "deposit {} vs expected {}",
            state.midges.latent[(0, 0, 0)],
            expected
        );
    }

    #[test]
    fn test_zero_p_v_seeds_no_midges() {
        let mut config = ModelConfig::default();
        config.epi.p_v = 0.0;
        let mut state = one_farm_state(&config, 20.0);
        state.farms[0].number_of_cattle = 10.0;
        state.farms[0].i_cattle[0] = 5.0;
        state.simulation_day = 200;
        state.day_of_year = 200;

        farm_transmission_hosts_to_midges(&mut state, 0, &config.epi);

        assert_eq!(state.midges.latent.sum(), 0.0);
    }
}
