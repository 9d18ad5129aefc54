//! Daily simulation pipeline
//!
//! One call to [`simulate_day`] advances the world exactly one day
//! through six phases in fixed order:
//! 1. Zero the daily counters
//! 2. Control step (restriction zones, active surveillance)
//! 3. Midge mortality and EIP progression
//! 4. Midge diffusion for the day
//! 5. Movement transmission over the edge list
//! 6. Per farm, in stored order: weather, deaths/recoveries,
//!    midge-to-host, host-to-midge
//!
//! The order is load-bearing: control reads the previous day's
//! detections, midge dynamics must precede transmission so today's
//! infectious field reflects survival and emergence, and host-to-midge
//! seeding runs last so deposits only feed the next day's dynamics.

pub mod control;
pub mod farm_epi;
pub mod midge_dynamics;
pub mod movement;

pub use control::apply_control_measures;
pub use farm_epi::{
    farm_deaths_and_recoveries, farm_get_weather, farm_transmission_hosts_to_midges,
    farm_transmission_midges_to_hosts,
};
pub use midge_dynamics::{midge_diffusion_for_day, midge_mortality_and_incubation};
pub use movement::movement_transmission;

use rand_chacha::ChaCha8Rng;

use crate::core::config::ModelConfig;
use crate::core::types::DAYS_PER_YEAR;
use crate::entomology::VectorSpecies;
use crate::world::SimulationState;

/// Run one complete day of the simulation and advance the clock
pub fn simulate_day(
    state: &mut SimulationState,
    config: &ModelConfig,
    species: &dyn VectorSpecies,
    rng: &mut ChaCha8Rng,
) {
    state.reset_daily_counters();

    apply_control_measures(state, &config.control);

    midge_mortality_and_incubation(state, &config.epi, &config.grids, species);
    midge_diffusion_for_day(state, &config.sim, &config.epi, &config.grids);

    movement_transmission(state, &config.movement, rng);

    for k in 0..state.farms.len() {
        farm_get_weather(state, k, rng);
        farm_deaths_and_recoveries(state, k, &config.epi, &config.control, rng);
        farm_transmission_midges_to_hosts(state, k, &config.epi, species, rng);
        farm_transmission_hosts_to_midges(state, k, &config.epi);
    }

    state.simulation_day += 1;
    state.day_of_year = state.simulation_day % DAYS_PER_YEAR;

    end_of_day_bookkeeping(state);
}

/// Roll the daily outcome into the long-running control statistics
fn end_of_day_bookkeeping(state: &mut SimulationState) {
    if state.num_farms_detected_today > 0 {
        state.days_since_last_detection = 0;
    } else if state.btv_observed {
        state.days_since_last_detection += 1;
    }

    let banned = state.farms.iter().filter(|f| f.movement_banned).count();
    if banned > 0 {
        state.days_of_movement_ban += 1;
    }
    state.total_farm_days_movement_banned += banned as u64;
    state.total_farm_days_affected_by_control +=
        state.farms.iter().filter(|f| !f.free_area).count() as u64;
}
