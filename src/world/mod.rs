//! SimulationState - the mutable world a run evolves
//!
//! Farms, midge grids, the movement network, daily and cumulative
//! counters, and outbreak tracking flags. Topology (farms, grids, edges)
//! is populated once by an external loader before day 0; only the fields
//! documented as mutable evolve after that.

pub mod farm;
pub mod grids;
pub mod movement;

pub use farm::Farm;
pub use grids::{MidgeGrids, WeatherGrids};
pub use movement::MovementNetwork;

use crate::core::config::ModelConfig;
use crate::core::error::{Result, VectraError};
use crate::core::types::DAYS_PER_YEAR;

/// Top-level mutable state for a single simulation run
pub struct SimulationState {
    /// Days elapsed since the start of the run
    pub simulation_day: usize,
    /// `simulation_day % 365`; indexes the weather grids
    pub day_of_year: usize,

    pub farms: Vec<Farm>,
    pub midges: MidgeGrids,
    pub weather: WeatherGrids,
    pub movements: MovementNetwork,

    // Daily counters, zeroed at the start of every day
    pub num_farms_detected_today: u32,
    pub num_sheep_infected_today: u32,
    pub num_cattle_infected_today: u32,
    pub num_sheep_deaths: u32,

    // Cumulative counters
    pub interrupted_movements: u32,
    pub num_risky_moves_blocked: u32,
    pub num_movement_transmissions: u32,
    pub num_farms_checked: u32,
    pub num_tests: u64,
    pub num_pos_tests: u64,
    pub days_of_movement_ban: u32,
    pub total_farm_days_movement_banned: u64,
    pub total_farm_days_affected_by_control: u64,

    // Outbreak tracking
    pub btv_observed: bool,
    /// Index of the farm whose detection first revealed the outbreak
    pub first_detected_farm_id: Option<usize>,
    pub restriction_zones_implemented: bool,
    pub active_surveillance_performed: bool,
    pub days_since_last_detection: u32,
}

impl SimulationState {
    pub fn new(midges: MidgeGrids, weather: WeatherGrids) -> Self {
        Self {
            simulation_day: 0,
            day_of_year: 0,
            farms: Vec::new(),
            midges,
            weather,
            movements: MovementNetwork::new(),
            num_farms_detected_today: 0,
            num_sheep_infected_today: 0,
            num_cattle_infected_today: 0,
            num_sheep_deaths: 0,
            interrupted_movements: 0,
            num_risky_moves_blocked: 0,
            num_movement_transmissions: 0,
            num_farms_checked: 0,
            num_tests: 0,
            num_pos_tests: 0,
            days_of_movement_ban: 0,
            total_farm_days_movement_banned: 0,
            total_farm_days_affected_by_control: 0,
            btv_observed: false,
            first_detected_farm_id: None,
            restriction_zones_implemented: false,
            active_surveillance_performed: false,
            days_since_last_detection: 0,
        }
    }

    /// Register a farm and return its index
    pub fn add_farm(&mut self, farm: Farm) -> usize {
        self.farms.push(farm);
        self.farms.len() - 1
    }

    pub fn add_movement_link(&mut self, from: usize, to: usize, risk: f64) {
        self.movements.push(from, to, risk);
    }

    /// Zero the per-day counters; the orchestrator calls this first
    /// thing every day
    pub fn reset_daily_counters(&mut self) {
        self.num_farms_detected_today = 0;
        self.num_sheep_infected_today = 0;
        self.num_cattle_infected_today = 0;
        self.num_sheep_deaths = 0;
    }

    /// Fail-fast consistency check between the loaded world and the
    /// configuration; must pass before the first `simulate_day`.
    pub fn validate(&self, config: &ModelConfig) -> Result<()> {
        config.validate()?;

        let rows = self.midges.rows();
        let cols = self.midges.cols();
        if rows == 0 || cols == 0 {
            return Err(VectraError::GridMismatch("midge grid has zero extent".into()));
        }
        if self.weather.rows() != rows || self.weather.cols() != cols {
            return Err(VectraError::GridMismatch(format!(
                "weather grids are {}x{} but midge grids are {}x{}",
                self.weather.rows(),
                self.weather.cols(),
                rows,
                cols
            )));
        }
        if self.weather.temperature.dim().2 != DAYS_PER_YEAR {
            return Err(VectraError::GridMismatch(format!(
                "temperature grid carries {} days, expected {}",
                self.weather.temperature.dim().2,
                DAYS_PER_YEAR
            )));
        }
        if self.midges.num_eip_stages() != config.epi.num_eip_stages {
            return Err(VectraError::GridMismatch(format!(
                "midge grids hold {} EIP stages but config asks for {}",
                self.midges.num_eip_stages(),
                config.epi.num_eip_stages
            )));
        }

        for (k, farm) in self.farms.iter().enumerate() {
            for (what, (r, c)) in [
                ("temp_cell", farm.temp_cell),
                ("rain_cell", farm.rain_cell),
                ("midge_cell", farm.midge_cell),
            ] {
                if r >= rows || c >= cols {
                    return Err(VectraError::InvalidFarm {
                        farm: k,
                        problem: format!("{} ({}, {}) outside {}x{} grid", what, r, c, rows, cols),
                    });
                }
            }
            if farm.i_sheep.len() != config.epi.num_inf_stages_sheep {
                return Err(VectraError::InvalidFarm {
                    farm: k,
                    problem: format!(
                        "sheep chain has {} stages, config asks for {}",
                        farm.i_sheep.len(),
                        config.epi.num_inf_stages_sheep
                    ),
                });
            }
            if farm.i_cattle.len() != config.epi.num_inf_stages_cattle {
                return Err(VectraError::InvalidFarm {
                    farm: k,
                    problem: format!(
                        "cattle chain has {} stages, config asks for {}",
                        farm.i_cattle.len(),
                        config.epi.num_inf_stages_cattle
                    ),
                });
            }
            let counts = farm
                .i_sheep
                .iter()
                .chain(farm.i_cattle.iter())
                .chain([&farm.s_sheep, &farm.r_sheep, &farm.s_cattle, &farm.r_cattle]);
            for value in counts {
                if !value.is_finite() || *value < 0.0 {
                    return Err(VectraError::InvalidFarm {
                        farm: k,
                        problem: format!("compartment count {} is not a valid animal count", value),
                    });
                }
            }
        }

        for k in 0..self.movements.len() {
            let (from, to) = (self.movements.from[k], self.movements.to[k]);
            if from >= self.farms.len() || to >= self.farms.len() {
                return Err(VectraError::InvalidMovementLink {
                    link: k,
                    problem: format!("endpoints ({}, {}) outside farm roster", from, to),
                });
            }
            if from == to {
                return Err(VectraError::InvalidMovementLink {
                    link: k,
                    problem: "self-loop".into(),
                });
            }
            let risk = self.movements.risk[k];
            if !(0.0..=1.0).contains(&risk) {
                return Err(VectraError::InvalidMovementLink {
                    link: k,
                    problem: format!("risk {} outside [0, 1]", risk),
                });
            }
        }

        Ok(())
    }
}
