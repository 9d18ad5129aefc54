//! Model configuration with documented parameters
//!
//! Parameters are grouped by concern: run settings, epidemiology, control
//! policy, spatial grids, and shipment sizes. External loaders populate
//! these from whatever source they like; `validate()` is the fail-fast
//! gate that must pass before day 0.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, VectraError};

/// Upper bound on Erlang infectious stages accepted by validation.
/// Storage is dynamic; the bound only catches nonsense configurations.
pub const MAX_INF_STAGES: usize = 20;

/// Upper bound on extrinsic-incubation stages accepted by validation.
pub const MAX_EIP_STAGES: usize = 20;

/// Sub-day timestep for farm-level dynamics (days).
///
/// Fixed: the farm update loop always runs 1/FARM_SUBSTEP sub-steps per
/// day. `SimulationParams::dt_farm` is carried for loaders but ignored;
/// `validate()` logs a warning when the two disagree.
pub const FARM_SUBSTEP: f64 = 0.1;

/// Daily mortality rate for infected sheep.
///
/// Fixed alongside [`FARM_SUBSTEP`]: `EpiParams::sheep_mort_rate` is
/// carried for loaders but the model always uses this value.
pub const SHEEP_MORT_RATE: f64 = 0.0055;

/// Parameters controlling a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Timestep for the explicit-Euler midge diffusion sub-steps (days).
    ///
    /// Diffusion repeats sub-steps of this size until a full day has
    /// elapsed. Must satisfy the usual explicit stability bound for the
    /// diffusion coefficients in use.
    pub dt: f64,

    /// Timestep for farm-level dynamics (days). Declared for loaders;
    /// the model uses the fixed [`FARM_SUBSTEP`] regardless.
    pub dt_farm: f64,

    /// Initial density of infectious midges at the seed location
    pub initial_density_inf_midges: f64,

    /// Spatial extent of the initial seeding around the central site (metres)
    pub initial_width_from_central_site: f64,

    /// County number where the outbreak is seeded
    pub outbreak_county: f64,

    /// Total number of days to simulate
    pub num_days: usize,

    /// Number of Monte Carlo repetitions (consumed by the outer driver)
    pub num_reps: usize,

    /// Day of year on which the run starts (0-364)
    pub start_day_of_year: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            dt: 0.25,
            dt_farm: FARM_SUBSTEP,
            initial_density_inf_midges: 10.0,
            initial_width_from_central_site: 5_000.0,
            outbreak_county: 0.0,
            num_days: 365,
            num_reps: 1,
            start_day_of_year: 152,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt <= 1.0) {
            return Err(VectraError::InvalidConfig(format!(
                "dt must be in (0, 1], got {}",
                self.dt
            )));
        }
        if self.num_days == 0 {
            return Err(VectraError::InvalidConfig("num_days must be > 0".into()));
        }
        if self.start_day_of_year >= crate::core::types::DAYS_PER_YEAR {
            return Err(VectraError::InvalidConfig(format!(
                "start_day_of_year must be < 365, got {}",
                self.start_day_of_year
            )));
        }
        if (self.dt_farm - FARM_SUBSTEP).abs() > 1e-12 {
            log::warn!(
                "dt_farm = {} is declared but farm dynamics run at the fixed sub-step {}",
                self.dt_farm,
                FARM_SUBSTEP
            );
        }
        Ok(())
    }
}

/// Epidemiological parameters for BTV transmission and disease
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpiParams {
    /// Daily probability that one infected cow is noticed and reported
    pub detection_prob_cattle: f64,

    /// Daily probability that one infected sheep is noticed and reported
    pub detection_prob_sheep: f64,

    /// Length scale for midge diffusion (metres)
    pub diffusion_length_scale: f64,

    /// Erlang stages for the sheep infectious period
    pub num_inf_stages_sheep: usize,

    /// Erlang stages for the cattle infectious period
    pub num_inf_stages_cattle: usize,

    /// Stages for the extrinsic incubation period of the vector
    pub num_eip_stages: usize,

    /// Probability a vector is infected per bite on an infectious host
    pub p_v: f64,

    /// Probability a host is infected per bite from an infectious vector
    pub p_h: f64,

    /// Daily mortality rate for infected sheep. Declared for loaders;
    /// the model uses the fixed [`SHEEP_MORT_RATE`] regardless.
    pub sheep_mort_rate: f64,

    /// Recovery rate for sheep (per day); the Erlang chain passes animals
    /// through each stage at `num_stages * rate`
    pub rec_rate_sheep: f64,

    /// Recovery rate for cattle (per day)
    pub rec_rate_cattle: f64,

    /// Vector feeding preference for sheep relative to cattle
    pub preference_for_sheep: f64,

    /// Scalar on the climate-regression estimate of bites per animal
    pub transmission_scalar: f64,
}

impl Default for EpiParams {
    fn default() -> Self {
        Self {
            detection_prob_cattle: 0.005,
            detection_prob_sheep: 0.02,
            diffusion_length_scale: 5_000.0,
            num_inf_stages_sheep: 5,
            num_inf_stages_cattle: 5,
            num_eip_stages: 10,
            p_v: 0.15,
            p_h: 0.9,
            sheep_mort_rate: SHEEP_MORT_RATE,
            rec_rate_sheep: 0.061,
            rec_rate_cattle: 0.049,
            preference_for_sheep: 0.13,
            transmission_scalar: 1.0,
        }
    }
}

impl EpiParams {
    pub fn validate(&self) -> Result<()> {
        let stage_counts = [
            ("num_inf_stages_sheep", self.num_inf_stages_sheep, MAX_INF_STAGES),
            ("num_inf_stages_cattle", self.num_inf_stages_cattle, MAX_INF_STAGES),
            ("num_eip_stages", self.num_eip_stages, MAX_EIP_STAGES),
        ];
        for (name, count, max) in stage_counts {
            if count == 0 || count > max {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be in 1..={}, got {}",
                    name, max, count
                )));
            }
        }
        let probabilities = [
            ("detection_prob_cattle", self.detection_prob_cattle),
            ("detection_prob_sheep", self.detection_prob_sheep),
            ("p_v", self.p_v),
            ("p_h", self.p_h),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be a probability, got {}",
                    name, p
                )));
            }
        }
        let rates = [
            ("rec_rate_sheep", self.rec_rate_sheep),
            ("rec_rate_cattle", self.rec_rate_cattle),
            ("preference_for_sheep", self.preference_for_sheep),
            ("transmission_scalar", self.transmission_scalar),
        ];
        for (name, r) in rates {
            if r < 0.0 {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be >= 0, got {}",
                    name, r
                )));
            }
        }
        Ok(())
    }
}

/// Parameters defining disease control measures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlParams {
    /// Radius of the local movement ban around detected farms (metres)
    pub ban_radius: f64,

    /// On detection, ban all movement within the county of the detected farm
    pub county_ban: bool,

    /// Disable every control measure
    pub no_control: bool,

    /// Disable farm-level movement bans (zones still apply)
    pub no_farm_ban: bool,

    /// Require pre-movement testing (reserved; not consumed by the core)
    pub pre_movement_tests: bool,

    /// Radius of the protection zone (metres)
    pub pz_radius: f64,

    /// Enable protection and surveillance zones on first detection
    pub restriction_zones: bool,

    /// Radius of the surveillance zone (metres)
    pub sz_radius: f64,

    /// On detection, ban all animal movement nationally
    pub total_ban: bool,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            ban_radius: 10_000.0,
            county_ban: false,
            no_control: false,
            no_farm_ban: false,
            pre_movement_tests: false,
            pz_radius: 100_000.0,
            restriction_zones: true,
            sz_radius: 150_000.0,
            total_ban: false,
        }
    }
}

impl ControlParams {
    pub fn validate(&self) -> Result<()> {
        for (name, r) in [
            ("ban_radius", self.ban_radius),
            ("pz_radius", self.pz_radius),
            ("sz_radius", self.sz_radius),
        ] {
            if r < 0.0 {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be >= 0, got {}",
                    name, r
                )));
            }
        }
        if self.pz_radius > self.sz_radius {
            return Err(VectraError::InvalidConfig(format!(
                "pz_radius ({}) must be <= sz_radius ({})",
                self.pz_radius, self.sz_radius
            )));
        }
        Ok(())
    }
}

/// Parameters defining the spatial grid resolutions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    /// Grid cell width for the autocorrelation field (metres)
    pub autocorr_grid_width: f64,

    /// Discretisation parameter for the diffusion solver
    pub discretisation: f64,

    /// Grid cell width for midge density (metres)
    pub midge_grid_width: f64,

    /// Grid cell width for rainfall data (metres)
    pub rain_grid_width: f64,

    /// Grid cell width for temperature data (metres)
    pub temp_grid_width: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            autocorr_grid_width: 5_000.0,
            discretisation: 1.0,
            midge_grid_width: 5_000.0,
            rain_grid_width: 5_000.0,
            temp_grid_width: 5_000.0,
        }
    }
}

impl GridParams {
    /// Stride of the temperature-to-midge block coupling: one temperature
    /// cell drives `stride x stride` midge cells.
    pub fn temp_to_midge_stride(&self) -> usize {
        (self.midge_grid_width / self.temp_grid_width).round().max(1.0) as usize
    }

    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("autocorr_grid_width", self.autocorr_grid_width),
            ("midge_grid_width", self.midge_grid_width),
            ("rain_grid_width", self.rain_grid_width),
            ("temp_grid_width", self.temp_grid_width),
        ] {
            if w <= 0.0 {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be > 0, got {}",
                    name, w
                )));
            }
        }
        let ratio = self.midge_grid_width / self.temp_grid_width;
        if ratio < 1.0 - 1e-9 || (ratio - ratio.round()).abs() > 1e-9 {
            return Err(VectraError::InvalidConfig(format!(
                "midge_grid_width must be an integer multiple of temp_grid_width, ratio is {}",
                ratio
            )));
        }
        Ok(())
    }
}

/// Negative-binomial shipment-size parameters per species
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementParams {
    pub cattle_shipment_size_k: f64,
    pub cattle_shipment_size_p: f64,
    pub sheep_shipment_size_k: f64,
    pub sheep_shipment_size_p: f64,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            cattle_shipment_size_k: 0.6,
            cattle_shipment_size_p: 0.98,
            sheep_shipment_size_k: 0.35,
            sheep_shipment_size_p: 0.997,
        }
    }
}

impl MovementParams {
    pub fn validate(&self) -> Result<()> {
        for (name, k) in [
            ("cattle_shipment_size_k", self.cattle_shipment_size_k),
            ("sheep_shipment_size_k", self.sheep_shipment_size_k),
        ] {
            if k <= 0.0 {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be > 0, got {}",
                    name, k
                )));
            }
        }
        for (name, p) in [
            ("cattle_shipment_size_p", self.cattle_shipment_size_p),
            ("sheep_shipment_size_p", self.sheep_shipment_size_p),
        ] {
            if !(p > 0.0 && p < 1.0) {
                return Err(VectraError::InvalidConfig(format!(
                    "{} must be in (0, 1), got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }
}

/// Full model configuration: one struct per concern, nested
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub sim: SimulationParams,
    pub epi: EpiParams,
    pub control: ControlParams,
    pub grids: GridParams,
    pub movement: MovementParams,
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        self.sim.validate()?;
        self.epi.validate()?;
        self.control.validate()?;
        self.grids.validate()?;
        self.movement.validate()?;
        Ok(())
    }
}
