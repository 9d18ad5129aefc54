//! Farm state: demography, staged SIR compartments, control flags

use crate::core::types::Vec2;

/// State of a single livestock holding during a run.
///
/// Compartment counts are stored as reals but represent whole animals;
/// every stochastic update moves whole animals and clamps draws so
/// counts never go negative. Infectious animals sit in an ordered Erlang
/// chain per species, entering at stage 0 and recovering out of the last.
#[derive(Debug, Clone)]
pub struct Farm {
    pub id: usize,

    /// Location in projected map coordinates (metres)
    pub position: Vec2,
    pub county_number: f64,

    /// Cached (row, col) indices into each grid this farm reads
    pub temp_cell: (usize, usize),
    pub rain_cell: (usize, usize),
    pub midge_cell: (usize, usize),
    pub ac_cell: (usize, usize),

    // Vector-abundance regression coefficients (farm-level random effects)
    pub v_intercept: f64,
    pub sin_yearly: f64,
    pub cos_yearly: f64,
    pub sin_6_month: f64,
    pub cos_6_month: f64,
    pub cos_4_month: f64,
    pub temp_eff: f64,
    pub temp_eff_sq: f64,
    pub rain_eff: f64,
    pub wind_eff: f64,
    /// Spatial autocorrelation noise, resampled with the daily weather
    pub autocorr: f64,
    /// Overdispersion noise, resampled with the daily weather
    pub overdispersion: f64,

    // Host demography and SIR state
    pub number_of_sheep: f64,
    pub number_of_cattle: f64,
    pub s_sheep: f64,
    pub i_sheep: Vec<f64>,
    pub r_sheep: f64,
    pub s_cattle: f64,
    pub i_cattle: Vec<f64>,
    pub r_cattle: f64,

    /// Relative attractiveness weight among local farms
    pub rel_local_weight: f64,
    /// Midge-to-host force of infection, cached each day
    pub force: f64,

    // Control status
    pub detected: bool,
    pub movement_banned: bool,
    pub protection_zone: bool,
    pub surveillance_zone: bool,
    pub free_area: bool,
    pub ever_been_detected: bool,
    pub ever_been_infected: bool,
    pub first_infected_due_to_movement: bool,

    /// Indices of farms within the ban radius; built lazily on this
    /// farm's first detection and never cleared
    pub local_farm_ids: Vec<usize>,

    // Today's weather at this farm
    pub temp_today: f64,
    pub mean_rain_last_week: f64,
    pub wind_today: f64,
}

impl Farm {
    /// New farm with empty compartments sized for the configured Erlang
    /// chains. Demography and coefficients are filled in by the loader.
    pub fn new(
        id: usize,
        position: Vec2,
        num_inf_stages_sheep: usize,
        num_inf_stages_cattle: usize,
    ) -> Self {
        Self {
            id,
            position,
            county_number: 0.0,
            temp_cell: (0, 0),
            rain_cell: (0, 0),
            midge_cell: (0, 0),
            ac_cell: (0, 0),
            v_intercept: 0.0,
            sin_yearly: 0.0,
            cos_yearly: 0.0,
            sin_6_month: 0.0,
            cos_6_month: 0.0,
            cos_4_month: 0.0,
            temp_eff: 0.0,
            temp_eff_sq: 0.0,
            rain_eff: 0.0,
            wind_eff: 0.0,
            autocorr: 0.0,
            overdispersion: 0.0,
            number_of_sheep: 0.0,
            number_of_cattle: 0.0,
            s_sheep: 0.0,
            i_sheep: vec![0.0; num_inf_stages_sheep],
            r_sheep: 0.0,
            s_cattle: 0.0,
            i_cattle: vec![0.0; num_inf_stages_cattle],
            r_cattle: 0.0,
            rel_local_weight: 1.0,
            force: 0.0,
            detected: false,
            movement_banned: false,
            protection_zone: false,
            surveillance_zone: false,
            free_area: true,
            ever_been_detected: false,
            ever_been_infected: false,
            first_infected_due_to_movement: false,
            local_farm_ids: Vec::new(),
            temp_today: 0.0,
            mean_rain_last_week: 0.0,
            wind_today: 0.0,
        }
    }

    /// Stock the farm with fully susceptible herds
    pub fn with_stock(mut self, sheep: f64, cattle: f64) -> Self {
        self.number_of_sheep = sheep;
        self.s_sheep = sheep;
        self.number_of_cattle = cattle;
        self.s_cattle = cattle;
        self
    }

    pub fn num_inf_sheep(&self) -> f64 {
        self.i_sheep.iter().sum()
    }

    pub fn num_inf_cattle(&self) -> f64 {
        self.i_cattle.iter().sum()
    }

    pub fn num_sheep(&self) -> f64 {
        self.s_sheep + self.num_inf_sheep() + self.r_sheep
    }

    pub fn num_cattle(&self) -> f64 {
        self.s_cattle + self.num_inf_cattle() + self.r_cattle
    }

    pub fn is_infected(&self) -> bool {
        self.num_inf_sheep() + self.num_inf_cattle() > 0.0
    }

    /// Bite-weighted herd size: cattle count one each, sheep count at
    /// the vector's feeding preference
    pub fn eff_num_animals(&self, preference_for_sheep: f64) -> f64 {
        self.num_cattle() + preference_for_sheep * self.num_sheep()
    }

    /// Bite-weighted infectious herd size
    pub fn eff_num_inf_animals(&self, preference_for_sheep: f64) -> f64 {
        self.num_inf_cattle() + preference_for_sheep * self.num_inf_sheep()
    }

    pub fn dist_sq(&self, other: &Farm) -> f64 {
        self.position.distance_sq(&other.position)
    }
}
