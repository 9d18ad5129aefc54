//! Vector species and their temperature-dependent rate functions
//!
//! The simulation calls rates through the [`VectorSpecies`] trait, so a
//! different vector (another Culicoides complex, mosquitoes) only needs
//! three functions and a name. One species is selected per run.

/// Temperature-response capability set of a vector species.
///
/// All rates are per day; temperature is in degrees Celsius.
pub trait VectorSpecies {
    /// Species name for logging
    fn name(&self) -> &'static str;

    /// Bites per vector per day as a function of temperature
    fn biting_rate(&self, temperature: f64) -> f64;

    /// Daily mortality rate as a function of temperature
    fn mortality_rate(&self, temperature: f64) -> f64;

    /// Extrinsic-incubation progression rate as a function of temperature
    fn incubation_rate(&self, temperature: f64) -> f64;
}

/// Culicoides biting midges, the default BTV vector
#[derive(Debug, Clone, Copy, Default)]
pub struct Culicoides;

impl VectorSpecies for Culicoides {
    fn name(&self) -> &'static str {
        "Culicoides"
    }

    fn biting_rate(&self, temperature: f64) -> f64 {
        if temperature > 3.7 && temperature < 41.9 {
            0.0002 * temperature * (temperature - 3.7) * (41.9 - temperature).powf(0.37)
        } else {
            0.0
        }
    }

    fn mortality_rate(&self, temperature: f64) -> f64 {
        if temperature > -2.0 {
            0.009 * (0.16 * temperature).exp()
        } else {
            // Below -2 C the population does not overwinter as adults
            100.0
        }
    }

    fn incubation_rate(&self, temperature: f64) -> f64 {
        (0.018 * (temperature - 13.4)).max(0.0)
    }
}
