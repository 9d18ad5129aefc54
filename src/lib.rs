//! VECTRA - stochastic spatial model of bluetongue virus spread
//!
//! Simulates BTV transmission between livestock farms mediated by
//! Culicoides biting midges. A continuous midge-density field evolves on
//! a grid under temperature-driven mortality, staged extrinsic
//! incubation, and diffusion, while farms carry Erlang-staged SIR
//! dynamics over sheep and cattle. Livestock movements carry infection
//! along a directed network, and a reactive control layer answers
//! detections with movement bans, restriction zones, and surveillance.
//!
//! The crate is the simulation core only: loaders populate a
//! [`world::SimulationState`] and a [`core::ModelConfig`], validation
//! gates the setup, and the driver calls [`simulation::simulate_day`]
//! once per day with an explicit seeded generator.

pub mod core;
pub mod entomology;
pub mod random;
pub mod simulation;
pub mod world;
