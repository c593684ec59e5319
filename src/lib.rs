//! Simulation and evaluation core for populations of autonomous driving
//! agents on a 2-D track, plus a minimal generational search driver.

pub mod analysis;
pub mod arena;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod manager;
pub mod model;
pub mod policy;
pub mod sensor;
pub mod stats;
