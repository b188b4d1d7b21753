//! Sensor module - synchronized rig readings, simulation and filtering

pub mod filter;
pub mod rig;
