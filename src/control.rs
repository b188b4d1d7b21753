//! Control module - force regulation for the compression actuator

pub mod pid;
