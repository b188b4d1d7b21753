//! IPC module - channels and shared state between rig and control threads

pub mod channels;
pub mod shared_resource;
