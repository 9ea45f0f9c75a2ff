//! Heat-diffusion output: temperature profiles, centre-point traces and maps.

pub mod files;
pub mod map;
pub mod plot;
