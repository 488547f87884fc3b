//! Schema module - Configuration, genome and result types for lander evolution.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
