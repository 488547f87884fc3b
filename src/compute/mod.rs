//! Compute module - Lander simulation, controller networks and evolution.

mod lander;
mod network;
mod observer;

pub mod evolution;

pub use lander::*;
pub use network::*;
pub use observer::*;
