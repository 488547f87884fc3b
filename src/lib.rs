//! Lander Evo - Neuro-evolution of fixed-topology lander controllers.
//!
//! This crate simulates a simplified powered-descent lander and evolves
//! two-layer feed-forward controllers with an elitist genetic algorithm to
//! maximize landing success.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, genome and result types
//! - `compute`: Numerical computation (lander physics, networks, evolution)
//!
//! # Example
//!
//! ```rust,no_run
//! use lander_evo::{
//!     compute::{Action, LanderEnv},
//!     schema::LanderConfig,
//! };
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut env = LanderEnv::new(LanderConfig::default()).expect("valid config");
//! env.reset(&mut rng);
//!
//! // Free fall until touchdown
//! loop {
//!     let result = env.step(Action::NoOp);
//!     if result.done {
//!         println!("Episode ended with reward {}", result.reward);
//!         break;
//!     }
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{ChampionExport, EvolutionEngine, EvolutionError};
pub use compute::{Action, ControlNetwork, LanderEnv, Observation};
pub use schema::{EvolutionConfig, LanderConfig};
