//! Evolutionary search over lander controllers.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Fitness Evaluation** (`fitness`): Episode runner and mean-reward fitness
//! - **Genome Operations** (`genome`): Random initialization, crossover, and mutation
//! - **Search Algorithm** (`search`): Elitist generational genetic algorithm
//! - **Champion Archive** (`archive`): JSON export and import of trained controllers
//!
//! # Example
//!
//! ```rust,no_run
//! use lander_evo::schema::EvolutionConfig;
//! use lander_evo::compute::evolution::EvolutionEngine;
//!
//! let config = EvolutionConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config).expect("valid config");
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!(
//!             "Generation {}: best fitness = {:.3}",
//!             progress.generation, progress.generation_best
//!         );
//!     })
//!     .expect("non-empty population");
//!
//! println!("Champion fitness: {:.3}", result.best.fitness);
//! ```
//!
//! # Selection
//!
//! Selection pressure comes only from elitism: the top
//! `max(1, floor(elite_fraction * size))` candidates survive unchanged and are
//! the sole parent pool. Children are the element-wise mean of two parents
//! drawn uniformly with replacement, followed by Gaussian mutation.

mod archive;
mod fitness;
mod genome;
mod search;

pub use archive::{ChampionExport, load_champion, save_champion};
pub use fitness::{EpisodeOutcome, FitnessEvaluator, FitnessReport, run_episode};
pub use genome::{GenomeRng, crossover, genome_distance};
pub use search::{Candidate, EvolutionEngine, EvolutionError};
