//! Generational genetic algorithm over controller networks.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::compute::{Architecture, ControlNetwork};
use crate::schema::{
    CandidateSnapshot, EvolutionConfig, EvolutionConfigError, EvolutionHistory,
    EvolutionProgress, EvolutionResult, EvolutionStats,
};

use super::fitness::{FitnessEvaluator, FitnessReport};
use super::genome::{GenomeRng, crossover, genome_distance};

/// A candidate individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier.
    pub id: u64,
    /// The controller.
    pub network: ControlNetwork,
    /// Fitness score (mean episode reward).
    pub fitness: f32,
    /// Episode results behind the fitness.
    pub report: FitnessReport,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

impl Candidate {
    /// Convert to snapshot for serialization.
    pub fn to_snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot {
            id: self.id,
            fitness: self.fitness,
            landing_rate: self.report.landing_rate(),
            generation: self.generation,
            parents: self.parents.clone(),
            genome: self.network.params().clone(),
        }
    }
}

/// Errors from running evolution.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid evolution config: {0}")]
    InvalidConfig(#[from] EvolutionConfigError),
    #[error("Population is empty")]
    EmptyPopulation,
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    architecture: Architecture,
    rng: GenomeRng,
    evaluator: FitnessEvaluator,
    population: Vec<Candidate>,
    history: EvolutionHistory,
    generation: usize,
    best_fitness: f32,
    episodes_run: u64,
    next_id: u64,
}

impl EvolutionEngine {
    /// Create a new evolution engine.
    ///
    /// The configuration is validated here; the network architecture is fixed
    /// for the lifetime of the engine.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionConfigError> {
        config.validate()?;
        let architecture = Architecture::lander(config.network.hidden_size)
            .map_err(|_| EvolutionConfigError::InvalidHiddenSize)?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!("evolution seed: {seed}");
        let rng = GenomeRng::new(seed);
        let evaluator =
            FitnessEvaluator::new(config.environment.clone(), config.evaluation.clone())?;

        Ok(Self {
            config,
            architecture,
            rng,
            evaluator,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            best_fitness: f32::NEG_INFINITY,
            episodes_run: 0,
            next_id: 0,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Current population, in breeding order (elites first after a step).
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Index of the current generation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Number of elites carried into each new generation.
    pub fn elite_count(&self) -> usize {
        self.config.population.elite_count()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Initialize the population.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best_fitness = f32::NEG_INFINITY;
        self.episodes_run = 0;

        for _ in 0..self.config.population.size {
            let network = self.rng.random_network(self.architecture);
            let id = self.next_id();

            self.population.push(Candidate {
                id,
                network,
                fitness: 0.0,
                report: FitnessReport::default(),
                generation: 0,
                parents: Vec::new(),
            });
        }
    }

    /// Evaluate all candidates in the population.
    ///
    /// Episode seeds are drawn sequentially before the fan-out, so parallel and
    /// sequential evaluation give identical fitness values.
    pub fn evaluate_population(&mut self) {
        let seeds: Vec<u64> = (0..self.population.len())
            .map(|_| self.rng.next_seed())
            .collect();
        let evaluator = &self.evaluator;

        #[cfg(not(target_arch = "wasm32"))]
        let iter = self.population.par_iter_mut().zip(seeds.par_iter());
        #[cfg(target_arch = "wasm32")]
        let iter = self.population.iter_mut().zip(seeds.iter());

        iter.for_each(|(candidate, &seed)| {
            let report = evaluator.evaluate(&candidate.network, seed);
            candidate.fitness = report.fitness;
            candidate.report = report;
        });

        self.episodes_run += (self.population.len() * self.config.evaluation.episodes) as u64;
    }

    /// Population indices ordered by descending fitness. Ties keep population
    /// order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.population.len()).collect();
        indices.sort_by(|&a, &b| {
            self.population[b]
                .fitness
                .total_cmp(&self.population[a].fitness)
        });
        indices
    }

    /// Record statistics for the evaluated population.
    ///
    /// Returns `None` for an empty population.
    fn record_generation(&mut self) -> Option<EvolutionProgress> {
        if self.population.is_empty() {
            return None;
        }
        let n = self.population.len() as f32;

        let gen_best = self
            .population
            .iter()
            .map(|c| c.fitness)
            .fold(f32::NEG_INFINITY, f32::max);
        self.best_fitness = self.best_fitness.max(gen_best);

        let fitness_sum: f32 = self.population.iter().map(|c| c.fitness).sum();
        let avg_fitness = fitness_sum / n;
        let variance: f32 = self
            .population
            .iter()
            .map(|c| (c.fitness - avg_fitness).powi(2))
            .sum::<f32>()
            / n;

        let (landed, episodes) = self.population.iter().fold((0, 0), |(l, e), c| {
            (l + c.report.landings(), e + c.report.episodes.len())
        });
        let landing_rate = if episodes > 0 {
            landed as f32 / episodes as f32
        } else {
            0.0
        };

        // Compute diversity
        let diversity = self.compute_diversity();

        self.history.best_fitness.push(gen_best);
        self.history.avg_fitness.push(avg_fitness);
        self.history.fitness_std.push(variance.sqrt());
        self.history.diversity.push(diversity);
        self.history.landing_rate.push(landing_rate);

        log::info!(
            "Generation {}: best fitness = {:.3}, avg fitness = {:.3}, landing rate = {:.3}",
            self.generation,
            gen_best,
            avg_fitness,
            landing_rate
        );

        Some(EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.generations,
            best_fitness: self.best_fitness,
            generation_best: gen_best,
            avg_fitness,
            landing_rate,
            elite_count: self.elite_count(),
        })
    }

    /// Run a single generation: evaluate, rank, keep elites, breed the rest.
    ///
    /// Returns `None` without touching anything if the population is empty.
    pub fn step_generation(&mut self) -> Option<EvolutionProgress> {
        if self.population.is_empty() {
            return None;
        }

        self.evaluate_population();
        let progress = self.record_generation()?;
        self.breed();
        self.generation += 1;
        Some(progress)
    }

    /// Replace the population with elites plus offspring bred from them.
    fn breed(&mut self) {
        let size = self.config.population.size;
        let elite_num = self.elite_count();
        let ranking = self.ranking();

        let elites: Vec<Candidate> = ranking
            .iter()
            .take(elite_num)
            .map(|&i| self.population[i].clone())
            .collect();
        if elites.is_empty() {
            return;
        }

        let mut next_gen = Vec::with_capacity(size);
        next_gen.extend(elites.iter().cloned());

        let rate = self.config.mutation.rate;
        let strength = self.config.mutation.strength;

        while next_gen.len() < size {
            let (Some(i1), Some(i2)) = (self.rng.pick(elites.len()), self.rng.pick(elites.len()))
            else {
                break;
            };
            let (parent1, parent2) = (&elites[i1], &elites[i2]);

            let mut child = crossover(&parent1.network, &parent2.network);
            self.rng.mutate(&mut child, rate, strength);

            let id = self.next_id();
            next_gen.push(Candidate {
                id,
                network: child,
                fitness: 0.0,
                report: FitnessReport::default(),
                generation: self.generation + 1,
                parents: vec![parent1.id, parent2.id],
            });
        }

        self.population = next_gen;
    }

    /// Compute population diversity.
    fn compute_diversity(&self) -> f32 {
        if self.population.len() < 2 {
            return 0.0;
        }

        let mut total_distance = 0.0f32;
        let mut count = 0;

        for i in 0..self.population.len() {
            for j in (i + 1)..self.population.len() {
                total_distance += genome_distance(
                    self.population[i].network.params(),
                    self.population[j].network.params(),
                );
                count += 1;
            }
        }

        if count > 0 {
            total_distance / count as f32
        } else {
            0.0
        }
    }

    /// Best candidate of the current (evaluated) population.
    pub fn best(&self) -> Option<&Candidate> {
        self.ranking().first().map(|&i| &self.population[i])
    }

    /// Run evolution with progress callback.
    ///
    /// Breeds `generations` generations, then evaluates the final population
    /// once more and returns its best member.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<EvolutionResult, EvolutionError>
    where
        F: Fn(&EvolutionProgress),
    {
        let start_time = std::time::Instant::now();

        self.initialize();

        for _ in 0..self.config.population.generations {
            let progress = self
                .step_generation()
                .ok_or(EvolutionError::EmptyPopulation)?;
            callback(&progress);
        }

        // Final evaluation pass
        self.evaluate_population();
        if let Some(progress) = self.record_generation() {
            callback(&progress);
        }

        let best = self
            .best()
            .map(Candidate::to_snapshot)
            .ok_or(EvolutionError::EmptyPopulation)?;

        let final_avg_fitness =
            self.population.iter().map(|c| c.fitness).sum::<f32>() / self.population.len() as f32;

        let elapsed = start_time.elapsed().as_secs_f64();
        let episodes_per_second = if elapsed > 0.0 {
            self.episodes_run as f64 / elapsed
        } else {
            0.0
        };

        log::info!(
            "Evolution finished: champion #{} fitness = {:.3} ({} episodes in {:.2}s)",
            best.id,
            best.fitness,
            self.episodes_run,
            elapsed
        );

        Ok(EvolutionResult {
            best,
            stats: EvolutionStats {
                generations: self.generation,
                total_episodes: self.episodes_run,
                best_fitness: self.best_fitness,
                final_avg_fitness,
                elapsed_seconds: elapsed,
                episodes_per_second,
            },
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}
