//! Evolution configuration types for controller search.
//!
//! This module provides the genome representation (a fixed-shape bundle of
//! dense parameter tensors) and the types that configure, report on and
//! summarize an evolutionary run.

use serde::{Deserialize, Serialize};

use super::LanderConfig;

/// Top-level configuration for an evolutionary run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Environment every candidate is evaluated in.
    #[serde(default)]
    pub environment: LanderConfig,
    /// Controller network shape.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Evaluation settings (episodes per candidate, step budget).
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Offspring mutation settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Controller network configuration.
///
/// Input and output widths are fixed by the environment (observation length
/// and action count); only the hidden layer is configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_size: default_hidden_size(),
        }
    }
}

fn default_hidden_size() -> usize {
    10
}

/// Population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals per generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to breed before the final evaluation pass.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Fraction of the population carried forward unmodified.
    #[serde(default = "default_elite_fraction")]
    pub elite_fraction: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            generations: default_generations(),
            elite_fraction: default_elite_fraction(),
        }
    }
}

impl PopulationConfig {
    /// Number of elites: `max(1, floor(elite_fraction * size))`, never more
    /// than the population itself.
    pub fn elite_count(&self) -> usize {
        let raw = (self.elite_fraction * self.size as f32).floor();
        let raw = if raw.is_finite() && raw > 0.0 {
            raw as usize
        } else {
            0
        };
        raw.max(1).min(self.size)
    }
}

fn default_population_size() -> usize {
    50
}
fn default_generations() -> usize {
    10
}
fn default_elite_fraction() -> f32 {
    0.5
}

/// Fitness evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Independent episodes averaged into one fitness value.
    #[serde(default = "default_episodes")]
    pub episodes: usize,
    /// Step budget per episode.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            episodes: default_episodes(),
            max_steps: default_max_steps(),
        }
    }
}

fn default_episodes() -> usize {
    3
}
fn default_max_steps() -> u32 {
    1000
}

/// Gaussian mutation settings applied to every bred child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Per-entry mutation probability (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub rate: f32,
    /// Standard deviation of the additive noise.
    #[serde(default = "default_mutation_strength")]
    pub strength: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            rate: default_mutation_rate(),
            strength: default_mutation_strength(),
        }
    }
}

fn default_mutation_rate() -> f32 {
    0.1
}
fn default_mutation_strength() -> f32 {
    0.5
}

// ============================================================================
// Genome representation
// ============================================================================

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Matrix whose entries are produced by `f(row, col)` in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Build from row-major data. Returns `None` if the length does not match.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True when the backing storage matches the declared shape.
    ///
    /// Only deserialized matrices can violate this.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.rows * self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Element-wise combination of two equally shaped matrices.
    pub fn zip_map(&self, other: &Matrix, f: impl Fn(f32, f32) -> f32) -> Matrix {
        debug_assert_eq!(self.shape(), other.shape(), "matrix shape mismatch");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}

/// Parameter bundle of one controller network.
///
/// Shapes: `w1` input×hidden, `b1` 1×hidden, `w2` hidden×output, `b2` 1×output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub w1: Matrix,
    pub b1: Matrix,
    pub w2: Matrix,
    pub b2: Matrix,
}

impl Genome {
    /// The four tensors in a fixed order.
    pub fn tensors(&self) -> [&Matrix; 4] {
        [&self.w1, &self.b1, &self.w2, &self.b2]
    }

    /// Mutable access to the four tensors in the same order as [`Genome::tensors`].
    pub fn tensors_mut(&mut self) -> [&mut Matrix; 4] {
        [&mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2]
    }

    /// Total number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.tensors().iter().map(|t| t.as_slice().len()).sum()
    }

    /// Iterate over every parameter in tensor order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.tensors()
            .into_iter()
            .flat_map(|t| t.as_slice().iter().copied())
    }
}

// ============================================================================
// Progress and results
// ============================================================================

/// Serializable view of one individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    /// Unique identifier.
    pub id: u64,
    /// Mean episode reward.
    pub fitness: f32,
    /// Fraction of evaluation episodes that ended in a soft landing.
    pub landing_rate: f32,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs (empty for the initial population).
    pub parents: Vec<u64>,
    /// Network parameters.
    pub genome: Genome,
}

/// Per-generation statistics for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f32>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f32>,
    /// Standard deviation per generation.
    pub fitness_std: Vec<f32>,
    /// Mean pairwise genome distance per generation.
    pub diversity: Vec<f32>,
    /// Fraction of all episodes that landed, per generation.
    pub landing_rate: Vec<f32>,
}

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Generation index (0-based).
    pub generation: usize,
    /// Configured number of generations.
    pub total_generations: usize,
    /// Best fitness seen in any generation so far.
    pub best_fitness: f32,
    /// Best fitness in this generation.
    pub generation_best: f32,
    /// Mean fitness in this generation.
    pub avg_fitness: f32,
    /// Fraction of this generation's episodes that landed.
    pub landing_rate: f32,
    /// Number of elites carried forward.
    pub elite_count: usize,
}

/// Final result of an evolutionary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Champion from the final evaluation pass.
    pub best: CandidateSnapshot,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from an evolutionary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations bred.
    pub generations: usize,
    /// Total episodes simulated, including the final pass.
    pub total_episodes: u64,
    /// Best fitness achieved in any evaluation.
    pub best_fitness: f32,
    /// Average fitness of the final population.
    pub final_avg_fitness: f32,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Episodes per second.
    pub episodes_per_second: f64,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Elite fraction {0} must lie in [0, 1]")]
    InvalidEliteFraction(f32),
    #[error("Episodes per evaluation must be positive")]
    InvalidEpisodes,
    #[error("Evaluation steps must be positive")]
    InvalidSteps,
    #[error("Hidden layer size must be positive")]
    InvalidHiddenSize,
    #[error("Invalid mutation parameters: {0}")]
    InvalidMutation(String),
    #[error("Environment config validation failed: {0}")]
    EnvironmentError(#[from] super::ConfigError),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.environment.validate()?;

        if self.population.size < 1 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        if !(0.0..=1.0).contains(&self.population.elite_fraction) {
            return Err(EvolutionConfigError::InvalidEliteFraction(
                self.population.elite_fraction,
            ));
        }

        if self.evaluation.episodes == 0 {
            return Err(EvolutionConfigError::InvalidEpisodes);
        }
        if self.evaluation.max_steps == 0 {
            return Err(EvolutionConfigError::InvalidSteps);
        }

        if self.network.hidden_size == 0 {
            return Err(EvolutionConfigError::InvalidHiddenSize);
        }

        if !(0.0..=1.0).contains(&self.mutation.rate) {
            return Err(EvolutionConfigError::InvalidMutation(format!(
                "rate {} must lie in [0, 1]",
                self.mutation.rate
            )));
        }
        if !(self.mutation.strength >= 0.0 && self.mutation.strength.is_finite()) {
            return Err(EvolutionConfigError::InvalidMutation(format!(
                "strength {} must be finite and non-negative",
                self.mutation.strength
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_elite_count_clamped() {
        let mut population = PopulationConfig {
            size: 50,
            generations: 1,
            elite_fraction: 0.5,
        };
        assert_eq!(population.elite_count(), 25);

        population.elite_fraction = 0.0;
        assert_eq!(population.elite_count(), 1);

        population.elite_fraction = 0.01;
        assert_eq!(population.elite_count(), 1);

        population.elite_fraction = 1.0;
        assert_eq!(population.elite_count(), 50);

        population.size = 0;
        assert_eq!(population.elite_count(), 0);
    }

    #[test]
    fn test_rejects_bad_mutation() {
        let config = EvolutionConfig {
            mutation: MutationConfig {
                rate: 1.5,
                strength: 0.5,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidMutation(_))
        ));
    }

    #[test]
    fn test_rejects_empty_population() {
        let config = EvolutionConfig {
            population: PopulationConfig {
                size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::PopulationTooSmall)
        ));
    }

    #[test]
    fn test_environment_error_propagates() {
        let mut config = EvolutionConfig::default();
        config.environment.width = 0.0;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::EnvironmentError(_))
        ));
    }

    #[test]
    fn test_matrix_from_fn_row_major() {
        let m = Matrix::from_fn(2, 3, |r, c| (r * 10 + c) as f32);
        assert_eq!(m.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(m.get(1, 2), 12.0);
        assert!(Matrix::from_vec(2, 2, vec![1.0; 3]).is_none());
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.population.size, config.population.size);
        assert_eq!(parsed.evaluation.max_steps, 1000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: EvolutionConfig =
            serde_json::from_str(r#"{"population": {"size": 8}, "random_seed": 7}"#).unwrap();
        assert_eq!(parsed.population.size, 8);
        assert_eq!(parsed.population.elite_fraction, 0.5);
        assert_eq!(parsed.network.hidden_size, 10);
        assert_eq!(parsed.random_seed, Some(7));
    }
}
