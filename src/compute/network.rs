//! Fixed-topology feed-forward controller.
//!
//! `output = softmax(relu(x · W1 + b1) · W2 + b2)`
//!
//! The architecture is checked once when a network is built; after that every
//! operation assumes matching shapes.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::lander::{Action, OBSERVATION_SIZE, Observation};
use crate::schema::{Genome, Matrix};

/// Layer widths of a controller network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl Architecture {
    /// Validate and build an architecture.
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
    ) -> Result<Self, ArchitectureError> {
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return Err(ArchitectureError::ZeroSized {
                input_size,
                hidden_size,
                output_size,
            });
        }
        Ok(Self {
            input_size,
            hidden_size,
            output_size,
        })
    }

    /// Observation-in, action-distribution-out architecture for the lander.
    pub fn lander(hidden_size: usize) -> Result<Self, ArchitectureError> {
        Self::new(OBSERVATION_SIZE, hidden_size, Action::COUNT)
    }

    /// Infer the architecture of a genome, checking every tensor shape.
    pub fn of(genome: &Genome) -> Result<Self, ArchitectureError> {
        let arch = Self::new(genome.w1.rows(), genome.w1.cols(), genome.w2.cols())?;
        let expected = arch.shapes();
        for ((name, tensor), shape) in TENSOR_NAMES
            .into_iter()
            .zip(genome.tensors())
            .zip(expected)
        {
            if !tensor.is_well_formed() {
                return Err(ArchitectureError::Malformed(name));
            }
            if tensor.shape() != shape {
                return Err(ArchitectureError::ShapeMismatch {
                    name,
                    expected: shape,
                    actual: tensor.shape(),
                });
            }
        }
        Ok(arch)
    }

    /// Expected shapes of `w1`, `b1`, `w2`, `b2`.
    pub fn shapes(&self) -> [(usize, usize); 4] {
        [
            (self.input_size, self.hidden_size),
            (1, self.hidden_size),
            (self.hidden_size, self.output_size),
            (1, self.output_size),
        ]
    }

    /// Total number of trainable parameters.
    pub fn parameter_count(&self) -> usize {
        self.shapes().iter().map(|(r, c)| r * c).sum()
    }
}

const TENSOR_NAMES: [&str; 4] = ["w1", "b1", "w2", "b2"];

/// Architecture validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ArchitectureError {
    #[error("Layer sizes must be non-zero (got {input_size}x{hidden_size}x{output_size})")]
    ZeroSized {
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
    },
    #[error("Tensor {name} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("Tensor {0} storage does not match its declared shape")]
    Malformed(&'static str),
    #[error(
        "Network maps {input_size} inputs to {output_size} outputs, the lander needs {} and {}",
        OBSERVATION_SIZE,
        Action::COUNT
    )]
    NotLander {
        input_size: usize,
        output_size: usize,
    },
}

/// A two-layer controller. Cloning produces a fully independent deep copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetwork {
    architecture: Architecture,
    genome: Genome,
}

impl ControlNetwork {
    /// Fresh network with every parameter drawn from uniform [0, 1).
    pub fn random<R: Rng + ?Sized>(architecture: Architecture, rng: &mut R) -> Self {
        let [w1, b1, w2, b2] = architecture
            .shapes()
            .map(|(rows, cols)| Matrix::from_fn(rows, cols, |_, _| rng.r#gen::<f32>()));
        Self {
            architecture,
            genome: Genome { w1, b1, w2, b2 },
        }
    }

    /// Wrap an existing genome, validating its shapes.
    pub fn from_genome(genome: Genome) -> Result<Self, ArchitectureError> {
        let architecture = Architecture::of(&genome)?;
        Ok(Self {
            architecture,
            genome,
        })
    }

    /// Wrap a genome that must drive the lander: observation-sized input and
    /// one output per action.
    pub fn for_lander(genome: Genome) -> Result<Self, ArchitectureError> {
        let network = Self::from_genome(genome)?;
        let arch = network.architecture;
        if arch != Architecture::lander(arch.hidden_size)? {
            return Err(ArchitectureError::NotLander {
                input_size: arch.input_size,
                output_size: arch.output_size,
            });
        }
        Ok(network)
    }

    #[inline]
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// All four parameter tensors.
    #[inline]
    pub fn params(&self) -> &Genome {
        &self.genome
    }

    /// Replace all four parameter tensors at once.
    ///
    /// The new genome must have this network's architecture.
    pub fn set_params(&mut self, genome: Genome) {
        debug_assert!(
            Architecture::of(&genome).is_ok_and(|a| a == self.architecture),
            "genome does not match network architecture"
        );
        self.genome = genome;
    }

    /// Consume the network, returning its parameters.
    pub fn into_genome(self) -> Genome {
        self.genome
    }

    /// Gaussian mutation in place.
    ///
    /// Each entry of each tensor independently, with probability `rate`,
    /// receives additive noise from N(0, strength²).
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f32, strength: f32, rng: &mut R) {
        for tensor in self.genome.tensors_mut() {
            for value in tensor.as_mut_slice() {
                if rng.r#gen::<f32>() < rate {
                    let noise: f32 = rng.sample(StandardNormal);
                    *value += noise * strength;
                }
            }
        }
    }

    /// Action distribution for one input vector.
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.architecture.input_size);
        let Genome { w1, b1, w2, b2 } = &self.genome;

        let hidden: Vec<f32> = (0..self.architecture.hidden_size)
            .map(|j| {
                let z = input
                    .iter()
                    .enumerate()
                    .fold(b1.get(0, j), |acc, (i, &x)| acc + x * w1.get(i, j));
                relu(z)
            })
            .collect();

        let mut output: Vec<f32> = (0..self.architecture.output_size)
            .map(|k| {
                hidden
                    .iter()
                    .enumerate()
                    .fold(b2.get(0, k), |acc, (j, &h)| acc + h * w2.get(j, k))
            })
            .collect();

        softmax_in_place(&mut output);
        output
    }

    /// Greedy policy: the most probable action.
    pub fn act(&self, observation: &Observation) -> Action {
        let probs = self.forward(observation);
        Action::from_index(argmax(&probs)).unwrap_or(Action::NoOp)
    }
}

#[inline]
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// Numerically stable softmax.
pub fn softmax_in_place(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Index of the largest value; the first one wins ties. Returns 0 for an
/// empty slice.
pub fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v { (i, v) } else { (best_i, best_v) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn lander_net(seed: u64) -> ControlNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        ControlNetwork::random(Architecture::lander(10).unwrap(), &mut rng)
    }

    #[test]
    fn test_architecture_rejects_zero() {
        assert!(Architecture::new(8, 0, 4).is_err());
        assert!(Architecture::lander(10).is_ok());
        assert_eq!(Architecture::lander(10).unwrap().parameter_count(), 80 + 10 + 40 + 4);
    }

    #[test]
    fn test_random_init_shapes_and_range() {
        let net = lander_net(1);
        let g = net.params();
        assert_eq!(g.w1.shape(), (8, 10));
        assert_eq!(g.b1.shape(), (1, 10));
        assert_eq!(g.w2.shape(), (10, 4));
        assert_eq!(g.b2.shape(), (1, 4));
        assert!(g.iter().all(|v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_random_init_deterministic() {
        assert_eq!(lander_net(5), lander_net(5));
        assert_ne!(lander_net(5), lander_net(6));
    }

    #[test]
    fn test_forward_is_distribution() {
        let net = lander_net(2);
        let obs = [0.5, 0.1, 0.0, 0.3, 0.0, 0.0, 1.0, 0.0];
        let out = net.forward(&obs);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|&p| p > 0.0 && p <= 1.0));
        assert!((out.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_forward_handcrafted() {
        // w1 = identity-ish on the first input, b2 favours action 2
        let arch = Architecture::new(2, 1, 3).unwrap();
        let genome = Genome {
            w1: Matrix::from_vec(2, 1, vec![1.0, 0.0]).unwrap(),
            b1: Matrix::from_vec(1, 1, vec![-1.0]).unwrap(),
            w2: Matrix::from_vec(1, 3, vec![0.0, 0.0, 0.0]).unwrap(),
            b2: Matrix::from_vec(1, 3, vec![0.0, 0.0, 2.0]).unwrap(),
        };
        let net = ControlNetwork::from_genome(genome).unwrap();
        assert_eq!(net.architecture(), arch);

        let out = net.forward(&[0.5, 9.0]);
        let e2 = 2.0f32.exp();
        let denom = 2.0 + e2;
        assert!((out[0] - 1.0 / denom).abs() < 1e-6);
        assert!((out[2] - e2 / denom).abs() < 1e-6);
        assert_eq!(argmax(&out), 2);
    }

    #[test]
    fn test_softmax_stable_for_large_inputs() {
        let mut v = vec![1000.0, 1000.0, -1000.0];
        softmax_in_place(&mut v);
        assert!((v[0] - 0.5).abs() < 1e-6);
        assert!((v[1] - 0.5).abs() < 1e-6);
        assert!(v[2].abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), 0);
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_relu() {
        assert_eq!(relu(-3.0), 0.0);
        assert_eq!(relu(2.5), 2.5);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = lander_net(3);
        let snapshot = original.clone();
        let mut copy = original.clone();
        let mut rng = StdRng::seed_from_u64(0);
        copy.mutate(1.0, 0.5, &mut rng);

        assert_eq!(original, snapshot);
        assert_ne!(original, copy);
    }

    #[test]
    fn test_set_params_replaces_all() {
        let mut a = lander_net(10);
        let b = lander_net(11);
        a.set_params(b.params().clone());
        assert_eq!(a.params(), b.params());
    }

    #[test]
    fn test_from_genome_rejects_bad_shapes() {
        let mut genome = lander_net(4).into_genome();
        genome.b2 = Matrix::zeros(1, 3);
        assert!(matches!(
            ControlNetwork::from_genome(genome),
            Err(ArchitectureError::ShapeMismatch { name: "b2", .. })
        ));
    }

    #[test]
    fn test_from_genome_rejects_malformed_storage() {
        let genome = lander_net(4).into_genome();
        let mut json = serde_json::to_value(&genome).unwrap();
        json["b1"]["data"] = serde_json::json!([0.0, 1.0]);
        let bad: Genome = serde_json::from_value(json).unwrap();
        assert!(matches!(
            ControlNetwork::from_genome(bad),
            Err(ArchitectureError::Malformed("b1"))
        ));
    }

    #[test]
    fn test_for_lander_rejects_foreign_layouts() {
        let mut rng = StdRng::seed_from_u64(12);
        for arch in [
            Architecture::new(5, 10, 4).unwrap(),
            Architecture::new(8, 10, 5).unwrap(),
        ] {
            let genome = ControlNetwork::random(arch, &mut rng).into_genome();
            assert!(ControlNetwork::from_genome(genome.clone()).is_ok());
            assert!(matches!(
                ControlNetwork::for_lander(genome),
                Err(ArchitectureError::NotLander { .. })
            ));
        }

        let genome = lander_net(12).into_genome();
        assert!(ControlNetwork::for_lander(genome).is_ok());
    }

    #[test]
    fn test_act_matches_forward_argmax() {
        let net = lander_net(8);
        let obs = [0.5, 0.125, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let expected = argmax(&net.forward(&obs));
        assert_eq!(net.act(&obs).index(), expected);
    }
}
