//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random initialization, crossover, and mutation operations over
//! controller parameter bundles.

use rand::prelude::*;

use crate::compute::{Architecture, ControlNetwork};
use crate::schema::{Genome, Matrix};

/// Random number generator wrapper for genome operations.
///
/// This is the single source of randomness of a run: network initialization,
/// mutation noise, parent sampling and the seeds handed to environment resets
/// are all drawn from it, in call order.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a fresh network with uniform [0, 1) parameters.
    pub fn random_network(&mut self, architecture: Architecture) -> ControlNetwork {
        ControlNetwork::random(architecture, &mut self.rng)
    }

    /// Mutate a network in place.
    pub fn mutate(&mut self, network: &mut ControlNetwork, rate: f32, strength: f32) {
        network.mutate(rate, strength, &mut self.rng);
    }

    /// Uniform index in `0..len`, or `None` for an empty range.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}

/// Average two tensors element-wise.
fn blend(a: &Matrix, b: &Matrix) -> Matrix {
    a.zip_map(b, |x, y| (x + y) / 2.0)
}

/// Perform crossover between two networks.
///
/// Every tensor of the child is the element-wise arithmetic mean of the
/// parents' tensors. Both parents must share one architecture.
pub fn crossover(parent1: &ControlNetwork, parent2: &ControlNetwork) -> ControlNetwork {
    let (g1, g2) = (parent1.params(), parent2.params());
    let mut child = parent1.clone();
    child.set_params(Genome {
        w1: blend(&g1.w1, &g2.w1),
        b1: blend(&g1.b1, &g2.b1),
        w2: blend(&g1.w2, &g2.w2),
        b2: blend(&g1.b2, &g2.b2),
    });
    child
}

/// Compute genetic distance between two genomes: the mean absolute
/// difference over all parameters.
pub fn genome_distance(g1: &Genome, g2: &Genome) -> f32 {
    let mut distance = 0.0f32;
    let mut count = 0;

    for (a, b) in g1.iter().zip(g2.iter()) {
        distance += (a - b).abs();
        count += 1;
    }

    if count > 0 {
        distance / count as f32
    } else {
        0.0
    }
}
