//! Fitness evaluation for controller search.
//!
//! A candidate's fitness is the mean total reward over several independent
//! episodes of the lander environment, acting greedily on its network output.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::{ControlNetwork, LanderEnv, Observer};
use crate::schema::{ConfigError, EvaluationConfig, LanderConfig};

/// Summary of a single episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    /// Sum of per-step rewards.
    pub total_reward: f32,
    /// Steps taken before termination or budget exhaustion.
    pub steps: u32,
    pub landed: bool,
    pub crashed: bool,
}

impl EpisodeOutcome {
    /// Whether the step budget ran out before the episode ended.
    pub fn truncated(&self) -> bool {
        !self.landed && !self.crashed
    }
}

/// Fitness of one candidate plus the episodes it was computed from.
#[derive(Debug, Clone, Default)]
pub struct FitnessReport {
    /// Mean episode reward.
    pub fitness: f32,
    pub episodes: Vec<EpisodeOutcome>,
}

impl FitnessReport {
    fn from_episodes(episodes: Vec<EpisodeOutcome>) -> Self {
        let fitness = if episodes.is_empty() {
            0.0
        } else {
            episodes.iter().map(|e| e.total_reward).sum::<f32>() / episodes.len() as f32
        };
        Self { fitness, episodes }
    }

    /// Number of soft landings.
    pub fn landings(&self) -> usize {
        self.episodes.iter().filter(|e| e.landed).count()
    }

    /// Fraction of episodes that landed.
    pub fn landing_rate(&self) -> f32 {
        if self.episodes.is_empty() {
            0.0
        } else {
            self.landings() as f32 / self.episodes.len() as f32
        }
    }
}

/// Run one episode from a fresh reset.
///
/// The episode ends on a terminal step or after `max_steps` steps. The
/// optional observer sees every state but cannot alter it; once it reports
/// itself closed it is no longer called.
pub fn run_episode<R: Rng + ?Sized>(
    env: &mut LanderEnv,
    network: &ControlNetwork,
    max_steps: u32,
    rng: &mut R,
    observer: Option<&mut dyn Observer>,
) -> EpisodeOutcome {
    let mut observer = observer.filter(|o| !o.is_closed());

    let mut observation = env.reset(rng);
    if let Some(o) = observer.as_mut() {
        o.on_reset(env.state(), env.pad());
    }

    let mut total_reward = 0.0;
    for _ in 0..max_steps {
        let result = env.step(network.act(&observation));
        total_reward += result.reward;
        observation = result.observation;

        if observer.as_ref().is_some_and(|o| o.is_closed()) {
            observer = None;
        }
        if let Some(o) = observer.as_mut() {
            o.on_step(env.state(), env.pad(), result.reward);
        }

        if result.done {
            break;
        }
    }

    let state = env.state();
    EpisodeOutcome {
        total_reward,
        steps: state.steps,
        landed: state.landed,
        crashed: state.crashed,
    }
}

/// Evaluates candidates and returns fitness reports.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    template: LanderEnv,
    eval_config: EvaluationConfig,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator, validating the environment.
    pub fn new(
        environment: LanderConfig,
        eval_config: EvaluationConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            template: LanderEnv::new(environment)?,
            eval_config,
        })
    }

    pub fn environment(&self) -> &LanderConfig {
        self.template.config()
    }

    /// Evaluate a network.
    ///
    /// `seed` drives the pad placement of every episode, so a given
    /// (network, seed) pair always yields the same report.
    pub fn evaluate(&self, network: &ControlNetwork, seed: u64) -> FitnessReport {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut env = self.template.clone();

        let episodes: Vec<EpisodeOutcome> = (0..self.eval_config.episodes)
            .map(|_| {
                run_episode(
                    &mut env,
                    network,
                    self.eval_config.max_steps,
                    &mut rng,
                    None,
                )
            })
            .collect();

        let report = FitnessReport::from_episodes(episodes);
        log::debug!(
            "evaluated candidate: fitness={:.2} landings={}/{}",
            report.fitness,
            report.landings(),
            report.episodes.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Action, TrajectoryRecorder};
    use crate::schema::{Genome, Matrix};

    /// Network whose greedy action is always `action`.
    fn fixed_policy(action: Action) -> ControlNetwork {
        let mut b2 = Matrix::zeros(1, Action::COUNT);
        b2.set(0, action.index(), 1.0);
        ControlNetwork::from_genome(Genome {
            w1: Matrix::zeros(8, 4),
            b1: Matrix::zeros(1, 4),
            w2: Matrix::zeros(4, Action::COUNT),
            b2,
        })
        .unwrap()
    }

    fn free_fall_steps() -> u32 {
        let mut env = LanderEnv::new(LanderConfig::default()).unwrap();
        env.reset(&mut StdRng::seed_from_u64(0));
        loop {
            if env.step(Action::NoOp).done {
                return env.state().steps;
            }
        }
    }

    #[test]
    fn test_free_fall_fitness() {
        let evaluator = FitnessEvaluator::new(LanderConfig::default(), EvaluationConfig::default()).unwrap();
        let report = evaluator.evaluate(&fixed_policy(Action::NoOp), 42);

        let steps = free_fall_steps();
        let expected = -((steps - 1) as f32) - 100.0;

        assert_eq!(report.episodes.len(), 3);
        for episode in &report.episodes {
            assert!(episode.crashed);
            assert_eq!(episode.steps, steps);
            assert_eq!(episode.total_reward, expected);
        }
        assert_eq!(report.fitness, expected);
        assert_eq!(report.landings(), 0);
    }

    #[test]
    fn test_step_budget_truncates() {
        let evaluator = FitnessEvaluator::new(
            LanderConfig::default(),
            EvaluationConfig {
                episodes: 2,
                max_steps: 10,
            },
        )
        .unwrap();
        let report = evaluator.evaluate(&fixed_policy(Action::NoOp), 1);
        assert_eq!(report.fitness, -10.0);
        assert!(report.episodes.iter().all(|e| e.truncated() && e.steps == 10));
    }

    #[test]
    fn test_hovering_never_terminates() {
        // Upright thrust beats gravity, so the lander climbs until the budget ends
        let evaluator = FitnessEvaluator::new(
            LanderConfig::default(),
            EvaluationConfig {
                episodes: 1,
                max_steps: 200,
            },
        )
        .unwrap();
        let report = evaluator.evaluate(&fixed_policy(Action::Thrust), 9);
        assert_eq!(report.fitness, -200.0);
        assert!(report.episodes[0].truncated());
    }

    #[test]
    fn test_evaluation_deterministic() {
        let mut rng = StdRng::seed_from_u64(5);
        let arch = crate::compute::Architecture::lander(10).unwrap();
        let net = ControlNetwork::random(arch, &mut rng);
        let evaluator = FitnessEvaluator::new(LanderConfig::default(), EvaluationConfig::default()).unwrap();

        let a = evaluator.evaluate(&net, 77);
        let b = evaluator.evaluate(&net, 77);
        assert_eq!(a.fitness, b.fitness);
        assert_eq!(a.episodes, b.episodes);
    }

    #[test]
    fn test_observer_sees_every_step() {
        let net = fixed_policy(Action::NoOp);
        let mut env = LanderEnv::new(LanderConfig::default()).unwrap();
        let mut recorder = TrajectoryRecorder::new();

        let outcome = run_episode(
            &mut env,
            &net,
            1000,
            &mut StdRng::seed_from_u64(2),
            Some(&mut recorder),
        );

        assert_eq!(recorder.frames.len() as u32, outcome.steps);
        assert_eq!(recorder.total_reward(), outcome.total_reward);
        assert_eq!(recorder.start.map(|s| (s.x, s.y)), Some((300.0, 50.0)));
        assert_eq!(recorder.pad, Some(*env.pad()));
    }

    #[test]
    fn test_closed_observer_does_not_change_episode() {
        let net = fixed_policy(Action::RotateLeft);
        let mut env = LanderEnv::new(LanderConfig::default()).unwrap();

        let plain = run_episode(&mut env, &net, 500, &mut StdRng::seed_from_u64(4), None);

        let mut recorder = TrajectoryRecorder::with_capacity(5);
        let observed = run_episode(
            &mut env,
            &net,
            500,
            &mut StdRng::seed_from_u64(4),
            Some(&mut recorder),
        );

        assert_eq!(plain, observed);
        assert_eq!(recorder.frames.len(), 5);
    }

    #[test]
    fn test_evaluator_rejects_invalid_environment() {
        let environment = LanderConfig {
            pad_width: 700.0,
            ..Default::default()
        };
        assert!(matches!(
            FitnessEvaluator::new(environment, EvaluationConfig::default()),
            Err(ConfigError::PadExceedsWorld { .. })
        ));
    }

    #[test]
    fn test_report_landing_rate() {
        let landed = EpisodeOutcome {
            total_reward: 900.0,
            steps: 100,
            landed: true,
            crashed: false,
        };
        let crashed = EpisodeOutcome {
            total_reward: -150.0,
            steps: 51,
            landed: false,
            crashed: true,
        };
        let report = FitnessReport::from_episodes(vec![landed, crashed, crashed, landed]);
        assert_eq!(report.landings(), 2);
        assert_eq!(report.landing_rate(), 0.5);
        assert_eq!(report.fitness, (900.0 + 900.0 - 300.0) / 4.0);

        let empty = FitnessReport::from_episodes(Vec::new());
        assert_eq!(empty.fitness, 0.0);
        assert_eq!(empty.landing_rate(), 0.0);
    }
}
