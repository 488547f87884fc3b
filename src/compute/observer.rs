//! Episode observers.
//!
//! An observer is a passive consumer of environment state (a renderer, a
//! logger, a recorder). It is handed shared references only, so it has no
//! way to influence the simulation or the learning process.

use serde::{Deserialize, Serialize};

use super::lander::{LanderState, LandingPad};

/// Receives lander state during an episode.
pub trait Observer {
    /// Called once after each reset.
    fn on_reset(&mut self, _state: &LanderState, _pad: &LandingPad) {}

    /// Called after every step with the reward it produced.
    fn on_step(&mut self, state: &LanderState, pad: &LandingPad, reward: f32);

    /// A closed observer (e.g. its window was shut) is no longer notified.
    /// The episode itself continues.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Observer that traces every step through the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver {
    episode: usize,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for LogObserver {
    fn on_reset(&mut self, state: &LanderState, pad: &LandingPad) {
        self.episode += 1;
        log::debug!(
            "episode {} start: lander=({:.1}, {:.1}) pad_x={:.1}",
            self.episode,
            state.x,
            state.y,
            pad.center_x
        );
    }

    fn on_step(&mut self, state: &LanderState, _pad: &LandingPad, reward: f32) {
        log::trace!(
            "step {}: pos=({:.2}, {:.2}) vel=({:.3}, {:.3}) angle={:.2} legs=({}, {}) reward={}",
            state.steps,
            state.x,
            state.y,
            state.vx,
            state.vy,
            state.angle,
            state.left_contact,
            state.right_contact,
            reward
        );
    }
}

/// One recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFrame {
    pub state: LanderState,
    pub reward: f32,
}

/// Observer that stores the full trajectory of every episode it sees.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrajectoryRecorder {
    /// Pad of the most recent episode.
    pub pad: Option<LandingPad>,
    /// Initial state of the most recent episode.
    pub start: Option<LanderState>,
    /// Frames of the most recent episode.
    pub frames: Vec<TrajectoryFrame>,
    /// Stop recording after this many frames.
    #[serde(skip)]
    capacity: Option<usize>,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that closes itself once `capacity` frames are stored.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Sum of recorded rewards.
    pub fn total_reward(&self) -> f32 {
        self.frames.iter().map(|f| f.reward).sum()
    }
}

impl Observer for TrajectoryRecorder {
    fn on_reset(&mut self, state: &LanderState, pad: &LandingPad) {
        self.pad = Some(*pad);
        self.start = Some(*state);
        self.frames.clear();
    }

    fn on_step(&mut self, state: &LanderState, _pad: &LandingPad, reward: f32) {
        self.frames.push(TrajectoryFrame {
            state: *state,
            reward,
        });
    }

    fn is_closed(&self) -> bool {
        self.capacity.is_some_and(|cap| self.frames.len() >= cap)
    }
}
