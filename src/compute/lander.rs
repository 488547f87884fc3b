//! Powered-descent lander environment.
//!
//! A rigid rectangular lander falls under constant gravity toward a floor that
//! carries a landing pad at a random horizontal position. Each step applies one
//! discrete [`Action`], integrates the kinematics with a unit timestep
//! (semi-implicit Euler), checks leg contact and emits a reward.
//!
//! Coordinates follow screen convention: `y` grows downward, the floor is the
//! line `y == height`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::schema::{ConfigError, LanderConfig};

/// Length of the observation vector.
pub const OBSERVATION_SIZE: usize = 8;

/// Normalized view of the lander state fed to a controller.
///
/// Layout: `[x/width, y/height, vx/vs, vy/vs, angle/180, omega/ws, left, right]`
/// where the last two entries are leg contacts as exactly 0.0 or 1.0.
pub type Observation = [f32; OBSERVATION_SIZE];

/// Discrete control input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Do nothing.
    NoOp = 0,
    /// Fire the main engine along the lander's axis.
    Thrust = 1,
    /// Increase angular velocity.
    RotateLeft = 2,
    /// Decrease angular velocity.
    RotateRight = 3,
}

impl Action {
    /// Number of distinct actions.
    pub const COUNT: usize = 4;

    /// All actions, indexed by their action code.
    pub const ALL: [Action; Self::COUNT] = [
        Action::NoOp,
        Action::Thrust,
        Action::RotateLeft,
        Action::RotateRight,
    ];

    /// Map an action code (0-3) to an action.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Action code.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Kinematic and contact state of the lander.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LanderState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Orientation in degrees, always in [0, 360).
    pub angle: f32,
    /// Degrees per step.
    pub angular_velocity: f32,
    pub left_contact: bool,
    pub right_contact: bool,
    /// Steps taken since the last reset.
    pub steps: u32,
    pub crashed: bool,
    pub landed: bool,
}

impl LanderState {
    /// Whether the episode has ended.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.crashed || self.landed
    }
}

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Rectangle centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            left: cx - width / 2.0,
            top: cy - height / 2.0,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Whether `x` lies within the horizontal span, edges included.
    #[inline]
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.left && x <= self.right()
    }

    /// Strict overlap test: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        let left = self.left.max(other.left);
        let right = self.right().min(other.right());
        let top = self.top.max(other.top);
        let bottom = self.bottom().min(other.bottom());
        left < right && top < bottom
    }
}

/// Landing target, resampled at every reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingPad {
    /// Horizontal center.
    pub center_x: f32,
    /// Vertical coordinate of the top surface.
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl LandingPad {
    pub fn rect(&self) -> Rect {
        Rect {
            left: self.center_x - self.width / 2.0,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Still airborne (or touching down is not yet resolved).
    InFlight,
    /// Soft landing on the pad.
    Landed,
    /// Touched the floor outside the soft-landing envelope.
    Crashed,
    /// Left the horizontal bounds of the world.
    OutOfBounds,
}

impl Outcome {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InFlight)
    }
}

/// Result of a single [`LanderEnv::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub outcome: Outcome,
}

/// Wrap an angle in degrees into [0, 360).
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// The lander simulation.
#[derive(Debug, Clone)]
pub struct LanderEnv {
    config: LanderConfig,
    state: LanderState,
    pad: LandingPad,
}

impl LanderEnv {
    /// Create an environment with the lander at its start point and the pad
    /// centered. Call [`LanderEnv::reset`] to randomize the pad.
    ///
    /// The configuration is validated here, so a constructed environment can
    /// always place its pad.
    pub fn new(config: LanderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pad = LandingPad {
            center_x: config.width / 2.0,
            top: config.pad_top(),
            width: config.pad_width,
            height: config.pad_height,
        };
        let mut env = Self {
            config,
            state: LanderState::default(),
            pad,
        };
        env.state = env.initial_state();
        Ok(env)
    }

    pub fn config(&self) -> &LanderConfig {
        &self.config
    }

    pub fn state(&self) -> &LanderState {
        &self.state
    }

    pub fn pad(&self) -> &LandingPad {
        &self.pad
    }

    fn initial_state(&self) -> LanderState {
        LanderState {
            x: self.config.width / 2.0,
            y: self.config.start_height,
            ..LanderState::default()
        }
    }

    /// Start a new episode.
    ///
    /// The pad center is drawn uniformly from
    /// `[pad_width/2, width - pad_width/2]` using `rng`; everything else is
    /// deterministic.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Observation {
        let (lo, hi) = self.config.pad_center_range();
        self.pad = LandingPad {
            center_x: rng.gen_range(lo..=hi),
            top: self.config.pad_top(),
            width: self.config.pad_width,
            height: self.config.pad_height,
        };
        self.state = self.initial_state();
        self.observation()
    }

    /// Advance the simulation by one step.
    pub fn step(&mut self, action: Action) -> StepResult {
        let cfg = &self.config;
        let s = &mut self.state;
        s.steps += 1;

        match action {
            Action::Thrust => {
                let rad = s.angle.to_radians();
                s.vy -= cfg.thrust * rad.cos();
                s.vx += cfg.thrust * rad.sin();
            }
            Action::RotateLeft => s.angular_velocity += cfg.rotation_impulse,
            Action::RotateRight => s.angular_velocity -= cfg.rotation_impulse,
            Action::NoOp => {}
        }

        s.vy += cfg.gravity;

        s.x += s.vx;
        s.y += s.vy;

        s.angle = wrap_degrees(s.angle + s.angular_velocity);
        s.angular_velocity *= cfg.angular_damping;

        self.update_contacts();
        let outcome = self.resolve_outcome();
        let reward = match outcome {
            Outcome::InFlight => self.config.rewards.step,
            Outcome::Landed => self.config.rewards.landing,
            Outcome::Crashed | Outcome::OutOfBounds => self.config.rewards.crash,
        };

        match outcome {
            Outcome::Landed => self.state.landed = true,
            Outcome::Crashed | Outcome::OutOfBounds => self.state.crashed = true,
            Outcome::InFlight => {}
        }

        StepResult {
            observation: self.observation(),
            reward,
            done: outcome.is_terminal(),
            outcome,
        }
    }

    /// Unrotated bounding box of the lander body.
    pub fn lander_rect(&self) -> Rect {
        Rect::centered(
            self.state.x,
            self.state.y,
            self.config.lander_width,
            self.config.lander_height,
        )
    }

    /// Vertical coordinates of the left and right feet.
    pub fn leg_heights(&self) -> (f32, f32) {
        let rad = self.state.angle.to_radians();
        let half_h = self.config.lander_height / 2.0;
        let half_w = self.config.lander_width / 2.0;
        let base = self.state.y + half_h * rad.cos();
        let offset = half_w * rad.sin();
        (base + offset, base - offset)
    }

    /// Recompute leg contact flags from the current pose.
    fn update_contacts(&mut self) {
        let lander = self.lander_rect();
        let pad = self.pad.rect();
        let (left_y, right_y) = self.leg_heights();

        self.state.left_contact = left_y >= pad.top && pad.spans_x(lander.left);
        self.state.right_contact = right_y >= pad.top && pad.spans_x(lander.right());
    }

    /// Classify the current pose.
    ///
    /// Leaving the world wins over touching the floor. The landing branch
    /// requires pad overlap and both legs down; the crash branch only needs the
    /// lower edge to reach the floor.
    fn resolve_outcome(&self) -> Outcome {
        let s = &self.state;
        if s.x < 0.0 || s.x > self.config.width {
            return Outcome::OutOfBounds;
        }

        let lander = self.lander_rect();
        if lander.bottom() >= self.config.height {
            let criteria = &self.config.landing;
            let soft = lander.intersects(&self.pad.rect())
                && s.left_contact
                && s.right_contact
                && s.vx.abs() < criteria.max_horizontal_speed
                && s.vy.abs() < criteria.max_vertical_speed
                && s.angle.abs() < criteria.max_angle;
            return if soft {
                Outcome::Landed
            } else {
                Outcome::Crashed
            };
        }

        Outcome::InFlight
    }

    /// Current observation.
    pub fn observation(&self) -> Observation {
        let s = &self.state;
        let c = &self.config;
        [
            s.x / c.width,
            s.y / c.height,
            s.vx / c.velocity_scale,
            s.vy / c.velocity_scale,
            s.angle / 180.0,
            s.angular_velocity / c.angular_velocity_scale,
            if s.left_contact { 1.0 } else { 0.0 },
            if s.right_contact { 1.0 } else { 0.0 },
        ]
    }
}
