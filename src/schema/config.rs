//! Configuration types for the lander environment.

use serde::{Deserialize, Serialize};

/// Top-level environment configuration.
///
/// Screen coordinates: `x` grows to the right, `y` grows downward, so gravity
/// increases vertical velocity and the floor sits at `y == height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanderConfig {
    /// World width.
    pub width: f32,
    /// World height (floor line).
    pub height: f32,
    /// Lander body width.
    pub lander_width: f32,
    /// Lander body height.
    pub lander_height: f32,
    /// Vertical start position of the lander center.
    pub start_height: f32,
    /// Downward acceleration added to vertical velocity every step.
    pub gravity: f32,
    /// Main engine impulse per thrust step.
    pub thrust: f32,
    /// Angular velocity change (degrees/step) per rotate action.
    pub rotation_impulse: f32,
    /// Multiplicative damping applied to angular velocity every step.
    pub angular_damping: f32,
    /// Landing pad width.
    pub pad_width: f32,
    /// Landing pad height.
    pub pad_height: f32,
    /// Observation normalization scale for linear velocity.
    pub velocity_scale: f32,
    /// Observation normalization scale for angular velocity.
    pub angular_velocity_scale: f32,
    /// Soft-landing thresholds.
    pub landing: LandingCriteria,
    /// Reward schedule.
    pub rewards: RewardConfig,
}

impl Default for LanderConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            lander_width: 20.0,
            lander_height: 30.0,
            start_height: 50.0,
            gravity: 0.08,
            thrust: 0.25,
            rotation_impulse: 2.0,
            angular_damping: 0.9,
            pad_width: 80.0,
            pad_height: 10.0,
            velocity_scale: 5.0,
            angular_velocity_scale: 5.0,
            landing: LandingCriteria::default(),
            rewards: RewardConfig::default(),
        }
    }
}

/// Bounds a touchdown must satisfy to count as a soft landing.
///
/// All comparisons are strict (`|v| < max`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingCriteria {
    pub max_horizontal_speed: f32,
    pub max_vertical_speed: f32,
    /// Compared against the wrapped angle in degrees, [0, 360).
    pub max_angle: f32,
}

impl Default for LandingCriteria {
    fn default() -> Self {
        Self {
            max_horizontal_speed: 1.0,
            max_vertical_speed: 2.0,
            max_angle: 10.0,
        }
    }
}

/// Scalar rewards emitted by the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward for a soft landing on the pad.
    pub landing: f32,
    /// Reward for a crash or leaving the world.
    pub crash: f32,
    /// Reward for every non-terminal step.
    pub step: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            landing: 1000.0,
            crash: -100.0,
            step: -1.0,
        }
    }
}

impl LanderConfig {
    /// Vertical coordinate of the pad's top surface.
    #[inline]
    pub fn pad_top(&self) -> f32 {
        self.height - self.pad_height
    }

    /// Range the pad center is sampled from at reset.
    #[inline]
    pub fn pad_center_range(&self) -> (f32, f32) {
        let half = self.pad_width / 2.0;
        (half, self.width - half)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(self.lander_width > 0.0 && self.lander_height > 0.0) {
            return Err(ConfigError::InvalidLanderSize);
        }
        if !(self.pad_width > 0.0 && self.pad_height > 0.0) {
            return Err(ConfigError::InvalidPadSize);
        }
        if self.pad_width > self.width || self.pad_height > self.height {
            return Err(ConfigError::PadExceedsWorld {
                pad_width: self.pad_width,
                width: self.width,
            });
        }
        if !(self.velocity_scale > 0.0 && self.angular_velocity_scale > 0.0) {
            return Err(ConfigError::InvalidScale);
        }

        let constants = [
            ("start_height", self.start_height),
            ("gravity", self.gravity),
            ("thrust", self.thrust),
            ("rotation_impulse", self.rotation_impulse),
            ("angular_damping", self.angular_damping),
            ("landing.max_horizontal_speed", self.landing.max_horizontal_speed),
            ("landing.max_vertical_speed", self.landing.max_vertical_speed),
            ("landing.max_angle", self.landing.max_angle),
            ("rewards.landing", self.rewards.landing),
            ("rewards.crash", self.rewards.crash),
            ("rewards.step", self.rewards.step),
        ];
        for (name, value) in constants {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("World dimensions (width, height) must be positive")]
    InvalidDimensions,
    #[error("Lander dimensions must be positive")]
    InvalidLanderSize,
    #[error("Landing pad dimensions must be positive")]
    InvalidPadSize,
    #[error("Landing pad ({pad_width}) does not fit in the world ({width})")]
    PadExceedsWorld { pad_width: f32, width: f32 },
    #[error("Observation scales must be positive")]
    InvalidScale,
    #[error("Parameter {0} must be finite")]
    NonFinite(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(LanderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pad_geometry() {
        let config = LanderConfig::default();
        assert_eq!(config.pad_top(), 390.0);
        assert_eq!(config.pad_center_range(), (40.0, 560.0));
    }

    #[test]
    fn test_rejects_oversized_pad() {
        let config = LanderConfig {
            pad_width: 700.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PadExceedsWorld { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite_gravity() {
        let config = LanderConfig {
            gravity: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite("gravity"))
        ));
    }

    #[test]
    fn test_partial_json() {
        let config: LanderConfig = serde_json::from_str(r#"{"width": 800.0}"#).unwrap();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 400.0);
        assert_eq!(config.rewards.landing, 1000.0);
    }
}
