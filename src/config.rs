//! Configuration for a pointswarm session.
//!
//! Everything here can be serialized to JSON and passed to the binary as its
//! first argument. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::controls::checked_count_from_slider;
use crate::error::ConfigError;

/// A bounded, stepped numeric control.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SliderConfig {
    pub min: f32,
    pub max: f32,
    /// Amount one key press moves the slider.
    pub step: f32,
    /// Initial position.
    pub value: f32,
}

impl SliderConfig {
    pub const fn new(min: f32, max: f32, step: f32, value: f32) -> Self {
        Self {
            min,
            max,
            step,
            value,
        }
    }

    /// Clamp `value` into `[min, max]`.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Move `value` by `steps` increments, staying in range.
    pub fn nudge(&self, value: f32, steps: f32) -> f32 {
        self.clamp(value + steps * self.step)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.min <= self.max) {
            return Err(ConfigError::Invalid(format!(
                "{name}: min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if !(self.step > 0.0) {
            return Err(ConfigError::Invalid(format!("{name}: step must be positive")));
        }
        if !(self.min..=self.max).contains(&self.value) {
            return Err(ConfigError::Invalid(format!(
                "{name}: value {} outside [{}, {}]",
                self.value, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Acceleration slider; magnitude is `value * 0.0001`.
    pub accel: SliderConfig,
    /// Particle-count slider; count is `round(500 * exp(value / 12))`.
    pub points: SliderConfig,
    /// Point size in pixels.
    pub point_size: SliderConfig,
    pub clear_color: [f32; 3],
    /// Fixed RNG seed for reproducible seeding and screensaver paths.
    pub seed: Option<u64>,
    /// Start with the screensaver driving the controls.
    pub screensaver: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            title: "pointswarm".to_string(),
            width: 1280,
            height: 720,
            accel: SliderConfig::new(0.0, 100.0, 1.0, 10.0),
            points: SliderConfig::new(0.0, 72.0, 1.0, 36.0),
            point_size: SliderConfig::new(1.0, 10.0, 1.0, 1.0),
            clear_color: [0.01, 0.01, 0.01],
            seed: None,
            screensaver: false,
        }
    }
}

impl SwarmConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        self.accel.validate("accel")?;
        self.points.validate("points")?;
        if checked_count_from_slider(self.points.max).is_none() {
            return Err(ConfigError::Invalid(format!(
                "points: max {} gives more particles than fit in a u32",
                self.points.max
            )));
        }
        self.point_size.validate("point_size")?;
        Ok(())
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.clear_color;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SwarmConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SwarmConfig = serde_json::from_str(r#"{ "width": 640, "seed": 7 }"#).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.height, 720);
        assert_eq!(config.points, SwarmConfig::default().points);
    }

    #[test]
    fn slider_value_out_of_range_is_rejected() {
        let mut config = SwarmConfig::default();
        config.point_size.value = 50.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("point_size"));
    }

    #[test]
    fn points_max_beyond_u32_is_rejected() {
        let mut config = SwarmConfig::default();
        config.points = SliderConfig::new(0.0, 400.0, 1.0, 36.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("points"));

        config.points = SliderConfig::new(0.0, 150.0, 1.0, 130.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_step_is_rejected() {
        let mut config = SwarmConfig::default();
        config.accel.step = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nudge_stays_in_range() {
        let slider = SliderConfig::new(1.0, 10.0, 1.0, 1.0);
        assert_eq!(slider.nudge(1.0, -1.0), 1.0);
        assert_eq!(slider.nudge(9.0, 3.0), 10.0);
        assert_eq!(slider.nudge(4.0, 1.0), 5.0);
    }
}
