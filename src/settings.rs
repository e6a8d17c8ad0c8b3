//! Simulation settings
//!
//! Caps for the numeric searches plus the default jump time step. Every search
//! in the simulation is bounded by one of these values and fails closed when
//! the bound is reached.

use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Search precision presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Precision {
    Coarse,
    #[default]
    Standard,
    Fine,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Coarse => "Coarse",
            Precision::Standard => "Standard",
            Precision::Fine => "Fine",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "coarse" => Some(Precision::Coarse),
            "standard" | "std" => Some(Precision::Standard),
            "fine" => Some(Precision::Fine),
            _ => None,
        }
    }

    /// Time step used by callers that don't supply their own (s)
    pub fn jump_time_step(&self) -> f64 {
        match self {
            Precision::Coarse => 0.01,
            Precision::Standard => 0.001,
            Precision::Fine => 0.0001,
        }
    }

    /// Iteration cap for jump-time discovery
    pub fn max_jump_steps(&self) -> u32 {
        match self {
            Precision::Coarse => 50_000,
            Precision::Standard => 500_000,
            Precision::Fine => 5_000_000,
        }
    }
}

/// Tunable simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Precision preset the step sizes were derived from
    pub precision: Precision,
    /// Default jump time step (s)
    pub jump_time_step: f64,
    /// Iteration cap for jump-time discovery
    pub max_jump_steps: u32,
    /// Iteration cap for the adjacent-position search toward the world centre
    pub max_search_steps: u32,
    /// Iteration cap for a single fall (one raster row per step)
    pub max_fall_steps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(Precision::Standard)
    }
}

impl Settings {
    /// Create settings from a precision preset
    pub fn from_preset(precision: Precision) -> Self {
        Self {
            precision,
            jump_time_step: precision.jump_time_step(),
            max_jump_steps: precision.max_jump_steps(),
            max_search_steps: 200_000,
            max_fall_steps: 1_000_000,
        }
    }

    /// Apply a precision preset (updates the step-dependent settings)
    pub fn apply_preset(&mut self, precision: Precision) {
        self.precision = precision;
        self.jump_time_step = precision.jump_time_step();
        self.max_jump_steps = precision.max_jump_steps();
    }

    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> SimResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Serialize settings to JSON
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard_preset() {
        let settings = Settings::default();
        assert_eq!(settings.precision, Precision::Standard);
        assert_eq!(settings.jump_time_step, 0.001);
        assert_eq!(settings.max_jump_steps, 500_000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "max_fall_steps": 12 }"#).unwrap();
        assert_eq!(settings.max_fall_steps, 12);
        assert_eq!(settings.max_search_steps, 200_000);
        assert_eq!(settings.precision, Precision::Standard);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Settings::from_json("{ not json").is_err());
    }

    #[test]
    fn test_apply_preset() {
        let mut settings = Settings::default();
        settings.apply_preset(Precision::Coarse);
        assert_eq!(settings.jump_time_step, 0.01);
        assert_eq!(settings.max_jump_steps, 50_000);
        assert_eq!(Precision::from_str("FINE"), Some(Precision::Fine));
        assert_eq!(Precision::Fine.as_str(), "Fine");
    }

    #[test]
    fn test_json_round_trip_preserves_caps() {
        let mut settings = Settings::from_preset(Precision::Fine);
        settings.max_search_steps = 42;
        let json = settings.to_json().unwrap();
        let back = Settings::from_json(&json).unwrap();
        assert_eq!(back.max_search_steps, 42);
        assert_eq!(back.precision, Precision::Fine);
    }
}
