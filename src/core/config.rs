//! Universe configuration with documented constants
//!
//! Settings are plain serde structs so they can be loaded from TOML
//! (`data/universe/default.toml`) and carried inside checkpoints.
//! [`UniverseSettings::validate`] must pass before any tick runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Tick;

/// Malformed settings, detected before the first tick
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("speed_of_light must be positive and finite, got {0}")]
    NonPositiveSpeedOfLight(f64),

    #[error("t_dim must be at least 1, got {0}")]
    EmptyTimeWindow(Tick),

    #[error("universe dimensions must be positive, got {x}x{y}x{z}")]
    EmptySpace { x: i64, y: i64, z: i64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    #[error("fuel pool target ratios sum to {0}, which exceeds 1")]
    RatiosExceedOne(f64),

    #[error("{name} must be finite and not negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("human player count {humans} exceeds total player count {total}")]
    TooManyHumans { humans: usize, total: usize },
}

/// Settings shared by every part of the kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSettings {
    pub universe_name: String,

    /// Seed for every random draw in the simulation
    pub seed: u64,

    /// Distance light travels per tick
    ///
    /// Light delay between two cubes is `ceil(distance / speed_of_light)`.
    /// Velocities are always kept strictly below this value.
    pub speed_of_light: f64,

    /// How many ticks an observer can look back through
    ///
    /// A target whose light delay is `t_dim` or more is out of range;
    /// the observer keeps the last image it received.
    pub t_dim: Tick,

    /// Spatial extent of the universe in cubes
    pub x_dim: i64,
    pub y_dim: i64,
    pub z_dim: i64,

    /// Name of the mechanism collection (`default`, `empty`)
    pub mechanism_collection: String,

    /// Name of the AI used for AI-controlled players (`default`, `none`)
    pub ai: String,

    /// Worker threads for the planning phase (0 = rayon default)
    pub planning_threads: usize,

    pub constants: MechanismConstants,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            universe_name: "default".to_string(),
            seed: 100,
            speed_of_light: 1.0,
            t_dim: 8,
            x_dim: 10,
            y_dim: 10,
            z_dim: 3,
            mechanism_collection: "default".to_string(),
            ai: "default".to_string(),
            planning_threads: 0,
            constants: MechanismConstants::default(),
        }
    }
}

impl UniverseSettings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file, then validate them
    pub fn from_toml_file(path: impl AsRef<Path>) -> crate::core::error::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: UniverseSettings = toml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed_of_light.is_finite() && self.speed_of_light > 0.0) {
            return Err(ConfigError::NonPositiveSpeedOfLight(self.speed_of_light));
        }

        if self.t_dim < 1 {
            return Err(ConfigError::EmptyTimeWindow(self.t_dim));
        }

        if self.x_dim < 1 || self.y_dim < 1 || self.z_dim < 1 {
            return Err(ConfigError::EmptySpace {
                x: self.x_dim,
                y: self.y_dim,
                z: self.z_dim,
            });
        }

        self.constants.validate()
    }

    /// Largest speed any player may reach
    pub fn max_speed(&self) -> f64 {
        self.speed_of_light * self.constants.max_speed_fraction
    }
}

/// Tunable constants read by mechanisms, commands and the default AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanismConstants {
    // === FUEL ===
    /// Fuel added to storage on every dilation turn
    pub fuel_production_rate: f64,

    /// Share of total fuel kept in the movement pool after balancing
    pub movement_target_ratio: f64,

    /// Share of total fuel kept in the production pool after balancing
    pub production_target_ratio: f64,

    /// Share of total fuel kept in the trade pool after balancing
    pub trade_target_ratio: f64,

    /// Share of a subordinate's trade pool sent to its leader every tick
    pub tribute_fraction: f64,

    /// Movement fuel burned per unit of velocity change
    pub velocity_change_fuel_cost: f64,

    /// Storage fuel handed to a freshly spawned subordinate
    pub spawn_fuel_cost: f64,

    // === SCIENCE ===
    /// Knowledge gained on every dilation turn
    pub research_rate: f64,

    /// Share of the gap to shared knowledge absorbed every tick
    pub knowledge_diffusion_rate: f64,

    // === MOVEMENT ===
    /// Speed cap as a fraction of the speed of light (strictly below 1)
    pub max_speed_fraction: f64,

    // === AI ===
    /// Ticks during which a contacted target counts as recently contacted
    pub recent_contact_window: Tick,

    /// Most subordinates the default AI will spawn under one leader
    pub max_direct_subordinates: usize,
}

impl Default for MechanismConstants {
    fn default() -> Self {
        Self {
            fuel_production_rate: 1.0,
            movement_target_ratio: 0.1,
            production_target_ratio: 0.1,
            trade_target_ratio: 0.1,
            tribute_fraction: 0.1,
            velocity_change_fuel_cost: 10.0,
            spawn_fuel_cost: 100.0,
            research_rate: 0.5,
            knowledge_diffusion_rate: 0.05,
            max_speed_fraction: 0.9,
            recent_contact_window: 5,
            max_direct_subordinates: 3,
        }
    }
}

impl MechanismConstants {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("movement_target_ratio", self.movement_target_ratio),
            ("production_target_ratio", self.production_target_ratio),
            ("trade_target_ratio", self.trade_target_ratio),
            ("tribute_fraction", self.tribute_fraction),
            ("knowledge_diffusion_rate", self.knowledge_diffusion_rate),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RatioOutOfRange { name, value });
            }
        }

        let pool_sum =
            self.movement_target_ratio + self.production_target_ratio + self.trade_target_ratio;
        if pool_sum > 1.0 {
            return Err(ConfigError::RatiosExceedOne(pool_sum));
        }

        if !(0.0..1.0).contains(&self.max_speed_fraction) {
            return Err(ConfigError::RatioOutOfRange {
                name: "max_speed_fraction",
                value: self.max_speed_fraction,
            });
        }

        let non_negative = [
            ("fuel_production_rate", self.fuel_production_rate),
            ("velocity_change_fuel_cost", self.velocity_change_fuel_cost),
            ("spawn_fuel_cost", self.spawn_fuel_cost),
            ("research_rate", self.research_rate),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        Ok(())
    }
}

/// Settings for universe generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    /// Name of the generator (`random`, `minimal`)
    pub generate_method: String,
    pub num_players: usize,
    pub num_human_players: usize,
    /// Fuel placed in each generated player's storage pool
    pub initial_fuel: f64,
    pub universe: UniverseSettings,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            generate_method: "random".to_string(),
            num_players: 12,
            num_human_players: 0,
            initial_fuel: 1e6,
            universe: UniverseSettings::default(),
        }
    }
}

impl GenerateSettings {
    pub fn from_toml_file(path: impl AsRef<Path>) -> crate::core::error::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: GenerateSettings = toml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_human_players > self.num_players {
            return Err(ConfigError::TooManyHumans {
                humans: self.num_human_players,
                total: self.num_players,
            });
        }
        if !(self.initial_fuel.is_finite() && self.initial_fuel >= 0.0) {
            return Err(ConfigError::Negative {
                name: "initial_fuel",
                value: self.initial_fuel,
            });
        }
        self.universe.validate()
    }
}
