//! Configuration system for the simulation.
//!
//! Supports YAML configuration files with sensible defaults. Every section
//! may be omitted from a file and falls back to its defaults.

use crate::index::IndexKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub organisms: OrganismConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub quadtree: QuadtreeConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// World/environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world
    pub width: u32,
    /// Height of the world
    pub height: u32,
    /// Spatial index implementation (flat or quadtree)
    pub index: IndexKind,
    /// Worker threads for the reaction phase (1 = sequential)
    pub workers: usize,
    /// Seed for the environment's RNG; random when absent
    pub seed: Option<u64>,
}

/// Organism behaviour constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganismConfig {
    /// Life span of newly created organisms
    pub initial_life_span: f32,
    /// A predator must be this many times larger than its victim
    pub predation_ratio: f32,
    /// Flee when the other is this many times larger
    pub flee_ratio: f32,
    /// Chase when this organism is this many times larger
    pub chase_ratio: f32,
    /// Chance to keep the previous heading when nothing was sensed
    pub keep_movement_probability: f32,
    /// Life span needed before reproducing
    pub reproduction_threshold: f32,
    /// Offset of an offspring from its parent on both axes
    pub offspring_offset: f32,
    /// Multiplier on the per-tick life consumption formula
    pub consumption_scale: f32,
}

/// Food configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    /// Life span gained by eating one food item
    pub energy: f32,
}

/// Adaptive quadtree tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// Objects a leaf holds before it subdivides
    pub max_objects: usize,
    /// Nodes this size or smaller never subdivide
    pub min_size: f32,
}

/// Settings for the generational runner in the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Organisms placed before the first generation
    pub initial_organisms: usize,
    /// DNA of the founding organisms
    pub initial_dna: [u8; 4],
    /// Number of generations to run
    pub generations: u32,
    /// Ticks simulated per generation
    pub iterations_per_generation: u64,
    /// Food scattered at the start of each generation
    pub food_per_generation: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Ticks between stats history snapshots
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            index: IndexKind::Quadtree,
            workers: 1,
            seed: None,
        }
    }
}

impl Default for OrganismConfig {
    fn default() -> Self {
        Self {
            initial_life_span: 500.0,
            predation_ratio: 1.5,
            flee_ratio: 1.5,
            chase_ratio: 1.5,
            keep_movement_probability: 0.8,
            reproduction_threshold: 1000.0,
            offspring_offset: 2.0,
            consumption_scale: 1.3,
        }
    }
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self { energy: 500.0 }
    }
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_objects: 10,
            min_size: 10.0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_organisms: 50,
            initial_dna: [40, 40, 40, 40],
            generations: 20,
            iterations_per_generation: 200,
            food_per_generation: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.world.width == 0 || self.world.height == 0 {
            return invalid("world width and height must be > 0");
        }
        if self.world.workers == 0 {
            return invalid("workers must be >= 1");
        }
        let o = &self.organisms;
        if !(o.initial_life_span > 0.0) {
            return invalid("initial_life_span must be > 0");
        }
        if !(o.predation_ratio > 0.0 && o.flee_ratio > 0.0 && o.chase_ratio > 0.0) {
            return invalid("predation, flee and chase ratios must be > 0");
        }
        if !(0.0..=1.0).contains(&o.keep_movement_probability) {
            return invalid("keep_movement_probability must be between 0 and 1");
        }
        if !o.consumption_scale.is_finite() || o.consumption_scale < 0.0 {
            return invalid("consumption_scale must be a finite value >= 0");
        }
        if self.quadtree.max_objects == 0 {
            return invalid("quadtree max_objects must be > 0");
        }
        if !(self.quadtree.min_size > 0.0) {
            return invalid("quadtree min_size must be > 0");
        }
        if self.logging.stats_interval == 0 {
            return invalid("stats_interval must be > 0");
        }
        Ok(())
    }
}
