//! # simevo
//!
//! Discrete-time organism simulation engine backed by an adaptive quadtree.
//!
//! ## Features
//!
//! - **Spatial indexing**: flat scan or self-subdividing quadtree behind one trait
//! - **Parallel**: reaction decisions computed on a Rayon worker pool
//! - **Pluggable**: custom reaction, interaction, life-consumption and mutation hooks
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: every organism owns a seeded RNG
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simevo::{Environment, Food, Genes, Organism};
//!
//! let mut env = Environment::new(1000, 1000, "quadtree", 4)?;
//!
//! let organism = Organism::new(Genes::new([40, 40, 40, 40]), 500.0);
//! env.add(organism, 500.0, 500.0)?;
//! env.add(Food::new(), 505.0, 500.0)?;
//!
//! env.simulate_iteration_with(100, |env| {
//!     println!("{}", env.stats().summary());
//! })?;
//!
//! println!("Food eaten: {}", env.food_consumption());
//! println!("Dead organisms: {}", env.dead_organisms().len());
//! # Ok::<(), simevo::SimError>(())
//! ```
//!
//! ## Custom behaviour
//!
//! ```rust
//! use simevo::{Genes, Organism, ReactionStrategy, Vec2};
//!
//! // Always head east; may run on any worker thread
//! let strategy = ReactionStrategy::new(|_organism, _neighbors| Ok(Vec2::new(1.0, 0.0)));
//! let organism = Organism::new(Genes::new([40; 4]), 500.0).with_reaction(strategy);
//! assert!(organism.reacts_reentrantly());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use simevo::{Config, IndexKind};
//!
//! let mut config = Config::default();
//! config.world.index = IndexKind::Flat;
//! config.organisms.predation_ratio = 2.0;
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod entity;
pub mod environment;
pub mod error;
pub mod food;
pub mod genes;
pub mod geometry;
pub mod index;
pub mod organism;
pub mod profiler;
pub mod registry;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use entity::{Entity, EntityId, EntityKind, EnvironmentObject};
pub use environment::Environment;
pub use error::{SimError, StrategyError};
pub use food::{Food, FoodState};
pub use genes::Genes;
pub use geometry::Vec2;
pub use index::{AdaptiveQuadtree, FlatIndex, IndexKind, SpatialIndex};
pub use organism::{Interaction, InteractionStrategy, LifeConsumption, Organism, ReactionStrategy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark: `population` organisms and as much food on a
/// 1000x1000 world, simulated for up to `iterations` ticks.
pub fn benchmark(
    kind: IndexKind,
    iterations: u64,
    population: usize,
    workers: usize,
) -> Result<BenchmarkResult, SimError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.world.index = kind;
    config.world.workers = workers;

    let mut env = Environment::from_config_with_seed(config.clone(), 42)?;
    env.populate(population, config.run.initial_dna)?;
    env.scatter_food(population)?;

    let start = Instant::now();
    let executed = env.simulate_iteration(iterations)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        index: kind,
        iterations: executed,
        initial_population: population,
        final_population: env.population(),
        food_consumed: env.food_consumption(),
        elapsed_secs: elapsed.as_secs_f64(),
        iterations_per_second: executed as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub index: IndexKind,
    pub iterations: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub food_consumed: u64,
    pub elapsed_secs: f64,
    pub iterations_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ({}) ===", self.index)?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        writeln!(f, "Population: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Food consumed: {}", self.food_consumed)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} iterations/s", self.iterations_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut env = Environment::new(500, 500, "quadtree", 1).unwrap();
        env.populate(20, [40; 4]).unwrap();
        env.scatter_food(20).unwrap();

        let executed = env.simulate_iteration(100).unwrap();

        assert!(executed <= 100);
        assert_eq!(env.iteration(), executed);
    }

    #[test]
    fn test_benchmark() {
        for kind in IndexKind::ALL {
            let result = benchmark(kind, 20, 30, 2).unwrap();
            assert!(result.iterations <= 20);
            assert_eq!(result.initial_population, 30);
            assert_eq!(result.index, kind);
        }
    }
}
