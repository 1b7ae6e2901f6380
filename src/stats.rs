//! Statistics tracking for the simulation.

use crate::organism::Organism;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Statistics snapshot taken after a tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Ticks executed so far
    pub iteration: u64,
    /// Live organisms
    pub population: usize,
    /// Food items still in the world
    pub food: usize,
    /// Organisms that died during the last tick
    pub deaths: usize,
    /// Organisms archived as dead since the last reset
    pub dead_total: usize,
    /// Food items eaten during the last tick
    pub food_eaten: usize,
    /// Food items consumed since the last reset
    pub food_consumed: u64,
    /// Offspring added since the last reset
    pub births: u64,
    /// Mean life span across live organisms
    pub life_span_mean: f32,
    /// Mean speed across live organisms
    pub speed_mean: f32,
    /// Mean size across live organisms
    pub size_mean: f32,
    /// Mean awareness across live organisms
    pub awareness_mean: f32,
    /// Highest generation among live organisms
    pub generation_max: u32,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the population aggregates from the live organisms
    pub fn update<'a, I>(&mut self, organisms: I)
    where
        I: IntoIterator<Item = &'a Organism>,
    {
        let alive: Vec<&Organism> = organisms.into_iter().filter(|o| o.is_alive()).collect();
        self.population = alive.len();

        if alive.is_empty() {
            self.life_span_mean = 0.0;
            self.speed_mean = 0.0;
            self.size_mean = 0.0;
            self.awareness_mean = 0.0;
            self.generation_max = 0;
            return;
        }

        let n = alive.len() as f32;
        self.life_span_mean = alive.iter().map(|o| o.life_span()).sum::<f32>() / n;
        self.speed_mean = alive.iter().map(|o| o.speed()).sum::<f32>() / n;
        self.size_mean = alive.iter().map(|o| o.size()).sum::<f32>() / n;
        self.awareness_mean = alive.iter().map(|o| o.awareness()).sum::<f32>() / n;
        self.generation_max = alive.iter().map(|o| o.generation()).max().unwrap_or(0);
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Pop:{:5} | Food:{:5} | Dead:{:5} | Eaten:{:6} | Life:{:.0} | Spd:{:.1} Size:{:.1} Aw:{:.1} | Gen:{:3}",
            self.iteration,
            self.population,
            self.food,
            self.dead_total,
            self.food_consumed,
            self.life_span_mean,
            self.speed_mean,
            self.size_mean,
            self.awareness_mean,
            self.generation_max,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval in ticks
    pub interval: u64,
}

impl StatsHistory {
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// Whether a snapshot is due after `iteration`
    pub fn is_due(&self, iteration: u64) -> bool {
        iteration % self.interval == 0
    }

    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    pub fn latest(&self) -> Option<&Stats> {
        self.snapshots.last()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Get population over time
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.iteration, s.population))
            .collect()
    }

    /// Get remaining food over time
    pub fn food_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.iteration, s.food)).collect()
    }

    /// Get mean (speed, size, awareness) over time
    pub fn trait_series(&self) -> Vec<(u64, [f32; 3])> {
        self.snapshots
            .iter()
            .map(|s| (s.iteration, [s.speed_mean, s.size_mean, s.awareness_mean]))
            .collect()
    }

    /// Save history as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load history from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
