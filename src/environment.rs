//! Environment simulation engine - main simulation loop.
//!
//! A tick runs four phases with a full barrier between them:
//!
//! 1. Interaction: live organisms, in registry order, eat and kill what is
//!    within their size radius. Single-threaded.
//! 2. Reaction: live organisms pick a movement from what they sense within
//!    size + awareness. Computed in parallel against a frozen world.
//! 3. Post-iteration: life consumption and movement, clamped to the bounds,
//!    then every position is pushed into the spatial index.
//! 4. Cleanup: dead organisms are archived and eaten food is counted; both
//!    leave the registry and the index.

use crate::config::Config;
use crate::entity::{Entity, EntityId, EnvironmentObject};
use crate::error::SimError;
use crate::food::Food;
use crate::genes::Genes;
use crate::geometry::Vec2;
use crate::index::{IndexKind, SpatialIndex};
use crate::organism::{Interaction, Organism};
use crate::profiler::Profiler;
use crate::registry::EntityRegistry;
use crate::stats::{Stats, StatsHistory};
use log::{debug, info, trace};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Instant;

/// Movement decision computed during the reaction phase
type Decision = (EntityId, Option<Vec2>);

/// The simulated world
pub struct Environment {
    width: u32,
    height: u32,
    index_kind: IndexKind,
    index: Box<dyn SpatialIndex<EntityId>>,
    registry: EntityRegistry,

    // Archive and counters
    dead_organisms: Vec<Organism>,
    food_consumption: u64,
    births: u64,
    iteration: u64,

    // Reaction-phase workers
    workers: usize,
    pool: Option<rayon::ThreadPool>,

    config: Config,

    // Host-side randomness (population, food placement)
    rng: ChaCha8Rng,
    seed: u64,

    // Statistics
    stats: Stats,
    stats_history: StatsHistory,
    profiler: Profiler,

    // Per-tick counters
    deaths_this_tick: usize,
    eaten_this_tick: usize,
}

impl Environment {
    /// Create an environment of `width x height` backed by the named index
    /// kind (`"flat"` or `"quadtree"`) with `worker_count` reaction workers.
    pub fn new(
        width: u32,
        height: u32,
        index_kind: &str,
        worker_count: usize,
    ) -> Result<Self, SimError> {
        let mut config = Config::default();
        config.world.width = width;
        config.world.height = height;
        config.world.index = index_kind.parse()?;
        config.world.workers = worker_count;
        Self::from_config(config)
    }

    /// Create an environment from a full configuration
    pub fn from_config(config: Config) -> Result<Self, SimError> {
        let seed = config.world.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self::from_config_with_seed(config, seed)
    }

    /// Create an environment with a specific seed for reproducibility
    pub fn from_config_with_seed(config: Config, seed: u64) -> Result<Self, SimError> {
        let world = &config.world;
        if world.width == 0 || world.height == 0 {
            return Err(SimError::InvalidArgument(format!(
                "environment dimensions must be positive, got {}x{}",
                world.width, world.height
            )));
        }
        if world.workers == 0 {
            return Err(SimError::InvalidArgument(
                "worker count must be at least 1".to_string(),
            ));
        }
        config.validate()?;

        let pool = if world.workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(world.workers)
                    .thread_name(|i| format!("simevo-react-{}", i))
                    .build()?,
            )
        } else {
            None
        };

        let index = world
            .index
            .build(world.width as f32, world.height as f32, &config.quadtree);

        info!(
            "Environment {}x{} created (index: {}, workers: {}, seed: {})",
            world.width, world.height, world.index, world.workers, seed
        );

        Ok(Self {
            width: world.width,
            height: world.height,
            index_kind: world.index,
            index,
            registry: EntityRegistry::new(),
            dead_organisms: Vec::new(),
            food_consumption: 0,
            births: 0,
            iteration: 0,
            workers: world.workers,
            pool,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            stats: Stats::new(),
            stats_history: StatsHistory::new(config.logging.stats_interval),
            profiler: Profiler::new(),
            deaths_this_tick: 0,
            eaten_this_tick: 0,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Population management
    // ------------------------------------------------------------------

    /// Place `entity` at `(x, y)`. Bounds are inclusive on both ends. On
    /// error neither the registry nor the index is modified.
    pub fn add(&mut self, entity: impl Into<Entity>, x: f32, y: f32) -> Result<EntityId, SimError> {
        self.check_bounds(x, y)?;

        let mut entity = entity.into();
        let id = entity.id();
        if self.registry.contains(&id) {
            return Err(SimError::AlreadyPresent(id));
        }

        entity.set_position(Vec2::new(x, y));
        self.index.insert(id, x, y)?;
        if self.registry.insert(entity).is_err() {
            self.index.remove(&id);
            return Err(SimError::AlreadyPresent(id));
        }
        Ok(id)
    }

    /// Take an entity out of the environment
    pub fn remove(&mut self, id: EntityId) -> Result<Entity, SimError> {
        let entity = self.registry.remove(&id).ok_or(SimError::NotFound(id))?;
        self.index.remove(&id);
        Ok(entity)
    }

    /// Drop every entity, the dead archive and all counters
    pub fn reset(&mut self) {
        self.index.clear();
        self.registry.clear();
        self.dead_organisms.clear();
        self.food_consumption = 0;
        self.births = 0;
        self.iteration = 0;
        self.stats = Stats::new();
        self.stats_history.clear();
        self.profiler.reset();
        info!("Environment reset");
    }

    /// Add `count` organisms with the given DNA at random positions
    pub fn populate(&mut self, count: usize, dna: [u8; 4]) -> Result<Vec<EntityId>, SimError> {
        let genes = Genes::new(dna);
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let organism = Organism::with_seed(
                genes.clone(),
                self.config.organisms.initial_life_span,
                self.rng.gen(),
            );
            let (x, y) = self.random_position();
            ids.push(self.add(organism, x, y)?);
        }
        Ok(ids)
    }

    /// Add `count` fresh food items at random positions
    pub fn scatter_food(&mut self, count: usize) -> Result<Vec<EntityId>, SimError> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let food = Food::with_energy(self.config.food.energy);
            let (x, y) = self.random_position();
            ids.push(self.add(food, x, y)?);
        }
        Ok(ids)
    }

    /// Every organism able to reproduce adds one offspring at its own
    /// position. Returns the offspring ids.
    pub fn reproduce_organisms(&mut self) -> Result<Vec<EntityId>, SimError> {
        let parents: Vec<EntityId> = self
            .registry
            .organisms()
            .filter(|o| o.can_reproduce(&self.config.organisms))
            .map(Organism::id)
            .collect();

        let mut offspring = Vec::with_capacity(parents.len());
        for id in parents {
            let Some(position) = self.registry.organism(&id).map(|o| o.position()) else {
                continue;
            };
            // Checked before the parent pays for the child
            self.check_bounds(position.x, position.y)?;
            let Some(parent) = self.registry.organism_mut(&id) else {
                continue;
            };
            let child = parent.reproduce(&self.config.organisms);
            offspring.push(self.add(child, position.x, position.y)?);
        }

        self.births += offspring.len() as u64;
        debug!("{} offspring added", offspring.len());
        Ok(offspring)
    }

    /// Remove every food item. Removed food does not count as consumed.
    pub fn remove_all_foods(&mut self) -> usize {
        let removed = self.registry.sweep(Entity::is_food);
        for entity in &removed {
            self.index.remove(&entity.id());
        }
        removed.len()
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Run up to `iterations` ticks. Returns how many ran.
    pub fn simulate_iteration(&mut self, iterations: u64) -> Result<u64, SimError> {
        self.simulate_iteration_with(iterations, |_| {})
    }

    /// Run up to `iterations` ticks, calling `on_each_iteration` after every
    /// completed tick. Stops early once there are neither live organisms nor
    /// food left.
    pub fn simulate_iteration_with<F>(
        &mut self,
        iterations: u64,
        mut on_each_iteration: F,
    ) -> Result<u64, SimError>
    where
        F: FnMut(&Environment),
    {
        let mut executed = 0;
        for _ in 0..iterations {
            if self.is_exhausted() {
                debug!("Nothing left to simulate after {} ticks", self.iteration);
                break;
            }

            self.step()?;
            executed += 1;
            on_each_iteration(self);
        }
        Ok(executed)
    }

    /// Run a single tick
    pub fn step(&mut self) -> Result<(), SimError> {
        self.deaths_this_tick = 0;
        self.eaten_this_tick = 0;

        // Phase 1: Interactions (sequential, registry order)
        let start = Instant::now();
        self.interaction_phase()?;
        let interaction = start.elapsed();

        // Phase 2: Reactions (parallel decisions, sequential apply)
        let start = Instant::now();
        self.reaction_phase()?;
        let reaction = start.elapsed();

        // Phase 3: Life consumption, movement, index refresh
        let start = Instant::now();
        self.post_iteration_phase()?;
        let post_iteration = start.elapsed();

        // Phase 4: Sweep dead organisms and eaten food
        let start = Instant::now();
        self.cleanup();
        let cleanup = start.elapsed();

        self.iteration += 1;

        // Phase 5: Statistics
        self.profiler.record("interaction", interaction);
        self.profiler.record("reaction", reaction);
        self.profiler.record("post_iteration", post_iteration);
        self.profiler.record("cleanup", cleanup);
        trace!(
            "tick {}: interaction {:?}, reaction {:?}, post_iteration {:?}, cleanup {:?}",
            self.iteration,
            interaction,
            reaction,
            post_iteration,
            cleanup
        );
        self.update_stats();

        Ok(())
    }

    fn interaction_phase(&mut self) -> Result<(), SimError> {
        // Organisms killed during this phase still act on their own turn
        let actors = self.registry.living_organism_ids();

        for id in actors {
            let interactions = {
                let Some(actor) = self.registry.organism(&id) else {
                    continue;
                };
                let neighbors = self.neighbors(actor, actor.size());
                actor
                    .interact(&neighbors, &self.config.organisms)
                    .map_err(|source| SimError::Strategy { id, source })?
            };

            for interaction in interactions {
                self.apply_interaction(id, interaction)?;
            }
        }
        Ok(())
    }

    fn apply_interaction(&mut self, actor: EntityId, interaction: Interaction) -> Result<(), SimError> {
        let gained = match interaction {
            Interaction::Eat(target) => {
                if target == actor {
                    return Err(SimError::InvalidInteraction {
                        actor,
                        target,
                        reason: "an organism cannot eat itself",
                    });
                }
                match self.registry.get(&target) {
                    Some(Entity::Food(food)) => {
                        if !food.eaten() {
                            return Ok(());
                        }
                        self.eaten_this_tick += 1;
                        food.energy()
                    }
                    Some(Entity::Organism(_)) => {
                        return Err(SimError::InvalidInteraction {
                            actor,
                            target,
                            reason: "only food can be eaten",
                        })
                    }
                    None => return Err(SimError::NotFound(target)),
                }
            }
            Interaction::Kill(target) => {
                if target == actor {
                    return Err(SimError::InvalidInteraction {
                        actor,
                        target,
                        reason: "an organism cannot kill itself",
                    });
                }
                match self.registry.get_mut(&target) {
                    Some(Entity::Organism(victim)) => {
                        if !victim.is_alive() {
                            return Ok(());
                        }
                        victim.take_life()
                    }
                    Some(Entity::Food(_)) => {
                        return Err(SimError::InvalidInteraction {
                            actor,
                            target,
                            reason: "only organisms can be killed",
                        })
                    }
                    None => return Err(SimError::NotFound(target)),
                }
            }
        };

        let organism = self
            .registry
            .organism_mut(&actor)
            .ok_or(SimError::NotFound(actor))?;
        organism.add_life_span(gained);
        Ok(())
    }

    fn reaction_phase(&mut self) -> Result<(), SimError> {
        let ids = self.registry.living_organism_ids();
        if ids.is_empty() {
            return Ok(());
        }

        let exclusive = ids
            .iter()
            .filter_map(|id| self.registry.organism(id))
            .any(|o| !o.reacts_reentrantly());

        let decisions: Vec<Decision> = match &self.pool {
            Some(pool) if !exclusive => {
                let chunk_size = ids.len().div_ceil(self.workers);
                let chunks = pool.install(|| {
                    ids.par_chunks(chunk_size)
                        .map(|chunk| {
                            chunk
                                .iter()
                                .map(|&id| self.decide(id))
                                .collect::<Result<Vec<Decision>, SimError>>()
                        })
                        .collect::<Result<Vec<Vec<Decision>>, SimError>>()
                })?;
                chunks.into_iter().flatten().collect()
            }
            _ => {
                if exclusive && self.pool.is_some() {
                    debug!("Non-reentrant reaction strategy present, reacting on one thread");
                }
                ids.iter()
                    .map(|&id| self.decide(id))
                    .collect::<Result<Vec<Decision>, SimError>>()?
            }
        };

        for (id, movement) in decisions {
            if let (Some(movement), Some(organism)) = (movement, self.registry.organism_mut(&id)) {
                organism.apply_reaction(movement);
            }
        }
        Ok(())
    }

    /// Reaction decision for one organism. Reads shared state only.
    fn decide(&self, id: EntityId) -> Result<Decision, SimError> {
        let organism = self.registry.organism(&id).ok_or(SimError::NotFound(id))?;
        let neighbors = self.neighbors(organism, organism.reaction_radius());
        let movement = organism
            .react(&neighbors, &self.config.organisms)
            .map_err(|source| SimError::Strategy { id, source })?;
        Ok((id, movement))
    }

    fn post_iteration_phase(&mut self) -> Result<(), SimError> {
        let max = Vec2::new(self.width as f32, self.height as f32);
        for entity in self.registry.iter_mut() {
            entity.post_iteration(&self.config.organisms);
            if let Entity::Organism(organism) = entity {
                if organism.is_alive() {
                    organism.set_position(organism.position().clamp(Vec2::ZERO, max));
                }
            }
            let position = entity.position();
            self.index.update(entity.id(), position.x, position.y)?;
        }
        Ok(())
    }

    /// Archive dead organisms and count eaten food, removing both. Running
    /// it again without a tick in between changes nothing.
    pub fn cleanup(&mut self) -> usize {
        let removed = self.registry.sweep(Entity::is_spent);
        let count = removed.len();

        for entity in removed {
            self.index.remove(&entity.id());
            match entity {
                Entity::Organism(organism) => {
                    self.deaths_this_tick += 1;
                    self.dead_organisms.push(organism);
                }
                Entity::Food(_) => self.food_consumption += 1,
            }
        }
        count
    }

    fn update_stats(&mut self) {
        self.stats.iteration = self.iteration;
        self.stats.food = self.registry.foods().count();
        self.stats.deaths = self.deaths_this_tick;
        self.stats.dead_total = self.dead_organisms.len();
        self.stats.food_eaten = self.eaten_this_tick;
        self.stats.food_consumed = self.food_consumption;
        self.stats.births = self.births;
        self.stats.update(self.registry.organisms());

        if self.stats_history.is_due(self.iteration) {
            self.stats_history.record(self.stats.clone());
        }
        debug!("{}", self.stats.summary());
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Entities within `radius` of `organism`, excluding itself
    fn neighbors(&self, organism: &Organism, radius: f32) -> Vec<&Entity> {
        let p = organism.position();
        self.index
            .query(p.x, p.y, radius)
            .into_iter()
            .filter(|id| *id != organism.id())
            .filter_map(|id| self.registry.get(&id))
            .collect()
    }

    fn check_bounds(&self, x: f32, y: f32) -> Result<(), SimError> {
        let inside = (0.0..=self.width as f32).contains(&x) && (0.0..=self.height as f32).contains(&y);
        if inside {
            Ok(())
        } else {
            Err(SimError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn random_position(&mut self) -> (f32, f32) {
        (
            self.rng.gen_range(0.0..=self.width as f32),
            self.rng.gen_range(0.0..=self.height as f32),
        )
    }

    fn is_exhausted(&self) -> bool {
        !self.registry.organisms().any(Organism::is_alive) && self.registry.foods().next().is_none()
    }

    /// Snapshot of every organism
    pub fn organisms(&self) -> Vec<Organism> {
        self.registry.organisms().cloned().collect()
    }

    /// Snapshot of every food item
    pub fn foods(&self) -> Vec<Food> {
        self.registry.foods().cloned().collect()
    }

    /// Snapshot of every entity, in registry order
    pub fn objects(&self) -> Vec<Entity> {
        self.registry.iter().cloned().collect()
    }

    /// Snapshot of the organisms removed as dead since the last reset
    pub fn dead_organisms(&self) -> Vec<Organism> {
        self.dead_organisms.clone()
    }

    /// Eaten food items swept since the last reset
    pub fn food_consumption(&self) -> u64 {
        self.food_consumption
    }

    pub fn organism(&self, id: EntityId) -> Option<&Organism> {
        self.registry.organism(&id)
    }

    pub fn food(&self, id: EntityId) -> Option<&Food> {
        self.registry.food(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.registry.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.registry.contains(&id)
    }

    /// Position `id` is currently indexed at
    pub fn indexed_position(&self, id: EntityId) -> Option<Vec2> {
        self.index.position(&id)
    }

    /// Entity ids within `range` of `(x, y)`
    pub fn query(&self, x: f32, y: f32, range: f32) -> Vec<EntityId> {
        self.index.query(x, y, range)
    }

    /// Number of live organisms
    pub fn population(&self) -> usize {
        self.registry.organisms().filter(|o| o.is_alive()).count()
    }

    pub fn food_count(&self) -> usize {
        self.registry.foods().count()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index_kind
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Ticks executed since creation or the last reset
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn births(&self) -> u64 {
        self.births
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stats_history(&self) -> &StatsHistory {
        &self.stats_history
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organism::{InteractionStrategy, ReactionStrategy};

    fn organism(dna: [u8; 4], life: f32) -> Organism {
        Organism::with_seed(Genes::new(dna), life, 11)
    }

    #[test]
    fn test_environment_creation() {
        let env = Environment::new(1000, 800, "quadtree", 1).unwrap();
        assert_eq!(env.width(), 1000);
        assert_eq!(env.height(), 800);
        assert_eq!(env.index_kind(), IndexKind::Quadtree);
        assert!(env.is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            Environment::new(100, 100, "rtree", 1),
            Err(SimError::InvalidArgument(_))
        ));
        assert!(matches!(
            Environment::new(100, 100, "flat", 0),
            Err(SimError::InvalidArgument(_))
        ));
        assert!(matches!(
            Environment::new(0, 100, "flat", 1),
            Err(SimError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_bounds_inclusive() {
        let mut env = Environment::new(100, 50, "quadtree", 1).unwrap();
        assert!(env.add(Food::new(), 0.0, 0.0).is_ok());
        assert!(env.add(Food::new(), 100.0, 50.0).is_ok());
        assert!(matches!(
            env.add(Food::new(), 100.5, 10.0),
            Err(SimError::OutOfBounds { .. })
        ));
        assert!(env.add(Food::new(), 10.0, -0.1).is_err());
        assert!(env.add(Food::new(), f32::NAN, 1.0).is_err());
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_add_twice_rejected() {
        let mut env = Environment::new(100, 100, "flat", 1).unwrap();
        let food = Food::new();
        env.add(food.clone(), 1.0, 1.0).unwrap();
        assert!(matches!(
            env.add(food, 2.0, 2.0),
            Err(SimError::AlreadyPresent(_))
        ));
        assert_eq!(env.len(), 1);
        assert_eq!(env.query(2.0, 2.0, 0.5).len(), 0);
    }

    #[test]
    fn test_remove() {
        let mut env = Environment::new(100, 100, "quadtree", 1).unwrap();
        let id = env.add(Food::new(), 10.0, 10.0).unwrap();

        let removed = env.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(env.query(10.0, 10.0, 1.0).is_empty());
        assert!(matches!(env.remove(id), Err(SimError::NotFound(_))));
    }

    #[test]
    fn test_eating_food() {
        let mut env = Environment::new(200, 200, "flat", 1).unwrap();
        let org = organism([0, 40, 0, 0], 100.0);
        let id = env.add(org, 50.0, 50.0).unwrap();
        env.add(Food::with_energy(250.0), 52.0, 50.0).unwrap();

        assert_eq!(env.simulate_iteration(1).unwrap(), 1);

        let org = env.organism(id).unwrap();
        let cost = org.life_consumption(&env.config().organisms);
        assert!((org.life_span() - (350.0 - cost)).abs() < 1e-3);
        assert_eq!(env.food_count(), 0);
        assert_eq!(env.food_consumption(), 1);
    }

    #[test]
    fn test_positions_clamped_to_bounds() {
        let mut env = Environment::new(20, 20, "quadtree", 1).unwrap();
        let id = env.add(organism([200, 4, 4, 0], 10_000.0), 20.0, 20.0).unwrap();
        env.simulate_iteration(30).unwrap();

        let p = env.organism(id).unwrap().position();
        assert!((0.0..=20.0).contains(&p.x) && (0.0..=20.0).contains(&p.y));
        assert_eq!(env.indexed_position(id), Some(p));
    }

    #[test]
    fn test_cleanup_idempotent() {
        let mut env = Environment::new(100, 100, "flat", 1).unwrap();
        let food = Food::new();
        food.eaten();
        env.add(food, 5.0, 5.0).unwrap();
        env.add(Food::new(), 6.0, 5.0).unwrap();

        assert_eq!(env.cleanup(), 1);
        let ids: Vec<EntityId> = env.objects().iter().map(|e| e.id()).collect();
        assert_eq!(env.cleanup(), 0);
        let again: Vec<EntityId> = env.objects().iter().map(|e| e.id()).collect();
        assert_eq!(ids, again);
        assert_eq!(env.food_consumption(), 1);
    }

    #[test]
    fn test_invalid_interaction_reported() {
        let mut env = Environment::new(100, 100, "flat", 1).unwrap();
        let bully = organism([40, 40, 40, 0], 500.0).with_interaction(InteractionStrategy::new(
            |_, neighbors| {
                Ok(neighbors
                    .iter()
                    .filter(|e| e.is_organism())
                    .map(|e| Interaction::Eat(e.id()))
                    .collect())
            },
        ));
        env.add(bully, 10.0, 10.0).unwrap();
        env.add(organism([40, 40, 40, 0], 500.0), 11.0, 10.0).unwrap();

        assert!(matches!(
            env.simulate_iteration(1),
            Err(SimError::InvalidInteraction { .. })
        ));
    }

    #[test]
    fn test_strategy_error_aborts_run() {
        let mut env = Environment::new(100, 100, "flat", 2).unwrap();
        let org = organism([40; 4], 500.0)
            .with_reaction(ReactionStrategy::new(|_, _| Err("sensor failure".into())));
        env.add(org, 10.0, 10.0).unwrap();

        assert!(matches!(
            env.simulate_iteration(5),
            Err(SimError::Strategy { .. })
        ));
        assert_eq!(env.iteration(), 0);
    }

    #[test]
    fn test_custom_reaction_drives_movement() {
        let mut env = Environment::new(1000, 1000, "quadtree", 4).unwrap();
        let east = ReactionStrategy::new(|_, _| Ok(Vec2::new(100.0, 0.0)));
        let id = env
            .add(organism([40, 40, 40, 0], 500.0).with_reaction(east), 100.0, 100.0)
            .unwrap();

        env.simulate_iteration(3).unwrap();

        assert_eq!(env.organism(id).unwrap().position(), Vec2::new(130.0, 100.0));
    }

    #[test]
    fn test_exclusive_strategy_runs_sequentially() {
        let mut env = Environment::new(1000, 1000, "flat", 4).unwrap();
        let main = std::thread::current().id();
        let strategy = ReactionStrategy::exclusive(move |_, _| {
            if std::thread::current().id() == main {
                Ok(Vec2::new(1.0, 0.0))
            } else {
                Err("reaction ran off the calling thread".into())
            }
        });
        for i in 0..16 {
            let org = organism([40; 4], 500.0).with_reaction(strategy.clone());
            env.add(org, 10.0 + i as f32 * 50.0, 500.0).unwrap();
        }

        assert!(env.simulate_iteration(2).is_ok());
    }

    #[test]
    fn test_reproduce_organisms() {
        let mut env = Environment::new(500, 500, "quadtree", 1).unwrap();
        let parent = env.add(organism([40; 4], 1500.0), 100.0, 100.0).unwrap();
        env.add(organism([40; 4], 400.0), 300.0, 300.0).unwrap();

        let children = env.reproduce_organisms().unwrap();

        assert_eq!(children.len(), 1);
        let child = env.organism(children[0]).unwrap();
        assert_eq!(child.parent(), Some(parent));
        assert_eq!(child.position(), Vec2::new(100.0, 100.0));
        assert_eq!(env.organism(parent).unwrap().life_span(), 750.0);
        assert_eq!(env.births(), 1);
    }

    #[test]
    fn test_reproduce_out_of_bounds_parent_keeps_life() {
        let mut env = Environment::new(500, 500, "quadtree", 1).unwrap();
        let parent = env.add(organism([40; 4], 1500.0), 100.0, 100.0).unwrap();
        env.registry
            .organism_mut(&parent)
            .unwrap()
            .set_position(Vec2::new(600.0, 100.0));

        assert!(matches!(
            env.reproduce_organisms(),
            Err(SimError::OutOfBounds { .. })
        ));
        assert_eq!(env.organism(parent).unwrap().life_span(), 1500.0);
        assert_eq!(env.population(), 1);
        assert_eq!(env.births(), 0);
    }

    #[test]
    fn test_populate_scatter_and_remove_food() {
        let mut config = Config::default();
        config.world.width = 300;
        config.world.height = 300;
        config.world.seed = Some(5);
        let mut env = Environment::from_config(config).unwrap();

        let organisms = env.populate(10, [40; 4]).unwrap();
        let foods = env.scatter_food(25).unwrap();
        assert_eq!(organisms.len(), 10);
        assert_eq!(foods.len(), 25);
        assert_eq!(env.food_count(), 25);

        assert_eq!(env.remove_all_foods(), 25);
        assert_eq!(env.food_count(), 0);
        assert_eq!(env.food_consumption(), 0);
        assert_eq!(env.population(), 10);
        assert_eq!(env.query(150.0, 150.0, 1000.0).len(), 10);
    }

    #[test]
    fn test_reset() {
        let mut env = Environment::new(100, 100, "quadtree", 1).unwrap();
        env.add(organism([40, 40, 40, 0], 1.0), 10.0, 10.0).unwrap();
        env.add(Food::new(), 90.0, 90.0).unwrap();
        env.simulate_iteration(1).unwrap();
        assert_eq!(env.dead_organisms().len(), 1);

        env.reset();

        assert!(env.is_empty());
        assert!(env.dead_organisms().is_empty());
        assert_eq!(env.food_consumption(), 0);
        assert_eq!(env.iteration(), 0);
        assert!(env.query(50.0, 50.0, 200.0).is_empty());
    }

    #[test]
    fn test_profiler_records_phases() {
        let mut env = Environment::new(100, 100, "flat", 1).unwrap();
        env.add(organism([40; 4], 500.0), 50.0, 50.0).unwrap();
        env.simulate_iteration(2).unwrap();

        for phase in ["interaction", "reaction", "post_iteration", "cleanup"] {
            assert_eq!(env.profiler().get(phase).map(|e| e.count), Some(2), "{}", phase);
        }
    }
}
