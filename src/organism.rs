//! Organism structure and behavior.

use crate::config::OrganismConfig;
use crate::entity::{Entity, EntityId, EnvironmentObject};
use crate::error::StrategyError;
use crate::genes::Genes;
use crate::geometry::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Life span of a freshly created organism
pub const DEFAULT_LIFE_SPAN: f32 = 500.0;

/// Something an organism does to a neighbour during the interaction phase.
/// The environment carries it out on the organism's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Consume a fresh food item, gaining its energy
    Eat(EntityId),
    /// Kill a live organism, absorbing its remaining life span
    Kill(EntityId),
}

type ReactionFn =
    dyn for<'a> Fn(&'a Organism, &'a [&'a Entity]) -> Result<Vec2, StrategyError> + Send + Sync;
type InteractionFn = dyn for<'a> Fn(&'a Organism, &'a [&'a Entity]) -> Result<Vec<Interaction>, StrategyError>
    + Send
    + Sync;

/// Custom movement decision. Returns the desired displacement; a zero vector
/// means "no decision" and leaves the organism to wander.
#[derive(Clone)]
pub struct ReactionStrategy {
    func: Arc<ReactionFn>,
    reentrant: bool,
}

impl ReactionStrategy {
    /// Strategy that may be called from several worker threads at once
    pub fn new<F>(func: F) -> Self
    where
        F: for<'a> Fn(&'a Organism, &'a [&'a Entity]) -> Result<Vec2, StrategyError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            func: Arc::new(func),
            reentrant: true,
        }
    }

    /// Strategy that must only run on one thread at a time. While any live
    /// organism carries one, reactions are computed sequentially.
    pub fn exclusive<F>(func: F) -> Self
    where
        F: for<'a> Fn(&'a Organism, &'a [&'a Entity]) -> Result<Vec2, StrategyError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            func: Arc::new(func),
            reentrant: false,
        }
    }

    pub fn is_reentrant(&self) -> bool {
        self.reentrant
    }

    fn call(&self, organism: &Organism, neighbors: &[&Entity]) -> Result<Vec2, StrategyError> {
        (self.func)(organism, neighbors)
    }
}

impl fmt::Debug for ReactionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactionStrategy")
            .field("reentrant", &self.reentrant)
            .finish()
    }
}

/// Custom interaction logic returning what the organism does to its
/// immediate neighbours.
#[derive(Clone)]
pub struct InteractionStrategy(Arc<InteractionFn>);

impl InteractionStrategy {
    pub fn new<F>(func: F) -> Self
    where
        F: for<'a> Fn(&'a Organism, &'a [&'a Entity]) -> Result<Vec<Interaction>, StrategyError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(func))
    }

    fn call(
        &self,
        organism: &Organism,
        neighbors: &[&Entity],
    ) -> Result<Vec<Interaction>, StrategyError> {
        (self.0)(organism, neighbors)
    }
}

impl fmt::Debug for InteractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InteractionStrategy")
    }
}

/// Custom per-tick life consumption
#[derive(Clone)]
pub struct LifeConsumption(Arc<dyn Fn(&Organism) -> f32 + Send + Sync>);

impl LifeConsumption {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Organism) -> f32 + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }
}

impl fmt::Debug for LifeConsumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LifeConsumption")
    }
}

/// A mobile organism
#[derive(Clone)]
pub struct Organism {
    id: EntityId,
    position: Vec2,
    genes: Genes,
    life_span: f32,
    movement: Vec2,
    /// Reaction decisions recorded this tick
    reaction_counter: u32,
    /// Sticky: a killed organism stays dead for the rest of the tick
    killed: bool,
    generation: u32,
    parent: Option<EntityId>,
    reaction: Option<ReactionStrategy>,
    interaction: Option<InteractionStrategy>,
    consumption: Option<LifeConsumption>,
    rng: ChaCha8Rng,
}

impl Organism {
    /// Create an organism with a randomly seeded RNG
    pub fn new(genes: Genes, life_span: f32) -> Self {
        let seed = rand::thread_rng().gen();
        Self::with_seed(genes, life_span, seed)
    }

    /// Create an organism with a specific RNG seed for reproducibility
    pub fn with_seed(genes: Genes, life_span: f32, seed: u64) -> Self {
        Self {
            id: EntityId::new(),
            position: Vec2::ZERO,
            genes,
            life_span,
            movement: Vec2::ZERO,
            reaction_counter: 0,
            killed: false,
            generation: 0,
            parent: None,
            reaction: None,
            interaction: None,
            consumption: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_reaction(mut self, strategy: ReactionStrategy) -> Self {
        self.reaction = Some(strategy);
        self
    }

    pub fn with_interaction(mut self, strategy: InteractionStrategy) -> Self {
        self.interaction = Some(strategy);
        self
    }

    pub fn with_life_consumption(mut self, calculator: LifeConsumption) -> Self {
        self.consumption = Some(calculator);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn genes(&self) -> &Genes {
        &self.genes
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.genes.dna()[0] as f32 / 4.0
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.genes.dna()[1] as f32 / 4.0
    }

    #[inline]
    pub fn awareness(&self) -> f32 {
        self.genes.dna()[2] as f32 / 4.0
    }

    pub fn life_span(&self) -> f32 {
        self.life_span
    }

    pub fn add_life_span(&mut self, amount: f32) {
        self.life_span += amount;
    }

    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = movement;
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn reaction_strategy(&self) -> Option<&ReactionStrategy> {
        self.reaction.as_ref()
    }

    /// Whether reactions for this organism may be computed off-thread
    pub fn reacts_reentrantly(&self) -> bool {
        self.reaction.as_ref().map_or(true, ReactionStrategy::is_reentrant)
    }

    /// Radius within which this organism notices others
    #[inline]
    pub fn reaction_radius(&self) -> f32 {
        self.size() + self.awareness()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.killed && self.life_span > 0.0
    }

    #[inline]
    pub fn can_reproduce(&self, config: &OrganismConfig) -> bool {
        self.is_alive() && self.life_span > config.reproduction_threshold
    }

    /// Life span lost per tick
    pub fn life_consumption(&self, config: &OrganismConfig) -> f32 {
        if let Some(calculator) = &self.consumption {
            return (calculator.0)(self);
        }

        let speed = self.speed() / 10.0;
        let size = self.size() / 10.0;
        let awareness = self.awareness() / 10.0;
        (speed * speed + size * size * self.size() / 15.0 + awareness) * config.consumption_scale
    }

    /// Mark as killed and hand over the remaining life span
    pub fn take_life(&mut self) -> f32 {
        let absorbed = self.life_span.max(0.0);
        self.life_span = 0.0;
        self.killed = true;
        absorbed
    }

    /// Offspring with mutated genes and the same strategies. The parent's
    /// life span is halved.
    pub fn reproduce(&mut self, config: &OrganismConfig) -> Organism {
        let genes = self.genes.mutated(&mut self.rng);
        let seed = self.rng.gen();

        let mut child = Organism::with_seed(genes, config.initial_life_span, seed);
        child.generation = self.generation + 1;
        child.parent = Some(self.id);
        child.reaction = self.reaction.clone();
        child.interaction = self.interaction.clone();
        child.consumption = self.consumption.clone();
        child.position = self.position + Vec2::splat(config.offspring_offset);

        self.life_span /= 2.0;
        child
    }

    /// What this organism does to the neighbours within its size radius
    pub fn interact(
        &self,
        neighbors: &[&Entity],
        config: &OrganismConfig,
    ) -> Result<Vec<Interaction>, StrategyError> {
        if let Some(strategy) = &self.interaction {
            return strategy.call(self, neighbors);
        }

        let mut interactions = Vec::new();
        for neighbor in neighbors {
            match neighbor {
                Entity::Food(food) => {
                    if food.can_be_eaten() {
                        interactions.push(Interaction::Eat(food.id()));
                    }
                }
                Entity::Organism(other) => {
                    if other.id != self.id
                        && other.is_alive()
                        && self.size() > config.predation_ratio * other.size()
                    {
                        interactions.push(Interaction::Kill(other.id));
                    }
                }
            }
        }
        Ok(interactions)
    }

    /// Movement decision given the neighbours within the reaction radius.
    /// `None` means no decision this tick.
    pub fn react(
        &self,
        neighbors: &[&Entity],
        config: &OrganismConfig,
    ) -> Result<Option<Vec2>, StrategyError> {
        let decision = match &self.reaction {
            Some(strategy) => Some(strategy.call(self, neighbors)?),
            None => self.default_reaction(neighbors, config),
        };
        Ok(decision.filter(|v| !v.is_zero() && v.is_finite()))
    }

    fn default_reaction(&self, neighbors: &[&Entity], config: &OrganismConfig) -> Option<Vec2> {
        let nearest = neighbors
            .iter()
            .filter(|e| e.is_valid_target() && e.id() != self.id)
            .min_by(|a, b| {
                let da = self.position.distance_squared(a.position());
                let db = self.position.distance_squared(b.position());
                da.total_cmp(&db)
            })?;

        match nearest {
            Entity::Organism(other) => {
                if self.size() * config.flee_ratio < other.size() {
                    Some(self.position - other.position)
                } else if self.size() > config.chase_ratio * other.size() {
                    Some(other.position - self.position)
                } else {
                    None
                }
            }
            Entity::Food(food) => Some(food.position() - self.position),
        }
    }

    /// Record a movement decision. Only the first decision of a tick sticks.
    pub fn apply_reaction(&mut self, movement: Vec2) -> bool {
        if self.reaction_counter > 0 {
            return false;
        }
        self.movement = movement;
        self.reaction_counter += 1;
        true
    }

    /// Whether a movement decision was recorded this tick
    pub fn has_reacted(&self) -> bool {
        self.reaction_counter > 0
    }

    /// Per-tick update: pay life consumption, then move unless that was fatal.
    pub fn post_iteration(&mut self, config: &OrganismConfig) {
        if !self.is_alive() {
            return;
        }

        self.life_span -= self.life_consumption(config);
        if self.life_span <= 0.0 {
            self.take_life();
            return;
        }

        self.make_move(config);
    }

    fn make_move(&mut self, config: &OrganismConfig) {
        let speed = self.speed();

        if self.reaction_counter == 0 {
            let keep = !self.movement.is_zero()
                && self.rng.gen::<f32>() < config.keep_movement_probability;
            if !keep {
                let angle = self.rng.gen_range(0.0..TAU);
                self.movement = Vec2::new(angle.cos(), angle.sin()) * speed;
            }
        }

        self.movement = self.movement.clamp_length(speed);
        self.position += self.movement;
        self.reaction_counter = 0;
    }
}

impl EnvironmentObject for Organism {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn post_iteration(&mut self, config: &OrganismConfig) {
        Organism::post_iteration(self, config)
    }
}

impl fmt::Debug for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organism")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("dna", self.genes.dna())
            .field("life_span", &self.life_span)
            .field("movement", &self.movement)
            .field("killed", &self.killed)
            .field("generation", &self.generation)
            .finish()
    }
}
