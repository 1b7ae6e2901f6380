//! Entity identity and the closed set of entity kinds.

use crate::config::OrganismConfig;
use crate::food::Food;
use crate::geometry::Vec2;
use crate::organism::Organism;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique, never reused entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Fresh random (v4) identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Behaviour every object living in an environment shares
pub trait EnvironmentObject {
    fn id(&self) -> EntityId;

    fn position(&self) -> Vec2;

    fn set_position(&mut self, position: Vec2);

    /// Per-tick update run after interactions and reactions
    fn post_iteration(&mut self, config: &OrganismConfig);
}

/// Discriminant of [`Entity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Organism,
    Food,
}

/// Anything that can be placed in an environment
#[derive(Debug, Clone)]
pub enum Entity {
    Organism(Organism),
    Food(Food),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Organism(_) => EntityKind::Organism,
            Entity::Food(_) => EntityKind::Food,
        }
    }

    pub fn as_organism(&self) -> Option<&Organism> {
        match self {
            Entity::Organism(o) => Some(o),
            Entity::Food(_) => None,
        }
    }

    pub fn as_organism_mut(&mut self) -> Option<&mut Organism> {
        match self {
            Entity::Organism(o) => Some(o),
            Entity::Food(_) => None,
        }
    }

    pub fn as_food(&self) -> Option<&Food> {
        match self {
            Entity::Food(f) => Some(f),
            Entity::Organism(_) => None,
        }
    }

    pub fn is_organism(&self) -> bool {
        matches!(self, Entity::Organism(_))
    }

    pub fn is_food(&self) -> bool {
        matches!(self, Entity::Food(_))
    }

    /// Whether the cleanup sweep should remove this entity: dead organisms
    /// and eaten food.
    pub fn is_spent(&self) -> bool {
        match self {
            Entity::Organism(o) => !o.is_alive(),
            Entity::Food(f) => !f.can_be_eaten(),
        }
    }

    /// Whether this entity is something a reacting organism can target:
    /// fresh food or a live organism.
    pub fn is_valid_target(&self) -> bool {
        !self.is_spent()
    }
}

impl EnvironmentObject for Entity {
    fn id(&self) -> EntityId {
        match self {
            Entity::Organism(o) => o.id(),
            Entity::Food(f) => f.id(),
        }
    }

    fn position(&self) -> Vec2 {
        match self {
            Entity::Organism(o) => o.position(),
            Entity::Food(f) => f.position(),
        }
    }

    fn set_position(&mut self, position: Vec2) {
        match self {
            Entity::Organism(o) => o.set_position(position),
            Entity::Food(f) => f.set_position(position),
        }
    }

    fn post_iteration(&mut self, config: &OrganismConfig) {
        match self {
            Entity::Organism(o) => o.post_iteration(config),
            Entity::Food(f) => f.post_iteration(config),
        }
    }
}

impl From<Organism> for Entity {
    fn from(organism: Organism) -> Self {
        Entity::Organism(organism)
    }
}

impl From<Food> for Entity {
    fn from(food: Food) -> Self {
        Entity::Food(food)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genes::Genes;

    #[test]
    fn test_ids_are_unique() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn test_entity_dispatch() {
        let mut food: Entity = Food::new().into();
        food.set_position(Vec2::new(3.0, 4.0));
        assert_eq!(food.kind(), EntityKind::Food);
        assert_eq!(food.position(), Vec2::new(3.0, 4.0));
        assert!(food.as_organism().is_none());

        let organism: Entity = Organism::with_seed(Genes::new([40; 4]), 500.0, 1).into();
        assert!(organism.is_organism());
        assert!(!organism.is_spent());
    }

    #[test]
    fn test_spent_entities() {
        let food = Food::new();
        food.eaten();
        assert!(Entity::from(food).is_spent());

        let mut organism = Organism::with_seed(Genes::new([40; 4]), 500.0, 1);
        organism.take_life();
        assert!(Entity::from(organism).is_spent());
    }
}
