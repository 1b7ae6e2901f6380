//! Insertion-ordered owner of every entity in an environment.

use crate::entity::{Entity, EntityId, EnvironmentObject};
use crate::food::Food;
use crate::organism::Organism;
use indexmap::IndexMap;

/// Entities keyed by id. Iteration follows insertion order, which fixes the
/// order of the interaction phase.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: IndexMap<EntityId, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entity`, returning it back if its id is already taken
    pub fn insert(&mut self, entity: Entity) -> Result<(), Entity> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(entity);
        }
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Remove while preserving the order of the remaining entities
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.shift_remove(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn organism(&self, id: &EntityId) -> Option<&Organism> {
        self.get(id).and_then(Entity::as_organism)
    }

    pub fn organism_mut(&mut self, id: &EntityId) -> Option<&mut Organism> {
        self.get_mut(id).and_then(Entity::as_organism_mut)
    }

    pub fn food(&self, id: &EntityId) -> Option<&Food> {
        self.get(id).and_then(Entity::as_food)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.iter().filter_map(Entity::as_organism)
    }

    pub fn foods(&self) -> impl Iterator<Item = &Food> {
        self.iter().filter_map(Entity::as_food)
    }

    /// Ids of live organisms, in registry order
    pub fn living_organism_ids(&self) -> Vec<EntityId> {
        self.organisms()
            .filter(|o| o.is_alive())
            .map(Organism::id)
            .collect()
    }

    /// Remove every entity matching `spent`, returning them in registry
    /// order. Survivors keep their relative order.
    pub fn sweep<F>(&mut self, mut spent: F) -> Vec<Entity>
    where
        F: FnMut(&Entity) -> bool,
    {
        if !self.entities.values().any(&mut spent) {
            return Vec::new();
        }

        let mut removed = Vec::new();
        let entities = std::mem::take(&mut self.entities);
        for (id, entity) in entities {
            if spent(&entity) {
                removed.push(entity);
            } else {
                self.entities.insert(id, entity);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
