//! Static food items.

use crate::config::OrganismConfig;
use crate::entity::{EntityId, EnvironmentObject};
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Energy a food item grants when no other value is configured
pub const DEFAULT_FOOD_ENERGY: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodState {
    Fresh,
    Eaten,
}

/// A food item. Its state flag is atomic so reaction workers can read it
/// while holding only a shared reference.
pub struct Food {
    id: EntityId,
    position: Vec2,
    energy: f32,
    eaten: AtomicBool,
}

impl Food {
    pub fn new() -> Self {
        Self::with_energy(DEFAULT_FOOD_ENERGY)
    }

    pub fn with_energy(energy: f32) -> Self {
        Self {
            id: EntityId::new(),
            position: Vec2::ZERO,
            energy,
            eaten: AtomicBool::new(false),
        }
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

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn state(&self) -> FoodState {
        if self.eaten.load(Ordering::Acquire) {
            FoodState::Eaten
        } else {
            FoodState::Fresh
        }
    }

    pub fn can_be_eaten(&self) -> bool {
        self.state() == FoodState::Fresh
    }

    /// Mark as eaten. Returns `true` only for the call that performed the
    /// FRESH -> EATEN transition.
    pub fn eaten(&self) -> bool {
        self.eaten
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for Food {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Food {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            position: self.position,
            energy: self.energy,
            eaten: AtomicBool::new(self.eaten.load(Ordering::Acquire)),
        }
    }
}

impl fmt::Debug for Food {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Food")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("energy", &self.energy)
            .field("state", &self.state())
            .finish()
    }
}

impl EnvironmentObject for Food {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Food never changes on its own
    fn post_iteration(&mut self, _config: &OrganismConfig) {}
}
