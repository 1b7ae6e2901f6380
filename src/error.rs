//! Error types for the simulation engine.

use crate::config::ConfigError;
use crate::entity::EntityId;
use crate::index::IndexError;
use thiserror::Error;

/// Boxed error returned by user-supplied strategy callbacks
pub type StrategyError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`Environment`](crate::Environment) operations
#[derive(Debug, Error)]
pub enum SimError {
    #[error("position ({x}, {y}) is outside the environment bounds {width}x{height}")]
    OutOfBounds {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    },

    #[error("entity {0} not found")]
    NotFound(EntityId),

    #[error("entity {0} is already part of the environment")]
    AlreadyPresent(EntityId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An interaction that no entity kind can carry out. Indicates a bug in
    /// the strategy that produced it, not a runtime condition.
    #[error("invalid interaction from {actor} on {target}: {reason}")]
    InvalidInteraction {
        actor: EntityId,
        target: EntityId,
        reason: &'static str,
    },

    #[error("strategy of organism {id} failed: {source}")]
    Strategy {
        id: EntityId,
        #[source]
        source: StrategyError,
    },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::OutOfBounds {
            x: 1200.0,
            y: 3.0,
            width: 1000,
            height: 1000,
        };
        assert!(err.to_string().contains("1200"));

        let err = SimError::InvalidArgument("unknown index kind 'rtree'".into());
        assert_eq!(err.to_string(), "invalid argument: unknown index kind 'rtree'");
    }

    #[test]
    fn test_strategy_error_keeps_source() {
        use std::error::Error as _;

        let err = SimError::Strategy {
            id: EntityId::new(),
            source: "callback exploded".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("callback exploded"));
    }
}
