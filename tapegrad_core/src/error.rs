//! Error types for the tape engine.

use thiserror::Error;

/// Errors that can occur while building or differentiating a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The tape is full. Nothing was allocated; reset the tape before recording more.
    #[error("tape capacity exceeded: all {capacity} slots are in use")]
    CapacityExceeded { capacity: usize },

    /// A handle outlived the tape generation it was issued for.
    #[error("stale tape reference: node {index} belongs to generation {generation}, tape is at generation {current}")]
    StaleTapeReference {
        index: usize,
        generation: u64,
        current: u64,
    },

    /// A parameter handle outlived a `release_parameters` call.
    #[error("stale parameter reference: slot {slot} belongs to generation {generation}, store is at generation {current}")]
    StaleParameterReference {
        slot: usize,
        generation: u64,
        current: u64,
    },
}

impl Error {
    /// True for either flavour of stale handle.
    pub fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            Error::StaleTapeReference { .. } | Error::StaleParameterReference { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
