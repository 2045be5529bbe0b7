//! Error types for the segment cache
//!
//! Provides unified error handling using thiserror. Only recoverable
//! boundaries return these; broken component contracts panic instead.

use thiserror::Error;

use crate::registry::RegistrationId;

// == Cache Error Enum ==
/// Unified error type for the segment cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Deregistration of an id the registry does not hold
    #[error("Purgeable not registered: {0}")]
    NotRegistered(RegistrationId),

    /// The disposal worker thread could not be started
    #[error("Failed to spawn disposal worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// The disposal worker thread panicked while finalizing a segment
    #[error("Disposal worker panicked")]
    WorkerPanicked,
}

// == Result Type Alias ==
/// Convenience Result type for the segment cache.
pub type Result<T> = std::result::Result<T, CacheError>;
