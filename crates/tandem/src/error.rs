//! # Error Types
//!
//! Errors surfaced by the control-side API.
//!
//! Protocol violations arriving from the simulation never show up here: they
//! are logged and dropped where they are received.

use std::path::PathBuf;

use tandem_core::{BodyHandle, BufferError, HandoffError, RegistryError, ShapeHandle};
use thiserror::Error;

use crate::channel::ChannelState;

/// Errors from the simulation channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The requested operation is not legal in the current state.
    #[error("invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        /// State the channel was in.
        state: ChannelState,
        /// What was attempted.
        action: &'static str,
    },

    /// The simulation context has gone away.
    #[error("simulation context disconnected")]
    Disconnected,
}

/// Errors from body, shape and constraint lifecycle calls.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// No live body with this handle.
    #[error("unknown body: {0}")]
    UnknownBody(BodyHandle),

    /// The body has no such shape.
    #[error("unknown shape: {shape} on {body}")]
    UnknownShape {
        /// Body the shape was looked up on.
        body: BodyHandle,
        /// Missing shape.
        shape: ShapeHandle,
    },

    /// Adding the body would exceed the transfer buffer capacity.
    #[error("capacity exceeded: {capacity} bodies")]
    CapacityExceeded {
        /// Configured maximum.
        capacity: usize,
    },

    /// The command could not be delivered.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Errors from loading or validating world configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML could not be parsed.
    #[error("failed to parse world config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A value is out of range.
    #[error("invalid world config: {0}")]
    Invalid(String),
}

/// Any TANDEM error.
#[derive(Error, Debug)]
pub enum TandemError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lifecycle call failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Channel failure.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Registry rejected a binding.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Malformed transfer buffer.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Buffer ownership violated.
    #[error(transparent)]
    Handoff(#[from] HandoffError),

    /// The simulation thread could not be started.
    #[error("failed to spawn simulation worker: {0}")]
    Spawn(std::io::Error),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for anything in TANDEM.
pub type TandemResult<T> = Result<T, TandemError>;
