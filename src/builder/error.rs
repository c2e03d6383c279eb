//! Build errors for the state machine builder.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No states registered. Call .state(state, handler) before .build()")]
    NoStates,

    #[error("State '{state}' registered more than once")]
    DuplicateState { state: String },

    #[error("State '{state}' is a sentinel and cannot have a handler")]
    SentinelState { state: String },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}
