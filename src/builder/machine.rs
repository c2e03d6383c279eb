//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::State;
use crate::machine::{StateHandler, StateMachine};
use std::collections::HashMap;

/// Builder registering one handler per state.
pub struct StateMachineBuilder<S: State> {
    config: MachineConfig,
    handlers: HashMap<S, StateHandler<S>>,
    error: Option<BuildError>,
}

impl<S: State> StateMachineBuilder<S> {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            handlers: HashMap::new(),
            error: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name used in logs and snapshots.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Keep at most `limit` transitions in the history.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history.limit = limit;
        self
    }

    /// Do not record history.
    pub fn without_history(mut self) -> Self {
        self.config.history.enabled = false;
        self
    }

    /// Register the handler for `state`.
    ///
    /// Registering the same state twice, or a handler for the final or
    /// invalid sentinel, is reported by `build`.
    pub fn state<F>(mut self, state: S, handler: F) -> Self
    where
        F: FnMut(&StateMachine<S>) + Send + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if state.is_final() || state.is_invalid() {
            self.error = Some(BuildError::SentinelState {
                state: state.name().to_string(),
            });
            return self;
        }
        if self.handlers.contains_key(&state) {
            self.error = Some(BuildError::DuplicateState {
                state: state.name().to_string(),
            });
            return self;
        }
        self.handlers.insert(state, Box::new(handler));
        self
    }

    /// Build the state machine.
    /// Returns the first registration error, if any.
    pub fn build(self) -> Result<StateMachine<S>, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.handlers.is_empty() {
            return Err(BuildError::NoStates);
        }
        self.config.validate()?;

        Ok(StateMachine::new(self.config, self.handlers))
    }
}

impl<S: State> Default for StateMachineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
