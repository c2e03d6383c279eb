//! Errors returned by the dispatch loop.

use thiserror::Error;

/// Errors that end a run without reaching the final state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("Initial state '{state}' is the invalid sentinel")]
    InvalidInitialState { state: String },

    #[error("No handler registered for state '{state}'")]
    NoHandler { state: String },

    #[error("State machine '{name}' is already running")]
    AlreadyRunning { name: String },
}

impl RunError {
    /// Negative status code for callers that expect an integer result.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidInitialState { .. } => -1,
            Self::NoHandler { .. } => -2,
            Self::AlreadyRunning { .. } => -3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative_and_distinct() {
        let errors = [
            RunError::InvalidInitialState { state: "Invalid".into() },
            RunError::NoHandler { state: "Setup".into() },
            RunError::AlreadyRunning { name: "rx".into() },
        ];
        let codes: Vec<i32> = errors.iter().map(RunError::code).collect();
        assert_eq!(codes, vec![-1, -2, -3]);
    }

    #[test]
    fn messages_name_the_state() {
        let err = RunError::NoHandler { state: "SyncedRx".into() };
        assert_eq!(err.to_string(), "No handler registered for state 'SyncedRx'");
    }
}
