//! Core state machine types.
//!
//! This module contains the value types the machine is built from:
//! - Event bitmasks with the two reserved bits
//! - State identifiers via the `State` trait
//! - Immutable history of state entries
//!
//! Nothing in here blocks or locks; the `machine` module owns all
//! synchronization.

mod events;
mod history;
mod state;

pub use events::EventMask;
pub use history::{StateHistory, StateTransition};
pub use state::State;
