//! Builder API for ergonomic state machine construction.
//!
//! States are declared as enum values (see [`state_enum!`](crate::state_enum))
//! and handlers are registered per state, forming the lookup table the
//! dispatch loop uses.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;

use crate::core::State;
use crate::machine::{StateHandler, StateMachine};

/// Box a closure as a [`StateHandler`].
///
/// Useful when handlers are kept in a collection before registration.
///
/// # Example
///
/// ```
/// use evented_sm::builder::handler;
/// use evented_sm::machine::StateHandler;
/// use evented_sm::state_enum;
///
/// state_enum! {
///     enum Blink {
///         On,
///         Off,
///     }
///     final: Off
/// }
///
/// let on: StateHandler<Blink> = handler(|m| m.exit(0));
/// ```
pub fn handler<S, F>(f: F) -> StateHandler<S>
where
    S: State,
    F: FnMut(&StateMachine<S>) + Send + 'static,
{
    Box::new(f)
}
