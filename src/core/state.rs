//! Core State trait for state identifiers.
//!
//! A state is identified by a plain value (normally a fieldless enum).
//! Handlers are looked up by that value, so no function pointers are
//! shared between modules.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state identifiers.
///
/// One value of the type is the final sentinel: when the dispatch loop is
/// asked to enter it, the loop ends. Optionally one value is the invalid
/// sentinel, which `run` refuses as an initial state.
///
/// # Example
///
/// ```rust
/// use evented_sm::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum RadioState {
///     Invalid,
///     Setup,
///     WaitingForSync,
///     SyncedRx,
///     Done,
/// }
///
/// impl State for RadioState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Invalid => "Invalid",
///             Self::Setup => "Setup",
///             Self::WaitingForSync => "WaitingForSync",
///             Self::SyncedRx => "SyncedRx",
///             Self::Done => "Done",
///         }
///     }
///
///     fn final_state() -> Self {
///         Self::Done
///     }
///
///     fn is_invalid(&self) -> bool {
///         matches!(self, Self::Invalid)
///     }
/// }
///
/// assert!(RadioState::Done.is_final());
/// assert!(!RadioState::Setup.is_final());
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// The sentinel that terminates the dispatch loop.
    fn final_state() -> Self;

    /// Check if this is the final sentinel.
    fn is_final(&self) -> bool {
        *self == Self::final_state()
    }

    /// Check if this is the invalid sentinel.
    ///
    /// Default implementation returns `false` (no invalid sentinel).
    fn is_invalid(&self) -> bool {
        false
    }
}
