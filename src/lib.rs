//! Evented SM: a cooperative, event-driven state machine.
//!
//! One task runs the dispatch loop and executes the handler of the current
//! state. Handlers block on a set of events; interrupt handlers, driver
//! callbacks, timers and other threads post events and request transitions
//! concurrently.
//!
//! # Core Concepts
//!
//! - **Events**: bits in an [`EventMask`]. Thirty are free for the
//!   application; `TIMEOUT` and `TRANSITION` are reserved and always
//!   part of a wait.
//! - **States**: values of a type implementing [`State`], one handler per
//!   state, plus a final sentinel that ends the loop.
//! - **Deferred events**: posted while deferred in the current state, they
//!   are delivered to the next state instead.
//! - **Ignored events**: dropped for the rest of the current state.
//! - **Transitions**: the first [`StateMachine::set_next_state`] request
//!   between two state entries wins and wakes the running handler.
//!
//! # Example
//!
//! ```rust
//! use evented_sm::builder::StateMachineBuilder;
//! use evented_sm::core::EventMask;
//! use evented_sm::state_enum;
//! use std::thread;
//!
//! const PACKET_RECEIVED: EventMask = EventMask::event(0);
//!
//! state_enum! {
//!     enum Rx {
//!         Invalid,
//!         Listening,
//!         Done,
//!     }
//!     final: Done
//!     invalid: Invalid
//! }
//!
//! let machine = StateMachineBuilder::new()
//!     .name("rx")
//!     .state(Rx::Listening, |m| {
//!         // Stand-in for a radio driver callback.
//!         let radio = m.clone();
//!         thread::spawn(move || radio.post(PACKET_RECEIVED));
//!
//!         let events = m.wait(PACKET_RECEIVED);
//!         if events.contains(PACKET_RECEIVED) {
//!             m.exit(0);
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(machine.run(Rx::Listening), Ok(0));
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;
pub mod snapshot;
pub mod timer;

// Re-export commonly used types
pub use builder::StateMachineBuilder;
pub use self::core::{EventMask, State, StateHistory, StateTransition};
pub use machine::{RunError, StateMachine};
