//! Cooperative evented state machine.
//!
//! One task owns the dispatch loop ([`StateMachine::run`]) and executes the
//! handler of the current state. Handlers block in [`StateMachine::wait`]
//! until an event they subscribed to arrives. Any other thread (an
//! interrupt handler, a driver callback, a timer) may post events, request
//! transitions, or change the deferral and ignore masks through a clone of
//! the same handle.
//!
//! All bookkeeping lives behind one short critical section. It is never
//! held across a blocking wait or a handler call.

mod error;
mod flags;
mod signal;

pub use error::RunError;
pub use signal::Signal;

use crate::config::MachineConfig;
use crate::core::{EventMask, State, StateHistory, StateTransition};
use chrono::Utc;
use flags::Flags;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Handler executed once per state entry.
///
/// A handler must eventually request a transition (directly, or through a
/// callback it installed); if it returns without one, the same state is
/// entered again.
pub type StateHandler<S> = Box<dyn FnMut(&StateMachine<S>) + Send>;

struct Inner<S: State> {
    id: Uuid,
    config: MachineConfig,
    flags: Mutex<Flags<S>>,
    signal: Signal,
    handlers: Mutex<HashMap<S, StateHandler<S>>>,
    history: Mutex<StateHistory<S>>,
}

/// Handle to an evented state machine.
///
/// Cloning the handle is cheap; every clone refers to the same machine.
pub struct StateMachine<S: State> {
    inner: Arc<Inner<S>>,
}

impl<S: State> Clone for StateMachine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: State> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = self.inner.flags.lock();
        f.debug_struct("StateMachine")
            .field("id", &self.inner.id)
            .field("name", &self.inner.config.name)
            .field("current", &flags.current)
            .field("next", &flags.next)
            .field("pending", &flags.pending)
            .field("deferred", &flags.deferred)
            .finish()
    }
}

impl<S: State> StateMachine<S> {
    /// Construct a machine with all bookkeeping cleared and nothing
    /// pending on the wait signal. Use `StateMachineBuilder` to register
    /// handlers.
    pub(crate) fn new(config: MachineConfig, handlers: HashMap<S, StateHandler<S>>) -> Self {
        let history = fresh_history(&config);
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                config,
                flags: Mutex::new(Flags::default()),
                signal: Signal::new(),
                handlers: Mutex::new(handlers),
                history: Mutex::new(history),
            }),
        }
    }

    /// Run the dispatch loop from `initial` until the final state is
    /// entered, returning the exit code.
    ///
    /// Fails without calling any handler if `initial` is the invalid
    /// sentinel or the machine is already running on another thread. Fails
    /// mid-run if a state without a handler is entered.
    pub fn run(&self, initial: S) -> Result<i32, RunError> {
        if initial.is_invalid() {
            warn!(machine = %self.name(), state = initial.name(), "refusing invalid initial state");
            return Err(RunError::InvalidInitialState {
                state: initial.name().to_string(),
            });
        }

        let Some(mut handlers) = self.inner.handlers.try_lock() else {
            warn!(machine = %self.name(), "run requested while already running");
            return Err(RunError::AlreadyRunning {
                name: self.name().to_string(),
            });
        };

        self.inner.flags.lock().start(initial.clone());
        *self.inner.history.lock() = fresh_history(&self.inner.config);
        debug!(machine = %self.name(), id = %self.inner.id, state = initial.name(), "run started");

        let mut previous: Option<S> = None;
        loop {
            let (state, carried) = {
                let mut flags = self.inner.flags.lock();
                let carried = flags.enter_next();
                match flags.current.clone() {
                    Some(state) => (state, carried),
                    None => {
                        return Err(RunError::NoHandler {
                            state: "<none>".to_string(),
                        })
                    }
                }
            };

            if let Some(from) = previous.replace(state.clone()) {
                self.record(from, state.clone(), carried);
            }

            if state.is_final() {
                break;
            }

            let Some(handler) = handlers.get_mut(&state) else {
                warn!(machine = %self.name(), state = state.name(), "no handler for state");
                return Err(RunError::NoHandler {
                    state: state.name().to_string(),
                });
            };

            debug!(machine = %self.name(), state = state.name(), carried = %carried, "entering state");
            handler(self);
        }

        let exit_code = self.inner.flags.lock().exit_code;
        debug!(machine = %self.name(), exit_code, "run finished");
        Ok(exit_code)
    }

    /// Block until at least one event in `events` (or `TIMEOUT`, or
    /// `TRANSITION`) is pending, then consume and return the matched set.
    pub fn wait(&self, events: EventMask) -> EventMask {
        self.wait_inner(events, true)
    }

    /// Poll once for `events`. Never blocks: if nothing matching is
    /// pending, `TIMEOUT` is synthesized and returned.
    pub fn try_wait(&self, events: EventMask) -> EventMask {
        self.wait_inner(events, false)
    }

    fn wait_inner(&self, events: EventMask, blocking: bool) -> EventMask {
        let mask = events | EventMask::RESERVED;
        loop {
            let matched = self.inner.flags.lock().take(mask);
            if !matched.is_empty() {
                trace!(machine = %self.name(), matched = %matched, "wait matched");
                return matched;
            }

            if blocking {
                self.inner.signal.wait();
            } else if !self.inner.signal.try_wait() {
                self.inner.flags.lock().pending |= EventMask::TIMEOUT;
            }
        }
    }

    /// Raise `events`.
    ///
    /// Ignored bits are dropped, deferred bits are held for the next state,
    /// the rest become pending. The waiter is only woken if something
    /// became pending.
    pub fn post(&self, events: EventMask) {
        let immediate = self.inner.flags.lock().post(events);
        trace!(machine = %self.name(), events = %events, immediate = %immediate, "post");
        if !immediate.is_empty() {
            self.inner.signal.post();
        }
    }

    /// Defer `events` posted from now on in the current state to the next
    /// state. Held events no longer covered by `events` become pending
    /// again. Reserved bits are removed from `events`.
    pub fn set_events_deferred(&self, events: EventMask) {
        let released = self.inner.flags.lock().set_deferred_mask(events);
        trace!(machine = %self.name(), events = %events, released = %released, "deferral mask set");
        if !released.is_empty() {
            self.inner.signal.post();
        }
    }

    /// Drop `events` for the rest of the current state, including any that
    /// are already pending. Reserved bits are removed from `events`.
    pub fn set_events_ignored(&self, events: EventMask) {
        self.inner.flags.lock().set_ignored_mask(events);
        trace!(machine = %self.name(), events = %events, "ignore mask set");
    }

    pub fn set_exit_code(&self, code: i32) {
        self.inner.flags.lock().exit_code = code;
    }

    /// Request a transition to `state` and wake the current handler.
    ///
    /// Only the first request between two state entries is honored; later
    /// ones return `false` and have no effect.
    pub fn set_next_state(&self, state: S) -> bool {
        let accepted = {
            let mut flags = self.inner.flags.lock();
            let accepted = flags.request_transition(state.clone());
            if accepted {
                flags.post(EventMask::TRANSITION);
            }
            accepted
        };

        if accepted {
            trace!(machine = %self.name(), next = state.name(), "transition requested");
            self.inner.signal.post();
        } else {
            trace!(machine = %self.name(), next = state.name(), "transition already pending");
        }
        accepted
    }

    /// Set the exit code and request the final state.
    pub fn exit(&self, code: i32) {
        self.set_exit_code(code);
        self.set_next_state(S::final_state());
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &MachineConfig {
        &self.inner.config
    }

    /// State whose handler is running (or last ran).
    pub fn current_state(&self) -> Option<S> {
        self.inner.flags.lock().current.clone()
    }

    /// State the loop will enter next.
    pub fn next_state(&self) -> Option<S> {
        self.inner.flags.lock().next.clone()
    }

    pub fn pending_events(&self) -> EventMask {
        self.inner.flags.lock().pending
    }

    /// Events held for the next state.
    pub fn deferred_events(&self) -> EventMask {
        self.inner.flags.lock().deferred
    }

    pub fn is_transition_pending(&self) -> bool {
        self.inner.flags.lock().transition_pending
    }

    pub fn exit_code(&self) -> i32 {
        self.inner.flags.lock().exit_code
    }

    /// Transitions taken by the current (or last) run.
    pub fn history(&self) -> StateHistory<S> {
        self.inner.history.lock().clone()
    }

    pub(crate) fn flags(&self) -> Flags<S> {
        self.inner.flags.lock().clone()
    }

    fn record(&self, from: S, to: S, carried: EventMask) {
        if !self.inner.config.history.enabled {
            return;
        }
        let mut history = self.inner.history.lock();
        *history = history.record(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            carried,
        });
    }
}

fn fresh_history<S: State>(config: &MachineConfig) -> StateHistory<S> {
    StateHistory::bounded(config.history.limit)
}
