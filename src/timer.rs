//! One-shot timeout collaborator.
//!
//! The `TIMEOUT` event carries no duration of its own. A [`Timeout`] is an
//! external timer that posts it to a machine once its duration elapses,
//! unless cancelled first.

use crate::core::{EventMask, State};
use crate::machine::{Signal, StateMachine};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::trace;

/// Armed one-shot timer. Dropping it cancels the timer.
///
/// # Example
///
/// ```
/// use evented_sm::builder::StateMachineBuilder;
/// use evented_sm::core::EventMask;
/// use evented_sm::state_enum;
/// use evented_sm::timer::Timeout;
/// use std::time::Duration;
///
/// state_enum! {
///     enum Probe {
///         Listening,
///         Done,
///     }
///     final: Done
/// }
///
/// let machine = StateMachineBuilder::new()
///     .state(Probe::Listening, |m| {
///         let _timer = Timeout::start(m, Duration::from_millis(5));
///         let events = m.wait(EventMask::event(0));
///         m.exit(if events.contains(EventMask::TIMEOUT) { 1 } else { 0 });
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.run(Probe::Listening), Ok(1));
/// ```
#[derive(Debug)]
pub struct Timeout {
    cancel: Arc<Signal>,
    thread: Option<JoinHandle<bool>>,
}

impl Timeout {
    /// Arm a timer that posts `TIMEOUT` to `machine` after `duration`.
    pub fn start<S: State>(machine: &StateMachine<S>, duration: Duration) -> Self {
        Self::start_with(machine, duration, EventMask::TIMEOUT)
    }

    /// Arm a timer that posts `events` instead of `TIMEOUT`.
    pub fn start_with<S: State>(
        machine: &StateMachine<S>,
        duration: Duration,
        events: EventMask,
    ) -> Self {
        let cancel = Arc::new(Signal::new());
        let cancelled = Arc::clone(&cancel);
        let machine = machine.clone();

        let thread = thread::spawn(move || {
            if cancelled.wait_for(duration) {
                trace!(machine = %machine.name(), "timer cancelled");
                return false;
            }
            trace!(machine = %machine.name(), events = %events, "timer expired");
            machine.post(events);
            true
        });

        Self {
            cancel,
            thread: Some(thread),
        }
    }

    /// Cancel the timer and wait for its thread. Returns `true` if the
    /// timer had already fired.
    pub fn cancel(mut self) -> bool {
        self.stop()
    }

    fn stop(&mut self) -> bool {
        let Some(thread) = self.thread.take() else {
            return false;
        };
        self.cancel.post();
        thread.join().unwrap_or(false)
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.stop();
    }
}
