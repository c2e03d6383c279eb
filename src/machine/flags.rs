//! Event bookkeeping shared between the dispatch loop and event producers.
//!
//! Everything here is plain data and pure transformations. The machine
//! wraps one `Flags` value in its critical section and decides from the
//! returned values whether the wait signal must be raised.

use crate::core::{EventMask, State};

#[derive(Debug, Clone)]
pub(crate) struct Flags<S: State> {
    pub current: Option<S>,
    pub next: Option<S>,
    pub pending: EventMask,
    pub deferred: EventMask,
    pub deferred_mask: EventMask,
    pub ignored_mask: EventMask,
    pub transition_pending: bool,
    pub exit_code: i32,
}

impl<S: State> Default for Flags<S> {
    fn default() -> Self {
        Self {
            current: None,
            next: None,
            pending: EventMask::NONE,
            deferred: EventMask::NONE,
            deferred_mask: EventMask::NONE,
            ignored_mask: EventMask::NONE,
            transition_pending: false,
            exit_code: 0,
        }
    }
}

impl<S: State> Flags<S> {
    /// Reset for a new run starting in `initial`.
    pub fn start(&mut self, initial: S) {
        *self = Self {
            current: Some(initial.clone()),
            next: Some(initial),
            ..Self::default()
        };
    }

    /// Prepare the next state entry and return the events carried over
    /// from the previous state.
    ///
    /// The `TRANSITION` bit raised for the transition being consumed is
    /// dropped; everything else still pending stays pending.
    pub fn enter_next(&mut self) -> EventMask {
        let carried = self.deferred;
        self.pending = self.pending.difference(EventMask::TRANSITION) | carried;
        self.deferred = EventMask::NONE;
        self.deferred_mask = EventMask::NONE;
        self.ignored_mask = EventMask::NONE;
        self.current = self.next.clone();
        self.transition_pending = false;
        carried
    }

    /// Apply a post. Returns the bits that became pending immediately.
    pub fn post(&mut self, events: EventMask) -> EventMask {
        let accepted = events.difference(self.ignored_mask);
        let deferred = accepted & self.deferred_mask;
        let immediate = accepted.difference(self.deferred_mask);
        self.deferred |= deferred;
        self.pending |= immediate;
        immediate
    }

    /// Consume and return the pending events selected by `mask`.
    pub fn take(&mut self, mask: EventMask) -> EventMask {
        let matched = self.pending & mask;
        self.pending = self.pending.difference(matched);
        matched
    }

    /// Replace the deferral mask. Returns the held events that were
    /// released back to pending because they are no longer deferred.
    pub fn set_deferred_mask(&mut self, mask: EventMask) -> EventMask {
        let mask = mask.without_reserved();
        let released = self.deferred.difference(mask);
        self.pending |= released;
        self.deferred &= mask;
        self.deferred_mask = mask;
        released
    }

    /// Replace the ignore mask, dropping newly ignored events that are
    /// already pending or held.
    pub fn set_ignored_mask(&mut self, mask: EventMask) {
        let mask = mask.without_reserved();
        self.pending = self.pending.difference(mask);
        self.deferred = self.deferred.difference(mask);
        self.ignored_mask = mask;
    }

    /// Record a transition request. Returns `false` if one is already
    /// pending; the first request wins.
    pub fn request_transition(&mut self, state: S) -> bool {
        if self.transition_pending {
            return false;
        }
        self.transition_pending = true;
        self.next = Some(state);
        true
    }
}
