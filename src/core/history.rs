//! State entry history.
//!
//! Records every transition taken by the dispatch loop, following the
//! same immutable style as the rest of the core: `record` returns a new
//! history and leaves the original untouched.

use super::events::EventMask;
use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use evented_sm::core::{EventMask, State, StateTransition};
/// use serde::{Deserialize, Serialize};
/// use chrono::Utc;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Link { Setup, Synced, Done }
///
/// impl State for Link {
///     fn name(&self) -> &str {
///         match self {
///             Self::Setup => "Setup",
///             Self::Synced => "Synced",
///             Self::Done => "Done",
///         }
///     }
///
///     fn final_state() -> Self { Self::Done }
/// }
///
/// let transition = StateTransition {
///     from: Link::Setup,
///     to: Link::Synced,
///     timestamp: Utc::now(),
///     carried: EventMask::NONE,
/// };
/// assert_eq!(transition.to, Link::Synced);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being left
    pub from: S,
    /// The state being entered
    pub to: S,
    /// When the new state was entered
    pub timestamp: DateTime<Utc>,
    /// Deferred events carried over into the new state
    pub carried: EventMask,
}

/// Ordered, optionally bounded history of state transitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
    limit: Option<usize>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty, unbounded history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            limit: None,
        }
    }

    /// Create an empty history that keeps at most `limit` transitions.
    pub fn bounded(limit: usize) -> Self {
        Self {
            transitions: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// When the history is bounded and full, the oldest transition is
    /// dropped.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        if let Some(limit) = self.limit {
            let excess = transitions.len().saturating_sub(limit);
            transitions.drain(..excess);
        }
        Self {
            transitions,
            limit: self.limit,
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns references to states in order: the `from` of the oldest
    /// retained transition, then the `to` state of each transition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use evented_sm::core::{EventMask, State, StateHistory, StateTransition};
    /// use serde::{Deserialize, Serialize};
    /// use chrono::Utc;
    ///
    /// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    /// enum Phase { One, Two, Three }
    ///
    /// impl State for Phase {
    ///     fn name(&self) -> &str {
    ///         match self {
    ///             Self::One => "One",
    ///             Self::Two => "Two",
    ///             Self::Three => "Three",
    ///         }
    ///     }
    ///
    ///     fn final_state() -> Self { Self::Three }
    /// }
    ///
    /// let mut history = StateHistory::new();
    /// for (from, to) in [(Phase::One, Phase::Two), (Phase::Two, Phase::Three)] {
    ///     history = history.record(StateTransition {
    ///         from,
    ///         to,
    ///         timestamp: Utc::now(),
    ///         carried: EventMask::NONE,
    ///     });
    /// }
    ///
    /// assert_eq!(history.get_path(), vec![&Phase::One, &Phase::Two, &Phase::Three]);
    /// ```
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Duration from the first to the last retained transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all retained transitions, oldest first.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Setup,
        Waiting,
        Synced,
        Final,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Setup => "Setup",
                Self::Waiting => "Waiting",
                Self::Synced => "Synced",
                Self::Final => "Final",
            }
        }

        fn final_state() -> Self {
            Self::Final
        }
    }

    fn hop(from: TestState, to: TestState) -> StateTransition<TestState> {
        StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            carried: EventMask::NONE,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<TestState> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_leaves_original_unchanged() {
        let history = StateHistory::new();
        let updated = history.record(hop(TestState::Setup, TestState::Waiting));

        assert_eq!(history.transitions().len(), 0);
        assert_eq!(updated.transitions().len(), 1);
    }

    #[test]
    fn path_follows_transitions() {
        let history = StateHistory::new()
            .record(hop(TestState::Setup, TestState::Waiting))
            .record(hop(TestState::Waiting, TestState::Synced))
            .record(hop(TestState::Synced, TestState::Final));

        assert_eq!(
            history.get_path(),
            vec![
                &TestState::Setup,
                &TestState::Waiting,
                &TestState::Synced,
                &TestState::Final
            ]
        );
    }

    #[test]
    fn bounded_history_drops_oldest() {
        let history = StateHistory::bounded(2)
            .record(hop(TestState::Setup, TestState::Waiting))
            .record(hop(TestState::Waiting, TestState::Synced))
            .record(hop(TestState::Synced, TestState::Final));

        assert_eq!(history.transitions().len(), 2);
        assert_eq!(history.transitions()[0].from, TestState::Waiting);
    }

    #[test]
    fn duration_spans_first_to_last() {
        let start = Utc::now();
        let mut first = hop(TestState::Setup, TestState::Waiting);
        first.timestamp = start;
        let mut second = hop(TestState::Waiting, TestState::Final);
        second.timestamp = start + ChronoDuration::milliseconds(250);

        let history = StateHistory::new().record(first).record(second);
        assert_eq!(history.duration(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn carried_events_survive_serialization() {
        let mut transition = hop(TestState::Setup, TestState::Waiting);
        transition.carried = EventMask::event(2);
        let history = StateHistory::new().record(transition);

        let json = serde_json::to_string(&history).unwrap();
        let back: StateHistory<TestState> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transitions()[0].carried, EventMask::event(2));
    }
}
