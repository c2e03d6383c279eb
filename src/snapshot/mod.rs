//! Diagnostic snapshots of a state machine.
//!
//! A snapshot captures the event bookkeeping at one instant (states, masks,
//! pending and held events, exit code) together with the transition
//! history. It can be logged, stored, or shipped off-device in JSON or
//! binary form. Handlers are code and are not part of a snapshot, so a
//! snapshot cannot be turned back into a running machine.

use crate::core::{EventMask, State, StateHistory};
use crate::machine::StateMachine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable view of a state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MachineSnapshot<S: State> {
    /// Snapshot format version
    pub version: u32,

    /// Identifier of the machine the snapshot was taken from
    pub machine_id: Uuid,

    pub machine_name: String,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    pub current_state: Option<S>,
    pub next_state: Option<S>,

    pub pending: EventMask,
    pub deferred: EventMask,
    pub deferred_mask: EventMask,
    pub ignored_mask: EventMask,

    pub transition_pending: bool,
    pub exit_code: i32,

    pub history: StateHistory<S>,
}

impl<S: State> MachineSnapshot<S> {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Decode from JSON, rejecting unknown format versions.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Encode in the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Decode from the compact binary format, rejecting unknown format
    /// versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

impl<S: State> StateMachine<S> {
    /// Capture the current bookkeeping and history.
    ///
    /// The bookkeeping fields are read under a single critical section, so
    /// they are mutually consistent.
    pub fn snapshot(&self) -> MachineSnapshot<S> {
        let flags = self.flags();
        MachineSnapshot {
            version: SNAPSHOT_VERSION,
            machine_id: self.id(),
            machine_name: self.name().to_string(),
            timestamp: Utc::now(),
            current_state: flags.current,
            next_state: flags.next,
            pending: flags.pending,
            deferred: flags.deferred,
            deferred_mask: flags.deferred_mask,
            ignored_mask: flags.ignored_mask,
            transition_pending: flags.transition_pending,
            exit_code: flags.exit_code,
            history: self.history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMachineBuilder;
    use crate::state_enum;

    state_enum! {
        enum TestState {
            Setup,
            Running,
            Done,
        }
        final: Done
    }

    const X: EventMask = EventMask::event(0);
    const Y: EventMask = EventMask::event(1);

    fn machine() -> StateMachine<TestState> {
        StateMachineBuilder::new()
            .name("snap")
            .state(TestState::Setup, |m| {
                m.set_next_state(TestState::Running);
            })
            .state(TestState::Running, |m| m.exit(5))
            .build()
            .unwrap()
    }

    #[test]
    fn snapshot_captures_bookkeeping() {
        let machine = machine();
        machine.post(X);
        machine.set_events_deferred(Y);
        machine.post(Y);
        machine.set_next_state(TestState::Running);

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.machine_id, machine.id());
        assert_eq!(snapshot.machine_name, "snap");
        assert_eq!(snapshot.pending, X | EventMask::TRANSITION);
        assert_eq!(snapshot.deferred, Y);
        assert_eq!(snapshot.deferred_mask, Y);
        assert!(snapshot.transition_pending);
        assert_eq!(snapshot.next_state, Some(TestState::Running));
    }

    #[test]
    fn snapshot_after_run_includes_history() {
        let machine = machine();
        assert_eq!(machine.run(TestState::Setup), Ok(5));

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.exit_code, 5);
        assert_eq!(snapshot.current_state, Some(TestState::Done));
        assert_eq!(snapshot.history.transitions().len(), 2);
    }

    #[test]
    fn json_roundtrip() {
        let machine = machine();
        machine.post(X);
        let json = machine.snapshot().to_json().unwrap();

        let restored = MachineSnapshot::<TestState>::from_json(&json).unwrap();
        assert_eq!(restored.pending, X);
        assert_eq!(restored.machine_id, machine.id());
    }

    #[test]
    fn binary_roundtrip() {
        let machine = machine();
        assert_eq!(machine.run(TestState::Setup), Ok(5));
        let bytes = machine.snapshot().to_bytes().unwrap();

        let restored = MachineSnapshot::<TestState>::from_bytes(&bytes).unwrap();
        assert_eq!(restored.exit_code, 5);
        assert_eq!(
            restored.history.get_path(),
            vec![&TestState::Setup, &TestState::Running, &TestState::Done]
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = machine().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let json = snapshot.to_json().unwrap();

        let result = MachineSnapshot::<TestState>::from_json(&json);
        assert!(matches!(
            result,
            Err(SnapshotError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let result = MachineSnapshot::<TestState>::from_bytes(&[0xFF]);
        assert!(matches!(result, Err(SnapshotError::DeserializationFailed(_))));
    }
}
