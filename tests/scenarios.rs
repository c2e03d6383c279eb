//! End-to-end scenarios with the dispatch loop and concurrent producers.

use evented_sm::builder::StateMachineBuilder;
use evented_sm::core::EventMask;
use evented_sm::{state_enum, RunError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

state_enum! {
    enum Phase {
        Invalid,
        StateA,
        NextState,
        Final,
    }
    final: Final
    invalid: Invalid
}

const BIT_X: EventMask = EventMask::event(0);
const BIT_Y: EventMask = EventMask::event(1);

fn after(delay_ms: u64, f: impl FnOnce() + Send + 'static) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(delay_ms));
        f();
    })
}

#[test]
fn immediate_final_transition_returns_zero() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.set_next_state(Phase::Final);
        })
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));
}

#[test]
fn invalid_initial_state_invokes_no_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, move |m| {
            counter.fetch_add(1, Ordering::SeqCst);
            m.exit(0);
        })
        .build()
        .unwrap();

    let result = machine.run(Phase::Invalid);
    assert!(matches!(result, Err(RunError::InvalidInitialState { .. })));
    assert_eq!(result.unwrap_err().code(), -1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn post_from_other_thread_wakes_blocked_wait_exactly_once() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            let isr = m.clone();
            let producer = after(20, move || isr.post(BIT_X));

            let first = m.wait(BIT_X);
            let second = m.try_wait(BIT_X);
            producer.join().unwrap();

            let ok = first == BIT_X && second == EventMask::TIMEOUT;
            m.exit(if ok { 0 } else { 1 });
        })
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));
}

#[test]
fn deferred_event_is_pending_in_next_state() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.set_events_deferred(BIT_Y);
            m.post(BIT_Y);
            m.set_next_state(Phase::NextState);
        })
        .state(Phase::NextState, |m| {
            let matched = m.try_wait(BIT_Y);
            m.exit(if matched == BIT_Y { 0 } else { 1 });
        })
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));

    let history = machine.history();
    assert_eq!(history.transitions()[0].carried, BIT_Y);
}

#[test]
fn transition_request_wakes_waiter_regardless_of_mask() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            let other = m.clone();
            let requester = after(20, move || {
                other.set_next_state(Phase::NextState);
            });

            let matched = m.wait(BIT_X);
            requester.join().unwrap();
            if !matched.contains(EventMask::TRANSITION) {
                m.set_exit_code(1);
            }
        })
        .state(Phase::NextState, |m| m.exit(m.exit_code()))
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));
}

#[test]
fn deferred_post_does_not_wake_waiter() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.set_events_deferred(BIT_Y);
            let isr = m.clone();
            let producer = after(10, move || {
                isr.post(BIT_Y);
                thread::sleep(Duration::from_millis(20));
                isr.post(BIT_X);
            });

            let matched = m.wait(BIT_X | BIT_Y);
            producer.join().unwrap();

            let ok = matched == BIT_X && m.deferred_events() == BIT_Y;
            m.set_exit_code(if ok { 0 } else { 1 });
            m.set_next_state(Phase::NextState);
        })
        .state(Phase::NextState, |m| {
            if m.try_wait(BIT_Y) != BIT_Y {
                m.set_exit_code(2);
            }
            m.set_next_state(Phase::Final);
        })
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));
}

#[test]
fn masks_are_cleared_on_state_entry() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.set_events_ignored(BIT_X);
            m.set_events_deferred(BIT_Y);
            m.set_next_state(Phase::NextState);
        })
        .state(Phase::NextState, |m| {
            m.post(BIT_X | BIT_Y);
            let matched = m.try_wait(BIT_X | BIT_Y);
            m.exit(if matched == BIT_X | BIT_Y { 0 } else { 1 });
        })
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));
}

#[test]
fn transition_bit_does_not_leak_into_next_state() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.set_next_state(Phase::NextState);
        })
        .state(Phase::NextState, |m| {
            let matched = m.try_wait(EventMask::NONE);
            m.exit(if matched == EventMask::TIMEOUT { 0 } else { 1 });
        })
        .build()
        .unwrap();

    assert_eq!(machine.run(Phase::StateA), Ok(0));
}

#[test]
fn concurrent_run_is_rejected() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.wait(BIT_X);
            m.exit(0);
        })
        .build()
        .unwrap();

    let runner = machine.clone();
    let owner = thread::spawn(move || runner.run(Phase::StateA));

    // Wait until the owner has entered StateA.
    while machine.current_state() != Some(Phase::StateA) {
        thread::sleep(Duration::from_millis(1));
    }

    let second = machine.run(Phase::StateA);
    assert_eq!(second.map_err(|e| e.code()), Err(-3));

    machine.post(BIT_X);
    assert_eq!(owner.join().unwrap(), Ok(0));
}

#[test]
fn unknown_next_state_is_reported() {
    let machine = StateMachineBuilder::new()
        .state(Phase::StateA, |m| {
            m.set_next_state(Phase::Invalid);
        })
        .build()
        .unwrap();

    assert_eq!(
        machine.run(Phase::StateA),
        Err(RunError::NoHandler {
            state: "Invalid".to_string()
        })
    );
}
