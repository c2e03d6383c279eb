//! Synchronized Packet Receiver
//!
//! A receiver that first waits for a sync beacon, then listens in
//! synchronized receive windows. A missed beacon sends it back to
//! searching. Button presses made while searching are deferred and only
//! handled once the link is synchronized.
//!
//! Key concepts:
//! - Events posted from a simulated radio driver thread
//! - Events posted from a simulated button interrupt
//! - Deferring an event to the next state
//! - Ignoring events that are irrelevant in a state
//! - A timeout collaborator bounding the sync search
//!
//! Run with: cargo run --example synchronized_packet_rx
//! (set RUST_LOG=evented_sm=trace to see every post and wait)

use evented_sm::builder::StateMachineBuilder;
use evented_sm::core::EventMask;
use evented_sm::state_enum;
use evented_sm::timer::Timeout;
use evented_sm::StateMachine;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PACKET_RECEIVED: EventMask = EventMask::event(0);
const SYNC_MISSED: EventMask = EventMask::event(1);
const BUTTON_PUSHED: EventMask = EventMask::event(2);

const BEACON_INTERVAL: Duration = Duration::from_millis(40);
const SYNC_SEARCH_TIMEOUT: Duration = Duration::from_secs(2);
const PACKETS_TO_RECEIVE: u32 = 12;

state_enum! {
    enum RxState {
        Setup,
        WaitingForSync,
        SyncedRx,
        Done,
    }
    final: Done
}

/// Stand-in for the radio command queue: delivers beacons at a fixed
/// interval and drops every seventh one.
struct SimulatedRadio {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SimulatedRadio {
    fn start(machine: &StateMachine<RxState>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let alive = Arc::clone(&running);
        let machine = machine.clone();

        let thread = thread::spawn(move || {
            let mut beacon = 0u32;
            while alive.load(Ordering::Relaxed) {
                thread::sleep(BEACON_INTERVAL);
                beacon += 1;
                if beacon % 7 == 0 {
                    machine.post(SYNC_MISSED);
                } else {
                    machine.post(PACKET_RECEIVED);
                }
            }
        });

        Self {
            running,
            thread: Some(thread),
        }
    }
}

impl Drop for SimulatedRadio {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Stand-in for a GPIO interrupt: one press shortly after start.
fn button_isr(machine: &StateMachine<RxState>) -> JoinHandle<()> {
    let machine = machine.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        info!("button pushed");
        machine.post(BUTTON_PUSHED);
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Synchronized Packet Receiver ===\n");

    let received = Arc::new(AtomicU32::new(0));
    let radio: Arc<parking_lot::Mutex<Option<SimulatedRadio>>> = Arc::default();
    let button: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>> = Arc::default();

    let setup_radio = Arc::clone(&radio);
    let setup_button = Arc::clone(&button);
    let synced_count = Arc::clone(&received);

    let machine = StateMachineBuilder::new()
        .name("rx")
        .state(RxState::Setup, move |m| {
            info!("configuring radio");
            *setup_radio.lock() = Some(SimulatedRadio::start(m));
            *setup_button.lock() = Some(button_isr(m));
            m.set_next_state(RxState::WaitingForSync);
        })
        .state(RxState::WaitingForSync, |m| {
            m.set_events_deferred(BUTTON_PUSHED);
            m.set_events_ignored(SYNC_MISSED);
            let _search = Timeout::start(m, SYNC_SEARCH_TIMEOUT);

            let events = m.wait(PACKET_RECEIVED);
            if events.contains(PACKET_RECEIVED) {
                info!("sync beacon received");
                m.set_next_state(RxState::SyncedRx);
            } else if events.contains(EventMask::TIMEOUT) {
                warn!("no sync beacon found");
                m.exit(1);
            }
        })
        .state(RxState::SyncedRx, move |m| loop {
            let events = m.wait(PACKET_RECEIVED | SYNC_MISSED | BUTTON_PUSHED);

            if events.contains(BUTTON_PUSHED) {
                info!(
                    received = synced_count.load(Ordering::Relaxed),
                    "button handled while synchronized"
                );
            }
            if events.contains(PACKET_RECEIVED) {
                let total = synced_count.fetch_add(1, Ordering::Relaxed) + 1;
                info!(total, "packet received in window");
                if total >= PACKETS_TO_RECEIVE {
                    m.exit(0);
                }
            }
            if events.contains(SYNC_MISSED) {
                warn!("sync missed, searching again");
                m.set_next_state(RxState::WaitingForSync);
            }
            if events.contains(EventMask::TRANSITION) {
                break;
            }
        })
        .build()
        .expect("receiver states are registered once each");

    let exit_code = machine.run(RxState::Setup);

    radio.lock().take();
    if let Some(button) = button.lock().take() {
        let _ = button.join();
    }

    match exit_code {
        Ok(code) => println!("\nReceiver finished with exit code {code}"),
        Err(e) => println!("\nReceiver failed: {e} (code {})", e.code()),
    }

    let history = machine.history();
    println!("Visited states:");
    for state in history.get_path() {
        println!("  {state:?}");
    }
    println!("Packets received: {}", received.load(Ordering::Relaxed));

    println!("\n=== Example Complete ===");
}
