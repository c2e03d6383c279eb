//! Synchronized Packet Transmitter
//!
//! A transmitter that sends a sync beacon at a fixed interval. A button
//! press queues an application packet that goes out right after the next
//! beacon. Presses during setup are ignored.
//!
//! Key concepts:
//! - A repeating beacon driven by the timeout collaborator
//! - Button presses posted from a simulated interrupt
//! - Cycling between two states until the exit condition is met
//!
//! Run with: cargo run --example synchronized_packet_tx

use evented_sm::builder::StateMachineBuilder;
use evented_sm::core::EventMask;
use evented_sm::state_enum;
use evented_sm::timer::Timeout;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const BUTTON_PUSHED: EventMask = EventMask::event(0);
const TX_DONE: EventMask = EventMask::event(1);

const BEACON_INTERVAL: Duration = Duration::from_millis(50);
const AIR_TIME: Duration = Duration::from_millis(5);
const BEACONS_TO_SEND: u32 = 8;

state_enum! {
    enum TxState {
        Setup,
        WaitingForBeacon,
        Transmitting,
        Done,
    }
    final: Done
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Synchronized Packet Transmitter ===\n");

    let beacons = Arc::new(AtomicU32::new(0));
    let app_packets = Arc::new(AtomicU32::new(0));
    let queued = Arc::new(AtomicU32::new(0));

    let beacon_count = Arc::clone(&beacons);
    let app_count = Arc::clone(&app_packets);
    let queue_in = Arc::clone(&queued);
    let queue_out = Arc::clone(&queued);

    let machine = StateMachineBuilder::new()
        .name("tx")
        .state(TxState::Setup, |m| {
            m.set_events_ignored(BUTTON_PUSHED);
            info!("configuring radio");

            // Button presses arrive from an interrupt at random moments.
            let isr = m.clone();
            thread::spawn(move || {
                for delay in [5u64, 120, 260] {
                    thread::sleep(Duration::from_millis(delay));
                    isr.post(BUTTON_PUSHED);
                }
            });

            m.set_next_state(TxState::WaitingForBeacon);
        })
        .state(TxState::WaitingForBeacon, move |m| {
            let _beacon = Timeout::start(m, BEACON_INTERVAL);
            loop {
                let events = m.wait(BUTTON_PUSHED);
                if events.contains(BUTTON_PUSHED) {
                    queue_in.fetch_add(1, Ordering::Relaxed);
                    info!("application packet queued");
                }
                if events.contains(EventMask::TIMEOUT) {
                    m.set_next_state(TxState::Transmitting);
                }
                if events.contains(EventMask::TRANSITION) {
                    break;
                }
            }
        })
        .state(TxState::Transmitting, move |m| {
            // Presses during transmission are handled after the beacon.
            m.set_events_deferred(BUTTON_PUSHED);

            let sent = beacon_count.fetch_add(1, Ordering::Relaxed) + 1;
            let pending = queue_out.swap(0, Ordering::Relaxed);
            app_count.fetch_add(pending, Ordering::Relaxed);
            info!(beacon = sent, app_packets = pending, "transmitting");

            let _air = Timeout::start_with(m, AIR_TIME, TX_DONE);
            m.wait(TX_DONE);

            if sent >= BEACONS_TO_SEND {
                m.exit(0);
            } else {
                m.set_next_state(TxState::WaitingForBeacon);
            }
        })
        .build()
        .expect("transmitter states are registered once each");

    match machine.run(TxState::Setup) {
        Ok(code) => println!("\nTransmitter finished with exit code {code}"),
        Err(e) => println!("\nTransmitter failed: {e} (code {})", e.code()),
    }

    println!("Beacons sent: {}", beacons.load(Ordering::Relaxed));
    println!("Application packets sent: {}", app_packets.load(Ordering::Relaxed));

    let history = machine.history();
    if let Some(elapsed) = history.duration() {
        println!("Time from first to last transition: {elapsed:?}");
    }

    println!("\nSnapshot after run:");
    match machine.snapshot().to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => println!("snapshot failed: {e}"),
    }

    println!("\n=== Example Complete ===");
}
