//! Completion signalling.
//!
//! An asynchronous master raises a `CompletionSignal` from its engine when a
//! transfer ends. The driver blocks on it with [`await_completion`], a bounded
//! poll that services the engine, checks the signal, and sleeps one
//! millisecond between polls. It is the only place the sweep ever waits.

use crate::common::constants::POLL_INTERVAL_MS;
use crate::soc::traits::{Engine, Platform};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const IDLE: u8 = 0;
const PENDING: u8 = 1;
const DONE: u8 = 2;
const FAILED: u8 = 3;

/// State of a completion signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalState {
    /// Never armed.
    Idle,
    /// Transfer in flight.
    Pending,
    /// Transfer finished.
    Done,
    /// Transfer finished with the hardware error flag.
    Failed,
}

/// Shared flag raised by an engine when its transfer ends.
#[derive(Clone, Debug, Default)]
pub struct CompletionSignal(Arc<AtomicU8>);

impl CompletionSignal {
    /// Creates an idle signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a transfer as in flight.
    pub fn arm(&self) {
        self.0.store(PENDING, Ordering::Release);
    }

    /// Marks the transfer as finished.
    pub fn complete(&self) {
        self.0.store(DONE, Ordering::Release);
    }

    /// Marks the transfer as failed.
    pub fn fail(&self) {
        self.0.store(FAILED, Ordering::Release);
    }

    /// Current state.
    pub fn state(&self) -> SignalState {
        match self.0.load(Ordering::Acquire) {
            IDLE => SignalState::Idle,
            PENDING => SignalState::Pending,
            DONE => SignalState::Done,
            _ => SignalState::Failed,
        }
    }
}

/// How a wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitResult {
    /// The engine signalled completion.
    Completed,
    /// The timeout elapsed first.
    TimedOut,
    /// The engine signalled a hardware error.
    Error,
}

/// Blocks until `signal` leaves the pending state or `timeout_ms` elapses.
///
/// On timeout the engine's transfer is cancelled, so every wait leaves the
/// engine idle.
///
/// # Arguments
///
/// * `engine` - Engine to service between polls
/// * `signal` - Signal registered with that engine
/// * `timeout_ms` - Upper bound on the wait
/// * `hw` - Platform providing memory for the engine and the clock
pub fn await_completion<E: Engine + ?Sized>(
    engine: &mut E,
    signal: &CompletionSignal,
    timeout_ms: u32,
    hw: &mut Platform<'_>,
) -> WaitResult {
    let start = hw.clock.now_ms();
    loop {
        engine.service(&mut *hw.memory);
        match signal.state() {
            SignalState::Done => return WaitResult::Completed,
            SignalState::Failed => return WaitResult::Error,
            SignalState::Idle | SignalState::Pending => {}
        }
        if hw.clock.now_ms() - start >= u64::from(timeout_ms) {
            engine.cancel();
            return WaitResult::TimedOut;
        }
        hw.clock.delay_ms(POLL_INTERVAL_MS);
    }
}
