//! Link Peripheral Model.
//!
//! Models a DMA-capable link to an external device: a memory-mapped PSRAM,
//! an SD card, a serial PSRAM, an audio loopback, or a UART loopback. A write
//! moves data from the bus into the device's staging area, a read moves it
//! back out. Links with a mapped staging area use a window of the bus as the
//! device's storage; the others keep it private.
//!
//! An audio loopback delivers `rx_delay_bytes` of silence before the first
//! transmitted sample, so the receive stream is shifted relative to what was
//! sent.

use super::dma::{DmaChannel, Endpoint, FaultPlan};
use crate::common::HalError;
use crate::masters::CompletionSignal;
use crate::soc::traits::{Engine, LinkPort, MemoryPort, Staging};

/// Simulated link peripheral.
pub struct SimLink {
    channel: DmaChannel,
    staging: Staging,
    rx_delay_bytes: usize,
}

impl SimLink {
    /// Creates a link.
    ///
    /// # Arguments
    ///
    /// * `name` - Engine name
    /// * `staging` - Where data rests between write and read
    /// * `chunk_bytes` - Bytes moved per service call
    /// * `device_size` - Size of the device-private storage
    pub fn new(name: &str, staging: Staging, chunk_bytes: usize, device_size: usize) -> Self {
        Self {
            channel: DmaChannel::new(name, chunk_bytes, device_size),
            staging,
            rx_delay_bytes: 0,
        }
    }

    /// Delays the receive stream by `bytes` of silence.
    pub fn with_rx_delay(mut self, bytes: usize) -> Self {
        self.rx_delay_bytes = bytes;
        self
    }

    /// Installs a fault plan.
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.channel = self.channel.with_fault_plan(plan);
        self
    }

    /// Number of transfers started so far, writes and reads alike.
    pub fn starts(&self) -> u64 {
        self.channel.starts()
    }
}

impl Engine for SimLink {
    fn name(&self) -> &str {
        self.channel.name()
    }

    fn register_completion(&mut self, signal: CompletionSignal) {
        self.channel.attach(signal);
    }

    fn service(&mut self, memory: &mut dyn MemoryPort) {
        self.channel.step(memory);
    }

    fn cancel(&mut self) {
        self.channel.cancel();
    }
}

impl LinkPort for SimLink {
    fn staging(&self) -> Staging {
        self.staging
    }

    fn start_write(&mut self, src: u64, len: usize) -> Result<(), HalError> {
        match self.staging {
            Staging::Mapped(window) => self.channel.start(Endpoint::Bus(src), Endpoint::Bus(window), len),
            Staging::Device { offset } => {
                let at = offset as usize;
                let delay = self.rx_delay_bytes;
                if let Some(lead) = self.channel.local_mut().get_mut(at..at + delay) {
                    lead.fill(0);
                }
                self.channel
                    .start(Endpoint::Bus(src), Endpoint::Local(at + delay), len)
            }
        }
    }

    fn start_read(&mut self, dst: u64, len: usize) -> Result<(), HalError> {
        let src = match self.staging {
            Staging::Mapped(window) => Endpoint::Bus(window),
            Staging::Device { offset } => Endpoint::Local(offset as usize),
        };
        self.channel.start(src, Endpoint::Bus(dst), len)
    }
}
