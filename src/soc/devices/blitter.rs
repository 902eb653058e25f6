//! Simulated 2D Blitter.
//!
//! A DMA channel exposed through the blit port.

use super::dma::{DmaChannel, Endpoint, FaultPlan};
use crate::common::HalError;
use crate::masters::CompletionSignal;
use crate::soc::traits::{BlitPort, Engine, MemoryPort};

/// Simulated 2D accelerator performing linear block copies.
pub struct SimBlitter {
    channel: DmaChannel,
}

impl SimBlitter {
    /// Creates a blitter moving `chunk_bytes` per service call.
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            channel: DmaChannel::new("GPU", chunk_bytes, 0),
        }
    }

    /// Installs a fault plan.
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.channel = self.channel.with_fault_plan(plan);
        self
    }
}

impl Engine for SimBlitter {
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

impl BlitPort for SimBlitter {
    fn start_copy(&mut self, src: u64, dst: u64, len: usize) -> Result<(), HalError> {
        self.channel.start(Endpoint::Bus(src), Endpoint::Bus(dst), len)
    }
}
