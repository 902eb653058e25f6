//! Capture Sampler Model.
//!
//! Stands in for the PDM microphone interface and the ADC. Each sampler owns
//! a pre-generated sample FIFO and streams it into the destination when a
//! capture is started.

use super::dma::{DmaChannel, Endpoint, FaultPlan};
use crate::common::HalError;
use crate::masters::CompletionSignal;
use crate::soc::traits::{CapturePort, Engine, MemoryPort};

/// Sample format produced by a sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit PCM triangle wave.
    Pcm16,
    /// 32-bit FIFO words: slot number in the top byte, 12-bit conversion below.
    AdcFifo,
}

/// Simulated capture-only sampler.
pub struct SimSampler {
    channel: DmaChannel,
}

impl SimSampler {
    /// Creates a sampler.
    ///
    /// # Arguments
    ///
    /// * `name` - Engine name
    /// * `format` - Sample format
    /// * `chunk_bytes` - Bytes moved per service call
    /// * `capacity` - Largest capture in bytes
    pub fn new(name: &str, format: SampleFormat, chunk_bytes: usize, capacity: usize) -> Self {
        let mut channel = DmaChannel::new(name, chunk_bytes, capacity);
        synthesize(format, channel.local_mut());
        Self { channel }
    }

    /// Installs a fault plan.
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.channel = self.channel.with_fault_plan(plan);
        self
    }
}

fn synthesize(format: SampleFormat, fifo: &mut [u8]) {
    match format {
        SampleFormat::Pcm16 => {
            for (i, frame) in fifo.chunks_mut(2).enumerate() {
                let phase = (i % 512) as i32;
                let level = if phase < 256 { phase } else { 511 - phase };
                let sample = ((level - 128) * 200) as i16;
                let bytes = sample.to_le_bytes();
                frame.copy_from_slice(&bytes[..frame.len()]);
            }
        }
        SampleFormat::AdcFifo => {
            for (i, frame) in fifo.chunks_mut(4).enumerate() {
                let slot = (i % 8) as u32;
                let value = ((i * 37) % 4096) as u32;
                let bytes = ((slot << 24) | value).to_le_bytes();
                frame.copy_from_slice(&bytes[..frame.len()]);
            }
        }
    }
}

impl Engine for SimSampler {
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

impl CapturePort for SimSampler {
    fn start_capture(&mut self, dst: u64, len: usize) -> Result<(), HalError> {
        self.channel.start(Endpoint::Local(0), Endpoint::Bus(dst), len)
    }
}
