//! Engine, fabric, power, and clock models.
//!
//! Memories are attached to the bus; every other model here is driven
//! directly by a master through its port trait.

/// 2D accelerator.
pub mod blitter;

/// Virtual clock.
pub mod clock;

/// Hardware CRC engine.
pub mod crc;

/// Chunked DMA channel shared by every engine, and fault injection.
pub mod dma;

/// Fabric register block.
pub mod fabric;

/// Link peripherals.
pub mod link;

/// Power controller.
pub mod power;

/// Capture samplers.
pub mod sampler;

pub use blitter::SimBlitter;
pub use clock::VirtualClock;
pub use crc::SimCrc;
pub use dma::{DmaChannel, Endpoint, FaultPlan};
pub use fabric::{FabricState, SimFabric};
pub use link::SimLink;
pub use power::SimPower;
pub use sampler::{SampleFormat, SimSampler};
