//! Simulated System-on-Chip.
//!
//! The bus, sparse memories, fabric registers, power controller, clock, and
//! engine models that stand in for the part under test.

/// System container wiring every component together.
pub mod builder;

/// Engine, fabric, power, and clock models.
pub mod devices;

/// System bus routing accesses to memories.
pub mod interconnect;

/// Sparse memories and access timing.
pub mod memory;

/// Hardware-facing traits.
pub mod traits;

pub use builder::System;
pub use interconnect::Bus;
pub use traits::{
    BlitPort, CapturePort, Clock, CrcPort, Device, Engine, LinkPort, MemoryPort, Platform,
    PowerControl, Staging,
};
