//! System-on-Chip Traits.
//!
//! This module defines the interfaces between the sweep engine and the part
//! under test: memory-mapped devices behind the bus, the bus itself as seen
//! by a master, the millisecond clock, power control, and the driver ports of
//! every DMA-capable engine. The simulated SoC implements all of them; a
//! register-level adapter for real silicon would plug in at the same seams.

use crate::common::{BusFault, HalError, PerformanceMode};
use crate::fabric::FabricControl;
use crate::masters::{CompletionSignal, MasterKind};

/// Trait for memory-mapped devices.
///
/// All devices attached to the system bus implement this trait to handle
/// accesses at device-relative offsets.
pub trait Device {
    /// Returns the user-friendly name of the device.
    ///
    /// Used for debugging and logging purposes.
    fn name(&self) -> &str;

    /// Returns the address range (Base Address, Size) of the device.
    ///
    /// Used by the system bus to route memory accesses to the correct device.
    fn address_range(&self) -> (u64, u64);

    /// Whether plain stores are accepted.
    fn is_writable(&self) -> bool {
        true
    }

    /// Reads a byte from the device at the specified offset.
    fn read_u8(&mut self, offset: u64) -> u8;

    /// Writes a byte to the device at the specified offset.
    fn write_u8(&mut self, offset: u64, val: u8);

    /// Reads a half-word (16-bit, little-endian) at the specified offset.
    fn read_u16(&mut self, offset: u64) -> u16 {
        u16::from_le_bytes([self.read_u8(offset), self.read_u8(offset + 1)])
    }

    /// Reads a word (32-bit, little-endian) at the specified offset.
    fn read_u32(&mut self, offset: u64) -> u32 {
        let mut bytes = [0u8; 4];
        self.read_bytes(offset, &mut bytes);
        u32::from_le_bytes(bytes)
    }

    /// Writes a half-word (16-bit, little-endian) at the specified offset.
    fn write_u16(&mut self, offset: u64, val: u16) {
        self.write_bytes(offset, &val.to_le_bytes());
    }

    /// Writes a word (32-bit, little-endian) at the specified offset.
    fn write_u32(&mut self, offset: u64, val: u32) {
        self.write_bytes(offset, &val.to_le_bytes());
    }

    /// Reads consecutive bytes starting at the specified offset.
    ///
    /// Default implementation iterates and reads bytes individually.
    fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_u8(offset + i as u64);
        }
    }

    /// Writes a slice of bytes to the device starting at the specified offset.
    ///
    /// Default implementation iterates and writes bytes individually.
    /// Devices may override this for optimized block writes.
    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(offset + i as u64, *byte);
        }
    }
}

/// Physical memory as seen by a bus master.
///
/// Word and half-word accesses need not be aligned.
pub trait MemoryPort {
    /// Reads a byte.
    fn read_u8(&mut self, addr: u64) -> Result<u8, BusFault>;

    /// Reads a little-endian half-word.
    fn read_u16(&mut self, addr: u64) -> Result<u16, BusFault>;

    /// Reads a little-endian word.
    fn read_u32(&mut self, addr: u64) -> Result<u32, BusFault>;

    /// Writes a byte.
    fn write_u8(&mut self, addr: u64, val: u8) -> Result<(), BusFault>;

    /// Writes a little-endian half-word.
    fn write_u16(&mut self, addr: u64, val: u16) -> Result<(), BusFault>;

    /// Writes a little-endian word.
    fn write_u32(&mut self, addr: u64, val: u32) -> Result<(), BusFault>;

    /// Checks that every byte of `[addr, addr + len)` is decoded.
    fn is_mapped(&self, addr: u64, len: u64) -> bool;

    /// Reads `buf.len()` consecutive bytes.
    fn read_bytes(&mut self, addr: u64, buf: &mut [u8]) -> Result<(), BusFault> {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_u8(addr + i as u64)?;
        }
        Ok(())
    }

    /// Writes consecutive bytes.
    fn write_bytes(&mut self, addr: u64, data: &[u8]) -> Result<(), BusFault> {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(addr + i as u64, *byte)?;
        }
        Ok(())
    }

    /// Sets `len` bytes to `val`.
    fn fill(&mut self, addr: u64, len: usize, val: u8) -> Result<(), BusFault> {
        self.write_bytes(addr, &vec![val; len])
    }
}

/// Monotonic millisecond timer and delay primitive.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u64;

    /// Blocks for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Power and clock control of bus masters.
pub trait PowerControl {
    /// Powers up a master. Called once per master at startup.
    fn power_up(&mut self, master: MasterKind) -> Result<(), HalError>;

    /// Switches the part to a performance mode.
    fn select_mode(&mut self, mode: PerformanceMode) -> Result<(), HalError>;
}

/// Common driver surface of every DMA-capable engine.
pub trait Engine {
    /// Engine name used in errors and logs.
    fn name(&self) -> &str;

    /// Registers the signal raised when a transfer completes or fails.
    ///
    /// Called once at initialisation. Starting a transfer before
    /// registration is rejected.
    fn register_completion(&mut self, signal: CompletionSignal);

    /// Lets the engine make progress.
    ///
    /// Stands in for the interrupt handler: called between completion polls.
    /// Bus faults hit by the engine are reported through the completion
    /// signal, not returned.
    fn service(&mut self, memory: &mut dyn MemoryPort);

    /// Abandons the transfer in flight, if any, leaving the engine idle.
    ///
    /// Called when a wait times out so the next start is not refused as busy.
    fn cancel(&mut self);
}

/// Where a link stages data between its write and read phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staging {
    /// A window of the system address map backed by the external device.
    ///
    /// The master clears it before every write.
    Mapped(u64),
    /// Storage internal to the external device, at a fixed offset.
    Device {
        /// Offset inside the device.
        offset: u64,
    },
}

/// Driver of a DMA-capable serial or memory link.
pub trait LinkPort: Engine {
    /// Staging area used by this link.
    fn staging(&self) -> Staging;

    /// Starts a non-blocking write of `len` bytes from `src` to the device.
    fn start_write(&mut self, src: u64, len: usize) -> Result<(), HalError>;

    /// Starts a non-blocking read of `len` bytes from the device into `dst`.
    fn start_read(&mut self, dst: u64, len: usize) -> Result<(), HalError>;
}

/// Driver of the 2D accelerator's block copy.
pub trait BlitPort: Engine {
    /// Starts copying `len` bytes from `src` to `dst`.
    fn start_copy(&mut self, src: u64, dst: u64, len: usize) -> Result<(), HalError>;
}

/// Driver of the hardware CRC engine.
pub trait CrcPort: Engine {
    /// Starts a CRC over `[addr, addr + len)`.
    fn start_crc(&mut self, addr: u64, len: usize) -> Result<(), HalError>;

    /// Result of the last completed CRC.
    fn result(&self) -> u32;
}

/// Driver of a capture-only sampler.
pub trait CapturePort: Engine {
    /// Starts capturing `len` bytes of samples into `dst`.
    fn start_capture(&mut self, dst: u64, len: usize) -> Result<(), HalError>;
}

/// Hardware services the sweep consumes, borrowed for the length of a run.
pub struct Platform<'a> {
    /// Physical memory.
    pub memory: &'a mut dyn MemoryPort,
    /// Millisecond timer.
    pub clock: &'a mut dyn Clock,
    /// Fabric register adapter.
    pub fabric: &'a mut dyn FabricControl,
    /// Power controller.
    pub power: &'a mut dyn PowerControl,
}
