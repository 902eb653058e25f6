//! Core Copy Backend.
//!
//! The CPU copies the payload with plain loads and stores. Each case is run
//! once per access width so byte, half-word, and word stores all cross every
//! boundary. Word accesses at unaligned addresses are issued as-is.

use super::{BusMaster, MasterKind, Mover, TransferOutcome};
use crate::catalog::MemoryRegion;
use crate::common::{BusFault, CopyWidth, HalError};
use crate::soc::traits::{MemoryPort, Platform, PowerControl};
use tracing::warn;

/// CPU copy loops.
pub struct CoreCopy {
    widths: Vec<CopyWidth>,
}

impl CoreCopy {
    /// Creates a backend running byte, half-word, and word copies.
    pub fn new() -> Self {
        Self {
            widths: CopyWidth::CORE.to_vec(),
        }
    }

    /// Restricts the widths run per case.
    pub fn with_widths(widths: Vec<CopyWidth>) -> Self {
        Self { widths }
    }
}

impl Default for CoreCopy {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `len` bytes in `unit`-sized accesses; a tail shorter than `unit`
/// is copied bytewise.
fn copy_units(
    memory: &mut dyn MemoryPort,
    src: u64,
    dst: u64,
    len: usize,
    unit: usize,
) -> Result<(), BusFault> {
    let mut at = 0usize;
    while at + unit <= len {
        let (s, d) = (src + at as u64, dst + at as u64);
        match unit {
            1 => {
                let v = memory.read_u8(s)?;
                memory.write_u8(d, v)?;
            }
            2 => {
                let v = memory.read_u16(s)?;
                memory.write_u16(d, v)?;
            }
            _ => {
                let v = memory.read_u32(s)?;
                memory.write_u32(d, v)?;
            }
        }
        at += unit;
    }
    while at < len {
        let v = memory.read_u8(src + at as u64)?;
        memory.write_u8(dst + at as u64, v)?;
        at += 1;
    }
    Ok(())
}

impl BusMaster for CoreCopy {
    fn kind(&self) -> MasterKind {
        MasterKind::CoreCopy
    }

    fn init(&mut self, power: &mut dyn PowerControl) -> Result<(), HalError> {
        power.power_up(self.kind())
    }

    fn supports_source(&self, _region: &MemoryRegion) -> bool {
        true
    }

    fn supports_dest(&self, region: &MemoryRegion) -> bool {
        region.writable
    }

    fn as_mover(&mut self) -> Option<&mut dyn Mover> {
        Some(self)
    }
}

impl Mover for CoreCopy {
    fn copy_widths(&self) -> &[CopyWidth] {
        &self.widths
    }

    fn transfer(
        &mut self,
        hw: &mut Platform<'_>,
        src: u64,
        dst: u64,
        len: usize,
        width: CopyWidth,
    ) -> TransferOutcome {
        let unit = width.bytes().unwrap_or(4);
        match copy_units(&mut *hw.memory, src, dst, len, unit) {
            Ok(()) => TransferOutcome::done(),
            Err(fault) => {
                warn!(%width, error = %fault, "core copy faulted");
                TransferOutcome::error()
            }
        }
    }
}
