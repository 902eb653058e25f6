//! Guard bands around capture destinations.
//!
//! A capture-only master has no source to compare against, so the check is
//! that it wrote nowhere it should not have: a fixed pattern is planted just
//! before and just after the destination and must survive the capture. A
//! side whose bytes are unmapped or read-only is left unguarded.

use super::checksum::checksum16;
use crate::common::constants::{GUARD_BAND_BYTES, GUARD_PATTERN};
use crate::common::BusFault;
use crate::soc::traits::MemoryPort;

/// Result of inspecting the guard bands after a capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardCheck {
    /// Every planted byte still holds the pattern.
    pub intact: bool,
    /// Checksum of the planted pattern.
    pub expected: u16,
    /// Checksum of what was read back.
    pub observed: u16,
}

/// Planted guard bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardBands {
    before: Option<u64>,
    after: Option<u64>,
}

impl GuardBands {
    /// Plants guard bands around `[dst, dst + len)`.
    pub fn plant(memory: &mut dyn MemoryPort, dst: u64, len: usize) -> Self {
        let mut plant_at = |addr: u64| {
            memory.is_mapped(addr, GUARD_BAND_BYTES)
                && memory
                    .fill(addr, GUARD_BAND_BYTES as usize, GUARD_PATTERN)
                    .is_ok()
        };
        let before = dst.checked_sub(GUARD_BAND_BYTES).filter(|&a| plant_at(a));
        let after = Some(dst + len as u64).filter(|&a| plant_at(a));
        Self { before, after }
    }

    /// Whether at least one side is guarded.
    pub fn is_planted(&self) -> bool {
        self.before.is_some() || self.after.is_some()
    }

    /// Reads the bands back.
    pub fn check(&self, memory: &mut dyn MemoryPort) -> Result<GuardCheck, BusFault> {
        let mut expected = Vec::new();
        let mut observed = Vec::new();
        for addr in [self.before, self.after].into_iter().flatten() {
            let mut band = [0u8; GUARD_BAND_BYTES as usize];
            memory.read_bytes(addr, &mut band)?;
            expected.extend_from_slice(&[GUARD_PATTERN; GUARD_BAND_BYTES as usize]);
            observed.extend_from_slice(&band);
        }
        Ok(GuardCheck {
            intact: expected == observed,
            expected: checksum16(&expected),
            observed: checksum16(&observed),
        })
    }
}
