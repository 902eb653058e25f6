//! Link Backend.
//!
//! Drives a DMA-capable link through a round trip: a non-blocking write of
//! the source into the link's staging area, then a non-blocking read from
//! the staging area into the destination. Each phase blocks on the
//! completion signal with the link's timeout; the read is not started if the
//! write did not complete.
//!
//! A mapped staging area is cleared before every write so stale data from
//! the previous case can never satisfy the comparison. The mapped window
//! itself is never a source or destination.

use super::{
    await_completion, BusMaster, Comparison, CompletionSignal, MasterKind, Mover,
    TransferOutcome, WaitResult,
};
use crate::catalog::MemoryRegion;
use crate::common::{CopyWidth, HalError};
use crate::soc::traits::{LinkPort, Platform, PowerControl, Staging};
use tracing::warn;

/// Link peripheral backend.
pub struct LinkMaster {
    kind: MasterKind,
    port: Box<dyn LinkPort>,
    signal: CompletionSignal,
    timeout_ms: u32,
    registered: bool,
}

impl LinkMaster {
    /// Wraps a link driver.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which link this is
    /// * `port` - Driver
    /// * `timeout_ms` - Bound on each of the write and read waits
    pub fn new(kind: MasterKind, port: Box<dyn LinkPort>, timeout_ms: u32) -> Self {
        Self {
            kind,
            port,
            signal: CompletionSignal::new(),
            timeout_ms,
            registered: false,
        }
    }

    fn clear_of_staging(&self, region: &MemoryRegion) -> bool {
        match self.port.staging() {
            Staging::Mapped(window) => !region.contains(window),
            Staging::Device { .. } => true,
        }
    }

    fn phase(&mut self, hw: &mut Platform<'_>, started: Result<(), HalError>) -> WaitResult {
        if let Err(e) = started {
            warn!(master = %self.kind, error = %e, "link transfer rejected");
            return WaitResult::Error;
        }
        await_completion(&mut *self.port, &self.signal, self.timeout_ms, hw)
    }
}

impl BusMaster for LinkMaster {
    fn kind(&self) -> MasterKind {
        self.kind
    }

    fn init(&mut self, power: &mut dyn PowerControl) -> Result<(), HalError> {
        power.power_up(self.kind)?;
        if !self.registered {
            self.port.register_completion(self.signal.clone());
            self.registered = true;
        }
        Ok(())
    }

    fn supports_source(&self, region: &MemoryRegion) -> bool {
        self.clear_of_staging(region)
    }

    fn supports_dest(&self, region: &MemoryRegion) -> bool {
        region.writable && self.clear_of_staging(region)
    }

    fn as_mover(&mut self) -> Option<&mut dyn Mover> {
        Some(self)
    }
}

impl Mover for LinkMaster {
    fn copy_widths(&self) -> &[CopyWidth] {
        &[CopyWidth::Native]
    }

    fn comparison(&self) -> Comparison {
        if self.kind == MasterKind::I2s {
            Comparison::AlignedStream
        } else {
            Comparison::Checksum
        }
    }

    fn transfer(
        &mut self,
        hw: &mut Platform<'_>,
        src: u64,
        dst: u64,
        len: usize,
        _width: CopyWidth,
    ) -> TransferOutcome {
        if let Staging::Mapped(window) = self.port.staging() {
            if let Err(fault) = hw.memory.fill(window, len, 0) {
                warn!(master = %self.kind, error = %fault, "staging clear faulted");
                return TransferOutcome::error();
            }
        }

        let started = self.port.start_write(src, len);
        let written = self.phase(hw, started);
        if written != WaitResult::Completed {
            return written.into();
        }

        let started = self.port.start_read(dst, len);
        self.phase(hw, started).into()
    }
}
