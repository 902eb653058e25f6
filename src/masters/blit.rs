//! Accelerator Blit Backend.
//!
//! Copies through the 2D accelerator as one linear blit and waits on its
//! completion signal.

use super::{await_completion, BusMaster, CompletionSignal, MasterKind, Mover, TransferOutcome};
use crate::catalog::{MemoryRegion, RegionKind};
use crate::common::{CopyWidth, HalError};
use crate::soc::traits::{BlitPort, Platform, PowerControl};
use tracing::warn;

/// 2D accelerator backend.
///
/// The accelerator only reaches shared SRAM and the external memory window;
/// it cannot address non-volatile memory or the core's TCM.
pub struct AcceleratorBlit {
    port: Box<dyn BlitPort>,
    signal: CompletionSignal,
    timeout_ms: u32,
    registered: bool,
}

impl AcceleratorBlit {
    /// Wraps a blitter driver.
    pub fn new(port: Box<dyn BlitPort>, timeout_ms: u32) -> Self {
        Self {
            port,
            signal: CompletionSignal::new(),
            timeout_ms,
            registered: false,
        }
    }

    fn reachable(region: &MemoryRegion) -> bool {
        matches!(region.kind, RegionKind::Sram | RegionKind::Xip)
    }
}

impl BusMaster for AcceleratorBlit {
    fn kind(&self) -> MasterKind {
        MasterKind::AcceleratorBlit
    }

    fn init(&mut self, power: &mut dyn PowerControl) -> Result<(), HalError> {
        power.power_up(self.kind())?;
        if !self.registered {
            self.port.register_completion(self.signal.clone());
            self.registered = true;
        }
        Ok(())
    }

    fn supports_source(&self, region: &MemoryRegion) -> bool {
        Self::reachable(region)
    }

    fn supports_dest(&self, region: &MemoryRegion) -> bool {
        Self::reachable(region) && region.writable
    }

    fn as_mover(&mut self) -> Option<&mut dyn Mover> {
        Some(self)
    }
}

impl Mover for AcceleratorBlit {
    fn copy_widths(&self) -> &[CopyWidth] {
        &[CopyWidth::Native]
    }

    fn transfer(
        &mut self,
        hw: &mut Platform<'_>,
        src: u64,
        dst: u64,
        len: usize,
        _width: CopyWidth,
    ) -> TransferOutcome {
        if let Err(e) = self.port.start_copy(src, dst, len) {
            warn!(error = %e, "blit rejected");
            return TransferOutcome::error();
        }
        await_completion(&mut *self.port, &self.signal, self.timeout_ms, hw).into()
    }
}
