//! Capture Backend.
//!
//! Drives the PDM and ADC samplers. They only write: a capture fills the
//! destination with samples and waits on the sampler's completion signal.

use super::{await_completion, BusMaster, Capturer, CompletionSignal, MasterKind, TransferOutcome};
use crate::catalog::{MemoryRegion, RegionKind};
use crate::common::HalError;
use crate::soc::traits::{CapturePort, Platform, PowerControl};
use tracing::warn;

/// Capture-only backend for the PDM interface and the ADC.
pub struct CaptureMaster {
    kind: MasterKind,
    port: Box<dyn CapturePort>,
    signal: CompletionSignal,
    timeout_ms: u32,
    registered: bool,
}

impl CaptureMaster {
    /// Wraps a sampler driver.
    pub fn new(kind: MasterKind, port: Box<dyn CapturePort>, timeout_ms: u32) -> Self {
        Self {
            kind,
            port,
            signal: CompletionSignal::new(),
            timeout_ms,
            registered: false,
        }
    }
}

impl BusMaster for CaptureMaster {
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

    fn supports_source(&self, _region: &MemoryRegion) -> bool {
        false
    }

    fn supports_dest(&self, region: &MemoryRegion) -> bool {
        region.writable && region.kind != RegionKind::Nvm
    }

    fn as_capturer(&mut self) -> Option<&mut dyn Capturer> {
        Some(self)
    }
}

impl Capturer for CaptureMaster {
    fn capture(&mut self, hw: &mut Platform<'_>, dst: u64, len: usize) -> TransferOutcome {
        if let Err(e) = self.port.start_capture(dst, len) {
            warn!(master = %self.kind, error = %e, "capture rejected");
            return TransferOutcome::error();
        }
        await_completion(&mut *self.port, &self.signal, self.timeout_ms, hw).into()
    }
}
