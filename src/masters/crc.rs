//! CRC Engine Backend.
//!
//! Reads memory through the CRC engine and reports the checksum it computed,
//! so a region can be verified without a second bus master copying it.

use super::{
    await_completion, BusMaster, CompletionSignal, CrcReading, MasterKind, TransferOutcome,
    Verifier,
};
use crate::catalog::MemoryRegion;
use crate::common::HalError;
use crate::soc::traits::{CrcPort, Platform, PowerControl};
use tracing::warn;

/// Hardware CRC engine backend.
///
/// Verify-only: it reads any region and never writes.
pub struct CrcMaster {
    port: Box<dyn CrcPort>,
    signal: CompletionSignal,
    timeout_ms: u32,
    registered: bool,
}

impl CrcMaster {
    /// Wraps a CRC driver.
    pub fn new(port: Box<dyn CrcPort>, timeout_ms: u32) -> Self {
        Self {
            port,
            signal: CompletionSignal::new(),
            timeout_ms,
            registered: false,
        }
    }
}

impl BusMaster for CrcMaster {
    fn kind(&self) -> MasterKind {
        MasterKind::CrcEngine
    }

    fn init(&mut self, power: &mut dyn PowerControl) -> Result<(), HalError> {
        power.power_up(self.kind())?;
        if !self.registered {
            self.port.register_completion(self.signal.clone());
            self.registered = true;
        }
        Ok(())
    }

    fn supports_source(&self, _region: &MemoryRegion) -> bool {
        true
    }

    fn supports_dest(&self, _region: &MemoryRegion) -> bool {
        false
    }

    fn as_verifier(&mut self) -> Option<&mut dyn Verifier> {
        Some(self)
    }
}

impl Verifier for CrcMaster {
    fn verify(&mut self, hw: &mut Platform<'_>, addr: u64, len: usize) -> CrcReading {
        if let Err(e) = self.port.start_crc(addr, len) {
            warn!(error = %e, "crc rejected");
            return CrcReading {
                outcome: TransferOutcome::error(),
                value: 0,
            };
        }
        let outcome: TransferOutcome =
            await_completion(&mut *self.port, &self.signal, self.timeout_ms, hw).into();
        CrcReading {
            outcome,
            value: self.port.result(),
        }
    }
}
