//! Hardware CRC Engine Model.
//!
//! Reads a source range over the bus in chunks and folds it into a CRC-32.
//! A `corrupt` fault flips the low bit of the result instead of the data,
//! since the engine has no destination.

use super::dma::{FaultPlan, Injected, Sequencer};
use crate::common::HalError;
use crate::masters::CompletionSignal;
use crate::soc::traits::{CrcPort, Engine, MemoryPort};
use crate::verify::crc::Crc32;

struct CrcJob {
    addr: u64,
    len: usize,
    done: usize,
    fault: Injected,
    hasher: Crc32,
}

/// Simulated CRC engine.
pub struct SimCrc {
    seq: Sequencer,
    chunk_bytes: usize,
    job: Option<CrcJob>,
    result: u32,
}

impl SimCrc {
    /// Creates an engine reading `chunk_bytes` per service call.
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            seq: Sequencer::new("CRC"),
            chunk_bytes: chunk_bytes.max(1),
            job: None,
            result: 0,
        }
    }

    /// Installs a fault plan.
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.seq.set_fault_plan(plan);
        self
    }
}

impl Engine for SimCrc {
    fn name(&self) -> &str {
        self.seq.name()
    }

    fn register_completion(&mut self, signal: CompletionSignal) {
        self.seq.attach(signal);
    }

    fn service(&mut self, memory: &mut dyn MemoryPort) {
        let Some(mut job) = self.job.take() else {
            return;
        };
        let n = self.chunk_bytes.min(job.len - job.done);
        let mut chunk = vec![0u8; n];
        if let Err(fault) = memory.read_bytes(job.addr + job.done as u64, &mut chunk) {
            self.seq.abort(fault);
            return;
        }
        job.hasher.update(&chunk);
        job.done += n;
        if job.done < job.len {
            self.job = Some(job);
            return;
        }
        self.result = job.hasher.finish();
        if job.fault == Injected::Corrupt {
            self.result ^= 1;
        }
        self.seq.finish(job.fault);
    }

    fn cancel(&mut self) {
        self.job = None;
    }
}

impl CrcPort for SimCrc {
    fn start_crc(&mut self, addr: u64, len: usize) -> Result<(), HalError> {
        if self.job.is_some() {
            return Err(HalError::Busy {
                engine: self.seq.name().to_string(),
            });
        }
        let fault = self.seq.begin(len)?;
        self.job = Some(CrcJob {
            addr,
            len,
            done: 0,
            fault,
            hasher: Crc32::new(),
        });
        Ok(())
    }

    fn result(&self) -> u32 {
        self.result
    }
}
