//! DMA Channel Model.
//!
//! Every simulated engine moves data the same way: a transfer is armed by a
//! start call, progresses one chunk per service call, and raises its
//! completion signal when the last chunk lands. A `FaultPlan` can make the
//! n-th start misbehave so error paths of the sweep can be exercised.

use crate::common::{BusFault, HalError};
use crate::masters::CompletionSignal;
use crate::soc::traits::MemoryPort;
use serde::Deserialize;
use tracing::{debug, warn};

/// Faults to inject, keyed by 1-based start number of an engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FaultPlan {
    /// Starts whose transfer finishes without raising the completion signal.
    pub drop_completion: Vec<u64>,
    /// Starts that finish with the hardware error flag set.
    pub raise_error: Vec<u64>,
    /// Starts whose data is flipped in flight.
    pub corrupt: Vec<u64>,
    /// Starts that write four bytes past the end of the destination.
    pub overrun: Vec<u64>,
}

impl FaultPlan {
    /// Whether the plan injects nothing.
    pub fn is_empty(&self) -> bool {
        self.drop_completion.is_empty()
            && self.raise_error.is_empty()
            && self.corrupt.is_empty()
            && self.overrun.is_empty()
    }

    fn fault_for(&self, start: u64) -> Injected {
        if self.drop_completion.contains(&start) {
            Injected::DropCompletion
        } else if self.raise_error.contains(&start) {
            Injected::RaiseError
        } else if self.corrupt.contains(&start) {
            Injected::Corrupt
        } else if self.overrun.contains(&start) {
            Injected::Overrun
        } else {
            Injected::None
        }
    }
}

/// Fault selected for one transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Injected {
    /// Behave normally.
    None,
    /// Never raise completion.
    DropCompletion,
    /// Finish with the error flag.
    RaiseError,
    /// Flip the first byte of the last chunk.
    Corrupt,
    /// Spill past the destination.
    Overrun,
}

/// Start counting, fault selection, and completion signalling shared by
/// every engine model.
pub struct Sequencer {
    name: String,
    signal: Option<CompletionSignal>,
    plan: FaultPlan,
    starts: u64,
}

impl Sequencer {
    /// Creates a sequencer for the named engine.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signal: None,
            plan: FaultPlan::default(),
            starts: 0,
        }
    }

    /// Engine name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the fault plan.
    pub fn set_fault_plan(&mut self, plan: FaultPlan) {
        self.plan = plan;
    }

    /// Registers the completion signal.
    pub fn attach(&mut self, signal: CompletionSignal) {
        self.signal = Some(signal);
    }

    /// Number of transfers started so far.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Arms the signal for a new transfer and picks its fault.
    pub fn begin(&mut self, len: usize) -> Result<Injected, HalError> {
        let signal = self.signal.as_ref().ok_or_else(|| HalError::Rejected {
            engine: self.name.clone(),
            len,
            reason: "completion signal not registered",
        })?;
        self.starts += 1;
        signal.arm();
        Ok(self.plan.fault_for(self.starts))
    }

    /// Signals the end of a transfer according to its fault.
    pub fn finish(&self, fault: Injected) {
        let Some(signal) = &self.signal else { return };
        match fault {
            Injected::DropCompletion => {
                debug!(engine = %self.name, start = self.starts, "completion dropped");
            }
            Injected::RaiseError => signal.fail(),
            _ => signal.complete(),
        }
    }

    /// Signals a transfer that stopped on a bus fault.
    pub fn abort(&self, fault: BusFault) {
        warn!(engine = %self.name, error = %fault, "transfer aborted");
        if let Some(signal) = &self.signal {
            signal.fail();
        }
    }
}

/// One side of a DMA transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// A physical address on the system bus.
    Bus(u64),
    /// An offset into storage private to the engine's external device.
    Local(usize),
}

struct Job {
    src: Endpoint,
    dst: Endpoint,
    len: usize,
    done: usize,
    fault: Injected,
}

/// A chunked copy engine with optional device-private storage.
pub struct DmaChannel {
    seq: Sequencer,
    chunk_bytes: usize,
    local: Vec<u8>,
    job: Option<Job>,
}

impl DmaChannel {
    /// Creates a channel.
    ///
    /// # Arguments
    ///
    /// * `name` - Engine name
    /// * `chunk_bytes` - Bytes moved per service call
    /// * `local_size` - Size of the device-private storage
    pub fn new(name: &str, chunk_bytes: usize, local_size: usize) -> Self {
        Self {
            seq: Sequencer::new(name),
            chunk_bytes: chunk_bytes.max(1),
            local: vec![0; local_size],
            job: None,
        }
    }

    /// Replaces the fault plan.
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.seq.set_fault_plan(plan);
        self
    }

    /// Engine name.
    pub fn name(&self) -> &str {
        self.seq.name()
    }

    /// Registers the completion signal.
    pub fn attach(&mut self, signal: CompletionSignal) {
        self.seq.attach(signal);
    }

    /// Number of transfers started so far.
    pub fn starts(&self) -> u64 {
        self.seq.starts()
    }

    /// Whether a transfer is in flight.
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// Drops the transfer in flight without signalling completion.
    pub fn cancel(&mut self) {
        if let Some(job) = self.job.take() {
            debug!(engine = %self.name(), done = job.done, len = job.len, "transfer cancelled");
        }
    }

    /// Mutable device-private storage.
    pub fn local_mut(&mut self) -> &mut [u8] {
        &mut self.local
    }

    /// Arms a transfer of `len` bytes from `src` to `dst`.
    pub fn start(&mut self, src: Endpoint, dst: Endpoint, len: usize) -> Result<(), HalError> {
        if self.job.is_some() {
            return Err(HalError::Busy {
                engine: self.name().to_string(),
            });
        }
        for endpoint in [src, dst] {
            if let Endpoint::Local(offset) = endpoint {
                if offset + len > self.local.len() {
                    return Err(HalError::Rejected {
                        engine: self.name().to_string(),
                        len,
                        reason: "exceeds device storage",
                    });
                }
            }
        }
        let fault = self.seq.begin(len)?;
        self.job = Some(Job {
            src,
            dst,
            len,
            done: 0,
            fault,
        });
        Ok(())
    }

    /// Moves the next chunk of the current transfer.
    pub fn step(&mut self, memory: &mut dyn MemoryPort) {
        let Some(mut job) = self.job.take() else {
            return;
        };
        let n = self.chunk_bytes.min(job.len - job.done);
        let mut chunk = vec![0u8; n];
        if let Err(fault) = read_endpoint(&self.local, memory, job.src, job.done, &mut chunk) {
            self.seq.abort(fault);
            return;
        }
        let last = job.done + n == job.len;
        if last && job.fault == Injected::Corrupt {
            if let Some(first) = chunk.first_mut() {
                *first ^= 0xFF;
            }
        }
        if let Err(fault) = write_endpoint(&mut self.local, memory, job.dst, job.done, &chunk) {
            self.seq.abort(fault);
            return;
        }
        job.done += n;
        if !last {
            self.job = Some(job);
            return;
        }
        if job.fault == Injected::Overrun {
            if let Err(fault) = write_endpoint(&mut self.local, memory, job.dst, job.len, &[0x5A; 4]) {
                self.seq.abort(fault);
                return;
            }
        }
        self.seq.finish(job.fault);
    }
}

fn read_endpoint(
    local: &[u8],
    memory: &mut dyn MemoryPort,
    endpoint: Endpoint,
    at: usize,
    buf: &mut [u8],
) -> Result<(), BusFault> {
    match endpoint {
        Endpoint::Bus(addr) => memory.read_bytes(addr + at as u64, buf),
        Endpoint::Local(offset) => {
            let start = offset + at;
            match local.get(start..start + buf.len()) {
                Some(src) => buf.copy_from_slice(src),
                None => buf.fill(0),
            }
            Ok(())
        }
    }
}

fn write_endpoint(
    local: &mut [u8],
    memory: &mut dyn MemoryPort,
    endpoint: Endpoint,
    at: usize,
    data: &[u8],
) -> Result<(), BusFault> {
    match endpoint {
        Endpoint::Bus(addr) => memory.write_bytes(addr + at as u64, data),
        Endpoint::Local(offset) => {
            let start = offset + at;
            if let Some(dst) = local.get_mut(start..start + data.len()) {
                dst.copy_from_slice(data);
            }
            Ok(())
        }
    }
}
