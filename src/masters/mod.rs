//! Bus Master Transfer Backends.
//!
//! Every agent that can independently read or write memory is wrapped in a
//! `BusMaster`. A master plays exactly one role:
//!
//! * **Mover**: copies a source range to a destination range (core copy,
//!   2D blit, and the DMA-capable links).
//! * **Verifier**: computes a fingerprint of a source range in hardware
//!   (CRC engine).
//! * **Capturer**: writes samples into a destination range (PDM, ADC).
//!
//! The role traits are reached through `as_mover`, `as_verifier`, and
//! `as_capturer`, the same way devices are downcast on the bus.

/// 2D accelerator block copy.
pub mod blit;

/// Capture-only samplers.
pub mod capture;

/// Core (CPU) copy loops.
pub mod core_copy;

/// Hardware CRC engine.
pub mod crc;

/// DMA-capable links.
pub mod link;

/// Completion signalling and the bounded wait.
pub mod wait;

pub use blit::AcceleratorBlit;
pub use capture::CaptureMaster;
pub use core_copy::CoreCopy;
pub use crc::CrcMaster;
pub use link::LinkMaster;
pub use wait::{await_completion, CompletionSignal, SignalState, WaitResult};

use crate::catalog::MemoryRegion;
use crate::common::{ConfigError, CopyWidth, HalError};
use crate::soc::traits::{Platform, PowerControl};
use serde::Serialize;
use std::fmt;

macro_rules! master_kinds {{
    $($variant: ident => $name: literal),* $(,)?
} => {
    /// Every bus master the sweep can drive.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
    pub enum MasterKind {
        $(
            #[serde(rename = $name)]
            $variant,
        )*
    }

    impl MasterKind {
        /// Every master, in sweep order.
        pub const ALL: &'static [Self] = &[
            $(Self::$variant),*
        ];

        /// Name used in configuration files and reports.
        pub fn name(self) -> &'static str {
            match self {
                $(Self::$variant => $name,)*
            }
        }
    }

    impl std::str::FromStr for MasterKind {
        type Err = ConfigError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
            $(
                $name => Ok(Self::$variant),
            )*
                _ => Err(ConfigError::UnknownMaster(s.to_string())),
            }
        }
    }
}}

master_kinds! {
    CoreCopy => "core_copy",
    AcceleratorBlit => "blit",
    Mspi => "mspi",
    Sdio => "sdio",
    Iom => "iom",
    I2s => "i2s",
    Uart => "uart",
    CrcEngine => "crc",
    Pdm => "pdm",
    Adc => "adc",
}

impl MasterKind {
    /// Whether the master is a link-layer peripheral.
    pub fn is_link(self) -> bool {
        matches!(
            self,
            MasterKind::Mspi | MasterKind::Sdio | MasterKind::Iom | MasterKind::I2s | MasterKind::Uart
        )
    }

    /// Role the master plays in a case.
    pub fn role(self) -> MasterRole {
        match self {
            MasterKind::CrcEngine => MasterRole::Verifier,
            MasterKind::Pdm | MasterKind::Adc => MasterRole::Capturer,
            _ => MasterRole::Mover,
        }
    }

    /// What a hardware error flag from this master does to the sweep.
    ///
    /// Link peripherals and the ADC halt; a raised error there points at the
    /// link or its wiring rather than at one boundary. Everything else only
    /// fails the case.
    pub fn fault_policy(self) -> FaultPolicy {
        if self.is_link() || self == MasterKind::Adc {
            FaultPolicy::HaltOnHardwareError
        } else {
            FaultPolicy::Recoverable
        }
    }
}

impl fmt::Display for MasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role of a master.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MasterRole {
    /// Source and destination.
    Mover,
    /// Source only.
    Verifier,
    /// Destination only.
    Capturer,
}

/// Reaction to a hardware error flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FaultPolicy {
    /// Fail the case and continue.
    Recoverable,
    /// Fail the case and stop the sweep.
    HaltOnHardwareError,
}

/// How a transfer ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    /// All data was moved and completion was signalled.
    pub completed: bool,
    /// Completion was not signalled within the master's timeout.
    pub timed_out: bool,
    /// The master raised its hardware error flag or refused the request.
    pub hw_error: bool,
}

impl TransferOutcome {
    /// A completed transfer.
    pub fn done() -> Self {
        Self {
            completed: true,
            ..Self::default()
        }
    }

    /// A transfer that timed out.
    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    /// A transfer that ended with a hardware error.
    pub fn error() -> Self {
        Self {
            hw_error: true,
            ..Self::default()
        }
    }
}

impl From<WaitResult> for TransferOutcome {
    fn from(result: WaitResult) -> Self {
        match result {
            WaitResult::Completed => Self::done(),
            WaitResult::TimedOut => Self::timeout(),
            WaitResult::Error => Self::error(),
        }
    }
}

/// How the data at the destination is compared with the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// Checksums over the whole payload.
    Checksum,
    /// Word stream comparison tolerating a leading receive lag.
    AlignedStream,
}

/// Result of a hardware CRC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrcReading {
    /// How the computation ended.
    pub outcome: TransferOutcome,
    /// CRC value; meaningful only when completed.
    pub value: u32,
}

/// Common surface of every bus master.
pub trait BusMaster {
    /// Which master this is.
    fn kind(&self) -> MasterKind;

    /// Reaction to a hardware error flag.
    fn fault_policy(&self) -> FaultPolicy {
        self.kind().fault_policy()
    }

    /// Powers the master up and registers its completion signal.
    ///
    /// Called once before the sweep.
    fn init(&mut self, power: &mut dyn PowerControl) -> Result<(), HalError>;

    /// Whether the master can read from `region`.
    fn supports_source(&self, region: &MemoryRegion) -> bool;

    /// Whether the master can write to `region`.
    fn supports_dest(&self, region: &MemoryRegion) -> bool;

    /// Downcasts to the mover role.
    fn as_mover(&mut self) -> Option<&mut dyn Mover> {
        None
    }

    /// Downcasts to the verifier role.
    fn as_verifier(&mut self) -> Option<&mut dyn Verifier> {
        None
    }

    /// Downcasts to the capturer role.
    fn as_capturer(&mut self) -> Option<&mut dyn Capturer> {
        None
    }
}

/// A master that copies data from a source to a destination.
pub trait Mover {
    /// Sub-strategies run per case.
    fn copy_widths(&self) -> &[CopyWidth];

    /// How the destination is compared with the reference.
    fn comparison(&self) -> Comparison {
        Comparison::Checksum
    }

    /// Copies `len` bytes from `src` to `dst`.
    fn transfer(
        &mut self,
        hw: &mut Platform<'_>,
        src: u64,
        dst: u64,
        len: usize,
        width: CopyWidth,
    ) -> TransferOutcome;
}

/// A master that fingerprints a source range in hardware.
pub trait Verifier {
    /// Computes the fingerprint of `[addr, addr + len)`.
    fn verify(&mut self, hw: &mut Platform<'_>, addr: u64, len: usize) -> CrcReading;
}

/// A master that only writes into a destination.
pub trait Capturer {
    /// Captures `len` bytes into `dst`.
    fn capture(&mut self, hw: &mut Platform<'_>, dst: u64, len: usize) -> TransferOutcome;
}
