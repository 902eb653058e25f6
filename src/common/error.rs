//! Error Types.
//!
//! Each layer of the engine has its own error enum. Per-case problems such as
//! checksum mismatches or timeouts are not errors; they are recorded as case
//! outcomes and never abort the sweep.

use crate::masters::MasterKind;
use thiserror::Error;

/// A bus access that could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum BusFault {
    /// No device decodes the address.
    #[error("no device mapped at {addr:#010x}")]
    Unmapped {
        /// Faulting physical address.
        addr: u64,
    },

    /// The device at the address does not accept writes.
    #[error("write to read-only memory at {addr:#010x}")]
    ReadOnly {
        /// Faulting physical address.
        addr: u64,
    },
}

/// Errors reported by a peripheral driver or power controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// The master could not be powered up.
    #[error("{master} failed to power up")]
    PowerUp {
        /// Master that failed.
        master: MasterKind,
    },

    /// A transfer was started while another one is still in flight.
    #[error("{engine} is busy")]
    Busy {
        /// Engine name.
        engine: String,
    },

    /// The engine refused the request.
    #[error("{engine} rejected a {len}-byte request: {reason}")]
    Rejected {
        /// Engine name.
        engine: String,
        /// Requested length in bytes.
        len: usize,
        /// Why the request was refused.
        reason: &'static str,
    },

    /// A bus access issued by the driver faulted.
    #[error(transparent)]
    Bus(#[from] BusFault),
}

/// Errors reported when a fabric setting cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FabricError {
    /// The buffering stage must keep fewer free buffers than it owns.
    #[error("free buffer count {free} must be below buffer count {buffers}")]
    FreeBuffersExceedPool {
        /// Requested free buffer count.
        free: u8,
        /// Requested buffer pool size.
        buffers: u8,
    },

    /// `enable_cache` was called without a prior `configure_cache`.
    #[error("cache enabled before it was configured")]
    CacheNotConfigured,
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A catalog entry is inconsistent.
    #[error("region {name}: {reason}")]
    Region {
        /// Region name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A master name did not match any known master.
    #[error("unknown master `{0}`")]
    UnknownMaster(String),

    /// An address string could not be parsed.
    #[error("invalid address `{value}` for {field}")]
    Address {
        /// Configuration field.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// A numeric setting is outside its allowed range.
    #[error("{field}: {reason}")]
    Range {
        /// Configuration field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
