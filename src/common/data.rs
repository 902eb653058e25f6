//! Memory Access Widths.
//!
//! This module defines the access widths a bus master can use when it moves
//! data, and the performance modes a sweep pass can be repeated under. The
//! core-copy backend runs one sub-strategy per width so every store size is
//! exercised across every boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the individual stores a master issues during a copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyWidth {
    /// 8-bit loads and stores.
    Byte,

    /// 16-bit loads and stores.
    HalfWord,

    /// 32-bit loads and stores.
    ///
    /// Addresses are not required to be aligned; the bus splits accesses that
    /// straddle two devices.
    Word,

    /// Whatever burst size the engine uses internally.
    ///
    /// Used by DMA-capable masters whose access pattern is not under the
    /// caller's control.
    Native,
}

impl CopyWidth {
    /// Width sub-strategies used by the core-copy backend, in run order.
    pub const CORE: [CopyWidth; 3] = [CopyWidth::Byte, CopyWidth::HalfWord, CopyWidth::Word];

    /// Returns the access size in bytes, or `None` for [`CopyWidth::Native`].
    pub fn bytes(self) -> Option<usize> {
        match self {
            CopyWidth::Byte => Some(1),
            CopyWidth::HalfWord => Some(2),
            CopyWidth::Word => Some(4),
            CopyWidth::Native => None,
        }
    }
}

impl fmt::Display for CopyWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CopyWidth::Byte => "byte",
            CopyWidth::HalfWord => "half-word",
            CopyWidth::Word => "word",
            CopyWidth::Native => "native",
        };
        f.write_str(label)
    }
}

/// Power/performance mode a sweep pass runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceMode {
    /// High-performance clocking.
    High,
    /// Low-power clocking.
    Low,
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceMode::High => f.write_str("HP"),
            PerformanceMode::Low => f.write_str("LP"),
        }
    }
}
