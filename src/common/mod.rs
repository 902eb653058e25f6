//! Common utilities and types used throughout the sweep engine.
//!
//! This module provides the access-width and performance-mode types, shared
//! constants, and the error enums that are shared across the catalog,
//! fabric, SoC, and master components.

/// Common constants used throughout the crate.
pub mod constants;

/// Memory access width and power mode definitions.
pub mod data;

/// Error types for the bus, HAL, fabric, and configuration layers.
pub mod error;

pub use data::{CopyWidth, PerformanceMode};
pub use error::{BusFault, ConfigError, FabricError, HalError};

pub use constants::{GUARD_BAND_BYTES, MAX_BOUNDARY_OFFSET};
