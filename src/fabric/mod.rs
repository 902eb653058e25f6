//! Bus-Fabric Configuration Space.
//!
//! This module defines the value objects for every buffering and cache
//! setting the sweep runs under, the generators that enumerate them in a
//! stable order, and the `FabricControl` trait through which a setting is
//! applied to hardware. Mapping a setting to registers is the adapter's job;
//! the generators are pure and cannot fail.

/// Buffering stage settings and their generator.
pub mod buffering;

/// Cache controller settings and their generator.
pub mod cache;

pub use buffering::{
    generate_buffering_configs, AgingCounter, BufferCount, BufferingConfig,
    BUFFERING_CONFIG_COUNT,
};
pub use cache::{
    generate_cache_configs, CacheConfig, CacheDescriptor, CacheMode, CACHE_CONFIG_COUNT,
};

use crate::common::FabricError;
use serde::Serialize;

/// Register images currently programmed into the fabric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FabricSnapshot {
    /// Cache control register.
    pub cache: u32,
    /// Buffering control register.
    pub buffering: u32,
}

/// Adapter that programs fabric settings into hardware.
///
/// Every call may be rejected; the sweep logs the rejection and skips the
/// configuration.
pub trait FabricControl {
    /// Bypasses the buffering stage.
    fn disable_buffering(&mut self) -> Result<(), FabricError>;

    /// Programs a buffered setting.
    fn configure_buffering(&mut self, config: &BufferingConfig) -> Result<(), FabricError>;

    /// Turns the cache off.
    fn disable_cache(&mut self) -> Result<(), FabricError>;

    /// Programs the cache geometry and policy without enabling it.
    fn configure_cache(&mut self, config: &CacheConfig) -> Result<(), FabricError>;

    /// Turns on a previously configured cache.
    fn enable_cache(&mut self) -> Result<(), FabricError>;

    /// Reads back the current register images.
    fn snapshot(&self) -> FabricSnapshot;
}

/// Applies a cache setting: disable, or configure then enable.
///
/// # Arguments
///
/// * `fabric` - Adapter to program
/// * `config` - Setting to apply
pub fn apply_cache(fabric: &mut dyn FabricControl, config: &CacheConfig) -> Result<(), FabricError> {
    if !config.enabled {
        return fabric.disable_cache();
    }
    fabric.configure_cache(config)?;
    fabric.enable_cache()
}

/// Applies a buffering setting: disable when pass-through, else configure.
///
/// # Arguments
///
/// * `fabric` - Adapter to program
/// * `config` - Setting to apply
pub fn apply_buffering(
    fabric: &mut dyn FabricControl,
    config: &BufferingConfig,
) -> Result<(), FabricError> {
    if config.pass_through {
        fabric.disable_buffering()
    } else {
        fabric.configure_buffering(config)
    }
}
