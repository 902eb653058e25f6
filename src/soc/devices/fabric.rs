//! Fabric Register Block Model.
//!
//! Holds the cache and buffering control registers. The live register images
//! are shared with the bus timing model through `FabricState`, the same way
//! the system controller shares its exit signal.

use crate::common::FabricError;
use crate::fabric::cache::CACHE_ENABLE;
use crate::fabric::{BufferingConfig, CacheConfig, FabricControl, FabricSnapshot};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Live fabric register images, shared between the register block and the
/// memory controller.
#[derive(Clone, Debug)]
pub struct FabricState {
    cache: Arc<AtomicU32>,
    buffering: Arc<AtomicU32>,
}

impl FabricState {
    /// Reset state: cache off, buffering bypassed.
    pub fn new() -> Self {
        Self {
            cache: Arc::new(AtomicU32::new(CacheConfig::disabled().register_value())),
            buffering: Arc::new(AtomicU32::new(BufferingConfig::pass_through().register_value())),
        }
    }

    /// Current cache control register.
    pub fn cache(&self) -> u32 {
        self.cache.load(Ordering::Relaxed)
    }

    /// Current buffering control register.
    pub fn buffering(&self) -> u32 {
        self.buffering.load(Ordering::Relaxed)
    }
}

impl Default for FabricState {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated fabric register block.
///
/// Rejects buffered settings that keep as many free buffers as the pool
/// holds, and refuses to enable a cache that was never configured.
pub struct SimFabric {
    state: FabricState,
    staged_cache: Option<u32>,
    writes: u64,
}

impl SimFabric {
    /// Creates a register block driving `state`.
    pub fn new(state: FabricState) -> Self {
        Self {
            state,
            staged_cache: None,
            writes: 0,
        }
    }

    /// Handle on the live register images.
    pub fn state(&self) -> FabricState {
        self.state.clone()
    }

    /// Number of accepted register writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn store_buffering(&mut self, value: u32) {
        self.state.buffering.store(value, Ordering::Relaxed);
        self.writes += 1;
    }

    fn store_cache(&mut self, value: u32) {
        self.state.cache.store(value, Ordering::Relaxed);
        self.writes += 1;
    }
}

impl FabricControl for SimFabric {
    fn disable_buffering(&mut self) -> Result<(), FabricError> {
        self.store_buffering(BufferingConfig::pass_through().register_value());
        Ok(())
    }

    fn configure_buffering(&mut self, config: &BufferingConfig) -> Result<(), FabricError> {
        let buffers = config.buffer_count.get();
        if config.free_buffer_count >= buffers {
            return Err(FabricError::FreeBuffersExceedPool {
                free: config.free_buffer_count,
                buffers,
            });
        }
        self.store_buffering(config.register_value());
        Ok(())
    }

    fn disable_cache(&mut self) -> Result<(), FabricError> {
        self.staged_cache = None;
        self.store_cache(0);
        Ok(())
    }

    fn configure_cache(&mut self, config: &CacheConfig) -> Result<(), FabricError> {
        let staged = config.register_value() & !CACHE_ENABLE;
        self.staged_cache = Some(staged);
        self.store_cache(staged);
        Ok(())
    }

    fn enable_cache(&mut self) -> Result<(), FabricError> {
        let staged = self.staged_cache.ok_or(FabricError::CacheNotConfigured)?;
        self.store_cache(staged | CACHE_ENABLE);
        Ok(())
    }

    fn snapshot(&self) -> FabricSnapshot {
        FabricSnapshot {
            cache: self.state.cache(),
            buffering: self.state.buffering(),
        }
    }
}
