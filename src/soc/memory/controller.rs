//! Memory Timing Controller.
//!
//! This module defines the `MemoryController` trait and implementations for
//! simulating access latencies. Timing never changes the data that moves;
//! it only feeds the bus cycle statistics, which lets a sweep show that a
//! fabric setting was in effect without it affecting correctness.

use crate::fabric::buffering::BUF_PASS_THROUGH;
use crate::fabric::cache::CACHE_ENABLE;
use crate::soc::devices::fabric::FabricState;

/// Trait for memory controller implementations.
pub trait MemoryController {
    /// Calculates the latency for a memory access at a specific address.
    ///
    /// # Arguments
    ///
    /// * `addr` - The physical address being accessed.
    ///
    /// # Returns
    ///
    /// The latency in bus cycles.
    fn access_latency(&mut self, addr: u64) -> u64;
}

/// A simple memory controller with fixed latency.
///
/// Models an ideal memory system where every access takes a constant amount
/// of time regardless of the fabric setting.
pub struct SimpleController {
    /// Fixed latency per access.
    latency: u64,
}

impl SimpleController {
    /// Creates a new SimpleController.
    ///
    /// # Arguments
    ///
    /// * `latency` - The fixed latency in cycles.
    pub fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    /// Returns the fixed latency regardless of the address.
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// A controller whose timing follows the programmed fabric registers.
///
/// With the cache on, it tracks the most recently filled line so repeated
/// accesses to that line hit. With the buffering stage bypassed, every access
/// pays an extra penalty.
pub struct FabricController {
    state: FabricState,
    /// Line currently held, if any.
    last_line: Option<u64>,
    hit_latency: u64,
    miss_latency: u64,
    pass_through_penalty: u64,
}

impl FabricController {
    /// Creates a new FabricController.
    ///
    /// # Arguments
    ///
    /// * `state` - Live register images shared with the fabric model
    /// * `hit_latency` - Latency of a cached line hit
    /// * `miss_latency` - Latency of an uncached or missing access
    /// * `pass_through_penalty` - Extra cycles when buffering is bypassed
    pub fn new(
        state: FabricState,
        hit_latency: u64,
        miss_latency: u64,
        pass_through_penalty: u64,
    ) -> Self {
        Self {
            state,
            last_line: None,
            hit_latency,
            miss_latency,
            pass_through_penalty,
        }
    }
}

impl MemoryController for FabricController {
    /// Calculates latency based on the cache and buffering registers.
    ///
    /// * **Line Hit:** Cache enabled and the line is held: `hit_latency`.
    /// * **Line Miss:** Cache enabled, another line is held: `miss_latency`, line replaced.
    /// * **Uncached:** Cache disabled: `miss_latency`, no line is held.
    ///
    /// `pass_through_penalty` is added when the buffering stage is bypassed.
    fn access_latency(&mut self, addr: u64) -> u64 {
        let cache = self.state.cache();
        let mut cycles = if cache & CACHE_ENABLE != 0 {
            let line = addr & !127;
            match self.last_line {
                Some(held) if held == line => self.hit_latency,
                _ => {
                    self.last_line = Some(line);
                    self.miss_latency
                }
            }
        } else {
            self.last_line = None;
            self.miss_latency
        };

        if self.state.buffering() & BUF_PASS_THROUGH != 0 {
            cycles += self.pass_through_penalty;
        }
        cycles
    }
}
