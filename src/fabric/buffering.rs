//! Bus-fabric buffering stage settings.
//!
//! A `BufferingConfig` either bypasses the buffering stage entirely
//! (pass-through) or selects an aging policy, an aging counter, a buffer pool
//! size, and how many buffers are kept free.

use serde::Serialize;

/// Register bit that bypasses the buffering stage.
pub const BUF_PASS_THROUGH: u32 = 1 << 0;
/// Register bit that enables buffer aging.
pub const BUF_AGING_ENABLE: u32 = 1 << 1;
const AGING_SHIFT: u32 = 4;
const BUFFER_COUNT_SHIFT: u32 = 8;
const FREE_COUNT_SHIFT: u32 = 12;

/// Free-buffer counts swept for every buffered combination.
pub const FREE_BUFFER_COUNTS: [u8; 2] = [2, 3];

/// Aging/free-buffer combinations swept when the stage is not bypassed.
const FUNCTIONAL_COMBINATIONS: [(bool, u8); 4] = [
    (true, FREE_BUFFER_COUNTS[0]),
    (true, FREE_BUFFER_COUNTS[1]),
    (false, FREE_BUFFER_COUNTS[0]),
    (false, FREE_BUFFER_COUNTS[1]),
];

/// Number of records produced by [`generate_buffering_configs`].
pub const BUFFERING_CONFIG_COUNT: usize =
    1 + FUNCTIONAL_COMBINATIONS.len() * AgingCounter::COUNT * BufferCount::COUNT;

/// Number of cycles a buffered write may age before it is flushed.
///
/// Stored as a power-of-two exponent: 1, 2, 4, ... 32768 cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AgingCounter(u8);

impl AgingCounter {
    /// Number of distinct aging counter settings.
    pub const COUNT: usize = 16;

    /// Creates a counter of `2^exponent` cycles.
    pub fn from_exponent(exponent: u8) -> Option<Self> {
        ((exponent as usize) < Self::COUNT).then_some(Self(exponent))
    }

    /// Every setting in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Aging period in cycles.
    pub fn cycles(self) -> u32 {
        1 << self.0
    }

    /// Register field value.
    pub fn exponent(self) -> u8 {
        self.0
    }
}

/// Size of the buffer pool, from 1 to 16 buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BufferCount(u8);

impl BufferCount {
    /// Number of distinct pool sizes.
    pub const COUNT: usize = 16;

    /// Creates a pool of `count` buffers.
    pub fn new(count: u8) -> Option<Self> {
        (1..=Self::COUNT as u8).contains(&count).then_some(Self(count))
    }

    /// Every pool size in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::COUNT as u8).map(Self)
    }

    /// Number of buffers.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// One buffering stage setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BufferingConfig {
    /// Bypass the buffering stage.
    pub pass_through: bool,
    /// Flush aged writes.
    pub aging_enabled: bool,
    /// Aging period.
    pub aging_counter: AgingCounter,
    /// Buffer pool size.
    pub buffer_count: BufferCount,
    /// Buffers held back for incoming traffic.
    pub free_buffer_count: u8,
}

impl BufferingConfig {
    /// The bypass record, carrying fixed safe values in its unused fields.
    pub fn pass_through() -> Self {
        Self {
            pass_through: true,
            aging_enabled: false,
            aging_counter: AgingCounter(0),
            buffer_count: BufferCount(BufferCount::COUNT as u8),
            free_buffer_count: FREE_BUFFER_COUNTS[1],
        }
    }

    /// Encodes the setting as the fabric control register image.
    pub fn register_value(&self) -> u32 {
        let mut value = 0;
        if self.pass_through {
            value |= BUF_PASS_THROUGH;
        }
        if self.aging_enabled {
            value |= BUF_AGING_ENABLE;
        }
        value |= u32::from(self.aging_counter.exponent()) << AGING_SHIFT;
        value |= u32::from(self.buffer_count.get() - 1) << BUFFER_COUNT_SHIFT;
        value |= u32::from(self.free_buffer_count & 0x3) << FREE_COUNT_SHIFT;
        value
    }
}

/// Enumerates every buffering setting in sweep order.
///
/// The pass-through record comes first, followed by each aging/free-buffer
/// combination crossed with every aging counter and every pool size. The
/// order is stable so a sweep can be resumed by position.
pub fn generate_buffering_configs() -> Vec<BufferingConfig> {
    let mut configs = Vec::with_capacity(BUFFERING_CONFIG_COUNT);
    configs.push(BufferingConfig::pass_through());
    for &(aging_enabled, free_buffer_count) in &FUNCTIONAL_COMBINATIONS {
        for aging_counter in AgingCounter::all() {
            for buffer_count in BufferCount::all() {
                configs.push(BufferingConfig {
                    pass_through: false,
                    aging_enabled,
                    aging_counter,
                    buffer_count,
                    free_buffer_count,
                });
            }
        }
    }
    configs
}
