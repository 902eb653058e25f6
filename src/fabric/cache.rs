//! Cache controller settings.

use serde::Serialize;
use std::fmt;

/// Register bit that enables the cache.
pub const CACHE_ENABLE: u32 = 1 << 0;
/// Register bit that selects LRU replacement.
pub const CACHE_LRU: u32 = 1 << 1;
const DESCRIPTOR_SHIFT: u32 = 4;
const MODE_SHIFT: u32 = 8;

/// Number of records produced by [`generate_cache_configs`].
pub const CACHE_CONFIG_COUNT: usize = 1 + 2 * CacheMode::ALL.len() * CacheDescriptor::ALL.len();

/// Geometry of the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CacheDescriptor {
    /// Direct mapped, 128-byte lines, 512 entries.
    OneWay128B512E,
    /// Two-way, 128-byte lines, 512 entries.
    TwoWay128B512E,
    /// Direct mapped, 128-byte lines, 1024 entries.
    OneWay128B1024E,
}

impl CacheDescriptor {
    /// Every geometry in sweep order.
    pub const ALL: [CacheDescriptor; 3] = [
        CacheDescriptor::OneWay128B512E,
        CacheDescriptor::TwoWay128B512E,
        CacheDescriptor::OneWay128B1024E,
    ];

    /// Associativity.
    pub fn ways(self) -> u32 {
        match self {
            CacheDescriptor::TwoWay128B512E => 2,
            _ => 1,
        }
    }

    /// Line size in bytes.
    pub fn line_bytes(self) -> u64 {
        128
    }

    /// Number of entries.
    pub fn entries(self) -> u32 {
        match self {
            CacheDescriptor::OneWay128B1024E => 1024,
            _ => 512,
        }
    }

    fn code(self) -> u32 {
        match self {
            CacheDescriptor::OneWay128B512E => 0,
            CacheDescriptor::TwoWay128B512E => 1,
            CacheDescriptor::OneWay128B1024E => 2,
        }
    }
}

/// Which accesses the cache serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CacheMode {
    /// Instruction fetches only.
    Instruction,
    /// Data accesses only.
    Data,
    /// Both instruction and data accesses.
    InstructionData,
}

impl CacheMode {
    /// Every mode in sweep order.
    pub const ALL: [CacheMode; 3] = [CacheMode::Instruction, CacheMode::Data, CacheMode::InstructionData];

    /// Whether data accesses are cached.
    pub fn caches_data(self) -> bool {
        matches!(self, CacheMode::Data | CacheMode::InstructionData)
    }

    fn code(self) -> u32 {
        match self {
            CacheMode::Instruction => 1,
            CacheMode::Data => 2,
            CacheMode::InstructionData => 3,
        }
    }
}

/// One cache controller setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CacheConfig {
    /// Cache on or off. All other fields are ignored when off.
    pub enabled: bool,
    /// LRU replacement instead of random.
    pub lru: bool,
    /// Geometry.
    pub descriptor: CacheDescriptor,
    /// Served accesses.
    pub mode: CacheMode,
}

impl CacheConfig {
    /// The disabled record.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            lru: false,
            descriptor: CacheDescriptor::OneWay128B512E,
            mode: CacheMode::InstructionData,
        }
    }

    /// Encodes the setting as the cache control register image.
    ///
    /// A disabled cache reads back as zero.
    pub fn register_value(&self) -> u32 {
        if !self.enabled {
            return 0;
        }
        let mut value = CACHE_ENABLE;
        if self.lru {
            value |= CACHE_LRU;
        }
        value | (self.descriptor.code() << DESCRIPTOR_SHIFT) | (self.mode.code() << MODE_SHIFT)
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            return f.write_str("disabled");
        }
        write!(
            f,
            "{:?} {:?}{}",
            self.descriptor,
            self.mode,
            if self.lru { " lru" } else { "" }
        )
    }
}

/// Enumerates every cache setting in sweep order.
///
/// The disabled record comes first, followed by the cross product of
/// replacement policy, mode, and geometry, with geometry varying fastest.
pub fn generate_cache_configs() -> Vec<CacheConfig> {
    let mut configs = Vec::with_capacity(CACHE_CONFIG_COUNT);
    configs.push(CacheConfig::disabled());
    for lru in [false, true] {
        for mode in CacheMode::ALL {
            for descriptor in CacheDescriptor::ALL {
                configs.push(CacheConfig {
                    enabled: true,
                    lru,
                    descriptor,
                    mode,
                });
            }
        }
    }
    configs
}
