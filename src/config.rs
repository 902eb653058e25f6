//! Sweep Configuration.
//!
//! A TOML file with one table per concern. Every field has a default, so an
//! empty file (or no file at all) reproduces the full sweep over the
//! built-in catalog. Addresses are hex strings, like `"0x1005_4000"`.

use crate::catalog::{Catalog, MemoryRegion, RegionKind};
use crate::common::constants::{
    DEFAULT_MSPI_STAGING_ADDR, DEFAULT_SCRATCH_ADDR, DEFAULT_SEED,
};
use crate::common::{ConfigError, PerformanceMode};
use crate::fabric::{BUFFERING_CONFIG_COUNT, CACHE_CONFIG_COUNT};
use crate::masters::MasterKind;
use crate::soc::devices::FaultPlan;
use crate::sweep::{default_payload_size, SweepSettings};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

const DMA_CHUNK_BYTES: usize = 256;
const DEVICE_SIZE: usize = 0x1_0000;
const I2S_DELAY_WORDS: usize = 2;

const LINK_TIMEOUT_MS: u32 = 2000;
const I2S_TIMEOUT_MS: u32 = 4000;
const BLIT_TIMEOUT_MS: u32 = 2000;
const CRC_TIMEOUT_MS: u32 = 50;
const CAPTURE_TIMEOUT_MS: u32 = 2000;

const BUS_WIDTH: u64 = 4;
const HIT_LATENCY: u64 = 1;
const MISS_LATENCY: u64 = 10;
const PASS_THROUGH_PENALTY: u64 = 2;

/// Root of the configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Payload sizes per master name.
    #[serde(default)]
    pub payload: BTreeMap<String, Vec<usize>>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Catalog override; empty keeps the built-in catalog.
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub faults: FaultConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_scratch_addr")]
    pub scratch_addr: String,
    #[serde(default = "default_dma_chunk")]
    pub dma_chunk_bytes: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            scratch_addr: default_scratch_addr(),
            dma_chunk_bytes: default_dma_chunk(),
        }
    }
}

impl GeneralConfig {
    pub fn scratch_addr_val(&self) -> Result<u64, ConfigError> {
        parse_hex("general.scratch_addr", &self.scratch_addr)
    }
}

#[derive(Debug, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_true")]
    pub sweep_cache: bool,
    #[serde(default = "default_true")]
    pub sweep_buffering: bool,
    #[serde(default)]
    pub resume_cache: usize,
    #[serde(default)]
    pub resume_buffering: usize,
    #[serde(default)]
    pub performance_modes: Vec<PerformanceMode>,
    /// Master names to run; empty runs all of them.
    #[serde(default)]
    pub masters: Vec<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_cache: true,
            sweep_buffering: true,
            resume_cache: 0,
            resume_buffering: 0,
            performance_modes: Vec::new(),
            masters: Vec::new(),
        }
    }
}

impl SweepConfig {
    pub fn masters_val(&self) -> Result<Vec<MasterKind>, ConfigError> {
        self.masters.iter().map(|m| MasterKind::from_str(m)).collect()
    }
}

/// Completion timeouts in milliseconds.
#[derive(Debug, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_link_timeout")]
    pub link_ms: u32,
    #[serde(default = "default_i2s_timeout")]
    pub i2s_ms: u32,
    #[serde(default = "default_blit_timeout")]
    pub blit_ms: u32,
    #[serde(default = "default_crc_timeout")]
    pub crc_ms: u32,
    #[serde(default = "default_capture_timeout")]
    pub capture_ms: u32,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            link_ms: LINK_TIMEOUT_MS,
            i2s_ms: I2S_TIMEOUT_MS,
            blit_ms: BLIT_TIMEOUT_MS,
            crc_ms: CRC_TIMEOUT_MS,
            capture_ms: CAPTURE_TIMEOUT_MS,
        }
    }
}

impl TimeoutConfig {
    /// Timeout of one completion wait for `master`.
    pub fn for_master(&self, master: MasterKind) -> u32 {
        match master {
            MasterKind::I2s => self.i2s_ms,
            MasterKind::AcceleratorBlit => self.blit_ms,
            MasterKind::CrcEngine => self.crc_ms,
            MasterKind::Pdm | MasterKind::Adc => self.capture_ms,
            _ => self.link_ms,
        }
    }
}

/// Link staging areas.
#[derive(Debug, Deserialize)]
pub struct StagingConfig {
    /// Mapped window of the memory-mapped link.
    #[serde(default = "default_mspi_addr")]
    pub mspi_addr: String,
    /// Offset inside the external device for the other links.
    #[serde(default = "default_device_offset")]
    pub device_offset: String,
    /// Storage of each simulated external device, in bytes.
    #[serde(default = "default_device_size")]
    pub device_size: usize,
    /// Leading words the audio loopback receives before the first sample.
    #[serde(default = "default_i2s_delay")]
    pub i2s_delay_words: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            mspi_addr: default_mspi_addr(),
            device_offset: default_device_offset(),
            device_size: DEVICE_SIZE,
            i2s_delay_words: I2S_DELAY_WORDS,
        }
    }
}

impl StagingConfig {
    pub fn mspi_addr_val(&self) -> Result<u64, ConfigError> {
        parse_hex("staging.mspi_addr", &self.mspi_addr)
    }

    pub fn device_offset_val(&self) -> Result<u64, ConfigError> {
        parse_hex("staging.device_offset", &self.device_offset)
    }
}

/// Memory controller model used for bus timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    /// Fixed latency.
    Simple,
    /// Latency follows the programmed cache and buffering settings.
    Fabric,
}

/// Simulated bus timing.
#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_controller")]
    pub controller: ControllerKind,
    #[serde(default = "default_bus_width")]
    pub bus_width: u64,
    #[serde(default = "default_hit_latency")]
    pub hit_latency: u64,
    #[serde(default = "default_miss_latency")]
    pub miss_latency: u64,
    #[serde(default = "default_pass_through_penalty")]
    pub pass_through_penalty: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            controller: default_controller(),
            bus_width: BUS_WIDTH,
            hit_latency: HIT_LATENCY,
            miss_latency: MISS_LATENCY,
            pass_through_penalty: PASS_THROUGH_PENALTY,
        }
    }
}

/// One `[[regions]]` entry.
#[derive(Debug, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub base: String,
    pub size: String,
    pub block: String,
    #[serde(default)]
    pub adjacent: bool,
    #[serde(default = "default_region_kind")]
    pub kind: RegionKind,
    #[serde(default = "default_true")]
    pub writable: bool,
}

impl RegionConfig {
    pub fn to_region(&self) -> Result<MemoryRegion, ConfigError> {
        let mut region = MemoryRegion::new(
            &self.name,
            parse_hex("regions.base", &self.base)?,
            parse_hex("regions.size", &self.size)?,
            parse_hex("regions.block", &self.block)?,
            self.adjacent,
        )
        .with_kind(self.kind);
        if !self.writable {
            region = region.read_only();
        }
        Ok(region)
    }
}

/// Simulation fault injection.
#[derive(Debug, Default, Deserialize)]
pub struct FaultConfig {
    /// Masters whose power-up fails.
    #[serde(default)]
    pub power_up: Vec<String>,
    /// Fault plans per master name.
    #[serde(default)]
    pub engines: BTreeMap<String, FaultPlan>,
}

impl FaultConfig {
    pub fn power_up_failures(&self) -> Result<Vec<MasterKind>, ConfigError> {
        self.power_up.iter().map(|m| MasterKind::from_str(m)).collect()
    }

    /// Fault plan of `master`; empty when none is configured.
    pub fn plan_for(&self, master: MasterKind) -> FaultPlan {
        self.engines.get(master.name()).cloned().unwrap_or_default()
    }
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every cross-field constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.scratch_addr_val()?;
        self.staging.mspi_addr_val()?;
        self.staging.device_offset_val()?;
        self.sweep.masters_val()?;
        self.faults.power_up_failures()?;
        for name in self.faults.engines.keys() {
            MasterKind::from_str(name)?;
        }
        self.payload_sizes()?;
        if self.sweep.resume_cache >= CACHE_CONFIG_COUNT {
            return Err(ConfigError::Range {
                field: "sweep.resume_cache",
                reason: format!("must be below {}", CACHE_CONFIG_COUNT),
            });
        }
        if self.sweep.resume_buffering >= BUFFERING_CONFIG_COUNT {
            return Err(ConfigError::Range {
                field: "sweep.resume_buffering",
                reason: format!("must be below {}", BUFFERING_CONFIG_COUNT),
            });
        }
        if self.general.dma_chunk_bytes == 0 {
            return Err(ConfigError::Range {
                field: "general.dma_chunk_bytes",
                reason: "must be non-zero".to_string(),
            });
        }
        let largest = self
            .payload_sizes()?
            .values()
            .flatten()
            .copied()
            .chain(MasterKind::ALL.iter().map(|&m| default_payload_size(m)))
            .max()
            .unwrap_or(0);
        let needed = self.staging.device_offset_val()? as usize
            + largest
            + self.staging.i2s_delay_words * 4;
        if needed > self.staging.device_size {
            return Err(ConfigError::Range {
                field: "staging.device_offset",
                reason: format!(
                    "offset plus largest payload needs {} bytes, device holds {}",
                    needed, self.staging.device_size
                ),
            });
        }
        self.catalog()?;
        Ok(())
    }

    /// Payload sizes keyed by master.
    pub fn payload_sizes(&self) -> Result<BTreeMap<MasterKind, Vec<usize>>, ConfigError> {
        let mut out = BTreeMap::new();
        for (name, sizes) in &self.payload {
            let kind = MasterKind::from_str(name)?;
            if sizes.contains(&0) {
                return Err(ConfigError::Range {
                    field: "payload",
                    reason: format!("{} has a zero-byte payload", name),
                });
            }
            if sizes.iter().any(|&s| s > self.staging.device_size) {
                return Err(ConfigError::Range {
                    field: "payload",
                    reason: format!(
                        "{} payload exceeds device size {}",
                        name, self.staging.device_size
                    ),
                });
            }
            out.insert(kind, sizes.clone());
        }
        Ok(out)
    }

    /// Region catalog: the override when present, else the built-in map.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        if self.regions.is_empty() {
            return Ok(Catalog::builtin());
        }
        let regions = self
            .regions
            .iter()
            .map(RegionConfig::to_region)
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new(regions)
    }

    /// Sweep driver settings.
    pub fn settings(&self) -> Result<SweepSettings, ConfigError> {
        Ok(SweepSettings {
            sweep_cache: self.sweep.sweep_cache,
            sweep_buffering: self.sweep.sweep_buffering,
            resume_cache: self.sweep.resume_cache,
            resume_buffering: self.sweep.resume_buffering,
            performance_modes: self.sweep.performance_modes.clone(),
            payload_sizes: self.payload_sizes()?,
            masters: self.sweep.masters_val()?,
        })
    }
}

/// Parses a hex address such as `0x1005_4000`.
pub fn parse_hex(field: &'static str, s: &str) -> Result<u64, ConfigError> {
    let digits: String = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .filter(|&c| c != '_')
        .collect();
    u64::from_str_radix(&digits, 16).map_err(|_| ConfigError::Address {
        field,
        value: s.to_string(),
    })
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_scratch_addr() -> String {
    format!("{:#x}", DEFAULT_SCRATCH_ADDR)
}

fn default_dma_chunk() -> usize {
    DMA_CHUNK_BYTES
}

fn default_true() -> bool {
    true
}

fn default_link_timeout() -> u32 {
    LINK_TIMEOUT_MS
}

fn default_i2s_timeout() -> u32 {
    I2S_TIMEOUT_MS
}

fn default_blit_timeout() -> u32 {
    BLIT_TIMEOUT_MS
}

fn default_crc_timeout() -> u32 {
    CRC_TIMEOUT_MS
}

fn default_capture_timeout() -> u32 {
    CAPTURE_TIMEOUT_MS
}

fn default_mspi_addr() -> String {
    format!("{:#x}", DEFAULT_MSPI_STAGING_ADDR)
}

fn default_device_offset() -> String {
    "0x0".to_string()
}

fn default_device_size() -> usize {
    DEVICE_SIZE
}

fn default_i2s_delay() -> usize {
    I2S_DELAY_WORDS
}

fn default_controller() -> ControllerKind {
    ControllerKind::Fabric
}

fn default_bus_width() -> u64 {
    BUS_WIDTH
}

fn default_hit_latency() -> u64 {
    HIT_LATENCY
}

fn default_miss_latency() -> u64 {
    MISS_LATENCY
}

fn default_pass_through_penalty() -> u64 {
    PASS_THROUGH_PENALTY
}

fn default_region_kind() -> RegionKind {
    RegionKind::Sram
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_accepts_underscores_and_prefix() {
        assert_eq!(parse_hex("f", "0x1005_4000").ok(), Some(0x1005_4000));
        assert_eq!(parse_hex("f", "ff").ok(), Some(0xFF));
        assert!(parse_hex("f", "0xzz").is_err());
    }

    #[test]
    fn empty_file_is_full_default() {
        let config = Config::from_toml("").expect("empty config");
        assert!(config.sweep.sweep_cache);
        assert_eq!(config.timeouts.for_master(MasterKind::CrcEngine), 50);
        assert_eq!(config.timeouts.for_master(MasterKind::I2s), 4000);
        assert_eq!(config.catalog().expect("catalog").len(), 4);
    }
}
