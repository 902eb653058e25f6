//! Memory Region Catalog.
//!
//! This module describes the memory regions under test and derives the
//! boundary addresses swept in each of them. A boundary is every multiple of
//! a region's block size that lies strictly inside the region, plus the end
//! address when another region follows directly. The built-in catalog is the
//! four-region map of the target part and is trusted as-is; catalogs loaded
//! from a configuration file are validated.

use crate::common::ConfigError;
use serde::{Deserialize, Serialize};

/// Memory technology backing a region.
///
/// Masters decide which regions they can reach from this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Non-volatile code memory.
    Nvm,
    /// Tightly-coupled memory of the core.
    Tcm,
    /// Shared system SRAM.
    Sram,
    /// Execute-in-place window of an external device.
    Xip,
}

/// A contiguous memory region under test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    /// Label used in logs and reports.
    pub name: String,
    /// First address of the region.
    pub base: u64,
    /// Size of the region in bytes.
    pub total_size: u64,
    /// Distance between two boundaries. Divides `total_size`.
    pub block_size: u64,
    /// Whether another region starts at `base + total_size`.
    pub adjacent_region_follows: bool,
    /// Memory technology.
    pub kind: RegionKind,
    /// Whether plain stores reach the region.
    pub writable: bool,
}

impl MemoryRegion {
    /// Creates a writable SRAM region.
    ///
    /// # Arguments
    ///
    /// * `name` - Label used in logs
    /// * `base` - First address
    /// * `total_size` - Size in bytes
    /// * `block_size` - Boundary spacing in bytes
    /// * `adjacent_region_follows` - Whether sweeping may cross the end
    pub fn new(
        name: &str,
        base: u64,
        total_size: u64,
        block_size: u64,
        adjacent_region_follows: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            base,
            total_size,
            block_size,
            adjacent_region_follows,
            kind: RegionKind::Sram,
            writable: true,
        }
    }

    /// Sets the memory technology.
    pub fn with_kind(mut self, kind: RegionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the region as not writable by plain stores.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Returns the first address past the region.
    pub fn end(&self) -> u64 {
        self.base + self.total_size
    }

    /// Checks whether `addr` lies inside the region.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }

    /// Returns the boundary addresses swept in this region, in ascending order.
    ///
    /// Boundaries are `base + k * block_size` for `k >= 1`, strictly below
    /// the end of the region, or up to and including the end when an adjacent
    /// region follows. That yields `total_size / block_size - 1` boundaries,
    /// one more when a region follows.
    ///
    /// A region with no interior boundary is swept at its base address so
    /// every catalog entry is exercised.
    pub fn boundaries(&self) -> Vec<u64> {
        let mut out = Vec::new();
        if self.block_size == 0 {
            return out;
        }
        let limit = self.end() + u64::from(self.adjacent_region_follows);
        let mut bound = self.base + self.block_size;
        while bound < limit {
            out.push(bound);
            bound += self.block_size;
        }
        if out.is_empty() {
            out.push(self.base);
        }
        out
    }
}

/// Returns the built-in region map of the part under test.
///
/// The TCM is directly followed by SSRAM0, so sweeping its last boundary
/// crosses into the next region.
pub fn regions() -> Vec<MemoryRegion> {
    vec![
        MemoryRegion::new("MRAM", 0x0000_0000, 0x20_0000, 0x10_0000, false)
            .with_kind(RegionKind::Nvm)
            .read_only(),
        MemoryRegion::new("TCM", 0x1000_0000, 0x6_0000, 0x2_0000, true).with_kind(RegionKind::Tcm),
        MemoryRegion::new("SSRAM0", 0x1006_0000, 0x10_0000, 0x4_0000, false),
        MemoryRegion::new("XIPMM0", 0x1400_0000, 0x200_0000, 0x80_0000, false)
            .with_kind(RegionKind::Xip),
    ]
}

/// An ordered, immutable set of regions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    regions: Vec<MemoryRegion>,
}

impl Catalog {
    /// Builds a catalog from user-supplied regions.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Region` if a block size is zero or does not
    /// divide the region size, if a region runs past the end of the address
    /// space, or if two regions overlap.
    pub fn new(regions: Vec<MemoryRegion>) -> Result<Self, ConfigError> {
        let catalog = Self { regions };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Returns the built-in catalog.
    pub fn builtin() -> Self {
        Self { regions: regions() }
    }

    /// Checks the static invariants of every region.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for region in &self.regions {
            let fail = |reason: &str| ConfigError::Region {
                name: region.name.clone(),
                reason: reason.to_string(),
            };
            if region.total_size == 0 {
                return Err(fail("size must be non-zero"));
            }
            if region.block_size == 0 {
                return Err(fail("block size must be non-zero"));
            }
            if region.total_size % region.block_size != 0 {
                return Err(fail("block size must divide the region size"));
            }
            // One block past the end is swept when an adjacent region follows.
            let last = region
                .base
                .checked_add(region.total_size)
                .and_then(|end| end.checked_add(region.block_size));
            if last.is_none() {
                return Err(fail("region extends past the end of the address space"));
            }
        }
        for (i, a) in self.regions.iter().enumerate() {
            for b in &self.regions[i + 1..] {
                if a.base < b.end() && b.base < a.end() {
                    return Err(ConfigError::Region {
                        name: b.name.clone(),
                        reason: format!("overlaps {}", a.name),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the regions in catalog order.
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// Returns the region at `index`.
    pub fn get(&self, index: usize) -> Option<&MemoryRegion> {
        self.regions.get(index)
    }

    /// Looks a region up by name.
    pub fn by_name(&self, name: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Returns the region containing `addr`, if any.
    pub fn region_of(&self, addr: u64) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the catalog has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_region_adds_end_boundary() {
        let tcm = MemoryRegion::new("TCM", 0x1000_0000, 0x6_0000, 0x2_0000, true);
        assert_eq!(tcm.boundaries(), vec![0x1002_0000, 0x1004_0000, 0x1006_0000]);
    }

    #[test]
    fn single_block_region_falls_back_to_base() {
        let b = MemoryRegion::new("B", 0x4000, 0x1000, 0x1000, false);
        assert_eq!(b.boundaries(), vec![0x4000]);
    }

    #[test]
    fn overlapping_regions_are_rejected() {
        let err = Catalog::new(vec![
            MemoryRegion::new("A", 0x1000, 0x2000, 0x1000, false),
            MemoryRegion::new("B", 0x2000, 0x1000, 0x1000, false),
        ]);
        assert!(matches!(err, Err(ConfigError::Region { .. })));
    }
}
