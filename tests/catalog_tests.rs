//! Integration tests for the region catalog.

use crossmem_sweep::catalog::{Catalog, MemoryRegion, RegionKind};
use crossmem_sweep::common::ConfigError;
use proptest::prelude::*;
use rstest::rstest;

/// Tests the boundary count law: one per interior block edge, plus the end
/// when a region follows, and never fewer than one.
#[rstest]
#[case(0x4000, 0x1000, false, 3)]
#[case(0x4000, 0x1000, true, 4)]
#[case(0x1000, 0x1000, false, 1)]
#[case(0x1000, 0x1000, true, 1)]
#[case(0x20_0000, 0x10_0000, false, 1)]
fn test_boundary_count(
    #[case] size: u64,
    #[case] block: u64,
    #[case] adjacent: bool,
    #[case] expected: usize,
) {
    let region = MemoryRegion::new("R", 0x2000_0000, size, block, adjacent);
    assert_eq!(region.boundaries().len(), expected);
}

/// Tests the boundaries of the built-in catalog.
#[test]
fn test_builtin_boundaries() {
    let catalog = Catalog::builtin();
    assert_eq!(catalog.len(), 4);

    let expect = [
        ("MRAM", vec![0x10_0000]),
        ("TCM", vec![0x1002_0000, 0x1004_0000, 0x1006_0000]),
        ("SSRAM0", vec![0x100A_0000, 0x100E_0000, 0x1012_0000]),
        ("XIPMM0", vec![0x1480_0000, 0x1500_0000, 0x1580_0000]),
    ];
    for (name, bounds) in expect {
        let region = catalog.by_name(name).expect("region present");
        assert_eq!(region.boundaries(), bounds, "{}", name);
    }
}

/// Tests the built-in region attributes the masters rely on.
#[test]
fn test_builtin_kinds() {
    let catalog = Catalog::builtin();
    let mram = catalog.by_name("MRAM").expect("MRAM");
    assert_eq!(mram.kind, RegionKind::Nvm);
    assert!(!mram.writable);
    assert_eq!(catalog.by_name("TCM").map(|r| r.kind), Some(RegionKind::Tcm));
    assert_eq!(catalog.by_name("XIPMM0").map(|r| r.kind), Some(RegionKind::Xip));
    assert!(catalog.regions().iter().skip(1).all(|r| r.writable));
}

/// Tests a small two-region catalog: one interior boundary, and a
/// single-block region swept at its base.
#[test]
fn test_small_catalog_boundaries() {
    let catalog = Catalog::new(vec![
        MemoryRegion::new("A", 0x1000, 0x2000, 0x1000, false),
        MemoryRegion::new("B", 0x4000, 0x1000, 0x1000, false),
    ])
    .expect("valid catalog");

    assert_eq!(catalog.regions()[0].boundaries(), vec![0x2000]);
    assert_eq!(catalog.regions()[1].boundaries(), vec![0x4000]);
}

/// Tests that inconsistent regions are rejected.
#[rstest]
#[case(MemoryRegion::new("Z", 0x1000, 0, 0x1000, false))]
#[case(MemoryRegion::new("Z", 0x1000, 0x1000, 0, false))]
#[case(MemoryRegion::new("Z", 0x1000, 0x3000, 0x2000, false))]
#[case(MemoryRegion::new("Z", 0xFFFF_FFFF_FFFF_F000, 0x2000, 0x1000, false))]
#[case(MemoryRegion::new("Z", 0xFFFF_FFFF_FFFF_E000, 0x1000, 0x1000, true))]
fn test_invalid_region_rejected(#[case] region: MemoryRegion) {
    let err = Catalog::new(vec![region]);
    assert!(matches!(err, Err(ConfigError::Region { ref name, .. }) if name == "Z"));
}

/// Tests that overlapping regions are rejected and touching ones are not.
#[test]
fn test_overlap_rejected() {
    let overlapping = Catalog::new(vec![
        MemoryRegion::new("A", 0x1000, 0x2000, 0x1000, false),
        MemoryRegion::new("B", 0x2000, 0x2000, 0x1000, false),
    ]);
    assert!(overlapping.is_err());

    let touching = Catalog::new(vec![
        MemoryRegion::new("A", 0x1000, 0x1000, 0x1000, true),
        MemoryRegion::new("B", 0x2000, 0x1000, 0x1000, false),
    ]);
    assert!(touching.is_ok());
}

/// Tests address lookup.
#[test]
fn test_region_of() {
    let catalog = Catalog::builtin();
    assert_eq!(catalog.region_of(0x1005_FFFF).map(|r| r.name.as_str()), Some("TCM"));
    assert_eq!(catalog.region_of(0x1006_0000).map(|r| r.name.as_str()), Some("SSRAM0"));
    assert!(catalog.region_of(0x1016_0000).is_none());
    assert!(catalog.get(4).is_none());
}

proptest! {
    /// Tests that boundaries are ascending block multiples inside the region.
    #[test]
    fn prop_boundaries_are_block_multiples(
        base_page in 0u64..0x1000,
        block_shift in 0u32..16,
        blocks in 1u64..64,
        adjacent in any::<bool>(),
    ) {
        let block = 1u64 << block_shift;
        let base = base_page * 0x1_0000;
        let region = MemoryRegion::new("P", base, blocks * block, block, adjacent);
        let bounds = region.boundaries();

        let interior = (blocks - 1) as usize + usize::from(adjacent);
        prop_assert_eq!(bounds.len(), interior.max(1));
        prop_assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        for &b in &bounds {
            prop_assert_eq!((b - base) % block, 0);
            prop_assert!(b <= region.end());
            if b == region.end() {
                prop_assert!(adjacent);
            }
        }
    }
}
