//! Integration tests for integrity verification.

use crossmem_sweep::catalog::Catalog;
use crossmem_sweep::config::Config;
use crossmem_sweep::soc::{MemoryPort, System};
use crossmem_sweep::verify::{
    aligned_stream_matches, checksum16, checksum_words, compare, crc32, fingerprint, Crc32,
    Fingerprint, GuardBands, IntegrityVerifier,
};
use proptest::prelude::*;

const SCRATCH: u64 = 0x1005_4000;
const SSRAM0: u64 = 0x100A_0000;

fn system() -> System {
    System::new(&Config::default(), &Catalog::builtin()).expect("system")
}

/// Tests the CRC-32 check value.
#[test]
fn test_crc32_check_value() {
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    assert_eq!(crc32(&[]), 0);
}

/// Tests that incremental CRC updates match a single pass.
#[test]
fn test_crc32_incremental() {
    let data: Vec<u8> = (0..=255).collect();
    let mut crc = Crc32::new();
    crc.update(&data[..100]);
    crc.update(&data[100..]);
    assert_eq!(crc.finish(), crc32(&data));
}

/// Tests known folded checksum values.
#[test]
fn test_checksum16_known_values() {
    assert_eq!(checksum16(&[]), 0xFFFF);
    assert_eq!(checksum16(&[0xFF; 4]), 0x0000);
    assert_eq!(checksum16(&[2, 0, 1, 0]), 0xFFFC);
    // A trailing partial word is zero-padded.
    assert_eq!(checksum16(&[2, 0, 1]), checksum16(&[2, 0, 1, 0]));
}

/// Tests fingerprint formatting and comparison.
#[test]
fn test_fingerprint_display() {
    assert_eq!(Fingerprint::Checksum(0xBEEF).to_string(), "0xBEEF");
    assert_eq!(Fingerprint::Crc(0x1234).to_string(), "0x00001234");
    assert!(compare(Fingerprint::Crc(7), Fingerprint::Crc(7)));
    assert!(!compare(Fingerprint::Crc(7), Fingerprint::Checksum(7)));
}

/// Tests that equal seeds produce equal payloads.
#[test]
fn test_verifier_is_deterministic() {
    let mut images = Vec::new();
    for seed in [9, 9, 10] {
        let mut sys = system();
        let mut verifier = IntegrityVerifier::new(seed, SCRATCH);
        let image = verifier
            .fill_reference_and_source(&mut sys.bus, SSRAM0, 64, true)
            .expect("fill");
        assert!(image.faithful());
        images.push(verifier.reference_words(&mut sys.bus, 64).expect("words"));
    }
    assert_eq!(images[0], images[1]);
    assert_ne!(images[0], images[2]);
}

/// Tests that an unaligned source straddling two regions holds the payload.
#[test]
fn test_unaligned_fill_across_regions() {
    let mut sys = system();
    let mut verifier = IntegrityVerifier::new(3, SCRATCH);
    let src = 0x1006_0000 - 7;
    let image = verifier
        .fill_reference_and_source(&mut sys.bus, src, 30, true)
        .expect("fill");
    assert!(image.faithful());

    let mut at_src = vec![0u8; 30];
    let mut at_scratch = vec![0u8; 30];
    sys.bus.read_bytes(src, &mut at_src).expect("read src");
    sys.bus.read_bytes(SCRATCH, &mut at_scratch).expect("read scratch");
    assert_eq!(at_src, at_scratch);
}

/// Tests that a non-writable source keeps its contents and is mirrored
/// into scratch.
#[test]
fn test_read_only_source_is_mirrored() {
    let mut sys = system();
    let before = fingerprint(&mut sys.bus, 0x100, 64).expect("read");
    let mut verifier = IntegrityVerifier::new(3, SCRATCH);
    let image = verifier
        .fill_reference_and_source(&mut sys.bus, 0x100, 64, false)
        .expect("fill");
    assert!(image.faithful());
    assert_eq!(image.source, before);
    assert_eq!(image.reference, before);
}

/// Tests that guard bands detect a stray write on either side.
#[test]
fn test_guard_bands() {
    let mut sys = system();
    let dst = SSRAM0 + 0x100;
    let guards = GuardBands::plant(&mut sys.bus, dst, 64);
    assert!(guards.is_planted());
    sys.bus.fill(dst, 64, 0x11).expect("in-bounds write");
    assert!(guards.check(&mut sys.bus).expect("check").intact);

    sys.bus.write_u8(dst + 64, 0).expect("stray write");
    let check = guards.check(&mut sys.bus).expect("check");
    assert!(!check.intact);
    assert_ne!(check.expected, check.observed);
}

/// Tests that no band is planted on read-only or unmapped sides.
#[test]
fn test_guard_bands_skip_unwritable_sides() {
    let mut sys = system();
    assert!(!GuardBands::plant(&mut sys.bus, 0, 16).is_planted());
}

/// Tests stream comparison with a receive lag.
#[test]
fn test_aligned_stream() {
    let sent = [0xA1, 0xB2, 0xC3, 0xD4];
    assert!(aligned_stream_matches(&sent, &sent));
    assert!(aligned_stream_matches(&sent, &[0, 0, 0xA1, 0xB2]));
    assert!(!aligned_stream_matches(&sent, &[0, 0xA1, 0xB2, 0xC4]));
    assert!(!aligned_stream_matches(&sent, &[0; 4]));
    assert!(aligned_stream_matches(&[], &[1, 2]));
}

proptest! {
    /// Tests that the byte and word forms of the checksum agree.
    #[test]
    fn prop_checksum_forms_agree(words in proptest::collection::vec(any::<u32>(), 0..256)) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        prop_assert_eq!(checksum16(&bytes), checksum_words(&words));
    }

    /// Tests that flipping any single byte changes the CRC.
    #[test]
    fn prop_crc_detects_single_byte_change(
        data in proptest::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut corrupted = data.clone();
        let i = index.index(data.len());
        corrupted[i] ^= flip;
        prop_assert_ne!(crc32(&data), crc32(&corrupted));
    }
}
