//! Integration tests for configuration loading and validation.

use crossmem_sweep::common::{ConfigError, PerformanceMode};
use crossmem_sweep::config::{Config, ControllerKind};
use crossmem_sweep::masters::MasterKind;
use rstest::rstest;
use std::path::Path;

/// Tests that an empty file yields the full default sweep.
#[test]
fn test_defaults() {
    let config = Config::from_toml("").expect("config");
    assert!(config.sweep.sweep_cache);
    assert!(config.sweep.sweep_buffering);
    assert_eq!(config.sweep.resume_cache, 0);
    assert!(config.sweep.performance_modes.is_empty());
    assert_eq!(config.general.scratch_addr_val().ok(), Some(0x1005_4000));
    assert_eq!(config.staging.mspi_addr_val().ok(), Some(0x1400_0000));
    assert_eq!(config.timing.controller, ControllerKind::Fabric);

    assert_eq!(config.timeouts.for_master(MasterKind::Sdio), 2000);
    assert_eq!(config.timeouts.for_master(MasterKind::I2s), 4000);
    assert_eq!(config.timeouts.for_master(MasterKind::AcceleratorBlit), 2000);
    assert_eq!(config.timeouts.for_master(MasterKind::CrcEngine), 50);
    assert_eq!(config.timeouts.for_master(MasterKind::Adc), 2000);
}

/// Tests the default payload size of every master.
#[rstest]
#[case(MasterKind::CoreCopy, 32)]
#[case(MasterKind::Sdio, 512)]
#[case(MasterKind::Uart, 1024)]
#[case(MasterKind::AcceleratorBlit, 4096)]
#[case(MasterKind::Mspi, 4096)]
#[case(MasterKind::Iom, 4096)]
#[case(MasterKind::I2s, 4096)]
#[case(MasterKind::CrcEngine, 4096)]
#[case(MasterKind::Pdm, 4096)]
#[case(MasterKind::Adc, 4096)]
fn test_default_payload_sizes(#[case] master: MasterKind, #[case] size: usize) {
    let settings = Config::default().settings().expect("settings");
    assert_eq!(settings.payload_sizes_for(master), vec![size]);
}

/// Tests that sweep settings follow the file.
#[test]
fn test_settings_from_file() {
    let config = Config::from_toml(
        r#"
        [sweep]
        sweep_cache = false
        resume_buffering = 7
        performance_modes = ["low", "high"]
        masters = ["uart", "pdm"]

        [payload]
        uart = [16, 256]
        "#,
    )
    .expect("config");
    let settings = config.settings().expect("settings");

    assert!(!settings.sweep_cache);
    assert!(settings.sweep_buffering);
    assert_eq!(settings.resume_buffering, 7);
    assert_eq!(
        settings.performance_modes,
        vec![PerformanceMode::Low, PerformanceMode::High]
    );
    assert_eq!(settings.masters, vec![MasterKind::Uart, MasterKind::Pdm]);
    assert!(settings.selects(MasterKind::Pdm));
    assert!(!settings.selects(MasterKind::CoreCopy));
    assert_eq!(settings.payload_sizes_for(MasterKind::Uart), vec![16, 256]);
    assert_eq!(settings.payload_sizes_for(MasterKind::Pdm), vec![4096]);
}

/// Tests that every master is selected when none is named.
#[test]
fn test_empty_master_list_selects_all() {
    let settings = Config::default().settings().expect("settings");
    assert!(MasterKind::ALL.iter().all(|&m| settings.selects(m)));
}

/// Tests that a region override replaces the built-in catalog.
#[test]
fn test_region_override() {
    let config = Config::from_toml(
        r#"
        [[regions]]
        name = "SRAM"
        base = "0x2000_0000"
        size = "0x4_0000"
        block = "0x1_0000"
        adjacent = true

        [[regions]]
        name = "ROM"
        base = "0x0"
        size = "0x1000"
        block = "0x1000"
        kind = "nvm"
        writable = false
        "#,
    )
    .expect("config");
    let catalog = config.catalog().expect("catalog");
    assert_eq!(catalog.len(), 2);
    let sram = catalog.by_name("SRAM").expect("sram");
    assert_eq!(sram.boundaries(), vec![0x2001_0000, 0x2002_0000, 0x2003_0000, 0x2004_0000]);
    assert!(!catalog.by_name("ROM").expect("rom").writable);
}

/// Tests fault plans and power-up failures.
#[test]
fn test_fault_config() {
    let config = Config::from_toml(
        r#"
        [faults]
        power_up = ["adc"]

        [faults.engines.iom]
        drop_completion = [1, 5]
        overrun = [2]
        "#,
    )
    .expect("config");

    assert_eq!(config.faults.power_up_failures().ok(), Some(vec![MasterKind::Adc]));
    let plan = config.faults.plan_for(MasterKind::Iom);
    assert_eq!(plan.drop_completion, vec![1, 5]);
    assert_eq!(plan.overrun, vec![2]);
    assert!(plan.raise_error.is_empty());
    assert!(config.faults.plan_for(MasterKind::Sdio).is_empty());
}

/// Tests the validation errors of malformed files.
#[rstest]
#[case::unknown_master("[sweep]\nmasters = [\"usb\"]")]
#[case::unknown_payload_master("[payload]\nusb = [64]")]
#[case::unknown_fault_engine("[faults.engines.usb]\ncorrupt = [1]")]
#[case::unknown_power_up("[faults]\npower_up = [\"usb\"]")]
fn test_unknown_master_rejected(#[case] text: &str) {
    assert!(matches!(
        Config::from_toml(text),
        Err(ConfigError::UnknownMaster(name)) if name == "usb"
    ));
}

/// Tests that out-of-range settings are rejected.
#[rstest]
#[case::resume_cache("[sweep]\nresume_cache = 19", "sweep.resume_cache")]
#[case::resume_buffering("[sweep]\nresume_buffering = 1025", "sweep.resume_buffering")]
#[case::zero_payload("[payload]\nsdio = [0]", "payload")]
#[case::oversized_payload("[payload]\nsdio = [70000]", "payload")]
#[case::zero_chunk("[general]\ndma_chunk_bytes = 0", "general.dma_chunk_bytes")]
#[case::device_offset("[staging]\ndevice_offset = \"0xFFF0\"", "staging.device_offset")]
fn test_range_rejected(#[case] text: &str, #[case] expected: &str) {
    match Config::from_toml(text) {
        Err(ConfigError::Range { field, .. }) => assert_eq!(field, expected),
        other => panic!("expected a range error, got {other:?}"),
    }
}

/// Tests that the last position of each sequence is accepted.
#[test]
fn test_last_resume_position_accepted() {
    let config = Config::from_toml("[sweep]\nresume_cache = 18\nresume_buffering = 1024");
    assert!(config.is_ok());
}

/// Tests that a malformed address is rejected.
#[test]
fn test_bad_address_rejected() {
    let err = Config::from_toml("[general]\nscratch_addr = \"0x10g\"").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Address {
            field: "general.scratch_addr",
            ..
        }
    ));
}

/// Tests that an inconsistent region is rejected.
#[test]
fn test_bad_region_rejected() {
    let text = r#"
        [[regions]]
        name = "Z"
        base = "0x1000"
        size = "0x3000"
        block = "0x2000"
    "#;
    assert!(matches!(
        Config::from_toml(text),
        Err(ConfigError::Region { name, .. }) if name == "Z"
    ));
}

/// Tests that a region running past the top of the address space is
/// rejected when the file is loaded.
#[test]
fn test_region_past_address_space_rejected() {
    let text = r#"
        [[regions]]
        name = "TOP"
        base = "0xFFFF_FFFF_FFFF_F000"
        size = "0x2000"
        block = "0x1000"
    "#;
    assert!(matches!(
        Config::from_toml(text),
        Err(ConfigError::Region { name, .. }) if name == "TOP"
    ));
}

/// Tests that malformed TOML is a parse error.
#[test]
fn test_parse_error() {
    assert!(matches!(
        Config::from_toml("[sweep\nmasters = 3"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::from_toml("[timing]\ncontroller = \"dram\""),
        Err(ConfigError::Parse(_))
    ));
}

/// Tests that a missing file is an I/O error naming the path.
#[test]
fn test_missing_file() {
    let err = Config::load(Path::new("/nonexistent/sweep.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/sweep.toml"));
}

/// Tests that the shipped configuration files load.
#[test]
fn test_shipped_configs_load() {
    let full = Config::load(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/configs/default.toml")))
        .expect("default.toml");
    assert!(full.sweep.sweep_cache);
    assert_eq!(
        full.sweep.performance_modes,
        vec![PerformanceMode::High, PerformanceMode::Low]
    );
    assert_eq!(full.catalog().expect("catalog").len(), 4);

    let quick = Config::load(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/configs/quick.toml")))
        .expect("quick.toml");
    assert!(!quick.sweep.sweep_buffering);
    assert_eq!(quick.general.seed, 42);
    let settings = quick.settings().expect("settings");
    assert_eq!(settings.payload_sizes_for(MasterKind::CoreCopy), vec![8]);
    assert_eq!(quick.catalog().expect("catalog").len(), 2);
}
