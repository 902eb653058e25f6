//! Integration tests for the bus master backends.

use crossmem_sweep::catalog::Catalog;
use crossmem_sweep::common::{ConfigError, CopyWidth};
use crossmem_sweep::config::Config;
use crossmem_sweep::masters::{
    await_completion, AcceleratorBlit, BusMaster, Capturer, CaptureMaster, Comparison,
    CompletionSignal, CoreCopy, CrcMaster, FaultPolicy, LinkMaster, MasterKind, MasterRole,
    Mover, Verifier, WaitResult,
};
use crossmem_sweep::soc::devices::{
    FaultPlan, SampleFormat, SimBlitter, SimCrc, SimLink, SimSampler,
};
use crossmem_sweep::soc::{Clock, Engine, MemoryPort, Staging, System};
use crossmem_sweep::verify::{crc32, GuardBands};
use rstest::rstest;

const TCM_END: u64 = 0x1006_0000;
const SSRAM0: u64 = 0x100A_0000;
const MSPI_WINDOW: u64 = 0x1400_0000;

fn system() -> System {
    System::new(&Config::default(), &Catalog::builtin()).expect("system")
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

fn read(sys: &mut System, addr: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    sys.bus.read_bytes(addr, &mut buf).expect("read");
    buf
}

fn link(kind: MasterKind, staging: Staging, plan: FaultPlan) -> LinkMaster {
    let port = SimLink::new(&kind.name().to_uppercase(), staging, 64, 0x1000).with_fault_plan(plan);
    LinkMaster::new(kind, Box::new(port), 20)
}

/// Tests master name parsing and display.
#[test]
fn test_master_names() {
    for &kind in MasterKind::ALL {
        assert_eq!(kind.name().parse::<MasterKind>().ok(), Some(kind));
        assert_eq!(kind.to_string(), kind.name());
    }
    assert_eq!(MasterKind::ALL.len(), 10);
    assert!(matches!(
        "dma".parse::<MasterKind>(),
        Err(ConfigError::UnknownMaster(name)) if name == "dma"
    ));
}

/// Tests the role and fault policy of every master.
#[rstest]
#[case(MasterKind::CoreCopy, MasterRole::Mover, FaultPolicy::Recoverable)]
#[case(MasterKind::AcceleratorBlit, MasterRole::Mover, FaultPolicy::Recoverable)]
#[case(MasterKind::Mspi, MasterRole::Mover, FaultPolicy::HaltOnHardwareError)]
#[case(MasterKind::Sdio, MasterRole::Mover, FaultPolicy::HaltOnHardwareError)]
#[case(MasterKind::Iom, MasterRole::Mover, FaultPolicy::HaltOnHardwareError)]
#[case(MasterKind::I2s, MasterRole::Mover, FaultPolicy::HaltOnHardwareError)]
#[case(MasterKind::Uart, MasterRole::Mover, FaultPolicy::HaltOnHardwareError)]
#[case(MasterKind::CrcEngine, MasterRole::Verifier, FaultPolicy::Recoverable)]
#[case(MasterKind::Pdm, MasterRole::Capturer, FaultPolicy::Recoverable)]
#[case(MasterKind::Adc, MasterRole::Capturer, FaultPolicy::HaltOnHardwareError)]
fn test_master_role_and_policy(
    #[case] kind: MasterKind,
    #[case] role: MasterRole,
    #[case] policy: FaultPolicy,
) {
    assert_eq!(kind.role(), role);
    assert_eq!(kind.fault_policy(), policy);
}

/// Tests every core copy width across the TCM/SSRAM0 boundary.
#[rstest]
#[case(CopyWidth::Byte)]
#[case(CopyWidth::HalfWord)]
#[case(CopyWidth::Word)]
fn test_core_copy_across_boundary(#[case] width: CopyWidth) {
    let mut sys = system();
    let data = payload(35);
    let src = TCM_END - 13;
    let dst = SSRAM0 + 0x4_0000 - 5;
    sys.bus.write_bytes(src, &data).expect("seed");

    let mut master = CoreCopy::new();
    master.init(&mut sys.power).expect("power");
    assert_eq!(master.copy_widths(), &CopyWidth::CORE);
    let outcome = master.transfer(&mut sys.platform(), src, dst, data.len(), width);
    assert!(outcome.completed);
    assert_eq!(read(&mut sys, dst, data.len()), data);
}

/// Tests that a faulting core copy reports a hardware error.
#[test]
fn test_core_copy_fault() {
    let mut sys = system();
    let mut master = CoreCopy::with_widths(vec![CopyWidth::Word]);
    let outcome = master.transfer(&mut sys.platform(), SSRAM0, 0x100, 8, CopyWidth::Word);
    assert!(outcome.hw_error);
    assert!(!outcome.completed);
}

/// Tests which regions each master can reach.
#[test]
fn test_region_support() {
    let catalog = Catalog::builtin();
    let region = |name: &str| catalog.by_name(name).expect("region").clone();
    let (mram, tcm, sram, xip) = (region("MRAM"), region("TCM"), region("SSRAM0"), region("XIPMM0"));

    let core = CoreCopy::new();
    assert!(core.supports_source(&mram));
    assert!(!core.supports_dest(&mram));
    assert!(core.supports_dest(&tcm));

    let blit = AcceleratorBlit::new(Box::new(SimBlitter::new(64)), 20);
    assert!(!blit.supports_source(&mram));
    assert!(!blit.supports_source(&tcm));
    assert!(blit.supports_source(&sram));
    assert!(blit.supports_dest(&xip));
    assert!(!blit.supports_dest(&tcm));

    let mspi = link(MasterKind::Mspi, Staging::Mapped(MSPI_WINDOW), FaultPlan::default());
    assert!(!mspi.supports_source(&xip));
    assert!(!mspi.supports_dest(&xip));
    assert!(mspi.supports_source(&tcm));
    assert!(!mspi.supports_dest(&mram));

    let sdio = link(MasterKind::Sdio, Staging::Device { offset: 0 }, FaultPlan::default());
    assert!(sdio.supports_source(&xip));
    assert!(sdio.supports_dest(&xip));

    let crc = CrcMaster::new(Box::new(SimCrc::new(64)), 20);
    assert!(crc.supports_source(&mram));
    assert!(!crc.supports_dest(&sram));

    let pdm = CaptureMaster::new(
        MasterKind::Pdm,
        Box::new(SimSampler::new("PDM", SampleFormat::Pcm16, 64, 0x1000)),
        20,
    );
    assert!(!pdm.supports_source(&sram));
    assert!(pdm.supports_dest(&sram));
    assert!(!pdm.supports_dest(&mram));
}

/// Tests a blit between SSRAM0 and the XIP window.
#[test]
fn test_blit_copy() {
    let mut sys = system();
    let data = payload(300);
    sys.bus.write_bytes(SSRAM0 - 3, &data).expect("seed");

    let mut blit = AcceleratorBlit::new(Box::new(SimBlitter::new(64)), 20);
    blit.init(&mut sys.power).expect("power");
    let outcome = blit.transfer(&mut sys.platform(), SSRAM0 - 3, 0x1480_0000 - 9, 300, CopyWidth::Native);
    assert!(outcome.completed);
    assert_eq!(read(&mut sys, 0x1480_0000 - 9, 300), data);
}

/// Tests a transfer started before the master was initialised.
#[test]
fn test_uninitialised_master_errors() {
    let mut sys = system();
    let mut blit = AcceleratorBlit::new(Box::new(SimBlitter::new(64)), 20);
    let outcome = blit.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 16, CopyWidth::Native);
    assert!(outcome.hw_error);
}

/// Tests link round trips through device storage and a mapped window.
#[rstest]
#[case(MasterKind::Sdio, Staging::Device { offset: 0 })]
#[case(MasterKind::Uart, Staging::Device { offset: 0x100 })]
#[case(MasterKind::Mspi, Staging::Mapped(MSPI_WINDOW))]
fn test_link_round_trip(#[case] kind: MasterKind, #[case] staging: Staging) {
    let mut sys = system();
    let data = payload(200);
    let src = TCM_END - 100;
    let dst = SSRAM0 + 0x4_0000 - 17;
    sys.bus.write_bytes(src, &data).expect("seed");

    let mut master = link(kind, staging, FaultPlan::default());
    master.init(&mut sys.power).expect("power");
    assert_eq!(master.comparison(), Comparison::Checksum);
    let outcome = master.transfer(&mut sys.platform(), src, dst, data.len(), CopyWidth::Native);
    assert!(outcome.completed);
    assert_eq!(read(&mut sys, dst, data.len()), data);
}

/// Tests that the mapped window is cleared before every write.
#[test]
fn test_mapped_window_cleared() {
    let mut sys = system();
    sys.bus.fill(MSPI_WINDOW, 64, 0xEE).expect("stale data");
    // Not initialised: the write is refused after the window is cleared.
    let mut master = link(MasterKind::Mspi, Staging::Mapped(MSPI_WINDOW), FaultPlan::default());
    let outcome = master.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 64, CopyWidth::Native);
    assert!(outcome.hw_error);
    assert_eq!(read(&mut sys, MSPI_WINDOW, 64), vec![0u8; 64]);
}

/// Tests that a dropped completion times out after the link's timeout and
/// the read phase never starts.
#[test]
fn test_link_timeout() {
    let mut sys = system();
    let plan = FaultPlan {
        drop_completion: vec![1],
        ..FaultPlan::default()
    };
    let mut master = link(MasterKind::Iom, Staging::Device { offset: 0 }, plan);
    master.init(&mut sys.power).expect("power");
    sys.bus.fill(SSRAM0 + 0x1000, 32, 0x77).expect("seed dst");

    let outcome = master.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 32, CopyWidth::Native);
    assert!(outcome.timed_out);
    assert!(!outcome.hw_error);
    assert_eq!(sys.clock.now_ms(), 20);
    assert_eq!(read(&mut sys, SSRAM0 + 0x1000, 32), vec![0x77u8; 32]);

    // The next start behaves normally.
    let outcome = master.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 32, CopyWidth::Native);
    assert!(outcome.completed);
}

/// Tests that a raised error flag on either phase is reported.
#[rstest]
#[case(1)]
#[case(2)]
fn test_link_error(#[case] start: u64) {
    let mut sys = system();
    let plan = FaultPlan {
        raise_error: vec![start],
        ..FaultPlan::default()
    };
    let mut master = link(MasterKind::Sdio, Staging::Device { offset: 0 }, plan);
    master.init(&mut sys.power).expect("power");
    let outcome = master.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 32, CopyWidth::Native);
    assert!(outcome.hw_error);
}

/// Tests that the audio loopback lags the transmitted stream.
#[test]
fn test_i2s_lag() {
    let mut sys = system();
    let data = payload(64);
    sys.bus.write_bytes(SSRAM0, &data).expect("seed");
    let port = SimLink::new("I2S", Staging::Device { offset: 0 }, 64, 0x1000).with_rx_delay(8);
    let mut master = LinkMaster::new(MasterKind::I2s, Box::new(port), 20);
    master.init(&mut sys.power).expect("power");
    assert_eq!(master.comparison(), Comparison::AlignedStream);

    let outcome = master.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 64, CopyWidth::Native);
    assert!(outcome.completed);
    let received = read(&mut sys, SSRAM0 + 0x1000, 64);
    assert_eq!(&received[..8], &[0u8; 8]);
    assert_eq!(&received[8..], &data[..56]);
}

/// Tests that the CRC engine agrees with the software CRC.
#[test]
fn test_crc_engine() {
    let mut sys = system();
    let data = payload(1000);
    sys.bus.write_bytes(TCM_END - 500, &data).expect("seed");

    let mut crc = CrcMaster::new(Box::new(SimCrc::new(128)), 50);
    crc.init(&mut sys.power).expect("power");
    let reading = crc.verify(&mut sys.platform(), TCM_END - 500, 1000);
    assert!(reading.outcome.completed);
    assert_eq!(reading.value, crc32(&data));
}

/// Tests that injected CRC corruption changes the result.
#[test]
fn test_crc_engine_corrupt() {
    let mut sys = system();
    let plan = FaultPlan {
        corrupt: vec![1],
        ..FaultPlan::default()
    };
    let mut crc = CrcMaster::new(Box::new(SimCrc::new(128).with_fault_plan(plan)), 50);
    crc.init(&mut sys.power).expect("power");
    let reading = crc.verify(&mut sys.platform(), SSRAM0, 64);
    assert!(reading.outcome.completed);
    assert_ne!(reading.value, crc32(&[0u8; 64]));
}

/// Tests a capture into SSRAM0 and guard-band detection of an overrun.
#[test]
fn test_capture_and_overrun() {
    let mut sys = system();
    let plan = FaultPlan {
        overrun: vec![2],
        ..FaultPlan::default()
    };
    let sampler = SimSampler::new("ADC", SampleFormat::AdcFifo, 64, 0x1000).with_fault_plan(plan);
    let mut adc = CaptureMaster::new(MasterKind::Adc, Box::new(sampler), 20);
    adc.init(&mut sys.power).expect("power");

    let dst = SSRAM0 + 0x100;
    let guards = GuardBands::plant(&mut sys.bus, dst, 256);
    let outcome = adc.capture(&mut sys.platform(), dst, 256);
    assert!(outcome.completed);
    assert!(guards.check(&mut sys.bus).expect("check").intact);
    // Second FIFO word: slot 1, conversion 37.
    assert_eq!(sys.bus.read_u32(dst + 4), Ok((1 << 24) | 37));

    let guards = GuardBands::plant(&mut sys.bus, dst, 256);
    let outcome = adc.capture(&mut sys.platform(), dst, 256);
    assert!(outcome.completed);
    assert!(!guards.check(&mut sys.bus).expect("check").intact);
}

/// Tests that masters whose power-up fails stay unregistered.
#[test]
fn test_power_up_failure() {
    let mut config = Config::default();
    config.faults.power_up = vec!["pdm".to_string()];
    let mut sys = System::new(&config, &Catalog::builtin()).expect("system");
    let mut pdm = CaptureMaster::new(
        MasterKind::Pdm,
        Box::new(SimSampler::new("PDM", SampleFormat::Pcm16, 64, 0x1000)),
        20,
    );
    assert!(pdm.init(&mut sys.power).is_err());
    let outcome = pdm.capture(&mut sys.platform(), SSRAM0, 16);
    assert!(outcome.hw_error);
}

#[derive(Default)]
struct Stuck {
    cancels: u32,
}

impl Engine for Stuck {
    fn name(&self) -> &str {
        "STUCK"
    }

    fn register_completion(&mut self, _signal: CompletionSignal) {}

    fn service(&mut self, _memory: &mut dyn MemoryPort) {}

    fn cancel(&mut self) {
        self.cancels += 1;
    }
}

/// Tests that the bounded wait gives up exactly at its timeout and cancels
/// the engine's transfer only then.
#[test]
fn test_await_completion_timeout() {
    let mut sys = system();
    let mut engine = Stuck::default();
    let signal = CompletionSignal::new();
    signal.arm();
    let mut hw = sys.platform();
    let result = await_completion(&mut engine, &signal, 5, &mut hw);
    assert_eq!(result, WaitResult::TimedOut);
    assert_eq!(hw.clock.now_ms(), 5);
    assert_eq!(engine.cancels, 1);

    signal.complete();
    assert_eq!(await_completion(&mut engine, &signal, 5, &mut hw), WaitResult::Completed);
    signal.fail();
    assert_eq!(await_completion(&mut engine, &signal, 5, &mut hw), WaitResult::Error);
    assert_eq!(hw.clock.now_ms(), 5);
    assert_eq!(engine.cancels, 1);
}

/// Tests that a link whose transfer is slower than its timeout is idle again
/// for the next transfer.
#[test]
fn test_slow_link_recovers_after_timeout() {
    let mut sys = system();
    let port = SimLink::new("IOM", Staging::Device { offset: 0 }, 1, 0x1000);
    let mut iom = LinkMaster::new(MasterKind::Iom, Box::new(port), 10);
    iom.init(&mut sys.power).expect("power");

    for _ in 0..2 {
        let outcome = iom.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 64, CopyWidth::Native);
        assert!(outcome.timed_out);
        assert!(!outcome.hw_error);
    }

    let outcome = iom.transfer(&mut sys.platform(), SSRAM0, SSRAM0 + 0x1000, 4, CopyWidth::Native);
    assert!(outcome.completed);
}
