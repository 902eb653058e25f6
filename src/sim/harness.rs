//! Simulation Harness.
//!
//! Wires a configuration into a simulated SoC, builds the selected bus
//! masters over it, and runs the sweep end to end.

use crate::catalog::Catalog;
use crate::common::ConfigError;
use crate::config::Config;
use crate::masters::{
    AcceleratorBlit, BusMaster, CaptureMaster, CoreCopy, CrcMaster, LinkMaster, MasterKind,
};
use crate::report::Console;
use crate::soc::devices::{SampleFormat, SimBlitter, SimCrc, SimLink, SimSampler};
use crate::soc::{Staging, System};
use crate::stats::SweepReport;
use crate::sweep::SweepDriver;
use crate::verify::IntegrityVerifier;
use tracing::info;

/// Creates one backend per master, each wired to its simulated engine.
///
/// Fault plans and timeouts are taken from the configuration.
pub fn build_masters(config: &Config) -> Result<Vec<Box<dyn BusMaster>>, ConfigError> {
    let chunk = config.general.dma_chunk_bytes;
    let device_size = config.staging.device_size;
    let mspi_window = config.staging.mspi_addr_val()?;
    let device_offset = config.staging.device_offset_val()?;

    let mut masters: Vec<Box<dyn BusMaster>> = Vec::with_capacity(MasterKind::ALL.len());
    for &kind in MasterKind::ALL {
        let plan = config.faults.plan_for(kind);
        let timeout = config.timeouts.for_master(kind);
        let name = kind.name().to_uppercase();
        let master: Box<dyn BusMaster> = match kind {
            MasterKind::CoreCopy => Box::new(CoreCopy::new()),
            MasterKind::AcceleratorBlit => Box::new(AcceleratorBlit::new(
                Box::new(SimBlitter::new(chunk).with_fault_plan(plan)),
                timeout,
            )),
            MasterKind::Mspi => {
                let link = SimLink::new(&name, Staging::Mapped(mspi_window), chunk, device_size)
                    .with_fault_plan(plan);
                Box::new(LinkMaster::new(kind, Box::new(link), timeout))
            }
            MasterKind::Sdio | MasterKind::Iom | MasterKind::Uart | MasterKind::I2s => {
                let staging = Staging::Device {
                    offset: device_offset,
                };
                let mut link = SimLink::new(&name, staging, chunk, device_size).with_fault_plan(plan);
                if kind == MasterKind::I2s {
                    link = link.with_rx_delay(config.staging.i2s_delay_words * 4);
                }
                Box::new(LinkMaster::new(kind, Box::new(link), timeout))
            }
            MasterKind::CrcEngine => Box::new(CrcMaster::new(
                Box::new(SimCrc::new(chunk).with_fault_plan(plan)),
                timeout,
            )),
            MasterKind::Pdm | MasterKind::Adc => {
                let format = if kind == MasterKind::Pdm {
                    SampleFormat::Pcm16
                } else {
                    SampleFormat::AdcFifo
                };
                let sampler = SimSampler::new(&name, format, chunk, device_size).with_fault_plan(plan);
                Box::new(CaptureMaster::new(kind, Box::new(sampler), timeout))
            }
        };
        masters.push(master);
    }
    Ok(masters)
}

/// A configured simulated system, ready to sweep.
pub struct Harness {
    config: Config,
    catalog: Catalog,
    system: System,
}

impl Harness {
    /// Validates `config` and builds the system it describes.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = config.catalog()?;
        let system = System::new(&config, &catalog)?;
        Ok(Self {
            config,
            catalog,
            system,
        })
    }

    /// Regions under test.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The simulated system.
    pub fn system(&self) -> &System {
        &self.system
    }

    /// Mutable access to the simulated system, e.g. to preload memory.
    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }

    /// Runs the full sweep.
    ///
    /// # Arguments
    ///
    /// * `console` - Sink for progress and failure lines
    ///
    /// # Returns
    ///
    /// The sweep report with bus cycles filled in.
    pub fn run(&mut self, console: &mut dyn Console) -> Result<SweepReport, ConfigError> {
        let masters = build_masters(&self.config)?;
        let settings = self.config.settings()?;
        let seed = self.config.general.seed;
        let verifier = IntegrityVerifier::new(seed, self.config.general.scratch_addr_val()?);
        info!(
            regions = self.catalog.len(),
            masters = masters.len(),
            "starting sweep"
        );

        let mut driver = SweepDriver::new(&self.catalog, settings, verifier, masters);
        let mut hw = self.system.platform();
        let mut report = driver.run(&mut hw, console, seed);
        report.bus_cycles = self.system.bus.cycles;
        Ok(report)
    }
}
