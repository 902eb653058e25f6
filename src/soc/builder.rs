//! System-on-Chip (SoC) Builder.
//!
//! This module defines the `System` structure, which acts as the container
//! for all simulated hardware (bus, memories, fabric registers, power, and
//! clock). It handles the initialization and wiring of the system based on
//! the provided configuration and region catalog.

use crate::catalog::Catalog;
use crate::common::{BusFault, ConfigError};
use crate::config::{Config, ControllerKind};
use crate::soc::devices::{FabricState, SimFabric, SimPower, VirtualClock};
use crate::soc::interconnect::Bus;
use crate::soc::memory::controller::{FabricController, MemoryController, SimpleController};
use crate::soc::memory::{Backdrop, Memory};
use crate::soc::traits::{MemoryPort, Platform};

/// System-on-Chip (SoC) structure containing all simulated components.
///
/// Every catalog region is backed by one sparse memory on the bus. The
/// scratch buffer and the mapped link window get their own memory when no
/// region covers them. The fabric register block shares its live register
/// images with the bus timing model.
pub struct System {
    /// System interconnect bus.
    pub bus: Bus,
    /// Virtual millisecond clock.
    pub clock: VirtualClock,
    /// Fabric register block.
    pub fabric: SimFabric,
    /// Power controller.
    pub power: SimPower,
}

impl System {
    /// Creates a new system instance with the specified configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Timing model, seed, and power fault settings
    /// * `catalog` - Regions to back with memory
    ///
    /// # Returns
    ///
    /// A new `System` instance ready for a sweep, or the configuration error
    /// that prevented wiring it.
    pub fn new(config: &Config, catalog: &Catalog) -> Result<Self, ConfigError> {
        let state = FabricState::new();
        let timing = &config.timing;
        let controller: Box<dyn MemoryController> = match timing.controller {
            ControllerKind::Fabric => Box::new(FabricController::new(
                state.clone(),
                timing.hit_latency,
                timing.miss_latency,
                timing.pass_through_penalty,
            )),
            ControllerKind::Simple => Box::new(SimpleController::new(timing.miss_latency)),
        };
        let mut bus = Bus::new(timing.bus_width, controller);

        for region in catalog.regions() {
            let mut mem = Memory::new(&region.name, region.base, region.total_size);
            if !region.writable {
                mem = mem
                    .read_only()
                    .with_backdrop(Backdrop::Pattern(config.general.seed ^ region.base));
            }
            bus.add_device(Box::new(mem));
        }

        let backing = [
            ("SCRATCH", config.general.scratch_addr_val()?),
            ("STAGING", config.staging.mspi_addr_val()?),
        ];
        for (name, base) in backing {
            if !bus.is_valid_address(base) {
                let size = config.staging.device_size as u64;
                bus.add_device(Box::new(Memory::new(name, base, size)));
            }
        }

        Ok(Self {
            bus,
            clock: VirtualClock::new(),
            fabric: SimFabric::new(state),
            power: SimPower::new(config.faults.power_up_failures()?),
        })
    }

    /// Borrows the hardware services the sweep consumes.
    pub fn platform(&mut self) -> Platform<'_> {
        Platform {
            memory: &mut self.bus,
            clock: &mut self.clock,
            fabric: &mut self.fabric,
            power: &mut self.power,
        }
    }

    /// Loads a binary blob into memory at a specific address.
    ///
    /// # Arguments
    ///
    /// * `data` - The binary data to load
    /// * `addr` - The physical address to load the data at
    pub fn load_binary_at(&mut self, data: &[u8], addr: u64) -> Result<(), BusFault> {
        self.bus.write_bytes(addr, data)
    }
}
