//! System Bus Interconnect.
//!
//! This module implements the system bus, which routes memory accesses
//! to the appropriate devices based on the physical address map. It manages
//! a list of devices, handles address decoding, splits accesses that
//! straddle two devices, and accumulates access latency.

use crate::common::BusFault;
use crate::soc::memory::controller::MemoryController;
use crate::soc::traits::{Device, MemoryPort};
use tracing::debug;

/// System interconnect bus.
///
/// Routes accesses from every bus master to the memory devices that back
/// the regions under test. Accesses to undecoded addresses fault instead of
/// reading as zero so a stray transfer is reported rather than masked.
pub struct Bus {
    devices: Vec<Box<dyn Device>>,
    /// Bus width in bytes (determines how many beats a block access takes).
    pub width_bytes: u64,
    controller: Box<dyn MemoryController>,
    /// Total latency accumulated by all accesses, in cycles.
    pub cycles: u64,

    last_device_idx: usize,
}

impl Bus {
    /// Creates a new bus instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `width_bytes` - Bus width in bytes (typically 4 for a 32-bit part)
    /// * `controller` - Timing model charged for every beat
    ///
    /// # Returns
    ///
    /// A new `Bus` instance with no devices attached.
    pub fn new(width_bytes: u64, controller: Box<dyn MemoryController>) -> Self {
        Self {
            devices: Vec::new(),
            width_bytes: width_bytes.max(1),
            controller,
            cycles: 0,
            last_device_idx: 0,
        }
    }

    /// Adds a device to the bus.
    ///
    /// Registers a memory-mapped device on the bus. Devices are
    /// automatically sorted by base address for efficient lookup.
    ///
    /// # Arguments
    ///
    /// * `dev` - The device to add to the bus
    pub fn add_device(&mut self, dev: Box<dyn Device>) {
        let (base, size) = dev.address_range();
        debug!(
            "[Bus] Registered device: {:<12} @ {:#010x} - {:#010x} ({} bytes)",
            dev.name(),
            base,
            base + size,
            size
        );
        self.devices.push(dev);

        self.devices.sort_by_key(|d| d.address_range().0);
        self.last_device_idx = 0;
    }

    /// Number of attached devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Checks if a physical address maps to a valid device.
    ///
    /// # Arguments
    ///
    /// * `paddr` - The physical address to check
    ///
    /// # Returns
    ///
    /// `true` if the address is mapped to a device, `false` otherwise.
    pub fn is_valid_address(&self, paddr: u64) -> bool {
        self.locate(paddr).is_some()
    }

    /// Helper to find the device index and offset for an address without caching.
    fn locate(&self, paddr: u64) -> Option<(usize, u64)> {
        self.devices.iter().enumerate().find_map(|(i, dev)| {
            let (start, size) = dev.address_range();
            (paddr >= start && paddr - start < size).then(|| (i, paddr - start))
        })
    }

    /// Helper to find the device mapped to a specific physical address.
    ///
    /// Returns the device index and the offset within that device.
    #[inline(always)]
    fn find_device(&mut self, paddr: u64) -> Result<(usize, u64), BusFault> {
        if self.last_device_idx < self.devices.len() {
            let (start, size) = self.devices[self.last_device_idx].address_range();
            if paddr >= start && paddr - start < size {
                return Ok((self.last_device_idx, paddr - start));
            }
        }

        let (idx, offset) = self.locate(paddr).ok_or(BusFault::Unmapped { addr: paddr })?;
        self.last_device_idx = idx;
        Ok((idx, offset))
    }

    /// Resolves an access of `len` bytes that stays inside one device.
    ///
    /// Returns `None` when the access straddles devices and must be split.
    fn find_span(&mut self, paddr: u64, len: u64) -> Result<Option<(usize, u64)>, BusFault> {
        let (idx, offset) = self.find_device(paddr)?;
        let (_, size) = self.devices[idx].address_range();
        Ok((offset + len <= size).then_some((idx, offset)))
    }

    fn check_writable(&self, idx: usize, paddr: u64) -> Result<(), BusFault> {
        if self.devices[idx].is_writable() {
            Ok(())
        } else {
            Err(BusFault::ReadOnly { addr: paddr })
        }
    }

    /// Charges the timing model for a block access of `bytes` bytes.
    fn charge(&mut self, paddr: u64, bytes: usize) {
        let mut beat = 0u64;
        while beat < bytes as u64 {
            self.cycles += self.controller.access_latency(paddr + beat);
            beat += self.width_bytes;
        }
    }

    fn read_split(&mut self, paddr: u64, buf: &mut [u8]) -> Result<(), BusFault> {
        for (i, byte) in buf.iter_mut().enumerate() {
            let (idx, offset) = self.find_device(paddr + i as u64)?;
            *byte = self.devices[idx].read_u8(offset);
        }
        Ok(())
    }

    fn write_split(&mut self, paddr: u64, data: &[u8]) -> Result<(), BusFault> {
        for (i, byte) in data.iter().enumerate() {
            let addr = paddr + i as u64;
            let (idx, offset) = self.find_device(addr)?;
            self.check_writable(idx, addr)?;
            self.devices[idx].write_u8(offset, *byte);
        }
        Ok(())
    }
}

impl MemoryPort for Bus {
    /// Reads a byte from the specified physical address.
    #[inline(always)]
    fn read_u8(&mut self, paddr: u64) -> Result<u8, BusFault> {
        let (idx, offset) = self.find_device(paddr)?;
        self.charge(paddr, 1);
        Ok(self.devices[idx].read_u8(offset))
    }

    /// Reads a half-word (16-bit) from the specified physical address.
    #[inline(always)]
    fn read_u16(&mut self, paddr: u64) -> Result<u16, BusFault> {
        self.charge(paddr, 2);
        if let Some((idx, offset)) = self.find_span(paddr, 2)? {
            return Ok(self.devices[idx].read_u16(offset));
        }
        let mut bytes = [0u8; 2];
        self.read_split(paddr, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Reads a word (32-bit) from the specified physical address.
    #[inline(always)]
    fn read_u32(&mut self, paddr: u64) -> Result<u32, BusFault> {
        self.charge(paddr, 4);
        if let Some((idx, offset)) = self.find_span(paddr, 4)? {
            return Ok(self.devices[idx].read_u32(offset));
        }
        let mut bytes = [0u8; 4];
        self.read_split(paddr, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Writes a byte to the specified physical address.
    #[inline(always)]
    fn write_u8(&mut self, paddr: u64, val: u8) -> Result<(), BusFault> {
        let (idx, offset) = self.find_device(paddr)?;
        self.check_writable(idx, paddr)?;
        self.charge(paddr, 1);
        self.devices[idx].write_u8(offset, val);
        Ok(())
    }

    /// Writes a half-word (16-bit) to the specified physical address.
    #[inline(always)]
    fn write_u16(&mut self, paddr: u64, val: u16) -> Result<(), BusFault> {
        self.charge(paddr, 2);
        if let Some((idx, offset)) = self.find_span(paddr, 2)? {
            self.check_writable(idx, paddr)?;
            self.devices[idx].write_u16(offset, val);
            return Ok(());
        }
        self.write_split(paddr, &val.to_le_bytes())
    }

    /// Writes a word (32-bit) to the specified physical address.
    #[inline(always)]
    fn write_u32(&mut self, paddr: u64, val: u32) -> Result<(), BusFault> {
        self.charge(paddr, 4);
        if let Some((idx, offset)) = self.find_span(paddr, 4)? {
            self.check_writable(idx, paddr)?;
            self.devices[idx].write_u32(offset, val);
            return Ok(());
        }
        self.write_split(paddr, &val.to_le_bytes())
    }

    fn is_mapped(&self, addr: u64, len: u64) -> bool {
        let end = addr.saturating_add(len);
        let mut cursor = addr;
        while cursor < end {
            match self.locate(cursor) {
                Some((idx, offset)) => {
                    let (_, size) = self.devices[idx].address_range();
                    cursor += size - offset;
                }
                None => return false,
            }
        }
        true
    }

    fn read_bytes(&mut self, paddr: u64, buf: &mut [u8]) -> Result<(), BusFault> {
        self.charge(paddr, buf.len());
        let mut done = 0usize;
        while done < buf.len() {
            let cursor = paddr + done as u64;
            let (idx, offset) = self.find_device(cursor)?;
            let (_, size) = self.devices[idx].address_range();
            let n = ((size - offset) as usize).min(buf.len() - done);
            self.devices[idx].read_bytes(offset, &mut buf[done..done + n]);
            done += n;
        }
        Ok(())
    }

    fn write_bytes(&mut self, paddr: u64, data: &[u8]) -> Result<(), BusFault> {
        self.charge(paddr, data.len());
        let mut done = 0usize;
        while done < data.len() {
            let cursor = paddr + done as u64;
            let (idx, offset) = self.find_device(cursor)?;
            self.check_writable(idx, cursor)?;
            let (_, size) = self.devices[idx].address_range();
            let n = ((size - offset) as usize).min(data.len() - done);
            self.devices[idx].write_bytes(offset, &data[done..done + n]);
            done += n;
        }
        Ok(())
    }
}
