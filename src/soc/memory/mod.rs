//! Sparse Physical Memory.
//!
//! Regions under test span tens of megabytes but a sweep only touches a few
//! kilobytes around each boundary, so memories are stored as lazily
//! allocated pages. Untouched bytes read back as the memory's backdrop:
//! zero for RAM, a fixed address-derived pattern for non-volatile memory so
//! it looks like programmed code.

/// Access latency models.
pub mod controller;

use crate::common::constants::PAGE_SIZE;
use crate::soc::traits::Device;
use std::collections::HashMap;

/// Contents of bytes that were never written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backdrop {
    /// Reads as zero.
    Zero,
    /// Reads as a pattern derived from the offset and this seed.
    Pattern(u64),
}

impl Backdrop {
    #[inline]
    fn byte(self, offset: u64) -> u8 {
        match self {
            Backdrop::Zero => 0,
            Backdrop::Pattern(seed) => {
                let mixed = (offset ^ seed).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                (mixed >> 56) as u8
            }
        }
    }
}

/// A sparse, page-allocated memory device.
pub struct Memory {
    name: String,
    base: u64,
    size: u64,
    writable: bool,
    backdrop: Backdrop,
    pages: HashMap<u64, Box<[u8]>>,
}

impl Memory {
    /// Creates a writable memory that reads as zero.
    ///
    /// # Arguments
    ///
    /// * `name` - Device name shown in bus logs
    /// * `base` - Base physical address
    /// * `size` - Size in bytes
    pub fn new(name: &str, base: u64, size: u64) -> Self {
        Self {
            name: name.to_string(),
            base,
            size,
            writable: true,
            backdrop: Backdrop::Zero,
            pages: HashMap::new(),
        }
    }

    /// Makes the memory reject stores, like programmed non-volatile memory.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Sets the contents of never-written bytes.
    pub fn with_backdrop(mut self, backdrop: Backdrop) -> Self {
        self.backdrop = backdrop;
        self
    }

    /// Number of pages currently allocated.
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    fn page_mut(&mut self, page: u64) -> &mut [u8] {
        let backdrop = self.backdrop;
        self.pages.entry(page).or_insert_with(|| {
            let start = page * PAGE_SIZE;
            (0..PAGE_SIZE).map(|i| backdrop.byte(start + i)).collect()
        })
    }
}

impl Device for Memory {
    fn name(&self) -> &str {
        &self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.size)
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        let page = offset / PAGE_SIZE;
        match self.pages.get(&page) {
            Some(data) => data[(offset % PAGE_SIZE) as usize],
            None => self.backdrop.byte(offset),
        }
    }

    fn write_u8(&mut self, offset: u64, val: u8) {
        self.page_mut(offset / PAGE_SIZE)[(offset % PAGE_SIZE) as usize] = val;
    }

    fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) {
        let mut done = 0usize;
        while done < buf.len() {
            let cursor = offset + done as u64;
            let page = cursor / PAGE_SIZE;
            let within = (cursor % PAGE_SIZE) as usize;
            let n = (PAGE_SIZE as usize - within).min(buf.len() - done);
            match self.pages.get(&page) {
                Some(data) => buf[done..done + n].copy_from_slice(&data[within..within + n]),
                None => {
                    for (i, byte) in buf[done..done + n].iter_mut().enumerate() {
                        *byte = self.backdrop.byte(cursor + i as u64);
                    }
                }
            }
            done += n;
        }
    }

    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        let mut done = 0usize;
        while done < data.len() {
            let cursor = offset + done as u64;
            let within = (cursor % PAGE_SIZE) as usize;
            let n = (PAGE_SIZE as usize - within).min(data.len() - done);
            self.page_mut(cursor / PAGE_SIZE)[within..within + n]
                .copy_from_slice(&data[done..done + n]);
            done += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_access_spans_pages() {
        let mut mem = Memory::new("RAM", 0, 0x4000);
        let data: Vec<u8> = (0..64).collect();
        mem.write_bytes(PAGE_SIZE - 32, &data);
        let mut back = vec![0u8; 64];
        mem.read_bytes(PAGE_SIZE - 32, &mut back);
        assert_eq!(back, data);
        assert_eq!(mem.resident_pages(), 2);
    }

    #[test]
    fn pattern_backdrop_is_stable() {
        let mut mem = Memory::new("NVM", 0, 0x4000).with_backdrop(Backdrop::Pattern(7));
        let first = mem.read_u32(0x100);
        mem.write_u8(0x200, 0xAA);
        assert_eq!(mem.read_u32(0x100), first);
    }
}
