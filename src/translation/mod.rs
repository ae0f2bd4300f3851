//! Memory translation module for converting kernel virtual addresses to
//! file offsets in the dump
use crate::error::AnalysisError;
use crate::memory::{AddressSpace, FlatImage, MemoryRegion};

// x86-64 kernel address space constants
const KERNEL_MAP_BASE: u64 = 0xffffffff80000000; // __START_KERNEL_map
const KERNEL_MAP_END: u64 = 0xffffffffff000000;
const PAGE_OFFSET_4LEVEL: u64 = 0xffff880000000000;
const PAGE_OFFSET_4LEVEL_END: u64 = 0xffffc80000000000;
const PAGE_OFFSET_5LEVEL: u64 = 0xffff888000000000;
const PAGE_OFFSET_5LEVEL_END: u64 = 0xffffc88000000000;

/// Translates kernel virtual addresses to file offsets
pub struct MemoryTranslator {
    regions: Vec<MemoryRegion>,
    /// Physical base address where the kernel image is loaded
    phys_base: u64,
}

impl MemoryTranslator {
    /// Create a new memory translator with the given regions
    /// Uses default phys_base of 0x1000000 (16MB) which is standard for x86-64
    pub fn new(regions: Vec<MemoryRegion>) -> Self {
        MemoryTranslator {
            regions,
            phys_base: 0x1000000,
        }
    }

    pub fn set_phys_base(&mut self, phys_base: u64) {
        self.phys_base = phys_base;
    }

    /// Convert a kernel virtual address to physical address
    ///
    /// - Kernel text/data: physical = (virtual - __START_KERNEL_map) + phys_base
    /// - Direct mapping: physical = virtual - PAGE_OFFSET
    fn virtual_to_physical(&self, addr: u64) -> Option<u64> {
        if (KERNEL_MAP_BASE..KERNEL_MAP_END).contains(&addr) {
            return self.phys_base.checked_add(addr - KERNEL_MAP_BASE);
        }
        // The 5-level range sits inside the 4-level one, so test it first.
        if (PAGE_OFFSET_5LEVEL..PAGE_OFFSET_5LEVEL_END).contains(&addr) {
            return Some(addr - PAGE_OFFSET_5LEVEL);
        }
        if (PAGE_OFFSET_4LEVEL..PAGE_OFFSET_4LEVEL_END).contains(&addr) {
            return Some(addr - PAGE_OFFSET_4LEVEL);
        }
        None
    }

    /// Translate a virtual kernel address to a file offset
    pub fn virtual_to_file_offset(&self, virtual_addr: u64) -> Option<u64> {
        let physical_addr = self.virtual_to_physical(virtual_addr)?;
        let offset = self
            .regions
            .iter()
            .find_map(|region| region.physical_to_file_offset(physical_addr));
        if offset.is_none() {
            log::trace!(
                "0x{:x} (physical 0x{:x}) is not in any captured region",
                virtual_addr,
                physical_addr
            );
        }
        offset
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Kernel virtual address space backed by the dump file.
pub struct KernelSpace<'a> {
    file: FlatImage<&'a [u8]>,
    translator: &'a MemoryTranslator,
}

impl<'a> KernelSpace<'a> {
    pub fn new(mapped: &'a [u8], translator: &'a MemoryTranslator) -> Self {
        KernelSpace {
            file: FlatImage::new(mapped),
            translator,
        }
    }
}

impl AddressSpace for KernelSpace<'_> {
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<(), AnalysisError> {
        if buf.is_empty() {
            return Ok(());
        }
        let start = self
            .translator
            .virtual_to_file_offset(address)
            .ok_or(AnalysisError::InvalidAddress(address))?;
        // Reads may not run past the end of the region they start in.
        let last = address
            .checked_add(buf.len() as u64 - 1)
            .and_then(|a| self.translator.virtual_to_file_offset(a));
        if last != Some(start + buf.len() as u64 - 1) {
            return Err(AnalysisError::InvalidAddress(address));
        }
        self.file
            .read(start, buf)
            .map_err(|_| AnalysisError::InvalidAddress(address))
    }

    fn is_valid(&self, address: u64) -> bool {
        self.translator
            .virtual_to_file_offset(address)
            .is_some_and(|offset| self.file.is_valid(offset))
    }
}
