//! Memory module for handling raw and LiME format memory dumps
use crate::error::AnalysisError;
use memchr::memmem;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

pub mod space;

pub use space::{AddressSpace, FlatImage};

/// LiME segment magic, bytes `45 4D 69 4C` read as a little-endian u32.
const LIME_MAGIC: u32 = 0x4C69_4D45;
const LIME_HEADER_SIZE: usize = 32;

/// Physical memory range backed by a span of the dump file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    /// Inclusive, as recorded in the LiME header.
    pub end: u64,
    pub file_offset: u64,
}

impl MemoryRegion {
    /// Check if a physical address is within this memory region
    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address <= self.end
    }

    /// Convert a physical address to a file offset within this region
    pub fn physical_to_file_offset(&self, physical_addr: u64) -> Option<u64> {
        if self.contains(physical_addr) {
            Some(self.file_offset + (physical_addr - self.start))
        } else {
            None
        }
    }
}

/// Memory mapped file handle
pub struct MemoryMap {
    _file: File,
    pub mapped: Mmap,
}

impl MemoryMap {
    /// Create a new memory map from a file path
    pub fn new(path: &Path) -> Result<Self, AnalysisError> {
        let file = File::open(path)?;
        // The dump is opened read-only and never written through the mapping.
        let mapped = unsafe { Mmap::map(&file)? };
        Ok(MemoryMap {
            _file: file,
            mapped,
        })
    }

    /// Check if the beginning of the file is the LiME signature.
    pub fn is_lime(&self) -> bool {
        read_le_u32(&self.mapped, 0) == Some(LIME_MAGIC)
    }

    /// Physical regions in the dump: the LiME segment table, or a single
    /// region covering the whole file for raw captures.
    pub fn regions(&self) -> Vec<MemoryRegion> {
        if self.is_lime() {
            if let Some(regions) = parse_lime_header(&self.mapped) {
                return regions;
            }
            log::warn!("LiME header detected, but no memory regions were found");
        }
        vec![MemoryRegion {
            start: 0,
            end: (self.mapped.len() as u64).saturating_sub(1),
            file_offset: 0,
        }]
    }

    /// Locate the kernel's `Linux version ...` banner, if present.
    pub fn find_banner(&self) -> Option<String> {
        find_banner(&self.mapped)
    }

    pub fn len(&self) -> usize {
        self.mapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty()
    }
}

/// Parse the chain of LiME segment headers at the start of `data`.
///
/// Each segment is a 32 byte header followed by the segment's bytes:
/// - Magic: 4 bytes
/// - Version: 4 bytes
/// - Start: 8 bytes, physical address
/// - End: 8 bytes, physical address (inclusive)
/// - Reserved: 8 bytes
pub fn parse_lime_header(data: &[u8]) -> Option<Vec<MemoryRegion>> {
    let mut regions = Vec::new();
    let mut offset = 0usize;

    while offset + LIME_HEADER_SIZE <= data.len() {
        if read_le_u32(data, offset) != Some(LIME_MAGIC) {
            break;
        }
        let start = read_le_u64(data, offset + 8)?;
        let end = read_le_u64(data, offset + 16)?;
        let Some(span) = end.checked_sub(start).and_then(|s| s.checked_add(1)) else {
            log::warn!(
                "LiME segment at 0x{:x} has end 0x{:x} before start 0x{:x}",
                offset,
                end,
                start
            );
            break;
        };

        let file_offset = (offset + LIME_HEADER_SIZE) as u64;
        log::debug!(
            "LiME region {}: start=0x{:x} end=0x{:x} file_offset=0x{:x}",
            regions.len(),
            start,
            end,
            file_offset
        );
        regions.push(MemoryRegion {
            start,
            end,
            file_offset,
        });

        match usize::try_from(span)
            .ok()
            .and_then(|s| offset.checked_add(LIME_HEADER_SIZE + s))
        {
            Some(next) => offset = next,
            None => break,
        }
    }

    if regions.is_empty() {
        None
    } else {
        Some(regions)
    }
}

pub fn find_banner(data: &[u8]) -> Option<String> {
    let pos = memmem::find(data, b"Linux version ")?;
    let tail = &data[pos..data.len().min(pos + 256)];
    let end = tail
        .iter()
        .position(|&c| c == 0 || c == b'\n')
        .unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}

fn read_le_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_le_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}
