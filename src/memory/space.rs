//! Address spaces: bounds-checked, read-only views of captured memory
use crate::error::AnalysisError;

/// A read-only byte space addressed by plain integers.
///
/// Every read is bounds-checked; an address with no backing bytes yields
/// [`AnalysisError::InvalidAddress`] rather than undefined data. Values are
/// decoded little-endian, matching the captured x86 kernels.
pub trait AddressSpace: Sync {
    /// Fill `buf` with the bytes starting at `address`.
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<(), AnalysisError>;

    /// Whether `address` itself has a backing byte.
    fn is_valid(&self, address: u64) -> bool;

    fn read_u8(&self, address: u64) -> Result<u8, AnalysisError> {
        let mut buf = [0u8; 1];
        self.read(address, &mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&self, address: u64) -> Result<u16, AnalysisError> {
        let mut buf = [0u8; 2];
        self.read(address, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&self, address: u64) -> Result<u32, AnalysisError> {
        let mut buf = [0u8; 4];
        self.read(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(&self, address: u64) -> Result<u64, AnalysisError> {
        let mut buf = [0u8; 8];
        self.read(address, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read an unsigned little-endian integer of 1 to 8 bytes.
    fn read_uint(&self, address: u64, width: usize) -> Result<u64, AnalysisError> {
        if width == 0 || width > 8 {
            return Err(AnalysisError::InvalidStructure(format!(
                "cannot read a {}-byte integer at 0x{:x}",
                width, address
            )));
        }
        let mut buf = [0u8; 8];
        self.read(address, &mut buf[..width])?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a fixed-size, NUL-padded string such as `task_struct.comm`.
    fn read_cstring(&self, address: u64, max_len: usize) -> Result<String, AnalysisError> {
        let mut buf = vec![0u8; max_len];
        self.read(address, &mut buf)?;
        let nul_pos = buf.iter().position(|&c| c == 0).unwrap_or(max_len);
        Ok(String::from_utf8_lossy(&buf[..nul_pos]).into_owned())
    }
}

/// Contiguous bytes mapped at `base`: address `base + n` is byte `n`.
pub struct FlatImage<B> {
    base: u64,
    bytes: B,
}

impl<B: AsRef<[u8]>> FlatImage<B> {
    pub fn new(bytes: B) -> Self {
        Self::with_base(0, bytes)
    }

    pub fn with_base(base: u64, bytes: B) -> Self {
        FlatImage { base, bytes }
    }

    /// One past the last valid address.
    pub fn end(&self) -> u64 {
        self.base + self.bytes.as_ref().len() as u64
    }

    fn index(&self, address: u64, len: usize) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.as_ref().len()).then_some(start..end)
    }
}

impl<B: AsRef<[u8]> + Sync> AddressSpace for FlatImage<B> {
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<(), AnalysisError> {
        let range = self
            .index(address, buf.len())
            .ok_or(AnalysisError::InvalidAddress(address))?;
        buf.copy_from_slice(&self.bytes.as_ref()[range]);
        Ok(())
    }

    fn is_valid(&self, address: u64) -> bool {
        self.index(address, 1).is_some()
    }
}
