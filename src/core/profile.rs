//! Kernel profile: struct layouts and symbol addresses for one kernel build
use crate::core::dwarf::DwarfSymbols;
use crate::core::overlay::StructView;
use crate::error::AnalysisError;
use crate::memory::AddressSpace;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Bit range of a bitfield inside its storage word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub position: u32,
    pub length: u32,
}

impl BitRange {
    pub fn new(position: u32, length: u32) -> Self {
        BitRange { position, length }
    }

    pub fn extract(&self, raw: u64) -> u64 {
        let shifted = raw.checked_shr(self.position).unwrap_or(0);
        if self.length >= 64 {
            shifted
        } else {
            shifted & ((1u64 << self.length) - 1)
        }
    }
}

/// Location of one field inside its struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub offset: usize,
    /// Width in bytes; for bitfields, the width of the storage word.
    pub size: usize,
    pub bits: Option<BitRange>,
    /// Struct embedded at this field, or pointed to by it.
    pub target: Option<String>,
}

impl FieldLayout {
    pub fn new(offset: usize, size: usize) -> Self {
        FieldLayout {
            offset,
            size,
            bits: None,
            target: None,
        }
    }

    pub fn with_bits(mut self, position: u32, length: u32) -> Self {
        self.bits = Some(BitRange::new(position, length));
        self
    }

    pub fn with_target(mut self, type_name: &str) -> Self {
        self.target = Some(type_name.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructLayout {
    pub size: usize,
    fields: HashMap<String, FieldLayout>,
}

impl StructLayout {
    pub fn new(size: usize) -> Self {
        StructLayout {
            size,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, field: FieldLayout) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.get(name)
    }
}

/// Immutable layout database for one kernel build.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    structs: HashMap<String, StructLayout>,
    symbols: HashMap<String, u64>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_struct(mut self, name: &str, layout: StructLayout) -> Self {
        self.structs.insert(name.to_string(), layout);
        self
    }

    pub fn with_symbol(mut self, name: &str, address: u64) -> Self {
        self.add_symbol(name, address);
        self
    }

    pub fn add_symbol(&mut self, name: &str, address: u64) {
        self.symbols.insert(name.to_string(), address);
    }

    /// Load a dwarf2json (ISF) file
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, AnalysisError> {
        let isf: DwarfSymbols = serde_json::from_str(content)
            .map_err(|e| AnalysisError::ProfileError(format!("failed to parse dwarf2json: {}", e)))?;
        Ok(Self::from_isf(&isf))
    }

    pub fn from_isf(isf: &DwarfSymbols) -> Self {
        let mut profile = Profile::new();

        for (type_name, user_type) in &isf.user_types {
            let mut layout = StructLayout::new(user_type.size);
            for (field_name, field) in user_type.fields.iter().flatten() {
                let size = isf.width_of(&field.field_type).unwrap_or_else(|| {
                    log::debug!("No width for {}.{}, treating as 0", type_name, field_name);
                    0
                });
                let mut layout_field = FieldLayout::new(field.offset, size);
                if let crate::core::dwarf::IsfType::Bitfield {
                    bit_position,
                    bit_length,
                    ..
                } = field.field_type
                {
                    layout_field = layout_field.with_bits(bit_position, bit_length);
                }
                if let Some(target) = field.field_type.target() {
                    layout_field = layout_field.with_target(target);
                }
                layout = layout.with_field(field_name, layout_field);
            }
            profile.structs.insert(type_name.clone(), layout);
        }

        for (name, symbol) in &isf.symbols {
            profile.add_symbol(name, symbol.address);
        }

        log::info!(
            "Profile loaded: {} structures, {} symbols",
            profile.structs.len(),
            profile.symbols.len()
        );
        profile
    }

    /// Slide every symbol by a KASLR offset. Struct layouts are unaffected.
    pub fn shift_symbols(&mut self, shift: i64) {
        for address in self.symbols.values_mut() {
            *address = address.wrapping_add_signed(shift);
        }
        log::debug!("Shifted {} symbols by {:#x}", self.symbols.len(), shift);
    }

    /// Merge a System.map (`address type name` per line) into the symbol
    /// table, overriding addresses already present.
    pub fn load_system_map(&mut self, path: &Path) -> Result<usize, AnalysisError> {
        let file = std::fs::File::open(path)?;
        self.merge_system_map(std::io::BufReader::new(file))
    }

    pub fn merge_system_map<R: BufRead>(&mut self, reader: R) -> Result<usize, AnalysisError> {
        let mut loaded = 0;
        for line in reader.lines() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 || parts[1].len() != 1 {
                continue;
            }
            if let Ok(address) = u64::from_str_radix(parts[0].trim_start_matches("0x"), 16) {
                // Absolute and module symbols carry no usable address.
                if address == 0 {
                    continue;
                }
                self.add_symbol(parts[2], address);
                loaded += 1;
            }
        }
        log::info!("Merged {} symbols from System.map", loaded);
        Ok(loaded)
    }

    pub fn layout(&self, type_name: &str) -> Result<&StructLayout, AnalysisError> {
        self.structs
            .get(type_name)
            .ok_or_else(|| AnalysisError::UnknownStruct(type_name.to_string()))
    }

    pub fn struct_size(&self, type_name: &str) -> Result<usize, AnalysisError> {
        Ok(self.layout(type_name)?.size)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Result<&FieldLayout, AnalysisError> {
        self.layout(type_name)?
            .field(field_name)
            .ok_or_else(|| AnalysisError::UnknownField(type_name.to_string(), field_name.to_string()))
    }

    /// First of `candidates` present in `type_name`. Fields get renamed
    /// between kernel versions (`rcv_saddr` became `inet_rcv_saddr`).
    pub fn field_alias<'n>(
        &self,
        type_name: &str,
        candidates: &[&'n str],
    ) -> Result<&'n str, AnalysisError> {
        let layout = self.layout(type_name)?;
        candidates
            .iter()
            .copied()
            .find(|name| layout.field(name).is_some())
            .ok_or_else(|| {
                AnalysisError::UnknownField(type_name.to_string(), candidates.join("|"))
            })
    }

    pub fn symbol(&self, name: &str) -> Result<u64, AnalysisError> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| AnalysisError::SymbolNotFound(name.to_string()))
    }

    /// Typed view of `type_name` at `address`.
    ///
    /// Fails with [`AnalysisError::InvalidAddress`] when `address` has no
    /// backing byte in `space`; individual field reads are checked again.
    pub fn object<'a>(
        &'a self,
        type_name: &str,
        address: u64,
        space: &'a dyn AddressSpace,
    ) -> Result<StructView<'a>, AnalysisError> {
        let (name, layout) = self
            .structs
            .get_key_value(type_name)
            .ok_or_else(|| AnalysisError::UnknownStruct(type_name.to_string()))?;
        if !space.is_valid(address) {
            return Err(AnalysisError::InvalidAddress(address));
        }
        Ok(StructView::new(self, space, name, layout, address))
    }
}
