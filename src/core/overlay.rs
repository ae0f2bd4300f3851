//! Typed views over memory, driven by the profile's layout table
use crate::core::profile::{FieldLayout, Profile, StructLayout};
use crate::error::AnalysisError;
use crate::memory::AddressSpace;

/// A struct of a known type at a known address.
///
/// Views are cheap to copy; they hold no bytes, every field access reads
/// from the address space and is bounds-checked there.
#[derive(Clone, Copy)]
pub struct StructView<'a> {
    profile: &'a Profile,
    space: &'a dyn AddressSpace,
    type_name: &'a str,
    layout: &'a StructLayout,
    address: u64,
}

impl std::fmt::Debug for StructView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@0x{:x}", self.type_name, self.address)
    }
}

impl<'a> StructView<'a> {
    pub(crate) fn new(
        profile: &'a Profile,
        space: &'a dyn AddressSpace,
        type_name: &'a str,
        layout: &'a StructLayout,
        address: u64,
    ) -> Self {
        StructView {
            profile,
            space,
            type_name,
            layout,
            address,
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    pub fn field(&self, name: &str) -> Result<&'a FieldLayout, AnalysisError> {
        self.layout
            .field(name)
            .ok_or_else(|| AnalysisError::UnknownField(self.type_name.to_string(), name.to_string()))
    }

    /// Virtual address of a field.
    pub fn field_address(&self, name: &str) -> Result<u64, AnalysisError> {
        let field = self.field(name)?;
        self.address
            .checked_add(field.offset as u64)
            .ok_or(AnalysisError::InvalidAddress(self.address))
    }

    /// The field's whole storage word, with no bitfield masking applied.
    pub fn read_raw(&self, name: &str) -> Result<u64, AnalysisError> {
        let field = self.field(name)?;
        let address = self.field_address(name)?;
        self.space.read_uint(address, field.size)
    }

    /// The field's logical value: the storage word narrowed to the
    /// field's bit range when the profile declares one.
    pub fn read_value(&self, name: &str) -> Result<u64, AnalysisError> {
        let raw = self.read_raw(name)?;
        Ok(match self.field(name)?.bits {
            Some(bits) => bits.extract(raw),
            None => raw,
        })
    }

    pub fn read_pointer(&self, name: &str) -> Result<u64, AnalysisError> {
        self.read_raw(name)
    }

    /// Character array field, cut at the first NUL.
    pub fn read_string(&self, name: &str) -> Result<String, AnalysisError> {
        let field = self.field(name)?;
        self.space.read_cstring(self.field_address(name)?, field.size)
    }

    /// View of a struct embedded in this one.
    pub fn member(&self, name: &str) -> Result<StructView<'a>, AnalysisError> {
        let target = self.target_of(name)?;
        let address = self.field_address(name)?;
        self.profile.object(target, address, self.space)
    }

    /// View of the struct a pointer field refers to. A NULL pointer is an
    /// invalid address.
    pub fn deref(&self, name: &str) -> Result<StructView<'a>, AnalysisError> {
        let target = self.target_of(name)?;
        let pointer = self.read_pointer(name)?;
        if pointer == 0 {
            return Err(AnalysisError::InvalidAddress(0));
        }
        self.profile.object(target, pointer, self.space)
    }

    fn target_of(&self, name: &str) -> Result<&'a str, AnalysisError> {
        self.field(name)?.target.as_deref().ok_or_else(|| {
            AnalysisError::InvalidStructure(format!(
                "{}.{} is not a struct or struct pointer",
                self.type_name, name
            ))
        })
    }
}
