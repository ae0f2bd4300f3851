//! dwarf2json parser for loading Volatility 3 compatible symbol files (ISF)
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct IsfSymbol {
    pub address: u64,
}

#[derive(Debug, Deserialize)]
pub struct IsfBaseType {
    pub size: usize,
}

#[derive(Debug, Deserialize)]
pub struct IsfEnum {
    pub size: usize,
}

#[derive(Debug, Deserialize)]
pub struct IsfField {
    pub offset: usize,
    #[serde(rename = "type")]
    pub field_type: IsfType,
}

#[derive(Debug, Deserialize)]
pub struct IsfUserType {
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub fields: Option<HashMap<String, IsfField>>,
}

/// Type descriptor attached to every field, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IsfType {
    Base {
        name: String,
    },
    Pointer {
        subtype: Box<IsfType>,
    },
    Struct {
        name: String,
    },
    Union {
        name: String,
    },
    Class {
        name: String,
    },
    Enum {
        name: String,
    },
    Array {
        count: usize,
        subtype: Box<IsfType>,
    },
    Bitfield {
        bit_position: u32,
        bit_length: u32,
        #[serde(rename = "type")]
        storage: Box<IsfType>,
    },
    #[serde(other)]
    Other,
}

impl IsfType {
    /// Name of the aggregate this type embeds or points to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            IsfType::Struct { name } | IsfType::Union { name } | IsfType::Class { name } => {
                Some(name)
            }
            IsfType::Pointer { subtype } => match subtype.as_ref() {
                IsfType::Struct { name } | IsfType::Union { name } | IsfType::Class { name } => {
                    Some(name)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DwarfSymbols {
    #[serde(default)]
    pub base_types: HashMap<String, IsfBaseType>,
    #[serde(default)]
    pub user_types: HashMap<String, IsfUserType>,
    #[serde(default)]
    pub enums: HashMap<String, IsfEnum>,
    #[serde(default)]
    pub symbols: HashMap<String, IsfSymbol>,
}

impl DwarfSymbols {
    /// Byte width of a type, resolved through the base, user and enum tables.
    pub fn width_of(&self, ty: &IsfType) -> Option<usize> {
        match ty {
            IsfType::Base { name } => self.base_types.get(name).map(|b| b.size),
            IsfType::Pointer { .. } => Some(self.base_types.get("pointer").map_or(8, |b| b.size)),
            IsfType::Struct { name } | IsfType::Union { name } | IsfType::Class { name } => {
                self.user_types.get(name).map(|u| u.size)
            }
            IsfType::Enum { name } => self.enums.get(name).map(|e| e.size),
            IsfType::Array { count, subtype } => {
                self.width_of(subtype).and_then(|w| w.checked_mul(*count))
            }
            IsfType::Bitfield { storage, .. } => self.width_of(storage),
            IsfType::Other => None,
        }
    }
}
