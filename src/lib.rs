//! Library crate for memnetstat: socket reconstruction from Linux memory images

// Allow clippy lints that would require significant refactoring
#![allow(clippy::new_without_default)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::redundant_closure)]
#![allow(clippy::unnecessary_cast)]
#![allow(clippy::doc_lazy_continuation)]

pub mod error;
pub mod formats;
pub mod kernel;
pub mod memory;
pub mod net;
pub mod plugins;
pub mod translation;

#[cfg(test)]
pub(crate) mod testing;

// Core modules
pub mod core {
    pub mod dwarf;
    pub mod overlay;
    pub mod profile;
}

// CLI modules
pub mod cli {
    pub mod args;
}
