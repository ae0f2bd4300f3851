//! Output formats for analysis results
pub mod csv;
pub mod json;
pub mod jsonl;
pub mod records;
pub mod table;
pub mod text;
pub mod traits;

pub use traits::{OutputDestination, OutputFormat, OutputWriter, Record};
