//! Output format traits and the writer that dispatches on them
use crate::error::AnalysisError;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// A result row every format knows how to render.
pub trait Record: Serialize {
    /// CSV and table column names.
    fn headers() -> &'static [&'static str];

    /// Cells in [`Record::headers`] order.
    fn row(&self) -> Vec<String>;

    /// One line of the plain text report.
    fn text_line(&self) -> String;
}

/// Enum for output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Table,
    Csv,
    Json,
    Jsonl,
}

/// Enum for output destination
#[derive(Debug, Clone)]
pub enum OutputDestination {
    Stdout,
    File(std::path::PathBuf),
}

/// Output writer that combines format and destination
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    destination: OutputDestination,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, destination: OutputDestination) -> Self {
        Self {
            format,
            destination,
        }
    }

    /// Write `records` to the configured destination. Streaming formats
    /// emit each record as it is produced. Returns the record count.
    pub fn write<R, I>(&self, plugin: &str, records: I) -> Result<usize, AnalysisError>
    where
        R: Record,
        I: IntoIterator<Item = R>,
    {
        let mut out: Box<dyn Write> = match &self.destination {
            OutputDestination::Stdout => Box::new(BufWriter::new(io::stdout().lock())),
            OutputDestination::File(path) => Box::new(BufWriter::new(File::create(path)?)),
        };
        let count = self.write_to(plugin, records, &mut out)?;
        out.flush()?;
        Ok(count)
    }

    pub fn write_to<R, I, W>(&self, plugin: &str, records: I, out: &mut W) -> Result<usize, AnalysisError>
    where
        R: Record,
        I: IntoIterator<Item = R>,
        W: Write + ?Sized,
    {
        let count = match self.format {
            OutputFormat::Text => crate::formats::text::write(records, out)?,
            OutputFormat::Table => crate::formats::table::write(records, out)?,
            OutputFormat::Csv => crate::formats::csv::write(records, out)?,
            OutputFormat::Json => crate::formats::json::write(plugin, records, out)?,
            OutputFormat::Jsonl => crate::formats::jsonl::write(records, out)?,
        };
        log::info!("{}: {} record(s) written as {:?}", plugin, count, self.format);
        Ok(count)
    }
}
