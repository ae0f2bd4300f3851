//! JSON output formatter with run metadata
use crate::error::AnalysisError;
use crate::formats::traits::Record;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OutputWrapper<'p, T> {
    plugin: &'p str,
    timestamp: String,
    count: usize,
    results: Vec<T>,
}

pub fn write<R, I, W>(plugin: &str, records: I, out: &mut W) -> Result<usize, AnalysisError>
where
    R: Record,
    I: IntoIterator<Item = R>,
    W: Write + ?Sized,
{
    let results: Vec<R> = records.into_iter().collect();
    let wrapper = OutputWrapper {
        plugin,
        timestamp: chrono::Utc::now().to_rfc3339(),
        count: results.len(),
        results,
    };

    serde_json::to_writer_pretty(&mut *out, &wrapper)?;
    writeln!(out)?;
    Ok(wrapper.count)
}
