//! JSONL (JSON Lines) output formatter, one object per line
use crate::error::AnalysisError;
use crate::formats::traits::Record;
use std::io::Write;

pub fn write<R, I, W>(records: I, out: &mut W) -> Result<usize, AnalysisError>
where
    R: Record,
    I: IntoIterator<Item = R>,
    W: Write + ?Sized,
{
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
        count += 1;
    }
    Ok(count)
}
