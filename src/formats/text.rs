//! Plain text output: one fixed-column line per record, no header
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
        writeln!(out, "{}", record.text_line())?;
        count += 1;
    }
    Ok(count)
}
