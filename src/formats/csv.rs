//! CSV output formatter
use crate::error::AnalysisError;
use crate::formats::traits::Record;
use csv::Writer;
use std::io::Write;

pub fn write<R, I, W>(records: I, out: &mut W) -> Result<usize, AnalysisError>
where
    R: Record,
    I: IntoIterator<Item = R>,
    W: Write + ?Sized,
{
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(R::headers())?;

    let mut count = 0;
    for record in records {
        wtr.write_record(record.row())?;
        count += 1;
    }

    wtr.flush()?;
    Ok(count)
}
