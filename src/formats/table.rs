//! Table output formatter; buffers every record to size the columns
use crate::error::AnalysisError;
use crate::formats::traits::Record;
use prettytable::{Cell, Row, Table};
use std::io::Write;

pub fn write<R, I, W>(records: I, out: &mut W) -> Result<usize, AnalysisError>
where
    R: Record,
    I: IntoIterator<Item = R>,
    W: Write + ?Sized,
{
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        R::headers()
            .iter()
            .map(|h| Cell::new(&h.to_uppercase()).style_spec("c"))
            .collect(),
    ));

    let mut count = 0;
    for record in records {
        table.add_row(Row::new(record.row().iter().map(|c| Cell::new(c)).collect()));
        count += 1;
    }

    write!(out, "{}", table)?;
    Ok(count)
}
