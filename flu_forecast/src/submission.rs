//! Two-column submission output

use crate::engine::Forecast;
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write `Id,<value_column>` rows sorted by identifier
pub fn write_submission<P: AsRef<Path>>(
    path: P,
    forecast: &Forecast,
    value_column: &str,
) -> Result<()> {
    let file = File::create(path)?;
    write_submission_to(file, forecast, value_column)
}

pub fn write_submission_to<W: Write>(
    writer: W,
    forecast: &Forecast,
    value_column: &str,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["Id", value_column])?;

    // Forecast keeps its predictions ordered by identifier
    for prediction in forecast.predictions() {
        writer.write_record([prediction.id.to_string(), prediction.value.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}
