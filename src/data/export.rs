use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::ObservationTable;

/// Write the rows at `indices` as CSV, using the presented headers and the
/// same cell text the table shows.
pub fn write_csv<W: Write>(table: &ObservationTable, indices: &[usize], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.columns.iter().map(|c| c.label()))
        .context("writing CSV header")?;
    for &i in indices {
        let record = &table.records[i];
        out.write_record(table.columns.iter().map(|&c| record.cell_text(c)))
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    out.flush().context("flushing CSV")?;
    Ok(())
}

pub fn export_file(table: &ObservationTable, indices: &[usize], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, indices, file)?;
    log::info!("Exported {} observations to {}", indices.len(), path.display());
    Ok(())
}
