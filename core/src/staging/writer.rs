use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use tracing::debug;

use crate::errors::Result;
use crate::source::{Cell, DeltaBatch};

/// Writes the delta as headerless CSV with minimal quoting.
pub fn write_delta<W: Write>(out: W, batch: &DeltaBatch) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    for row in &batch.rows {
        writer.write_record(row.cells.iter().map(Cell::to_csv_field))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the delta to `path`, replacing any previous file, and returns the
/// number of bytes written.
pub fn write_delta_file(path: &Path, batch: &DeltaBatch) -> Result<u64> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_delta(file, batch)?;

    let bytes = std::fs::metadata(path)?.len();
    debug!("Wrote {} rows ({} bytes) to {}", batch.len(), bytes, path.display());
    Ok(bytes)
}
