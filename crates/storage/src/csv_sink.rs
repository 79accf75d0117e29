use std::path::Path;

use tracing::debug;

use sluice_core::{Dataset, PipelineError};

/// Write `ds` to `path` with a header row, replacing any existing file.
///
/// Missing cells are empty fields. Returns the size of the written file.
pub fn write_csv(ds: &Dataset, path: &Path) -> Result<u64, PipelineError> {
    let io_err = |e: &dyn std::fmt::Display| PipelineError::io(path.display(), e);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(&e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(&e))?;
    if ds.num_columns() > 0 {
        writer.write_record(ds.column_names()).map_err(|e| io_err(&e))?;
    }
    for row in ds.rows() {
        let fields = row.into_iter().map(|cell| cell.map(|v| v.to_string()).unwrap_or_default());
        writer.write_record(fields).map_err(|e| io_err(&e))?;
    }
    writer.flush().map_err(|e| io_err(&e))?;
    drop(writer);

    let bytes = std::fs::metadata(path).map_err(|e| io_err(&e))?.len();
    debug!(path = %path.display(), rows = ds.num_rows(), bytes, "Wrote CSV");
    Ok(bytes)
}
