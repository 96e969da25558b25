//! CSV loading for labeled training data.

use crate::error::{AppError, Result};
use crate::ml::models::TrainingRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Load training records from a headered CSV file.
///
/// Columns are matched by header name, so their order in the file is free and
/// extra columns are ignored.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<TrainingRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open dataset {}: {}", path.display(), e),
        ))
    })?;

    let records = read_records(file)?;
    info!(
        path = %path.display(),
        n_records = records.len(),
        "Loaded training dataset"
    );
    Ok(records)
}

/// Parse training records from any CSV source
pub fn read_records<R: Read>(source: R) -> Result<Vec<TrainingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let mut row = csv::StringRecord::new();
    let mut records = Vec::new();

    loop {
        let more = reader.read_record(&mut row).map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            AppError::Dataset(format!("line {}: {}", line, e))
        })?;
        if !more {
            break;
        }

        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let record: TrainingRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| AppError::Dataset(format!("line {}: {}", line, e)))?;

        if record.label.is_empty() {
            return Err(AppError::Dataset(format!("line {}: empty label", line)));
        }
        if let Some(value) = record.features().to_row().iter().find(|v| !v.is_finite()) {
            return Err(AppError::Dataset(format!(
                "line {}: non-finite feature value {}",
                line, value
            )));
        }

        records.push(record);
    }

    if records.is_empty() {
        return Err(AppError::Dataset("dataset contains no records".to_string()));
    }

    debug!(n_records = records.len(), "Parsed CSV records");
    Ok(records)
}
