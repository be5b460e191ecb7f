//! Plain-text numeric tables.
//!
//! One record per line, tab-separated columns, no header. Each column can
//! carry a unit factor: values are divided by it on write and multiplied by
//! it on read. Lines starting with `#` are ignored on read.

use std::fs::File;
use std::path::Path;

use crate::error::AppError;

/// Row-by-row table writer. Every row is flushed immediately so partial
/// results survive a crash.
pub struct TableWriter {
    writer: csv::Writer<File>,
    units: Vec<f64>,
    path: String,
}

impl TableWriter {
    pub fn create(path: &Path, units: &[f64]) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::input(format!("Failed to create folder '{}': {e}", parent.display()))
                })?;
            }
        }
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)
            .map_err(|e| AppError::input(format!("Failed to create table '{}': {e}", path.display())))?;
        Ok(Self {
            writer,
            units: units.to_vec(),
            path: path.display().to_string(),
        })
    }

    pub fn write_row(&mut self, row: &[f64]) -> Result<(), AppError> {
        if !self.units.is_empty() && row.len() != self.units.len() {
            return Err(AppError::input(format!(
                "Row has {} columns but table '{}' has {} units.",
                row.len(),
                self.path,
                self.units.len()
            )));
        }
        let fields = row.iter().enumerate().map(|(k, &v)| {
            let unit = self.units.get(k).copied().unwrap_or(1.0);
            format!("{:e}", v / unit)
        });
        self.writer
            .write_record(fields)
            .map_err(|e| AppError::input(format!("Failed to write row to '{}': {e}", self.path)))?;
        self.writer
            .flush()
            .map_err(|e| AppError::input(format!("Failed to flush '{}': {e}", self.path)))
    }
}

/// Write a whole table.
pub fn write_table(path: &Path, rows: &[Vec<f64>], units: &[f64]) -> Result<(), AppError> {
    let mut writer = TableWriter::create(path, units)?;
    for row in rows {
        writer.write_row(row)?;
    }
    Ok(())
}

/// Read a whole table. With units, every row must have one value per unit;
/// without, all rows must have the same length.
pub fn read_table(path: &Path, units: &[f64]) -> Result<Vec<Vec<f64>>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| AppError::input(format!("Failed to open table '{}': {e}", path.display())))?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::input(format!("Failed to read '{}': {e}", path.display())))?;
        let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);

        let mut row = Vec::with_capacity(record.len());
        for (k, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|e| {
                AppError::input(format!(
                    "Invalid number '{field}' in '{}' line {line}: {e}",
                    path.display()
                ))
            })?;
            row.push(value * units.get(k).copied().unwrap_or(1.0));
        }

        let expected = if units.is_empty() { rows.first().map(Vec::len) } else { Some(units.len()) };
        if let Some(expected) = expected {
            if row.len() != expected {
                return Err(AppError::input(format!(
                    "Line {line} of '{}' has {} columns, expected {expected}.",
                    path.display(),
                    row.len()
                )));
            }
        }
        rows.push(row);
    }
    Ok(rows)
}
