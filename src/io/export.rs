//! Result files of a run folder.
//!
//! - `p_values.txt`: mass [GeV], coupling [cm^2], p-value; mass-major
//! - `p_grid.txt`: raw grid, one line per coupling, one column per mass
//! - `Limit_<CL>.txt`: mass [GeV], coupling limit [cm^2] from the grid
//! - `Reflection_Limit_<CL>.txt`: the same from the direct root finder

use std::path::{Path, PathBuf};

use nalgebra::DMatrix;
use tracing::info;

use crate::domain::units::{CM2, GEV};
use crate::domain::{LimitPoint, certainty_label};
use crate::error::AppError;
use crate::io::table::{TableWriter, read_table, write_table};
use crate::scan::{DirectLimit, LimitCurve, LimitSink, ParameterGrid};

pub const P_VALUES_FILE: &str = "p_values.txt";
pub const P_GRID_FILE: &str = "p_grid.txt";

const P_VALUE_UNITS: [f64; 3] = [GEV, CM2, 1.0];
const LIMIT_UNITS: [f64; 2] = [GEV, CM2];

pub fn limit_file_name(certainty_level: f64) -> String {
    format!("Limit_{}.txt", certainty_label(certainty_level))
}

pub fn reflection_limit_file_name(certainty_level: f64) -> String {
    format!("Reflection_Limit_{}.txt", certainty_label(certainty_level))
}

/// Write `p_values.txt` and `p_grid.txt` into `dir`.
pub fn export_p_values(grid: &ParameterGrid, dir: &Path) -> Result<(), AppError> {
    let mut table = Vec::with_capacity(grid.n_masses() * grid.n_couplings());
    for i in 0..grid.n_masses() {
        for j in 0..grid.n_couplings() {
            table.push(vec![grid.mass(i), grid.coupling(j), grid.p_value(j, i)]);
        }
    }
    write_table(&dir.join(P_VALUES_FILE), &table, &P_VALUE_UNITS)?;

    let raw: Vec<Vec<f64>> = grid
        .p_values()
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();
    write_table(&dir.join(P_GRID_FILE), &raw, &[])?;

    info!(dir = %dir.display(), cells = table.len(), "exported p-values");
    Ok(())
}

/// Replace the grid's axes and p-values with the contents of `p_values.txt`.
///
/// The mass axis is the sorted set of distinct masses in the file, and the
/// number of couplings follows from the row count. The couplings are read
/// from the first mass block.
pub fn import_p_values(grid: &mut ParameterGrid, dir: &Path) -> Result<(), AppError> {
    let path = dir.join(P_VALUES_FILE);
    let table = read_table(&path, &P_VALUE_UNITS)?;

    let mut masses: Vec<f64> = table.iter().map(|row| row[0]).collect();
    masses.sort_by(f64::total_cmp);
    masses.dedup();

    let n_masses = masses.len();
    if n_masses == 0 {
        return Err(AppError::input(format!("'{}' contains no p-values.", path.display())));
    }
    if table.len() % n_masses != 0 {
        return Err(AppError::input(format!(
            "'{}' has {} rows, not a multiple of its {n_masses} distinct masses.",
            path.display(),
            table.len()
        )));
    }
    let n_couplings = table.len() / n_masses;

    let couplings: Vec<f64> = table[..n_couplings].iter().map(|row| row[1]).collect();
    let p_values = DMatrix::from_fn(n_couplings, n_masses, |j, i| table[i * n_couplings + j][2]);
    grid.replace(masses, couplings, p_values)?;

    info!(path = %path.display(), n_masses, n_couplings, "imported p-values");
    Ok(())
}

pub fn write_limit_curve(path: &Path, curve: &[LimitPoint]) -> Result<(), AppError> {
    let rows: Vec<Vec<f64>> = curve.iter().map(|p| vec![p.mass, p.coupling]).collect();
    write_table(path, &rows, &LIMIT_UNITS)
}

/// Write `Limit_<CL>.txt` for each curve and return the paths written.
pub fn export_limits(dir: &Path, curves: &[LimitCurve]) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::with_capacity(curves.len());
    for curve in curves {
        let path = dir.join(limit_file_name(curve.certainty_level));
        write_limit_curve(&path, &curve.points)?;
        info!(path = %path.display(), points = curve.points.len(), "exported limit curve");
        paths.push(path);
    }
    Ok(paths)
}

/// Bulk export of a direct-limit session.
pub fn export_direct_curve(direct: &DirectLimit, dir: &Path) -> Result<PathBuf, AppError> {
    let path = dir.join(reflection_limit_file_name(direct.certainty_level()));
    write_limit_curve(&path, &direct.curve())?;
    Ok(path)
}

/// Writes each direct limit to disk as soon as it is found.
pub struct LimitFileWriter {
    table: TableWriter,
    path: PathBuf,
}

impl LimitFileWriter {
    pub fn create(path: &Path) -> Result<Self, AppError> {
        Ok(Self {
            table: TableWriter::create(path, &LIMIT_UNITS)?,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LimitSink for LimitFileWriter {
    fn record(&mut self, point: LimitPoint) -> Result<(), AppError> {
        self.table.write_row(&[point.mass, point.coupling])
    }
}
