//! Series discovery.
//!
//! Each `*.csv` file directly inside the data directory is one series; the
//! series name is the file stem (`plate_01.csv` -> `plate_01`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// A series file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSource {
    pub name: String,
    pub path: PathBuf,
}

/// List series files in `data_dir`, sorted by series name.
pub fn discover_series(data_dir: &Path) -> Result<Vec<SeriesSource>, AppError> {
    if !data_dir.is_dir() {
        return Err(AppError::new(
            2,
            format!("Data directory not found: {}", data_dir.display()),
        ));
    }

    let entries = fs::read_dir(data_dir).map_err(|e| {
        AppError::new(2, format!("Failed to list '{}': {e}", data_dir.display()))
    })?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() || !is_csv(&path) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("skipping non-UTF-8 file name: {}", path.display());
            continue;
        };
        out.push(SeriesSource {
            name: name.to_string(),
            path,
        });
    }

    if out.is_empty() {
        return Err(AppError::new(
            2,
            format!("No .csv series files found in {}", data_dir.display()),
        ));
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    log::info!("found {} series in {}", out.len(), data_dir.display());
    Ok(out)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}
