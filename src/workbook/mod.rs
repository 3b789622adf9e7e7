//! Loading workbooks from disk.
//!
//! The engine reads [`Workbook`]s; this module turns files into them.
//! Spreadsheet files (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`) are decoded
//! with calamine, and `.json` files hold a serialized [`Workbook`].
//!
//! # Example
//!
//! ```no_run
//! use bonus_recon::workbook::load_workbook;
//!
//! let workbook = load_workbook("inputs/staff_salary.xlsx")?;
//! println!("Sheets: {:?}", workbook.sheet_names());
//! # Ok::<(), bonus_recon::error::EngineError>(())
//! ```

mod xlsx;

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::Workbook;

pub use xlsx::XlsxSource;

/// Something that can produce a [`Workbook`] from a path.
pub trait WorkbookSource {
    /// Reads the workbook at `path`.
    fn load(&self, path: &Path) -> EngineResult<Workbook>;
}

/// Reads a workbook serialized as JSON (the HTTP payload shape).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSource;

impl WorkbookSource for JsonSource {
    fn load(&self, path: &Path) -> EngineResult<Workbook> {
        let path_str = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| EngineError::WorkbookRead {
            path: path_str.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| EngineError::WorkbookRead {
            path: path_str,
            message: e.to_string(),
        })
    }
}

/// Picks a source by file extension.
pub fn source_for(path: &Path) -> EngineResult<Box<dyn WorkbookSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Box::new(XlsxSource)),
        "json" => Ok(Box::new(JsonSource)),
        _ => Err(EngineError::WorkbookRead {
            path: path.display().to_string(),
            message: format!("unsupported file extension '{}'", extension),
        }),
    }
}

/// Loads a workbook with the source its extension calls for.
pub fn load_workbook<P: AsRef<Path>>(path: P) -> EngineResult<Workbook> {
    let path = path.as_ref();
    source_for(path)?.load(path)
}
