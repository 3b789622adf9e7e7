//! Configuration loading and management for the bonus reconciliation engine.
//!
//! This module loads the bonus policy, the per-employee override table, and
//! the column layouts of every input workbook from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use bonus_recon::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/bonus_2025").unwrap();
//! println!("Reference date: {}", config.policy().reference_date);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BonusConfig, BonusPolicy, ColumnRef, HrLayout, HrSheetLayout, LayoutConfig, LedgerLayout,
    OverrideSheetLayout, OverrideTable, SalaryLayout, ServiceTier,
};
