//! Calculation logic for the bonus reconciliation engine.
//!
//! This module contains the Software side of a reconciliation: locating
//! headers and months in salary sheets, building per-employee timelines,
//! projecting the partial month, measuring service length, classifying
//! bonus tiers, and evaluating the stage formulas.

mod formula;
mod projection;
mod service;
mod sheet_locator;
mod tier;
mod timeline;

pub use formula::{
    FormulaInputs, PaymentStatus, actual_entitlement, adjusted_gross, evaluate,
};
pub use projection::{
    Projection, ProjectionBasis, gross_record, is_saturated, project, round_money,
};
pub use service::{Eligibility, assess_eligibility, months_of_service};
pub use sheet_locator::{
    find_column, find_header_row, month_key_from_sheet_name, normalize_label, resolve_column,
};
pub use tier::{TierAssignment, TierKind, TierSource, classify};
pub use timeline::{LocatedSheet, SalaryColumns, TimelineBuild, build_timelines, fold_sheet};
