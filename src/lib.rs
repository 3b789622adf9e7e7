//! Bonus reconciliation engine
//!
//! This crate recomputes an annual payroll bonus from monthly salary
//! workbooks (gross, adjusted gross, register, unpaid, reimbursement, final
//! payable) and compares every stage against the figures HR prepared,
//! within an absolute tolerance.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod workbook;
