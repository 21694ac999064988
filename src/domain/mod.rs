//! Core domain types and logic.

pub mod symbol;
pub mod dates;
pub mod price;
pub mod fundamentals;
pub mod valuation;
pub mod performance;
pub mod universe;
pub mod dashboard;
pub mod config_validation;
pub mod error;
