//! Concrete adapter implementations for ports.

pub mod cache;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod markdown_report;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
