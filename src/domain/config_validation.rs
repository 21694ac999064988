//! Configuration validation.
//!
//! Validates all config fields before anything is fetched.

use crate::domain::dates::parse_date_input;
use crate::domain::error::DashboardError;
use crate::domain::universe::parse_delimiter;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const PROVIDERS: [&str; 2] = ["csv", "yahoo"];

pub fn validate_dashboard_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_universe(config)?;
    validate_provider(config)?;
    validate_fetch_dates(config)?;
    validate_initial_per_symbol(config)?;
    validate_selection_dates(config)?;
    Ok(())
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    match config.get_string("universe", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(DashboardError::ConfigMissing {
                section: "universe".to_string(),
                key: "path".to_string(),
            })
        }
    }
    if let Some(delimiter) = config.get_string("universe", "delimiter") {
        if parse_delimiter(&delimiter).is_none() {
            return Err(DashboardError::ConfigInvalid {
                section: "universe".to_string(),
                key: "delimiter".to_string(),
                reason: "delimiter must be a single ASCII character or one of semicolon, comma, tab, pipe"
                    .to_string(),
            });
        }
    }
    Ok(())
}

fn validate_provider(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let provider = config
        .get_string("data", "provider")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();
    if !PROVIDERS.contains(&provider.as_str()) {
        return Err(DashboardError::ConfigInvalid {
            section: "data".to_string(),
            key: "provider".to_string(),
            reason: format!("unknown provider '{}', expected one of {:?}", provider, PROVIDERS),
        });
    }
    if provider == "csv" {
        match config.get_string("data", "path") {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(DashboardError::ConfigMissing {
                    section: "data".to_string(),
                    key: "path".to_string(),
                })
            }
        }
    }
    Ok(())
}

fn validate_fetch_dates(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let start_str = config.get_string("data", "start_date");
    let end_str = config.get_string("data", "end_date");

    let start_date = parse_date("data", start_str.as_deref(), "start_date")?;
    let end_date = parse_date("data", end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(DashboardError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

fn validate_initial_per_symbol(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let value = config.get_double("portfolio", "initial_per_symbol", 1000.0);
    if value <= 0.0 {
        return Err(DashboardError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "initial_per_symbol".to_string(),
            reason: "initial_per_symbol must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_selection_dates(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let start = match config.get_string("dashboard", "start") {
        Some(s) => Some(parse_date("dashboard", Some(&s), "start")?),
        None => None,
    };
    let end = match config.get_string("dashboard", "end") {
        Some(s) => Some(parse_date("dashboard", Some(&s), "end")?),
        None => None,
    };
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(DashboardError::ConfigInvalid {
                section: "dashboard".to_string(),
                key: "start".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
    }
    Ok(())
}

pub fn parse_date(
    section: &str,
    value: Option<&str>,
    field: &str,
) -> Result<NaiveDate, DashboardError> {
    match value {
        None => Err(DashboardError::ConfigMissing {
            section: section.to_string(),
            key: field.to_string(),
        }),
        Some(s) => parse_date_input(s).ok_or_else(|| DashboardError::ConfigInvalid {
            section: section.to_string(),
            key: field.to_string(),
            reason: format!("invalid {} format, expected YYYY-MM-DD or RFC 3339", field),
        }),
    }
}
