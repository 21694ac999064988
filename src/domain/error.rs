//! Domain error types.
//!
//! A missing metric is not an error: it is `None` all the way to the
//! report, where it renders as `N/A`.

/// Top-level error type for equidash.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Ticker universe file missing or malformed. Fatal to startup.
    #[error("failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    /// Per-symbol data-provider failure. Contained by the caller.
    #[error("fetch failed for {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn fetch(symbol: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DashboardError::Fetch {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    pub fn data_load(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DashboardError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::Io(_) => 1,
            DashboardError::ConfigParse { .. }
            | DashboardError::ConfigMissing { .. }
            | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::DataLoad { .. } => 3,
            DashboardError::Fetch { .. } | DashboardError::NoData { .. } => 5,
            DashboardError::InvalidDateRange { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_load_message_names_path() {
        let err = DashboardError::data_load("IBOV.csv", "no such file");
        assert_eq!(err.to_string(), "failed to load IBOV.csv: no such file");
    }

    #[test]
    fn fetch_message_names_symbol() {
        let err = DashboardError::fetch("PETR4.SA", "timeout");
        assert_eq!(err.to_string(), "fetch failed for PETR4.SA: timeout");
    }

    #[test]
    fn exit_codes_distinguish_categories() {
        use std::process::ExitCode;
        let load = DashboardError::data_load("x", "y");
        let cfg = DashboardError::ConfigMissing {
            section: "universe".into(),
            key: "path".into(),
        };
        assert_eq!(ExitCode::from(&load), ExitCode::from(3));
        assert_eq!(ExitCode::from(&cfg), ExitCode::from(2));
    }
}
