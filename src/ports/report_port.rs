//! Presentation port: renders the output of a dashboard pass.

use crate::domain::dashboard::{FundamentalsDashboard, PriceDashboard};
use crate::domain::error::DashboardError;
use std::path::Path;

pub trait ReportPort {
    fn write_prices(
        &self,
        dashboard: &PriceDashboard,
        output_path: &Path,
    ) -> Result<(), DashboardError>;

    fn write_fundamentals(
        &self,
        dashboard: &FundamentalsDashboard,
        output_path: &Path,
    ) -> Result<(), DashboardError>;
}
