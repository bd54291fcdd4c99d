//! Report generation port.

use crate::domain::cycle::CycleReport;
use crate::domain::error::NiftyShopError;

/// Port for writing the outcome of a decision cycle.
pub trait ReportPort {
    fn write(&self, report: &CycleReport, output_path: &str) -> Result<(), NiftyShopError>;
}
