//! JSON output formatter

use crate::callback::ScanReport;
use crate::error::ScanResult;

/// Convert a scan report to a JSON string
///
/// # Errors
/// Returns an error if serialization fails
pub fn to_json(report: &ScanReport) -> ScanResult<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
