use crate::model::delivery::DeliverySummary;
use serde::{Deserialize, Serialize};

/// A row that could not be turned into a certificate, or whose address could not
/// be registered for delivery. `row_index` is 0-based and excludes the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

/// What a finished batch run reports back to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of rows in the dataset, blank rows included.
    pub total_rows: usize,
    /// Number of certificates produced (and archived).
    pub certificates: usize,
    /// Artifact filenames in row order.
    pub filenames: Vec<String>,
    pub errors: Vec<RowError>,
    pub deliveries: DeliverySummary,
    /// The run was stopped through the cancel flag; the output is partial.
    pub cancelled: bool,
}

/// One QR code issued for a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCode {
    pub filename: String,
    pub certificate_id: String,
    pub url: String,
}
