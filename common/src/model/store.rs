use serde::{Deserialize, Serialize};

/// Which backing store accepted a report.
///
/// The wire names match what the intake front-end already understands: `real` when
/// the row went to the spreadsheet, `mock` when it landed in the local fallback file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreMode {
    #[serde(rename = "real")]
    Remote,
    #[serde(rename = "mock")]
    LocalFallback,
}
