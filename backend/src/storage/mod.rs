//! Backing stores for report rows.
//!
//! A row goes to exactly one place: the Google Sheets range when service-account
//! credentials resolve, otherwise the local CSV fallback. [`BackingStore::select`] is the
//! only place that choice is made; running without credentials is a supported mode, not
//! a failure.

mod local_csv;
mod sheets;

pub use local_csv::LocalCsvStore;
pub use sheets::SheetsStore;

use crate::config::AppConfig;
use crate::credentials::Credentials;
use crate::error::StoreError;
use common::model::report::ReportRow;
use common::model::store::StoreMode;
use log::info;

pub const LOCAL_SAVED_MESSAGE: &str = "Saved to local CSV (Google Sheets not configured)";
pub const REMOTE_SAVED_MESSAGE: &str = "Data submitted successfully!";

/// Result of a successful append.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub mode: StoreMode,
    pub message: String,
    /// Response body of the spreadsheet API, absent for local writes.
    pub acknowledgment: Option<serde_json::Value>,
}

pub enum BackingStore {
    Sheets(SheetsStore),
    LocalCsv(LocalCsvStore),
}

impl BackingStore {
    pub fn select(
        credentials: Option<Credentials>,
        config: &AppConfig,
        http: &reqwest::Client,
    ) -> Result<Self, StoreError> {
        match credentials {
            Some(credentials) => {
                info!(
                    "Using {:?} service account credentials for {}",
                    credentials.origin, credentials.client_email
                );
                let spreadsheet_id = config
                    .spreadsheet_id
                    .clone()
                    .ok_or(StoreError::MissingSpreadsheetId)?;
                Ok(BackingStore::Sheets(SheetsStore::new(
                    http.clone(),
                    credentials,
                    spreadsheet_id,
                    config.sheet_range.clone(),
                    config.sheets_api_base.clone(),
                )))
            }
            None => Ok(BackingStore::LocalCsv(LocalCsvStore::new(
                config.fallback_csv.clone(),
            ))),
        }
    }

    pub fn mode(&self) -> StoreMode {
        match self {
            BackingStore::Sheets(_) => StoreMode::Remote,
            BackingStore::LocalCsv(_) => StoreMode::LocalFallback,
        }
    }

    pub async fn append(&self, row: &ReportRow) -> Result<AppendOutcome, StoreError> {
        match self {
            BackingStore::Sheets(store) => store.append(row).await,
            BackingStore::LocalCsv(store) => store.append(row).await,
        }
    }
}
