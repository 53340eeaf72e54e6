use super::{AppendOutcome, LOCAL_SAVED_MESSAGE};
use crate::error::StoreError;
use actix_web::web;
use common::model::report::{ReportRow, COLUMN_HEADERS};
use common::model::store::StoreMode;
use log::info;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Append-only CSV file used when the spreadsheet is not configured.
///
/// The header is written only when the file is new (absent or empty). Two concurrent
/// first writes can both see an empty file; that window is accepted for fallback mode.
#[derive(Debug, Clone)]
pub struct LocalCsvStore {
    path: PathBuf,
}

impl LocalCsvStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, row: &ReportRow) -> Result<AppendOutcome, StoreError> {
        let store = self.clone();
        let row = row.clone();
        web::block(move || store.append_blocking(&row))
            .await
            .map_err(|e| StoreError::Blocking(e.to_string()))??;

        info!("Row appended to {}", self.path().display());
        Ok(AppendOutcome {
            mode: StoreMode::LocalFallback,
            message: LOCAL_SAVED_MESSAGE.to_string(),
            acknowledgment: None,
        })
    }

    pub fn append_blocking(&self, row: &ReportRow) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(COLUMN_HEADERS)?;
        }
        writer.write_record(row.record())?;
        writer.flush()?;
        Ok(())
    }
}
