use chrono::{Local, NaiveDateTime};
use common::model::report::{ReportRow, SubmissionForm};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds the row for a report received at `at`.
pub fn build_row(form: &SubmissionForm, image_url: String, at: NaiveDateTime) -> ReportRow {
    ReportRow::new(at.format(TIMESTAMP_FORMAT).to_string(), form, image_url)
}

/// Builds the row stamped with the server's local clock.
pub fn build_row_now(form: &SubmissionForm, image_url: String) -> ReportRow {
    build_row(form, image_url, Local::now().naive_local())
}
