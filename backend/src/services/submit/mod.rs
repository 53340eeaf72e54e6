//! Field-visit report submission.
//!
//! `POST /api/submit` takes a multipart body with a `photograph` file part and the report's
//! text fields. The photograph is validated and stored under the uploads directory, the
//! text fields and the photograph's public URL become one 16-column row, and that row is
//! appended to Google Sheets when service-account credentials resolve, or to the local
//! CSV fallback otherwise.
//!
//! Responses are JSON `{success, message, mode}`: `200` once the row is written, `400` when
//! the photograph is missing or rejected, `500` when storing the file or writing the row
//! fails.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod process;
pub mod row;
pub mod upload;

const API_PATH: &str = "/api";

/// Configures and returns the Actix scope for the submission route.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/submit", post().to(process::process))
}
