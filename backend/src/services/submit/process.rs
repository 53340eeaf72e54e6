use super::row::build_row_now;
use super::upload::{image_url, read_payload, validate_photograph, ImageStore, SubmissionPayload};
use crate::config::{AppConfig, AppState};
use crate::credentials;
use crate::error::SubmitError;
use crate::storage::{AppendOutcome, BackingStore};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use common::model::report::SubmissionForm;
use common::responses::SubmitResponse;
use log::{debug, error, info, warn};

/// HTTP handler wrapper that converts the pipeline result into a `SubmitResponse`.
pub(crate) async fn process(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> impl Responder {
    match submit_report(&req, payload, &state).await {
        Ok(outcome) => {
            if let Some(ack) = &outcome.acknowledgment {
                debug!("Spreadsheet acknowledgment: {}", ack);
            }
            HttpResponse::Ok().json(SubmitResponse::saved(outcome.message, outcome.mode))
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("Error processing submission: {}", e);
            } else {
                warn!("Rejected submission: {}", e);
            }
            e.error_response()
        }
    }
}

/// Runs one submission end to end.
///
/// A file stored before a failing row write stays on disk; nothing is rolled back.
pub async fn submit_report(
    req: &HttpRequest,
    payload: Multipart,
    state: &AppState,
) -> Result<AppendOutcome, SubmitError> {
    let config = &state.config;
    let SubmissionPayload { fields, photograph } = read_payload(payload).await?;
    let image = validate_photograph(photograph.as_ref(), config.verify_image_content)?;

    let stored_name = ImageStore::new(&config.upload_dir)
        .persist(image, Utc::now().timestamp())
        .await
        .map_err(SubmitError::Upload)?;
    let image_url = image_url(&public_base(req, config), &stored_name);

    let form = SubmissionForm::from_fields(&fields);
    let row = build_row_now(&form, image_url);
    info!("Received submission: {:?} with image {}", form, row.image_url());

    let credentials = credentials::resolve(&config.credentials)?;
    let store = BackingStore::select(credentials, config, &state.http)?;
    debug!("Writing report to {:?} store", store.mode());
    Ok(store.append(&row).await?)
}

fn public_base(req: &HttpRequest, config: &AppConfig) -> String {
    match &config.public_base_url {
        Some(base) => base.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSources;
    use crate::services::files;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use common::model::report::{COLUMN_COUNT, COLUMN_HEADERS};
    use common::model::store::StoreMode;
    use std::path::Path;
    use tempfile::TempDir;

    const BOUNDARY: &str = "----field-visit-boundary";
    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";
    const GIF_BYTES: &[u8] = b"GIF89a\x01\0\x01\0";
    const KEY_JSON: &str = include_str!("../../../tests/fixtures/service_account.json");

    struct Fixture {
        _dir: TempDir,
        config: AppConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let upload_dir = dir.path().join("uploads");
            std::fs::create_dir_all(&upload_dir).unwrap();
            let config = AppConfig {
                upload_dir,
                fallback_csv: dir.path().join("data_backup.csv"),
                credentials: CredentialSources {
                    inline_json: None,
                    file: dir.path().join("service-account.json"),
                },
                ..AppConfig::default()
            };
            Self { _dir: dir, config }
        }

        fn uploads(&self) -> Vec<String> {
            std::fs::read_dir(&self.config.upload_dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        }

        fn csv_records(&self) -> Vec<csv::StringRecord> {
            read_records(&self.config.fallback_csv)
        }
    }

    fn read_records(path: &Path) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(Result::unwrap)
            .collect()
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photograph\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    macro_rules! submit {
        ($app:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/submit")
                .insert_header(("host", "intake.test"))
                .insert_header((
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                ))
                .set_payload($body)
                .to_request();
            let resp = test::call_service($app, req).await;
            let status = resp.status();
            let body: SubmitResponse = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn state(config: &AppConfig) -> web::Data<AppState> {
        web::Data::new(AppState::new(config.clone()).unwrap())
    }

    #[actix_web::test]
    async fn missing_photograph_is_rejected_without_writing_anything() {
        let fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;

        let (status, body) = submit!(&app, multipart_body(&[("srName", "A")], None));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.message, "Photograph is required.");
        assert!(fx.uploads().is_empty());
        assert!(!fx.config.fallback_csv.exists());
    }

    #[actix_web::test]
    async fn disallowed_extensions_are_rejected_without_writing_anything() {
        let fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;

        for filename in ["notes.txt", "photo.PNG.exe", "photo", "script.svg"] {
            let (status, body) =
                submit!(&app, multipart_body(&[], Some((filename, PNG_BYTES))));
            assert_eq!(status, StatusCode::BAD_REQUEST, "{filename}");
            assert_eq!(body.message, "Invalid file type.");
        }
        assert!(fx.uploads().is_empty());
        assert!(!fx.config.fallback_csv.exists());
    }

    #[actix_web::test]
    async fn valid_png_without_credentials_goes_to_local_csv() {
        let fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;

        let fields = [
            ("srName", "A"),
            ("storeName", "B"),
            ("visitType", "Follow-up"),
            ("remarks", "Shelf looks good"),
            ("unknownKey", "ignored"),
        ];
        let (status, body) =
            submit!(&app, multipart_body(&fields, Some(("Photo.PNG", PNG_BYTES))));

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.mode, Some(StoreMode::LocalFallback));
        assert_eq!(
            body.message,
            "Saved to local CSV (Google Sheets not configured)"
        );

        let uploads = fx.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].ends_with("_Photo.PNG"));

        let records = fx.csv_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iter().collect::<Vec<_>>(), COLUMN_HEADERS.to_vec());
        let row = &records[1];
        assert_eq!(row.len(), COLUMN_COUNT);
        assert_eq!(row.get(0).unwrap().len(), "2026-10-17 10:00:00".len());
        assert_eq!(row.get(1), Some("A"));
        assert_eq!(row.get(2), Some("B"));
        assert_eq!(row.get(3), Some("Follow-up"));
        assert_eq!(row.get(5), Some(""));
        assert_eq!(row.get(14), Some("Shelf looks good"));
        assert_eq!(
            row.get(15).map(str::to_string),
            Some(format!("http://intake.test/uploads/{}", uploads[0]))
        );
    }

    #[actix_web::test]
    async fn stored_photograph_is_served_back() {
        let fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes())
                .service(files::uploads_service(&fx.config.upload_dir)),
        )
        .await;

        let (status, _) = submit!(&app, multipart_body(&[], Some(("photo.png", PNG_BYTES))));
        assert_eq!(status, StatusCode::OK);

        let stored = fx.uploads().remove(0);
        let req = test::TestRequest::get()
            .uri(&format!("/uploads/{stored}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await.as_ref(), PNG_BYTES);
    }

    #[actix_web::test]
    async fn repeated_fields_are_joined() {
        let fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;

        let fields = [("products", "Tea"), ("products", "Coffee"), ("srName", "A")];
        let (status, _) =
            submit!(&app, multipart_body(&fields, Some(("photo.png", PNG_BYTES))));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fx.csv_records()[1].get(8), Some("Tea, Coffee"));
    }

    #[actix_web::test]
    async fn content_verification_can_be_disabled() {
        let mut fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;
        let (status, body) = submit!(&app, multipart_body(&[], Some(("photo.png", GIF_BYTES))));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Invalid file type.");

        fx.config.verify_image_content = false;
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;
        let (status, body) = submit!(&app, multipart_body(&[], Some(("photo.png", GIF_BYTES))));
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
    }

    #[actix_web::test]
    async fn backend_failure_is_a_server_error_and_keeps_the_stored_file() {
        let mut fx = Fixture::new();
        fx.config.credentials.inline_json = Some(KEY_JSON.to_string());
        fx.config.spreadsheet_id = None;
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;

        let (status, body) = submit!(&app, multipart_body(&[], Some(("photo.png", PNG_BYTES))));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.success);
        assert_eq!(body.message, "SPREADSHEET_ID is not configured");
        assert_eq!(fx.uploads().len(), 1);
        assert!(!fx.config.fallback_csv.exists());
    }

    #[actix_web::test]
    async fn public_base_url_overrides_request_host() {
        let mut fx = Fixture::new();
        fx.config.public_base_url = Some("https://intake.example.com".into());
        let app = test::init_service(
            App::new()
                .app_data(state(&fx.config))
                .service(super::super::configure_routes()),
        )
        .await;

        let (status, _) = submit!(&app, multipart_body(&[], Some(("photo.png", PNG_BYTES))));

        assert_eq!(status, StatusCode::OK);
        let url = fx.csv_records()[1].get(15).unwrap().to_string();
        assert!(url.starts_with("https://intake.example.com/uploads/"));
    }
}
