use super::{AppendOutcome, REMOTE_SAVED_MESSAGE};
use crate::credentials::{Credentials, SHEETS_SCOPE};
use crate::error::StoreError;
use chrono::Utc;
use common::model::report::ReportRow;
use common::model::store::StoreMode;
use jsonwebtoken::{encode, Algorithm, Header};
use log::info;
use serde::{Deserialize, Serialize};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: [&'a ReportRow; 1],
}

/// Appends rows to a Google Sheets range as a service account.
///
/// Values are sent with `valueInputOption=USER_ENTERED`, so the sheet interprets them
/// (dates and numbers are parsed) instead of storing literal strings. There is no retry:
/// a rejected token, an error status or a timeout is returned to the caller.
pub struct SheetsStore {
    http: reqwest::Client,
    credentials: Credentials,
    spreadsheet_id: String,
    range: String,
    api_base: String,
}

impl SheetsStore {
    pub fn new(
        http: reqwest::Client,
        credentials: Credentials,
        spreadsheet_id: String,
        range: String,
        api_base: String,
    ) -> Self {
        Self {
            http,
            credentials,
            spreadsheet_id,
            range,
            api_base,
        }
    }

    pub fn append_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range)
        )
    }

    /// Exchanges a signed JWT assertion for an access token.
    async fn access_token(&self) -> Result<String, StoreError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.credentials.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.credentials.key_id.clone();
        let assertion = encode(&header, &claims, self.credentials.signing_key())?;

        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Token {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<TokenResponse>().await?.access_token)
    }

    pub async fn append(&self, row: &ReportRow) -> Result<AppendOutcome, StoreError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(self.append_url())
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&AppendBody { values: [row] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let acknowledgment: serde_json::Value = response.json().await?;
        info!(
            "Row appended to spreadsheet {} at {}",
            self.spreadsheet_id,
            acknowledgment
                .pointer("/updates/updatedRange")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown range")
        );

        Ok(AppendOutcome {
            mode: StoreMode::Remote,
            message: REMOTE_SAVED_MESSAGE.to_string(),
            acknowledgment: Some(acknowledgment),
        })
    }
}
