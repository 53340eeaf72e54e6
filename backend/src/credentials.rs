//! Service-account credential resolution.
//!
//! Resolution runs on every write and nothing is cached between requests. The inline key
//! from `GOOGLE_CREDENTIALS_JSON` wins over the key file; a broken inline key is logged and
//! skipped so the file (or, failing that, the local fallback) can still serve the request.
//! Resolving never touches the network: it only parses the key so the spreadsheet client
//! can sign its token request later.

use crate::config::CredentialSources;
use crate::error::CredentialError;
use jsonwebtoken::EncodingKey;
use log::{debug, warn};
use serde::Deserialize;
use std::fmt;
use std::fs;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    Inline,
    File,
}

#[derive(Clone)]
pub struct Credentials {
    pub client_email: String,
    pub token_uri: String,
    pub key_id: Option<String>,
    pub origin: CredentialOrigin,
    signing_key: EncodingKey,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("key_id", &self.key_id)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Parses a service-account JSON key and its RSA private key.
    pub fn from_json(json: &str, origin: CredentialOrigin) -> Result<Self, CredentialError> {
        let key: ServiceAccountKey = serde_json::from_str(json)?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            client_email: key.client_email,
            token_uri: key
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            key_id: key.private_key_id,
            origin,
            signing_key,
        })
    }

    pub fn signing_key(&self) -> &EncodingKey {
        &self.signing_key
    }
}

/// Returns the credentials to use for this write, or `None` to select the local fallback.
pub fn resolve(sources: &CredentialSources) -> Result<Option<Credentials>, CredentialError> {
    if let Some(inline) = sources.inline_json.as_deref() {
        match Credentials::from_json(inline, CredentialOrigin::Inline) {
            Ok(credentials) => return Ok(Some(credentials)),
            Err(e) => warn!("Error loading GOOGLE_CREDENTIALS_JSON: {}", e),
        }
    }

    if !sources.file.exists() {
        debug!(
            "No credentials found ({} absent), using local fallback",
            sources.file.display()
        );
        return Ok(None);
    }

    let json = fs::read_to_string(&sources.file).map_err(|source| CredentialError::Io {
        path: sources.file.display().to_string(),
        source,
    })?;
    Credentials::from_json(&json, CredentialOrigin::File).map(Some)
}
