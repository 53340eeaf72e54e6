//! Photograph intake: multipart parsing, validation and storage.
//!
//! The multipart body is drained into text fields and at most one `photograph` file part.
//! A photograph is accepted when its filename is non-empty and ends in one of
//! [`ALLOWED_EXTENSIONS`] (case-insensitive). With content verification enabled the
//! leading bytes must also be an image of that family. Accepted files are written once,
//! under `{unix_secs}_{sanitized name}`, and never overwritten.

use crate::error::ValidationError;
use actix_multipart::{Multipart, MultipartError};
use futures_util::StreamExt;
use image::ImageFormat;
use regex::Regex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub const PHOTOGRAPH_FIELD: &str = "photograph";
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
pub const UPLOADS_PATH: &str = "/uploads";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid pattern"));

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything a submission carried, before validation.
#[derive(Debug, Default)]
pub struct SubmissionPayload {
    pub fields: HashMap<String, String>,
    pub photograph: Option<UploadedImage>,
}

/// Drains the multipart stream.
///
/// Text parts repeated under one name (multi-select checkboxes) are joined with `", "`.
/// A `photograph` part without a filename is not a file and is ignored, as are file parts
/// under any other name.
pub async fn read_payload(mut payload: Multipart) -> Result<SubmissionPayload, MultipartError> {
    let mut submission = SubmissionPayload::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let disposition = field.content_disposition();
        let name = disposition.and_then(|cd| cd.get_name().map(|n| n.to_string()));
        let filename = disposition.and_then(|cd| cd.get_filename().map(|f| f.to_string()));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk?);
        }

        match (name, filename) {
            (Some(name), Some(filename)) if name == PHOTOGRAPH_FIELD => {
                if submission.photograph.is_none() {
                    submission.photograph = Some(UploadedImage { filename, bytes });
                }
            }
            (Some(name), None) => {
                let value = String::from_utf8_lossy(&bytes).into_owned();
                match submission.fields.entry(name) {
                    Entry::Occupied(mut existing) => {
                        let joined = existing.get_mut();
                        joined.push_str(", ");
                        joined.push_str(&value);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// Lower-cased extension after the last `.`, if it is an allowed one.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn content_matches(extension: &str, bytes: &[u8]) -> bool {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => extension == "png",
        Ok(ImageFormat::Jpeg) => extension == "jpg" || extension == "jpeg",
        Ok(ImageFormat::Gif) => extension == "gif",
        _ => false,
    }
}

pub fn validate_photograph(
    photograph: Option<&UploadedImage>,
    verify_content: bool,
) -> Result<&UploadedImage, ValidationError> {
    let image = photograph.ok_or(ValidationError::MissingPhotograph)?;
    if image.filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    let extension =
        allowed_extension(&image.filename).ok_or(ValidationError::InvalidFileType)?;
    if verify_content && !content_matches(&extension, &image.bytes) {
        return Err(ValidationError::InvalidFileType);
    }
    Ok(image)
}

/// Reduces a filename to ASCII letters, digits, `_`, `.` and `-`.
///
/// Path separators become word breaks, whitespace runs become `_`, and leading or
/// trailing dots and underscores are stripped so the result can never name a parent
/// directory or a hidden file.
pub fn secure_filename(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    cleaned
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

pub fn image_url(base: &str, stored_name: &str) -> String {
    format!("{}{}/{}", base.trim_end_matches('/'), UPLOADS_PATH, stored_name)
}

/// Writes accepted photographs into the uploads directory.
pub struct ImageStore<'a> {
    dir: &'a Path,
}

impl<'a> ImageStore<'a> {
    pub fn new(dir: &'a Path) -> Self {
        Self { dir }
    }

    /// Stores the image and returns its file name inside the uploads directory.
    ///
    /// Files are opened with create-new semantics. If the timestamped name is already
    /// taken (same name within the same second) a short random token is added.
    pub async fn persist(&self, image: &UploadedImage, unix_secs: i64) -> io::Result<String> {
        let name = secure_filename(&format!("{}_{}", unix_secs, image.filename));
        match write_new(&self.dir.join(&name), &image.bytes).await {
            Ok(()) => Ok(name),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let token = Uuid::new_v4().simple().to_string();
                let name =
                    secure_filename(&format!("{}_{}_{}", unix_secs, &token[..8], image.filename));
                write_new(&self.dir.join(&name), &image.bytes).await?;
                Ok(name)
            }
            Err(e) => Err(e),
        }
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}
