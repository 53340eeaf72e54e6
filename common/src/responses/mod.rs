use crate::model::store::StoreMode;
use serde::{Deserialize, Serialize};

/// Body returned by `POST /api/submit`, for success and failure alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    /// Present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<StoreMode>,
}

impl SubmitResponse {
    pub fn saved(message: impl Into<String>, mode: StoreMode) -> Self {
        Self {
            success: true,
            message: message.into(),
            mode: Some(mode),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            mode: None,
        }
    }
}
