use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the activities backend on non-2xx responses.
///
/// `detail` is usually a string, but validation failures carry an array of
/// objects instead, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// The detail text, if the server sent a non-empty string.
    pub fn detail_text(&self) -> Option<&str> {
        match &self.detail {
            Some(Value::String(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}
