use serde::{Deserialize, Serialize};

/// Body of a successful `POST /activities/{name}/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
}

/// Body of a successful `DELETE /activities/{name}/unregister`. The client
/// does not require it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantQuery<'a> {
    pub email: &'a str,
}
