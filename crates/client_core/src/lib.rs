use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::ActivityCatalog,
    error::ApiErrorBody,
    protocol::{ParticipantQuery, SignupResponse},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod config;
pub mod controller;
pub mod notifier;
pub mod view;

pub use config::{load_settings, ClientSettings};
pub use controller::{
    ActionOutcome, ActivitiesController, AutoConfirm, ConfirmPrompt, RefreshOutcome,
};
pub use notifier::{StatusKind, StatusMessage, StatusNotifier};
pub use view::{
    render_activity, ActivityCard, ActivityListView, ListArea, ParticipantRow, RemoveControl,
    Roster, SelectionState, SelectorOption,
};

/// Published whenever a piece of view state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ListRefreshed(ActivityListView),
    StatusChanged(StatusMessage),
    /// A signup went through; the form should be cleared.
    FormReset,
}

#[derive(Debug, Error)]
pub enum ActivitiesError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("server url '{0}' cannot be used as an api base")]
    InvalidServerUrl(String),
    #[error("'{0}' cannot be sent as a path segment")]
    InvalidPathSegment(String),
}

impl ActivitiesError {
    /// Server-provided explanation carried by a rejection.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// The three operations the activities backend exposes.
#[async_trait]
pub trait ActivitiesApi: Send + Sync {
    async fn list_activities(&self) -> Result<ActivityCatalog, ActivitiesError>;
    async fn signup(
        &self,
        activity: &str,
        participant: &str,
    ) -> Result<SignupResponse, ActivitiesError>;
    async fn unregister(&self, activity: &str, participant: &str) -> Result<(), ActivitiesError>;
}

pub struct HttpActivitiesClient {
    http: Client,
    base_url: Url,
}

impl HttpActivitiesClient {
    pub fn new(server_url: &str) -> Result<Self, ActivitiesError> {
        Self::with_http_client(server_url, Client::new())
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ActivitiesError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Self::with_http_client(&settings.server_url, http)
    }

    pub fn with_http_client(server_url: &str, http: Client) -> Result<Self, ActivitiesError> {
        let base_url = Url::parse(server_url)
            .map_err(|_| ActivitiesError::InvalidServerUrl(server_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ActivitiesError::InvalidServerUrl(server_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base url. `.` and `..`
    /// would be collapsed by url normalization, so they are refused.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ActivitiesError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ActivitiesError::InvalidPathSegment(segment.to_string()));
        }
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| ActivitiesError::InvalidServerUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ActivitiesError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn rejection(response: Response) -> ActivitiesError {
    let status = response.status().as_u16();
    match read_json::<ApiErrorBody>(response).await {
        Ok(body) => ActivitiesError::Rejected {
            status,
            detail: body.detail_text().map(str::to_owned),
        },
        Err(err) => {
            warn!(status, error = %err, "rejection body was not an error document");
            err
        }
    }
}

#[async_trait]
impl ActivitiesApi for HttpActivitiesClient {
    async fn list_activities(&self) -> Result<ActivityCatalog, ActivitiesError> {
        let url = self.endpoint(&["activities"])?;
        debug!(%url, "fetching activities");
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        read_json(response).await
    }

    async fn signup(
        &self,
        activity: &str,
        participant: &str,
    ) -> Result<SignupResponse, ActivitiesError> {
        let url = self.endpoint(&["activities", activity, "signup"])?;
        let response = self
            .http
            .post(url)
            .query(&ParticipantQuery { email: participant })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        read_json(response).await
    }

    async fn unregister(&self, activity: &str, participant: &str) -> Result<(), ActivitiesError> {
        let url = self.endpoint(&["activities", activity, "unregister"])?;
        let response = self
            .http
            .delete(url)
            .query(&ParticipantQuery { email: participant })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
