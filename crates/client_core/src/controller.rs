use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientSettings,
    notifier::{StatusKind, StatusMessage, StatusNotifier},
    view::{confirmation_prompt, ActivityListView, RemoveControl},
    ActivitiesApi, ActivitiesError, HttpActivitiesClient, ViewEvent,
};

pub const SIGNUP_REJECTED_FALLBACK: &str = "An error occurred";
pub const SIGNUP_FAILED_MESSAGE: &str = "Failed to sign up. Please try again.";
pub const UNREGISTER_REJECTED_FALLBACK: &str = "Failed to remove participant";
pub const UNREGISTER_FAILED_MESSAGE: &str = "Failed to remove participant. Please try again.";

pub fn removed_message(participant: &str, activity: &str) -> String {
    format!("{participant} has been removed from {activity}")
}

/// Asks the user to confirm a destructive action.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way without asking.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded(String),
    /// The server answered with a non-success status.
    Rejected(String),
    /// No usable response.
    Failed(String),
    /// The user said no at the confirmation prompt.
    Declined,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded(m) | Self::Rejected(m) | Self::Failed(m) => Some(m),
            Self::Declined => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded { activities: usize },
    Unavailable,
}

/// Owns the list view and the status notifier, and runs the list, signup and
/// unregister flows against an [`ActivitiesApi`].
pub struct ActivitiesController {
    api: Arc<dyn ActivitiesApi>,
    confirm: Arc<dyn ConfirmPrompt>,
    notifier: StatusNotifier,
    list: Mutex<ActivityListView>,
    events: broadcast::Sender<ViewEvent>,
}

impl ActivitiesController {
    pub fn new(
        api: Arc<dyn ActivitiesApi>,
        confirm: Arc<dyn ConfirmPrompt>,
        hide_delay: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            confirm,
            notifier: StatusNotifier::new(hide_delay, events.clone()),
            list: Mutex::new(ActivityListView::default()),
            events,
        })
    }

    pub fn from_settings(
        settings: &ClientSettings,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Result<Arc<Self>, ActivitiesError> {
        let api = HttpActivitiesClient::from_settings(settings)?;
        Ok(Self::new(
            Arc::new(api),
            confirm,
            settings.message_hide_delay(),
        ))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    pub async fn list_view(&self) -> ActivityListView {
        self.list.lock().await.clone()
    }

    pub async fn status(&self) -> StatusMessage {
        self.notifier.current().await
    }

    /// Re-fetches the catalog and rebuilds the list area and selector.
    /// Failures end here: the list area shows the failure notice.
    pub async fn refresh(&self) -> RefreshOutcome {
        match self.api.list_activities().await {
            Ok(catalog) => {
                let view = ActivityListView::from_catalog(&catalog);
                {
                    // Publish under the lock so event order matches store order.
                    let mut guard = self.list.lock().await;
                    *guard = view.clone();
                    let _ = self.events.send(ViewEvent::ListRefreshed(view));
                }
                debug!(activities = catalog.len(), "activity list refreshed");
                RefreshOutcome::Loaded {
                    activities: catalog.len(),
                }
            }
            Err(err) => {
                error!(error = %err, "failed to load activities");
                {
                    let mut guard = self.list.lock().await;
                    guard.mark_unavailable();
                    let _ = self.events.send(ViewEvent::ListRefreshed(guard.clone()));
                }
                RefreshOutcome::Unavailable
            }
        }
    }

    pub async fn submit(&self, participant: &str, activity: &str) -> ActionOutcome {
        match self.api.signup(activity, participant).await {
            Ok(response) => {
                info!(activity, participant, "signed up participant");
                self.notifier
                    .show(response.message.clone(), StatusKind::Success)
                    .await;
                let _ = self.events.send(ViewEvent::FormReset);
                self.refresh().await;
                ActionOutcome::Succeeded(response.message)
            }
            Err(err) if err.is_rejection() => {
                let message = err.detail().unwrap_or(SIGNUP_REJECTED_FALLBACK).to_string();
                warn!(activity, participant, error = %err, detail = %message, "signup rejected");
                self.notifier.show(message.clone(), StatusKind::Error).await;
                ActionOutcome::Rejected(message)
            }
            Err(err) => {
                error!(activity, participant, error = %err, "error signing up");
                self.notifier
                    .show(SIGNUP_FAILED_MESSAGE, StatusKind::Error)
                    .await;
                ActionOutcome::Failed(SIGNUP_FAILED_MESSAGE.to_string())
            }
        }
    }

    /// Only the removal notice auto-hides; errors stay up until the next
    /// message replaces them.
    pub async fn remove(&self, participant: &str, activity: &str) -> ActionOutcome {
        let prompt = confirmation_prompt(participant, activity);
        if !self.confirm.confirm(&prompt).await {
            debug!(activity, participant, "removal declined");
            return ActionOutcome::Declined;
        }

        match self.api.unregister(activity, participant).await {
            Ok(()) => {
                info!(activity, participant, "removed participant");
                let message = removed_message(participant, activity);
                self.notifier.show(message.clone(), StatusKind::Success).await;
                self.refresh().await;
                ActionOutcome::Succeeded(message)
            }
            Err(err) if err.is_rejection() => {
                let message = err
                    .detail()
                    .unwrap_or(UNREGISTER_REJECTED_FALLBACK)
                    .to_string();
                warn!(activity, participant, error = %err, detail = %message, "removal rejected");
                self.notifier
                    .show_sticky(message.clone(), StatusKind::Error)
                    .await;
                ActionOutcome::Rejected(message)
            }
            Err(err) => {
                error!(activity, participant, error = %err, "error removing participant");
                self.notifier
                    .show_sticky(UNREGISTER_FAILED_MESSAGE, StatusKind::Error)
                    .await;
                ActionOutcome::Failed(UNREGISTER_FAILED_MESSAGE.to_string())
            }
        }
    }

    pub async fn remove_control(&self, control: &RemoveControl) -> ActionOutcome {
        self.remove(&control.participant, &control.activity).await
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
