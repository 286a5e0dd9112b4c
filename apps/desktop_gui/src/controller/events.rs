//! Events flowing from the backend worker to the UI thread.

use client_core::ViewEvent;
use tokio::sync::oneshot;

pub enum UiEvent {
    Info(String),
    /// The worker could not start; nothing will be served.
    BackendFailed(String),
    View(ViewEvent),
    ConfirmRequested {
        prompt: String,
        reply: oneshot::Sender<bool>,
    },
}
