//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use async_trait::async_trait;
use client_core::{ActivitiesController, ClientSettings, ConfirmPrompt};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::{broadcast::error::RecvError, oneshot};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

/// Routes confirmation prompts to the UI thread and waits for the answer.
/// A dismissed or dropped dialog counts as "no".
struct DialogConfirm {
    ui_tx: Sender<UiEvent>,
}

#[async_trait]
impl ConfirmPrompt for DialogConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = UiEvent::ConfirmRequested {
            prompt: prompt.to_string(),
            reply,
        };
        if self.ui_tx.try_send(request).is_err() {
            tracing::warn!("could not deliver confirmation prompt to the ui");
            return false;
        }
        answer.await.unwrap_or(false)
    }
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let confirm = Arc::new(DialogConfirm {
                ui_tx: ui_tx.clone(),
            });
            let controller = match ActivitiesController::from_settings(&settings, confirm) {
                Ok(controller) => controller,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                        "backend worker startup failure: {err}"
                    )));
                    tracing::error!(server_url = %settings.server_url, "failed to build activities client: {err}");
                    return;
                }
            };

            let mut events = controller.subscribe_events();
            let ui_tx_clone = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let _ = ui_tx_clone.try_send(UiEvent::View(event));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "ui event forwarder lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {}",
                settings.server_url
            )));
            {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    controller.refresh().await;
                });
            }

            while let Ok(cmd) = cmd_rx.recv() {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    match cmd {
                        BackendCommand::Refresh => {
                            controller.refresh().await;
                        }
                        BackendCommand::Signup { email, activity } => {
                            controller.submit(&email, &activity).await;
                        }
                        BackendCommand::Unregister { email, activity } => {
                            controller.remove(&email, &activity).await;
                        }
                    }
                });
            }
            tracing::debug!("ui command queue closed; backend worker exiting");
        });
    });
}
