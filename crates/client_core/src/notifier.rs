use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};

use crate::ViewEvent;

pub const DEFAULT_HIDE_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

impl StatusKind {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub visible: bool,
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: StatusKind::Success,
            visible: false,
        }
    }
}

struct NotifierState {
    message: StatusMessage,
    generation: u64,
    hide_task: Option<JoinHandle<()>>,
}

/// Single status message with an auto-hide timer.
///
/// Showing a message replaces the previous one and restarts the timer; the
/// previous hide task is aborted so it cannot hide the newer message. Sticky
/// messages skip the timer.
#[derive(Clone)]
pub struct StatusNotifier {
    state: Arc<Mutex<NotifierState>>,
    hide_delay: Duration,
    events: broadcast::Sender<ViewEvent>,
}

impl StatusNotifier {
    pub fn new(hide_delay: Duration, events: broadcast::Sender<ViewEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(NotifierState {
                message: StatusMessage::default(),
                generation: 0,
                hide_task: None,
            })),
            hide_delay,
            events,
        }
    }

    pub fn hide_delay(&self) -> Duration {
        self.hide_delay
    }

    pub async fn current(&self) -> StatusMessage {
        self.state.lock().await.message.clone()
    }

    pub async fn show(&self, text: impl Into<String>, kind: StatusKind) {
        self.publish(text.into(), kind, true).await;
    }

    /// Like [`show`](Self::show) but stays up until the next message.
    /// A hide pending from an earlier message is still cancelled.
    pub async fn show_sticky(&self, text: impl Into<String>, kind: StatusKind) {
        self.publish(text.into(), kind, false).await;
    }

    async fn publish(&self, text: String, kind: StatusKind, auto_hide: bool) {
        let message = StatusMessage {
            text,
            kind,
            visible: true,
        };

        let mut state = self.state.lock().await;
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        if let Some(task) = state.hide_task.take() {
            task.abort();
        }
        state.message = message.clone();
        let _ = self.events.send(ViewEvent::StatusChanged(message));
        if !auto_hide {
            return;
        }

        let shared_state = Arc::clone(&self.state);
        let events = self.events.clone();
        let delay = self.hide_delay;
        state.hide_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared_state.lock().await;
            // A newer message may have raced the abort.
            if state.generation != generation {
                return;
            }
            state.message.visible = false;
            state.hide_task = None;
            let _ = events.send(ViewEvent::StatusChanged(state.message.clone()));
        }));
    }
}
