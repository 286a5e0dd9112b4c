//! Backend commands queued from UI to backend worker.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Refresh,
    Signup { email: String, activity: String },
    Unregister { email: String, activity: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Refresh => "refresh",
            BackendCommand::Signup { .. } => "signup",
            BackendCommand::Unregister { .. } => "unregister",
        }
    }
}
