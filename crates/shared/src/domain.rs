use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Activities keyed by name, in the order the server listed them.
pub type ActivityCatalog = IndexMap<String, ActivityDetails>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetails {
    pub description: String,
    pub schedule: String,
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

impl ActivityDetails {
    pub fn has_participant(&self, participant: &str) -> bool {
        self.participants.iter().any(|p| p == participant)
    }

    /// Remaining capacity, when the server reports one. Never negative.
    pub fn spots_left(&self) -> Option<u32> {
        let max = self.max_participants?;
        let taken = u32::try_from(self.participants.len()).unwrap_or(u32::MAX);
        Some(max.saturating_sub(taken))
    }
}
