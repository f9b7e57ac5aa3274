//! In-app notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, Record};

/// A notification shown in the local inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: EntityId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    /// Task this notification refers to, if any
    #[serde(default)]
    pub task_id: Option<EntityId>,
}

impl Notification {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        task_id: Option<EntityId>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            title: title.into(),
            message: message.into(),
            read: false,
            created_at: Utc::now(),
            task_id,
        }
    }
}

impl Record for Notification {
    const TABLE: &'static str = "notifications";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
