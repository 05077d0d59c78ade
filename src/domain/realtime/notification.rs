//! User notifications delivered on the per-user notification channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{Timestamp, UserId};

/// Kind of notification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    System,
    CollaboratorCellTag,
    CollaboratorMultiRowTag,
}

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNotification {
    pub id: String,
    pub to_user_id: UserId,
    pub notify_type: NotificationType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub is_read: bool,
    pub created_time: Timestamp,
}

impl UserNotification {
    /// Creates an unread notification with a fresh id.
    pub fn new(to_user_id: UserId, notify_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            to_user_id,
            notify_type,
            message: message.into(),
            url: None,
            is_read: false,
            created_time: Timestamp::now(),
        }
    }

    /// Link the client opens when the notification is clicked.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
