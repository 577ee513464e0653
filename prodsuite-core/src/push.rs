//! Web Push subscriptions and notification payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{SuiteError, SuiteResult};
use crate::note::Note;
use crate::reminder::NoteReminder;

const NOTIFICATION_ICON: &str = "/icon-192x192.png";
const NOTIFICATION_BADGE: &str = "/badge-72x72.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: Option<String>,
    pub auth: Option<String>,
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionInput {
    pub endpoint: Option<String>,
    pub keys: Option<SubscriptionKeys>,
}

impl SubscriptionInput {
    pub fn into_subscription(self, user_id: &str, now: DateTime<Utc>) -> SuiteResult<PushSubscription> {
        let invalid = || SuiteError::validation("Invalid subscription object");
        let endpoint = self.endpoint.filter(|e| !e.is_empty()).ok_or_else(invalid)?;
        let keys = self.keys.ok_or_else(invalid)?;
        let p256dh = keys.p256dh.filter(|k| !k.is_empty()).ok_or_else(invalid)?;
        let auth = keys.auth.filter(|k| !k.is_empty()).ok_or_else(invalid)?;

        Ok(PushSubscription {
            user_id: user_id.to_string(),
            endpoint,
            p256dh,
            auth,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub note_id: Option<String>,
    pub reminder_id: Option<String>,
    pub data: Map<String, Value>,
}

impl NotificationPayload {
    pub fn for_reminder(note: &Note, reminder: &NoteReminder) -> Self {
        let note_id = note.id.to_string();
        let mut data = Map::new();
        data.insert("url".into(), Value::String(format!("/notes?view={note_id}")));

        NotificationPayload {
            title: "🔔 Reminder".to_string(),
            body: note.display_title().to_string(),
            tag: format!("reminder-{note_id}-{}", reminder.id),
            note_id: Some(note_id),
            reminder_id: Some(reminder.id.clone()),
            data,
        }
    }

    pub fn test() -> Self {
        NotificationPayload {
            title: "Test Notification".to_string(),
            body: "This is a test notification from your notes app!".to_string(),
            tag: "test-notification".to_string(),
            note_id: Some("test".to_string()),
            reminder_id: Some("test".to_string()),
            data: Map::new(),
        }
    }

    /// JSON body handed to the service worker.
    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        data.insert("noteId".into(), json!(self.note_id));
        data.insert("reminderId".into(), json!(self.reminder_id));
        data.extend(self.data.clone());

        json!({
            "title": self.title,
            "body": self.body,
            "icon": NOTIFICATION_ICON,
            "badge": NOTIFICATION_BADGE,
            "tag": self.tag,
            "data": data,
        })
    }
}
