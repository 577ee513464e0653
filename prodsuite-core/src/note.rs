use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::reminder::NoteReminder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reminders: Vec<NoteReminder>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewNote {
    pub fn validate(&self) -> SuiteResult<()> {
        if self.title.is_empty() || self.content.is_empty() {
            return Err(SuiteError::validation("Title and content are required"));
        }
        Ok(())
    }
}

/// Partial note update. Empty strings count as "not provided".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteChanges {
    pub fn validated(self) -> SuiteResult<Self> {
        let changes = NoteChanges {
            title: self.title.filter(|t| !t.is_empty()),
            content: self.content.filter(|c| !c.is_empty()),
            tags: self.tags,
        };
        if changes.title.is_none() && changes.content.is_none() && changes.tags.is_none() {
            return Err(SuiteError::validation("Nothing to update"));
        }
        Ok(changes)
    }

    pub fn apply(self, note: &mut Note, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(tags) = self.tags {
            note.tags = tags;
        }
        note.updated_at = now;
    }
}

impl Note {
    pub fn new(user_id: &str, input: NewNote, now: DateTime<Utc>) -> Self {
        Note {
            id: crate::id::new_id(),
            user_id: user_id.to_string(),
            title: input.title,
            content: input.content,
            tags: input.tags,
            reminders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reminder_mut(&mut self, reminder_id: &str) -> Option<&mut NoteReminder> {
        self.reminders.iter_mut().find(|r| r.id == reminder_id)
    }

    /// Display title used in notifications.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled Note"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> Note {
        Note::new(
            "user-1",
            NewNote {
                title: "Groceries".into(),
                content: "milk".into(),
                tags: vec![],
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_note_requires_title_and_content() {
        let input = NewNote {
            title: "Title".into(),
            ..Default::default()
        };
        assert_eq!(
            input.validate().unwrap_err().to_string(),
            "Title and content are required"
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        let changes = NoteChanges {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            changes.validated().unwrap_err().to_string(),
            "Nothing to update"
        );
    }

    #[test]
    fn update_keeps_unset_fields() {
        let mut note = note();
        let later = note.updated_at + chrono::Duration::minutes(1);
        NoteChanges {
            content: Some("eggs".into()),
            ..Default::default()
        }
        .validated()
        .unwrap()
        .apply(&mut note, later);

        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "eggs");
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn untitled_notes_have_a_display_title() {
        let mut note = note();
        note.title.clear();
        assert_eq!(note.display_title(), "Untitled Note");
    }

    #[test]
    fn serializes_mongo_style_id() {
        let note = note();
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["_id"], note.id.to_string());
        assert_eq!(json["userId"], "user-1");
        assert!(json["reminders"].as_array().unwrap().is_empty());
    }
}
