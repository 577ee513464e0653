use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::id::{nullable, parse_nullable_id, parse_optional_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub folder_id: Option<Uuid>,
    pub title: String,
    pub subtitle: String,
    /// Markdown.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// "Monday, March 2, 2026"
pub fn default_subtitle(day: NaiveDate) -> String {
    day.format("%A, %B %-d, %Y").to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournal {
    pub folder_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl NewJournal {
    pub fn folder(&self) -> SuiteResult<Option<Uuid>> {
        parse_optional_id(self.folder_id.as_deref(), "folder")
    }

    /// `today` is the local calendar day used for the default subtitle.
    pub fn into_journal(
        self,
        user_id: &str,
        folder_id: Option<Uuid>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> SuiteResult<Journal> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(SuiteError::validation("Title is required"));
        }
        let content = self.content.trim();
        if content.is_empty() {
            return Err(SuiteError::validation("Content is required"));
        }

        let subtitle = self
            .subtitle
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_subtitle(today));

        Ok(Journal {
            id: crate::id::new_id(),
            user_id: user_id.to_string(),
            folder_id,
            title: title.to_string(),
            subtitle,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalChanges {
    #[serde(default, deserialize_with = "nullable")]
    pub folder_id: Option<Option<String>>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: Option<String>,
}

impl JournalChanges {
    pub fn validate(&self) -> SuiteResult<()> {
        if self.title.is_none()
            && self.subtitle.is_none()
            && self.content.is_none()
            && self.folder_id.is_none()
        {
            return Err(SuiteError::validation("Nothing to update"));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(SuiteError::validation("Title cannot be empty"));
        }
        Ok(())
    }

    pub fn folder(&self) -> SuiteResult<Option<Option<Uuid>>> {
        parse_nullable_id(self.folder_id.as_ref(), "folder")
    }

    pub fn apply(self, journal: &mut Journal, folder: Option<Option<Uuid>>, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            journal.title = title.trim().to_string();
        }
        if let Some(subtitle) = self.subtitle {
            journal.subtitle = subtitle.trim().to_string();
        }
        if let Some(content) = self.content {
            journal.content = content.trim().to_string();
        }
        if let Some(folder_id) = folder {
            journal.folder_id = folder_id;
        }
        journal.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn subtitle_defaults_to_long_date() {
        let journal = NewJournal {
            title: "Day one".into(),
            content: " wrote code ".into(),
            subtitle: Some("  ".into()),
            ..Default::default()
        }
        .into_journal("u", None, today(), Utc::now())
        .unwrap();

        assert_eq!(journal.subtitle, "Monday, March 2, 2026");
        assert_eq!(journal.content, "wrote code");
    }

    #[test]
    fn content_is_required() {
        let err = NewJournal {
            title: "Day one".into(),
            ..Default::default()
        }
        .into_journal("u", None, today(), Utc::now())
        .unwrap_err();
        assert_eq!(err.to_string(), "Content is required");
    }

    #[test]
    fn blank_title_update_is_rejected() {
        let changes = JournalChanges {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(changes.validate().unwrap_err().to_string(), "Title cannot be empty");
        assert!(JournalChanges::default().validate().is_err());
    }
}
