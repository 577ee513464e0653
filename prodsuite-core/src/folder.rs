//! Folders group lists, trackers, drawings and journals.
//!
//! Each feature has its own folder namespace; a folder of one kind never
//! holds documents of another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderKind {
    List,
    Tracker,
    Drawing,
    Journal,
}

impl FolderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FolderKind::List => "list",
            FolderKind::Tracker => "tracker",
            FolderKind::Drawing => "drawing",
            FolderKind::Journal => "journal",
        }
    }

    /// Plural name of the documents stored in this kind of folder.
    pub fn contents(self) -> &'static str {
        match self {
            FolderKind::List => "lists",
            FolderKind::Tracker => "trackers",
            FolderKind::Drawing => "drawings",
            FolderKind::Journal => "journals",
        }
    }

    pub fn not_empty_error(self) -> SuiteError {
        let contents = self.contents();
        SuiteError::validation(format!(
            "Cannot delete folder with {contents}. Please move or delete {contents} first."
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFolder {
    #[serde(default)]
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewFolder {
    pub fn into_folder(self, user_id: &str, now: DateTime<Utc>) -> SuiteResult<Folder> {
        Ok(Folder {
            id: crate::id::new_id(),
            user_id: user_id.to_string(),
            name: folder_name(&self.name)?,
            color: self.color,
            icon: self.icon,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial folder update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderChanges {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl FolderChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.icon.is_none()
    }

    /// Trim the name, rejecting a blank one.
    pub fn validated(mut self) -> SuiteResult<Self> {
        if let Some(name) = self.name.take() {
            self.name = Some(folder_name(&name)?);
        }
        Ok(self)
    }

    pub fn apply(self, folder: &mut Folder, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            folder.name = name;
        }
        if self.color.is_some() {
            folder.color = self.color;
        }
        if self.icon.is_some() {
            folder.icon = self.icon;
        }
        folder.updated_at = now;
    }
}

/// Trimmed folder name; blank names are rejected.
pub fn folder_name(raw: &str) -> SuiteResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SuiteError::validation("Folder name is required"));
    }
    Ok(name.to_string())
}
