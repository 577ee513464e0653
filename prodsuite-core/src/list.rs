//! Checklists with optional public share links.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::id::{nullable, parse_nullable_id, parse_optional_id};
use crate::tags::or_default_tag;

/// Access granted to holders of a list's share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShareMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "read-only")]
    ReadOnly,
    #[serde(rename = "read-write")]
    ReadWrite,
}

impl ShareMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShareMode::None => "none",
            ShareMode::ReadOnly => "read-only",
            ShareMode::ReadWrite => "read-write",
        }
    }

    pub fn is_shared(self) -> bool {
        !matches!(self, ShareMode::None)
    }
}

impl fmt::Display for ShareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareMode {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ShareMode::None),
            "read-only" => Ok(ShareMode::ReadOnly),
            "read-write" => Ok(ShareMode::ReadWrite),
            _ => Err(SuiteError::validation(format!("Unknown share mode: {s}"))),
        }
    }
}

/// Mode requested when enabling or changing sharing. `none` is not accepted;
/// sharing is switched off through its own operation.
pub fn requested_share_mode(raw: Option<&str>) -> SuiteResult<ShareMode> {
    match raw {
        Some("read-only") => Ok(ShareMode::ReadOnly),
        Some("read-write") => Ok(ShareMode::ReadWrite),
        _ => Err(SuiteError::validation(
            "Valid share mode required (read-only or read-write)",
        )),
    }
}

/// 32 lowercase hex characters.
pub fn generate_share_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub is_complex: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_expanded: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub folder_id: Option<Uuid>,
    pub title: String,
    pub items: Vec<ListItem>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
    pub share_mode: ShareMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub folder_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<ListItem>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewList {
    pub fn folder(&self) -> SuiteResult<Option<Uuid>> {
        parse_optional_id(self.folder_id.as_deref(), "folder")
    }

    /// Build the list; the caller has already checked the folder.
    pub fn into_list(self, user_id: &str, folder_id: Option<Uuid>, now: DateTime<Utc>) -> SuiteResult<List> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(SuiteError::validation("Title is required"));
        }

        Ok(List {
            id: crate::id::new_id(),
            user_id: user_id.to_string(),
            folder_id,
            title: title.to_string(),
            items: self.items,
            tags: or_default_tag(self.tags),
            share_id: None,
            share_mode: ShareMode::None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChanges {
    #[serde(default, deserialize_with = "nullable")]
    pub folder_id: Option<Option<String>>,
    pub title: Option<String>,
    pub items: Option<Vec<ListItem>>,
    pub tags: Option<Vec<String>>,
}

impl ListChanges {
    pub fn validate(&self) -> SuiteResult<()> {
        let has_title = self.title.as_deref().is_some_and(|t| !t.is_empty());
        if !has_title && self.items.is_none() && self.tags.is_none() && self.folder_id.is_none() {
            return Err(SuiteError::validation("Nothing to update"));
        }
        Ok(())
    }

    /// `Some(None)` moves the list to the root.
    pub fn folder(&self) -> SuiteResult<Option<Option<Uuid>>> {
        parse_nullable_id(self.folder_id.as_ref(), "folder")
    }

    pub fn apply(self, list: &mut List, folder: Option<Option<Uuid>>, now: DateTime<Utc>) {
        if let Some(title) = self.title.filter(|t| !t.trim().is_empty()) {
            list.title = title.trim().to_string();
        }
        if let Some(items) = self.items {
            list.items = items;
        }
        if let Some(tags) = self.tags {
            list.tags = or_default_tag(tags);
        }
        if let Some(folder_id) = folder {
            list.folder_id = folder_id;
        }
        list.updated_at = now;
    }
}

/// Edits allowed through a read-write share link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedListChanges {
    pub items: Option<Vec<ListItem>>,
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl SharedListChanges {
    pub fn apply(self, list: &mut List, now: DateTime<Utc>) {
        if let Some(items) = self.items {
            list.items = items;
        }
        if let Some(title) = self.title {
            list.title = title;
        }
        if let Some(tags) = self.tags {
            list.tags = tags;
        }
        list.updated_at = now;
    }
}

impl List {
    pub fn enable_sharing(&mut self, mode: ShareMode, now: DateTime<Utc>) {
        self.share_id = Some(generate_share_id());
        self.share_mode = mode;
        self.updated_at = now;
    }

    pub fn disable_sharing(&mut self, now: DateTime<Utc>) {
        self.share_id = None;
        self.share_mode = ShareMode::None;
        self.updated_at = now;
    }
}
