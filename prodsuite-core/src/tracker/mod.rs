//! Habit and metric trackers with one entry per calendar day.

mod stats;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::id::{nullable, parse_nullable_id, parse_optional_id};
use crate::reminder::Frequency;

pub use stats::{TrackerStats, compute_stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerType {
    Binary,
    Numeric,
    Duration,
    Frequency,
    Scale,
    Target,
}

impl TrackerType {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackerType::Binary => "binary",
            TrackerType::Numeric => "numeric",
            TrackerType::Duration => "duration",
            TrackerType::Frequency => "frequency",
            TrackerType::Scale => "scale",
            TrackerType::Target => "target",
        }
    }
}

impl fmt::Display for TrackerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerType {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(TrackerType::Binary),
            "numeric" => Ok(TrackerType::Numeric),
            "duration" => Ok(TrackerType::Duration),
            "frequency" => Ok(TrackerType::Frequency),
            "scale" => Ok(TrackerType::Scale),
            "target" => Ok(TrackerType::Target),
            _ => Err(SuiteError::validation("Valid tracker type is required")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPeriod {
    Week,
    Month,
}

/// Per-type settings. Every field is optional; which ones matter depends on
/// the tracker type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<DurationUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_frequency: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_labels: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_period: Option<TargetPeriod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_notes: Option<bool>,
    /// "HH:MM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracker {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub folder_id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tracker_type: TrackerType,
    pub tags: Vec<String>,
    pub config: TrackerConfig,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTracker {
    pub folder_id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tracker_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub config: TrackerConfig,
}

impl NewTracker {
    pub fn folder(&self) -> SuiteResult<Option<Uuid>> {
        parse_optional_id(self.folder_id.as_deref(), "folder")
    }

    pub fn into_tracker(
        self,
        user_id: &str,
        folder_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> SuiteResult<Tracker> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SuiteError::validation("Tracker name is required"));
        }
        let tracker_type: TrackerType = self
            .tracker_type
            .as_deref()
            .unwrap_or_default()
            .parse()?;

        Ok(Tracker {
            id: crate::id::new_id(),
            user_id: user_id.to_string(),
            folder_id,
            name: name.to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            tracker_type,
            tags: self.tags,
            config: self.config,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerChanges {
    #[serde(default, deserialize_with = "nullable")]
    pub folder_id: Option<Option<String>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub config: Option<TrackerConfig>,
    pub is_active: Option<bool>,
}

impl TrackerChanges {
    pub fn validate(&self) -> SuiteResult<()> {
        let has_name = self.name.as_deref().is_some_and(|n| !n.is_empty());
        let has_description = self.description.as_deref().is_some_and(|d| !d.is_empty());
        if !has_name
            && !has_description
            && self.tags.is_none()
            && self.config.is_none()
            && self.folder_id.is_none()
            && self.is_active.is_none()
        {
            return Err(SuiteError::validation("Nothing to update"));
        }
        Ok(())
    }

    pub fn folder(&self) -> SuiteResult<Option<Option<Uuid>>> {
        parse_nullable_id(self.folder_id.as_ref(), "folder")
    }

    pub fn apply(self, tracker: &mut Tracker, folder: Option<Option<Uuid>>, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            tracker.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            tracker.description = Some(description.trim().to_string());
        }
        if let Some(tags) = self.tags {
            tracker.tags = tags;
        }
        if let Some(config) = self.config {
            tracker.config = config;
        }
        if let Some(folder_id) = folder {
            tracker.folder_id = folder_id;
        }
        if let Some(is_active) = self.is_active {
            tracker.is_active = is_active;
        }
        tracker.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub tracker_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    /// When the entry was last written.
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: EntryValues,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The logged values of an entry. Used both as the stored shape and as a
/// partial update, where `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
}

impl EntryValues {
    /// Overlay the fields set in `update`.
    pub fn merge(&mut self, update: EntryValues) {
        if update.completed.is_some() {
            self.completed = update.completed;
        }
        if update.numeric_value.is_some() {
            self.numeric_value = update.numeric_value;
        }
        if update.duration_value.is_some() {
            self.duration_value = update.duration_value;
        }
        if update.scale_value.is_some() {
            self.scale_value = update.scale_value;
        }
        if update.note.is_some() {
            self.note = update.note;
        }
        if update.skipped.is_some() {
            self.skipped = update.skipped;
        }
    }
}

impl TrackerEntry {
    pub fn new(
        tracker_id: Uuid,
        user_id: &str,
        date: NaiveDate,
        values: EntryValues,
        now: DateTime<Utc>,
    ) -> Self {
        TrackerEntry {
            id: crate::id::new_id(),
            tracker_id,
            user_id: user_id.to_string(),
            date,
            timestamp: now,
            values,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(&mut self, values: EntryValues, now: DateTime<Utc>) {
        self.values.merge(values);
        self.timestamp = now;
        self.updated_at = now;
    }

    /// A day counts as done when it was not skipped and something was logged.
    pub fn is_completed(&self) -> bool {
        let v = &self.values;
        if v.skipped == Some(true) {
            return false;
        }
        v.completed == Some(true)
            || v.numeric_value.is_some_and(|n| n > 0.0)
            || v.duration_value.is_some_and(|d| d > 0.0)
            || v.scale_value.is_some()
    }
}

/// Parse an entry date: `YYYY-MM-DD`, or an RFC 3339 timestamp whose
/// calendar day is taken as-is.
pub fn parse_entry_date(raw: &str) -> SuiteResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| SuiteError::validation(format!("Invalid date: {raw}")))
}

/// Entry listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: u32,
    pub skip: u32,
}

impl Default for EntryQuery {
    fn default() -> Self {
        EntryQuery {
            start: None,
            end: None,
            limit: 100,
            skip: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(values: EntryValues) -> TrackerEntry {
        TrackerEntry::new(
            crate::id::new_id(),
            "user-1",
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            values,
            Utc::now(),
        )
    }

    #[test]
    fn tracker_type_is_required_and_known() {
        let input = NewTracker {
            name: "Water".into(),
            ..Default::default()
        };
        assert_eq!(
            input.into_tracker("u", None, Utc::now()).unwrap_err().to_string(),
            "Valid tracker type is required"
        );

        let input = NewTracker {
            name: " Water ".into(),
            tracker_type: Some("numeric".into()),
            ..Default::default()
        };
        let tracker = input.into_tracker("u", None, Utc::now()).unwrap();
        assert_eq!(tracker.name, "Water");
        assert_eq!(tracker.tracker_type, TrackerType::Numeric);
        assert!(tracker.is_active);
    }

    #[test]
    fn completion_rules() {
        assert!(entry(EntryValues {
            completed: Some(true),
            ..Default::default()
        })
        .is_completed());
        assert!(!entry(EntryValues {
            numeric_value: Some(0.0),
            ..Default::default()
        })
        .is_completed());
        assert!(entry(EntryValues {
            duration_value: Some(15.0),
            ..Default::default()
        })
        .is_completed());
        assert!(entry(EntryValues {
            scale_value: Some(0.0),
            ..Default::default()
        })
        .is_completed());
        assert!(!entry(EntryValues {
            completed: Some(true),
            skipped: Some(true),
            ..Default::default()
        })
        .is_completed());
        assert!(!entry(EntryValues::default()).is_completed());
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut e = entry(EntryValues {
            numeric_value: Some(3.0),
            note: Some("ok".into()),
            ..Default::default()
        });
        e.update(
            EntryValues {
                numeric_value: Some(5.0),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(e.values.numeric_value, Some(5.0));
        assert_eq!(e.values.note.as_deref(), Some("ok"));
    }

    #[test]
    fn entry_dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_entry_date("2026-03-02").unwrap(), expected);
        assert_eq!(parse_entry_date("2026-03-02T00:00:00.000Z").unwrap(), expected);
        assert!(parse_entry_date("yesterday").is_err());
    }

    #[test]
    fn entry_json_flattens_values() {
        let e = entry(EntryValues {
            completed: Some(true),
            ..Default::default()
        });
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["completed"], true);
        assert_eq!(json["date"], "2026-03-02");
        assert!(json.get("numericValue").is_none());
    }

    #[test]
    fn config_omits_unset_fields() {
        let config = TrackerConfig {
            unit: Some("glasses".into()),
            target_value: Some(8.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({ "unit": "glasses", "targetValue": 8.0 }));
    }
}
