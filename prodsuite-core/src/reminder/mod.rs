//! Note reminders: one-shot and recurring notification rules.
//!
//! Reminders are stored as UTC instants. Recurrence math happens in the
//! wall-clock time of a caller-supplied zone, see [`recurrence`].

mod display;
pub mod recurrence;
mod validate;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub use display::format_reminder_display;
pub use recurrence::{
    MAX_PREVIEW_OCCURRENCES, count_recurring_reminders, next_occurrence, next_reminder,
    occurrences,
};
pub use validate::{ReminderError, validate_reminder_form};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// How a recurring reminder repeats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    pub frequency: Frequency,
    pub interval: u32,
    /// 0 = Sunday, 6 = Saturday. Only meaningful for weekly patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteReminder {
    pub id: String,
    pub enabled: bool,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurringPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
}

/// Raw reminder input as entered by the user, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderForm {
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recurring: bool,
    pub frequency: Option<Frequency>,
    pub interval: Option<u32>,
    pub days_of_week: Option<Vec<u8>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ReminderForm {
    /// The recurrence described by the form, if it is complete.
    pub fn pattern(&self) -> Option<RecurringPattern> {
        if !self.is_recurring {
            return None;
        }
        let frequency = self.frequency?;
        let interval = self.interval.filter(|i| *i >= 1)?;
        let end_date = self.end_date?;

        let days_of_week = match frequency {
            Frequency::Weekly => self.days_of_week.clone().filter(|d| !d.is_empty()),
            _ => None,
        };

        Some(RecurringPattern {
            frequency,
            interval,
            days_of_week,
            end_date,
        })
    }
}

/// `"<unix millis>-<9 base36 chars>"`
pub fn generate_reminder_id() -> String {
    crate::id::timestamped_id()
}

/// Build an enabled reminder from a form. Callers validate first.
pub fn create_reminder(form: &ReminderForm, now: DateTime<Utc>) -> Option<NoteReminder> {
    let date_time = form.date_time?;
    let recurring_pattern = form.pattern();

    Some(NoteReminder {
        id: generate_reminder_id(),
        enabled: true,
        date_time,
        is_recurring: form.is_recurring,
        recurring_pattern,
        completed_at: None,
        last_modified: now,
    })
}

/// A completed, disabled reminder can be switched back on with a new time.
pub fn can_reactivate_reminder(reminder: &NoteReminder) -> bool {
    !reminder.enabled && reminder.completed_at.is_some()
}

fn truncate_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

impl NoteReminder {
    /// True when the reminder is enabled and its minute has arrived.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && truncate_to_minute(self.date_time) <= truncate_to_minute(now)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.enabled = false;
        self.completed_at = Some(now);
        self.last_modified = now;
    }

    pub fn reactivate(&mut self, date_time: DateTime<Utc>, now: DateTime<Utc>) {
        self.enabled = true;
        self.date_time = date_time;
        self.completed_at = None;
        self.last_modified = now;
    }
}
