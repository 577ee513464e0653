use chrono::{DateTime, Months, Utc};
use thiserror::Error;

use super::{Frequency, ReminderForm};
use crate::error::SuiteError;

/// Why a reminder form was rejected. Messages are shown to users as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    #[error("Date and time are required")]
    MissingDateTime,

    #[error("Reminder must be in the future")]
    NotInFuture,

    #[error("Frequency is required for recurring reminders")]
    MissingFrequency,

    #[error("Interval must be at least 1")]
    InvalidInterval,

    #[error("End date is required for recurring reminders")]
    MissingEndDate,

    #[error("End date must be after start date")]
    EndBeforeStart,

    #[error("End date cannot be more than 12 months from start date")]
    EndTooFar,

    #[error("At least one day must be selected for weekly reminders")]
    MissingWeekdays,

    #[error("Days of week must be between 0 (Sunday) and 6 (Saturday)")]
    InvalidWeekday,
}

impl From<ReminderError> for SuiteError {
    fn from(err: ReminderError) -> Self {
        SuiteError::Validation(err.to_string())
    }
}

/// Check a form against `now`. The first failing rule wins.
pub fn validate_reminder_form(form: &ReminderForm, now: DateTime<Utc>) -> Result<(), ReminderError> {
    let date_time = form.date_time.ok_or(ReminderError::MissingDateTime)?;

    if date_time <= now {
        return Err(ReminderError::NotInFuture);
    }

    if !form.is_recurring {
        return Ok(());
    }

    let frequency = form.frequency.ok_or(ReminderError::MissingFrequency)?;

    if form.interval.is_none_or(|i| i < 1) {
        return Err(ReminderError::InvalidInterval);
    }

    let end_date = form.end_date.ok_or(ReminderError::MissingEndDate)?;

    if end_date <= date_time {
        return Err(ReminderError::EndBeforeStart);
    }

    let latest_end = date_time
        .checked_add_months(Months::new(12))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if end_date > latest_end {
        return Err(ReminderError::EndTooFar);
    }

    if frequency == Frequency::Weekly {
        let days = form.days_of_week.as_deref().unwrap_or_default();
        if days.is_empty() {
            return Err(ReminderError::MissingWeekdays);
        }
        if days.iter().any(|d| *d > 6) {
            return Err(ReminderError::InvalidWeekday);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn weekly_form() -> ReminderForm {
        ReminderForm {
            date_time: Some(now() + Duration::days(1)),
            is_recurring: true,
            frequency: Some(Frequency::Weekly),
            interval: Some(1),
            days_of_week: Some(vec![1, 3]),
            end_date: Some(now() + Duration::days(60)),
        }
    }

    #[test]
    fn valid_recurring_form_passes() {
        assert_eq!(validate_reminder_form(&weekly_form(), now()), Ok(()));
    }

    #[test]
    fn date_time_is_required() {
        let form = ReminderForm::default();
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::MissingDateTime)
        );
    }

    #[test]
    fn past_and_present_times_are_rejected() {
        let mut form = ReminderForm {
            date_time: Some(now()),
            ..Default::default()
        };
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::NotInFuture)
        );

        form.date_time = Some(now() - Duration::minutes(5));
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::NotInFuture)
        );

        form.date_time = Some(now() + Duration::seconds(1));
        assert_eq!(validate_reminder_form(&form, now()), Ok(()));
    }

    #[test]
    fn one_shot_ignores_recurrence_fields() {
        let form = ReminderForm {
            date_time: Some(now() + Duration::hours(1)),
            is_recurring: false,
            interval: Some(0),
            ..Default::default()
        };
        assert_eq!(validate_reminder_form(&form, now()), Ok(()));
    }

    #[test]
    fn recurring_rules_are_checked_in_order() {
        let mut form = weekly_form();
        form.frequency = None;
        form.interval = None;
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::MissingFrequency)
        );

        let mut form = weekly_form();
        form.interval = Some(0);
        form.end_date = None;
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::InvalidInterval)
        );

        let mut form = weekly_form();
        form.end_date = None;
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::MissingEndDate)
        );
    }

    #[test]
    fn end_date_must_follow_start() {
        let mut form = weekly_form();
        form.end_date = form.date_time;
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::EndBeforeStart)
        );
    }

    #[test]
    fn end_date_is_limited_to_a_year() {
        let mut form = weekly_form();
        let start = form.date_time.unwrap();

        form.end_date = Some(start.checked_add_months(Months::new(12)).unwrap());
        assert_eq!(validate_reminder_form(&form, now()), Ok(()));

        form.end_date = Some(start.checked_add_months(Months::new(12)).unwrap() + Duration::minutes(1));
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::EndTooFar)
        );
    }

    #[test]
    fn weekly_needs_valid_days() {
        let mut form = weekly_form();
        form.days_of_week = Some(vec![]);
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::MissingWeekdays)
        );

        form.days_of_week = Some(vec![1, 7]);
        assert_eq!(
            validate_reminder_form(&form, now()),
            Err(ReminderError::InvalidWeekday)
        );
    }

    #[test]
    fn converts_to_validation_error() {
        let err: SuiteError = ReminderError::EndTooFar.into();
        assert_eq!(
            err.to_string(),
            "End date cannot be more than 12 months from start date"
        );
    }
}
