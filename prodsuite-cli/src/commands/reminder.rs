use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use prodsuite_core::reminder::{
    Frequency, ReminderForm, count_recurring_reminders, create_reminder,
    format_reminder_display, occurrences, validate_reminder_form,
};

/// Occurrences printed by a preview.
const PREVIEW_OCCURRENCES: usize = 10;

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

pub struct PreviewArgs {
    pub at: String,
    pub every: Option<Frequency>,
    pub interval: u32,
    pub days: Vec<u8>,
    pub until: Option<String>,
}

/// Parse an instant given as RFC 3339, as wall-clock time in `tz`, or as a
/// duration from `now`.
pub fn parse_when(raw: &str, tz: &Tz, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .with_context(|| format!("{raw} does not exist in {tz}"));
        }
    }

    let offset = humantime::parse_duration(raw)
        .with_context(|| format!("Could not parse '{raw}' as a date, time or duration"))?;
    Ok(now + chrono::Duration::from_std(offset)?)
}

pub fn build_form(args: &PreviewArgs, tz: &Tz, now: DateTime<Utc>) -> Result<ReminderForm> {
    let date_time = parse_when(&args.at, tz, now)?;
    let end_date = args
        .until
        .as_deref()
        .map(|raw| parse_when(raw, tz, now))
        .transpose()?;

    Ok(ReminderForm {
        date_time: Some(date_time),
        is_recurring: args.every.is_some(),
        frequency: args.every,
        interval: args.every.map(|_| args.interval),
        days_of_week: (!args.days.is_empty()).then(|| args.days.clone()),
        end_date,
    })
}

pub fn run(args: PreviewArgs, tz: &Tz) -> Result<()> {
    let now = Utc::now();
    let form = build_form(&args, tz, now)?;
    validate_reminder_form(&form, now)?;

    let Some(reminder) = create_reminder(&form, now) else {
        anyhow::bail!("Date and time are required");
    };

    println!("{}", format_reminder_display(&reminder, tz).bold());

    let upcoming = match form.pattern() {
        Some(pattern) => occurrences(&pattern, reminder.date_time, PREVIEW_OCCURRENCES, tz),
        None => vec![reminder.date_time],
    };
    for instant in &upcoming {
        let local = instant.with_timezone(tz);
        println!("  {} {}", "•".dimmed(), local.format("%a %Y-%m-%d %H:%M %Z"));
    }

    let total = count_recurring_reminders(&form, tz);
    if total > upcoming.len() {
        println!("  {}", format!("... {} more", total - upcoming.len()).dimmed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn args(at: &str) -> PreviewArgs {
        PreviewArgs {
            at: at.to_string(),
            every: None,
            interval: 1,
            days: Vec::new(),
            until: None,
        }
    }

    #[test]
    fn rfc3339_wins_over_local_time() {
        let now = Utc::now();
        let parsed = parse_when("2026-05-01T09:00:00+02:00", &chrono_tz::UTC, now).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 5, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn local_time_uses_the_configured_zone() {
        let now = Utc::now();
        let berlin = chrono_tz::Europe::Berlin;
        let parsed = parse_when("2026-01-15 09:30", &berlin, now).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn nonexistent_local_time_is_an_error() {
        let now = Utc::now();
        let berlin = chrono_tz::Europe::Berlin;
        assert!(parse_when("2026-03-29 02:30", &berlin, now).is_err());
    }

    #[test]
    fn durations_count_from_now() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let parsed = parse_when("90m", &chrono_tz::UTC, now).unwrap();
        assert_eq!(parsed, now + Duration::minutes(90));
        assert!(parse_when("next tuesday-ish", &chrono_tz::UTC, now).is_err());
    }

    #[test]
    fn one_shot_form_has_no_recurrence() {
        let now = Utc::now();
        let form = build_form(&args("2h"), &chrono_tz::UTC, now).unwrap();
        assert!(!form.is_recurring);
        assert_eq!(form.interval, None);
        assert!(validate_reminder_form(&form, now).is_ok());
    }

    #[test]
    fn weekly_form_carries_days_and_end() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut weekly = args("2026-01-05 09:00");
        weekly.every = Some(Frequency::Weekly);
        weekly.interval = 2;
        weekly.days = vec![1, 3];
        weekly.until = Some("2026-03-01 09:00".to_string());

        let form = build_form(&weekly, &chrono_tz::UTC, now).unwrap();
        assert!(form.is_recurring);
        assert_eq!(form.interval, Some(2));
        assert_eq!(form.days_of_week, Some(vec![1, 3]));
        assert!(validate_reminder_form(&form, now).is_ok());
        assert!(count_recurring_reminders(&form, &chrono_tz::UTC) > 1);
    }
}
