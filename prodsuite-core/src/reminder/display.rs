use std::fmt::Display;

use chrono::TimeZone;

use super::{Frequency, NoteReminder};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn every(interval: u32, single: &str, unit: &str) -> String {
    if interval == 1 {
        single.to_string()
    } else {
        format!("Every {interval} {unit}")
    }
}

/// Human-readable summary, e.g. `"Mar 5, 2026 at 9:30 AM"` or
/// `"Every 2 weeks on Mon, Wed at 9:30 AM (until 6/1/2026)"`.
pub fn format_reminder_display<Tz>(reminder: &NoteReminder, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = reminder.date_time.with_timezone(tz);
    let time = local.format("%-I:%M %p");

    let pattern = match (&reminder.recurring_pattern, reminder.is_recurring) {
        (Some(pattern), true) => pattern,
        _ => return format!("{} at {}", local.format("%b %-d, %Y"), time),
    };

    let frequency = match pattern.frequency {
        Frequency::Daily => every(pattern.interval, "Daily", "days"),
        Frequency::Weekly => {
            let days: Vec<&str> = pattern
                .days_of_week
                .iter()
                .flatten()
                .filter_map(|d| WEEKDAY_LABELS.get(usize::from(*d)).copied())
                .collect();

            let base = every(pattern.interval, "Weekly", "weeks");
            if days.is_empty() {
                base
            } else {
                format!("{base} on {}", days.join(", "))
            }
        }
        Frequency::Monthly => every(pattern.interval, "Monthly", "months"),
    };

    let until = pattern.end_date.with_timezone(tz).format("%-m/%-d/%Y");
    format!("{frequency} at {time} (until {until})")
}
