//! Recurrence math for reminders.
//!
//! All stepping happens on the wall-clock time of the zone the input is
//! expressed in, so "every day at 9:00" stays at 9:00 across DST changes.
//! Wall-clock times that fall into a spring-forward gap move one hour ahead;
//! ambiguous times resolve to the earlier instant.
//!
//! Monthly steps clamp to the last day of a shorter month and keep the
//! clamped day afterwards: Jan 31 -> Feb 28 -> Mar 28.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDateTime, TimeZone, Utc};

use super::{Frequency, NoteReminder, RecurringPattern, ReminderForm, generate_reminder_id};

/// Upper bound for occurrence counts shown in previews.
pub const MAX_PREVIEW_OCCURRENCES: usize = 1000;

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(Duration::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

fn next_weekly(local: NaiveDateTime, interval: u32, days_of_week: &[u8]) -> Option<NaiveDateTime> {
    let mut days: Vec<i64> = days_of_week
        .iter()
        .filter(|d| **d <= 6)
        .map(|d| i64::from(*d))
        .collect();
    days.sort_unstable();
    days.dedup();

    let Some(first) = days.first().copied() else {
        return add_days(local, 7 * i64::from(interval));
    };

    let current_day = i64::from(local.weekday().num_days_from_sunday());
    let offset = match days.iter().find(|d| **d > current_day) {
        Some(next_day) => next_day - current_day,
        // Back to the start of this week, then `interval` weeks on.
        None => 7 * i64::from(interval) - current_day + first,
    };

    add_days(local, offset)
}

fn add_days(local: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    local.checked_add_signed(Duration::try_days(days)?)
}

/// The occurrence following `current` in a series, or `None` when it lies
/// beyond the representable calendar.
///
/// An `interval` of zero is treated as one.
pub fn next_occurrence<Tz: TimeZone>(
    current: &DateTime<Tz>,
    frequency: Frequency,
    interval: u32,
    days_of_week: Option<&[u8]>,
) -> Option<DateTime<Tz>> {
    let tz = current.timezone();
    let local = current.naive_local();
    let interval = interval.max(1);

    let next = match frequency {
        Frequency::Daily => add_days(local, i64::from(interval)),
        Frequency::Weekly => next_weekly(local, interval, days_of_week.unwrap_or_default()),
        Frequency::Monthly => local.checked_add_months(Months::new(interval)),
    }?;

    resolve_local(&tz, next)
}

fn step<Tz: TimeZone>(current: &DateTime<Tz>, pattern: &RecurringPattern) -> Option<DateTime<Tz>> {
    next_occurrence(
        current,
        pattern.frequency,
        pattern.interval,
        pattern.days_of_week.as_deref(),
    )
}

/// Occurrence instants of `pattern` starting at `start` (inclusive), up to
/// the end date and at most `limit` of them.
pub fn occurrences<Tz: TimeZone>(
    pattern: &RecurringPattern,
    start: DateTime<Utc>,
    limit: usize,
    tz: &Tz,
) -> Vec<DateTime<Utc>> {
    let mut result = Vec::new();
    let mut current = start.with_timezone(tz);

    while current <= pattern.end_date && result.len() < limit {
        result.push(current.with_timezone(&Utc));

        match step(&current, pattern) {
            Some(next) if next > current => current = next,
            _ => break,
        }
    }

    result
}

/// How many times the reminder described by `form` would fire.
///
/// One-shot and incomplete recurring forms count as a single reminder.
pub fn count_recurring_reminders<Tz: TimeZone>(form: &ReminderForm, tz: &Tz) -> usize {
    let (Some(start), Some(pattern)) = (form.date_time, form.pattern()) else {
        return 1;
    };

    occurrences(&pattern, start, MAX_PREVIEW_OCCURRENCES, tz).len()
}

/// The reminder that follows `reminder` in its series, skipping every
/// occurrence at or before `after`. `None` once the series has ended.
pub fn next_reminder<Tz: TimeZone>(
    reminder: &NoteReminder,
    after: DateTime<Utc>,
    tz: &Tz,
) -> Option<NoteReminder> {
    if !reminder.is_recurring {
        return None;
    }
    let pattern = reminder.recurring_pattern.as_ref()?;

    let mut current = reminder.date_time.with_timezone(tz);
    loop {
        let next = step(&current, pattern)?;
        if next <= current || next > pattern.end_date {
            return None;
        }
        current = next;
        if current > after {
            break;
        }
    }

    Some(NoteReminder {
        id: generate_reminder_id(),
        enabled: true,
        date_time: current.with_timezone(&Utc),
        is_recurring: true,
        recurring_pattern: Some(pattern.clone()),
        completed_at: None,
        last_modified: after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use chrono_tz::Europe::Berlin;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn recurring_form(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        frequency: Frequency,
        interval: u32,
        days: Option<Vec<u8>>,
    ) -> ReminderForm {
        ReminderForm {
            date_time: Some(start),
            is_recurring: true,
            frequency: Some(frequency),
            interval: Some(interval),
            days_of_week: days,
            end_date: Some(end),
        }
    }

    #[test]
    fn non_recurring_counts_once() {
        let form = ReminderForm {
            date_time: Some(at(2026, 3, 2, 9, 0)),
            ..Default::default()
        };
        assert_eq!(count_recurring_reminders(&form, &Utc), 1);
    }

    #[test]
    fn incomplete_recurring_counts_once() {
        let form = ReminderForm {
            date_time: Some(at(2026, 3, 2, 9, 0)),
            is_recurring: true,
            frequency: Some(Frequency::Daily),
            ..Default::default()
        };
        assert_eq!(count_recurring_reminders(&form, &Utc), 1);
    }

    #[test]
    fn daily_for_a_week_counts_seven() {
        let start = at(2026, 3, 2, 9, 0);
        let form = recurring_form(start, start + Duration::days(6), Frequency::Daily, 1, None);
        assert_eq!(count_recurring_reminders(&form, &Utc), 7);
    }

    #[test]
    fn weekly_mon_wed_fri_over_two_weeks_counts_six() {
        // 2026-03-02 is a Monday.
        let start = at(2026, 3, 2, 9, 0);
        let form = recurring_form(
            start,
            start + Duration::days(13),
            Frequency::Weekly,
            1,
            Some(vec![1, 3, 5]),
        );
        assert_eq!(count_recurring_reminders(&form, &Utc), 6);
    }

    #[test]
    fn count_is_capped() {
        let start = at(2026, 3, 2, 9, 0);
        let form = recurring_form(start, start + Duration::days(5000), Frequency::Daily, 1, None);
        assert_eq!(count_recurring_reminders(&form, &Utc), MAX_PREVIEW_OCCURRENCES);
    }

    #[test]
    fn daily_respects_interval() {
        let next = next_occurrence(&at(2026, 3, 2, 9, 0), Frequency::Daily, 3, None).unwrap();
        assert_eq!(next, at(2026, 3, 5, 9, 0));
    }

    #[test]
    fn weekly_moves_to_next_selected_day_in_week() {
        let wednesday = at(2026, 3, 4, 9, 0);
        let next = next_occurrence(&wednesday, Frequency::Weekly, 1, Some(&[1, 3, 5])).unwrap();
        assert_eq!(next, at(2026, 3, 6, 9, 0));
    }

    #[test]
    fn weekly_wraps_to_first_day_interval_weeks_later() {
        let friday = at(2026, 3, 6, 9, 0);
        let next = next_occurrence(&friday, Frequency::Weekly, 1, Some(&[1, 3, 5])).unwrap();
        assert_eq!(next, at(2026, 3, 9, 9, 0));

        let monday = at(2026, 3, 2, 9, 0);
        let next = next_occurrence(&monday, Frequency::Weekly, 2, Some(&[1])).unwrap();
        assert_eq!(next, at(2026, 3, 16, 9, 0));
    }

    #[test]
    fn weekly_day_order_does_not_matter() {
        let wednesday = at(2026, 3, 4, 9, 0);
        let next = next_occurrence(&wednesday, Frequency::Weekly, 1, Some(&[5, 1, 3, 5])).unwrap();
        assert_eq!(next, at(2026, 3, 6, 9, 0));
    }

    #[test]
    fn weekly_without_days_adds_whole_weeks() {
        let next = next_occurrence(&at(2026, 3, 2, 9, 0), Frequency::Weekly, 2, None).unwrap();
        assert_eq!(next, at(2026, 3, 16, 9, 0));

        let next = next_occurrence(&at(2026, 3, 2, 9, 0), Frequency::Weekly, 1, Some(&[])).unwrap();
        assert_eq!(next, at(2026, 3, 9, 9, 0));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        let jan31 = at(2026, 1, 31, 9, 0);
        let feb = next_occurrence(&jan31, Frequency::Monthly, 1, None).unwrap();
        assert_eq!(feb, at(2026, 2, 28, 9, 0));

        let leap = next_occurrence(&at(2028, 1, 31, 9, 0), Frequency::Monthly, 1, None).unwrap();
        assert_eq!(leap, at(2028, 2, 29, 9, 0));

        // The clamped day sticks for later months.
        let mar = next_occurrence(&feb, Frequency::Monthly, 1, None).unwrap();
        assert_eq!(mar, at(2026, 3, 28, 9, 0));
    }

    #[test]
    fn monthly_interval_crosses_year() {
        let next = next_occurrence(&at(2026, 11, 15, 9, 0), Frequency::Monthly, 3, None).unwrap();
        assert_eq!(next, at(2027, 2, 15, 9, 0));
    }

    #[test]
    fn daily_keeps_wall_clock_across_dst() {
        // Berlin switches to summer time on 2026-03-29.
        let start = Berlin
            .from_local_datetime(&NaiveDate::from_ymd_opt(2026, 3, 28).unwrap().and_hms_opt(9, 0, 0).unwrap())
            .unwrap();
        let next = next_occurrence(&start, Frequency::Daily, 1, None).unwrap();

        assert_eq!(next.hour(), 9);
        assert_eq!(next.with_timezone(&Utc), at(2026, 3, 29, 7, 0));
        assert_eq!(start.with_timezone(&Utc), at(2026, 3, 28, 8, 0));
    }

    #[test]
    fn weekday_is_judged_in_local_time() {
        // 23:30 UTC on Tuesday is already Wednesday in Berlin.
        let start = at(2026, 3, 3, 23, 30);
        let pattern = RecurringPattern {
            frequency: Frequency::Weekly,
            interval: 1,
            days_of_week: Some(vec![3, 4]),
            end_date: at(2026, 3, 6, 0, 0),
        };
        let all = occurrences(&pattern, start, 10, &Berlin);
        assert_eq!(all, vec![start, at(2026, 3, 4, 23, 30)]);
    }

    #[test]
    fn occurrences_respect_limit() {
        let pattern = RecurringPattern {
            frequency: Frequency::Daily,
            interval: 1,
            days_of_week: None,
            end_date: at(2026, 6, 1, 0, 0),
        };
        let start = at(2026, 3, 2, 9, 0);
        let first = occurrences(&pattern, start, 3, &Utc);
        assert_eq!(
            first,
            vec![start, at(2026, 3, 3, 9, 0), at(2026, 3, 4, 9, 0)]
        );
    }

    #[test]
    fn huge_interval_stops_at_the_end_of_the_calendar() {
        let new_york = chrono_tz::America::New_York;
        let start = at(2026, 3, 2, 14, 0);

        for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
            let pattern = RecurringPattern {
                frequency,
                interval: u32::MAX,
                days_of_week: None,
                end_date: DateTime::<Utc>::MAX_UTC,
            };
            assert_eq!(occurrences(&pattern, start, 10, &new_york), vec![start]);
            assert!(next_occurrence(&start.with_timezone(&new_york), frequency, u32::MAX, None).is_none());

            let reminder = NoteReminder {
                id: "r1".into(),
                enabled: true,
                date_time: start,
                is_recurring: true,
                recurring_pattern: Some(pattern),
                completed_at: None,
                last_modified: start,
            };
            assert!(next_reminder(&reminder, start, &new_york).is_none());
        }
    }

    fn daily_reminder(start: DateTime<Utc>, end: DateTime<Utc>) -> NoteReminder {
        NoteReminder {
            id: "r1".into(),
            enabled: true,
            date_time: start,
            is_recurring: true,
            recurring_pattern: Some(RecurringPattern {
                frequency: Frequency::Daily,
                interval: 1,
                days_of_week: None,
                end_date: end,
            }),
            completed_at: None,
            last_modified: start,
        }
    }

    #[test]
    fn next_reminder_skips_missed_occurrences() {
        let reminder = daily_reminder(at(2026, 3, 2, 9, 0), at(2026, 3, 10, 9, 0));
        let now = at(2026, 3, 5, 12, 0);

        let next = next_reminder(&reminder, now, &Utc).unwrap();
        assert_eq!(next.date_time, at(2026, 3, 6, 9, 0));
        assert!(next.enabled);
        assert_ne!(next.id, reminder.id);
        assert_eq!(next.recurring_pattern, reminder.recurring_pattern);
    }

    #[test]
    fn next_reminder_may_land_on_end_date() {
        let reminder = daily_reminder(at(2026, 3, 2, 9, 0), at(2026, 3, 3, 9, 0));
        let next = next_reminder(&reminder, at(2026, 3, 2, 9, 0), &Utc).unwrap();
        assert_eq!(next.date_time, at(2026, 3, 3, 9, 0));
    }

    #[test]
    fn next_reminder_ends_after_end_date() {
        let reminder = daily_reminder(at(2026, 3, 2, 9, 0), at(2026, 3, 3, 9, 0));
        assert!(next_reminder(&reminder, at(2026, 3, 3, 9, 0), &Utc).is_none());

        let mut one_shot = reminder.clone();
        one_shot.is_recurring = false;
        assert!(next_reminder(&one_shot, at(2026, 3, 1, 0, 0), &Utc).is_none());
    }
}
