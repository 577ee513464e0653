use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::{TrackerEntry, TrackerType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStats {
    pub tracker_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_entries: usize,
    /// Rounded percentage of entries that count as completed.
    pub completion_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_entry: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub this_week_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub this_month_count: Option<usize>,
}

fn is_next_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    later - earlier == Duration::days(1)
}

/// Consecutive completed days counting back from the newest entry.
fn current_streak(newest_first: &[&TrackerEntry]) -> u32 {
    let mut streak = 0;
    let mut previous: Option<NaiveDate> = None;

    for entry in newest_first {
        if !entry.is_completed() {
            break;
        }
        if previous.is_some_and(|prev| !is_next_day(entry.date, prev)) {
            break;
        }
        streak += 1;
        previous = Some(entry.date);
    }

    streak
}

fn longest_streak(oldest_first: &[&TrackerEntry]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for entry in oldest_first {
        if !entry.is_completed() {
            longest = longest.max(run);
            run = 0;
            previous = None;
            continue;
        }
        run = match previous {
            Some(prev) if is_next_day(prev, entry.date) => run + 1,
            Some(_) => {
                longest = longest.max(run);
                1
            }
            None => 1,
        };
        previous = Some(entry.date);
    }

    longest.max(run)
}

fn average_value(tracker_type: TrackerType, entries: &[&TrackerEntry]) -> Option<f64> {
    let pick: fn(&TrackerEntry) -> Option<f64> = match tracker_type {
        TrackerType::Numeric => |e| e.values.numeric_value,
        TrackerType::Duration => |e| e.values.duration_value,
        TrackerType::Scale => |e| e.values.scale_value,
        _ => return None,
    };

    let values: Vec<f64> = entries.iter().filter_map(|e| pick(e)).collect();
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Statistics over all of a tracker's entries. `today` is the current
/// calendar day in the user's zone; weeks start on Sunday.
pub fn compute_stats(
    tracker_id: Uuid,
    tracker_type: TrackerType,
    entries: &[TrackerEntry],
    today: NaiveDate,
) -> TrackerStats {
    let mut stats = TrackerStats {
        tracker_id,
        current_streak: 0,
        longest_streak: 0,
        total_entries: entries.len(),
        completion_rate: 0,
        average_value: None,
        last_entry: None,
        this_week_count: None,
        this_month_count: None,
    };

    if entries.is_empty() {
        return stats;
    }

    let mut oldest_first: Vec<&TrackerEntry> = entries.iter().collect();
    oldest_first.sort_by_key(|e| e.date);
    let newest_first: Vec<&TrackerEntry> = oldest_first.iter().rev().copied().collect();

    stats.current_streak = current_streak(&newest_first);
    stats.longest_streak = longest_streak(&oldest_first);

    let completed = entries.iter().filter(|e| e.is_completed()).count();
    stats.completion_rate = ((completed as f64 / entries.len() as f64) * 100.0).round() as u32;

    stats.average_value = average_value(tracker_type, &oldest_first);
    stats.last_entry = newest_first.first().map(|e| e.date);

    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let month_start = today.with_day(1).unwrap_or(today);
    stats.this_week_count = Some(entries.iter().filter(|e| e.date >= week_start).count());
    stats.this_month_count = Some(entries.iter().filter(|e| e.date >= month_start).count());

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::EntryValues;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn done(d: u32) -> TrackerEntry {
        TrackerEntry::new(
            Uuid::nil(),
            "u",
            day(d),
            EntryValues {
                completed: Some(true),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    fn missed(d: u32) -> TrackerEntry {
        TrackerEntry::new(Uuid::nil(), "u", day(d), EntryValues::default(), Utc::now())
    }

    fn valued(d: u32, value: f64) -> TrackerEntry {
        TrackerEntry::new(
            Uuid::nil(),
            "u",
            day(d),
            EntryValues {
                numeric_value: Some(value),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn empty_tracker_has_zero_stats() {
        let stats = compute_stats(Uuid::nil(), TrackerType::Binary, &[], day(10));
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.this_week_count, None);
    }

    #[test]
    fn streaks_follow_consecutive_completed_days() {
        // 1 2 3 _ 5 6 [7 missed] 8 9
        let entries = vec![
            done(1),
            done(2),
            done(3),
            done(5),
            done(6),
            missed(7),
            done(8),
            done(9),
        ];
        let stats = compute_stats(Uuid::nil(), TrackerType::Binary, &entries, day(9));

        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_entries, 8);
        assert_eq!(stats.completion_rate, 88);
        assert_eq!(stats.last_entry, Some(day(9)));
    }

    #[test]
    fn current_streak_stops_at_newest_incomplete_entry() {
        let entries = vec![done(1), done(2), missed(3)];
        let stats = compute_stats(Uuid::nil(), TrackerType::Binary, &entries, day(3));
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let entries = vec![valued(1, 1.0), valued(2, 2.0), valued(3, 2.0)];
        let stats = compute_stats(Uuid::nil(), TrackerType::Numeric, &entries, day(3));
        assert_eq!(stats.average_value, Some(1.7));

        let stats = compute_stats(Uuid::nil(), TrackerType::Binary, &entries, day(3));
        assert_eq!(stats.average_value, None);
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2026-03-08 is a Sunday; today is Wednesday the 11th.
        let entries = vec![done(6), done(7), done(8), done(10)];
        let stats = compute_stats(Uuid::nil(), TrackerType::Binary, &entries, day(11));
        assert_eq!(stats.this_week_count, Some(2));
        assert_eq!(stats.this_month_count, Some(4));
    }

    #[test]
    fn input_order_does_not_matter() {
        let entries = vec![done(3), done(1), done(2)];
        let stats = compute_stats(Uuid::nil(), TrackerType::Binary, &entries, day(3));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
    }
}
