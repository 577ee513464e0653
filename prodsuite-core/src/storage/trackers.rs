use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::tags::distinct_sorted;
use crate::tracker::{EntryQuery, EntryValues, Tracker, TrackerEntry};

use super::{Storage, id_text, json_column, optional_uuid_column, parsed_column, to_json, uuid_column};

const TRACKER_COLUMNS: &str = "id, user_id, folder_id, name, description, tracker_type, tags, config, \
                               is_active, created_at, updated_at";

const ENTRY_COLUMNS: &str =
    "id, tracker_id, user_id, date, timestamp, entry_values, created_at, updated_at";

fn row_to_tracker(row: &Row<'_>) -> rusqlite::Result<Tracker> {
    Ok(Tracker {
        id: uuid_column(row, 0)?,
        user_id: row.get(1)?,
        folder_id: optional_uuid_column(row, 2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        tracker_type: parsed_column(row, 5)?,
        tags: json_column(row, 6)?,
        config: json_column(row, 7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<TrackerEntry> {
    Ok(TrackerEntry {
        id: uuid_column(row, 0)?,
        tracker_id: uuid_column(row, 1)?,
        user_id: row.get(2)?,
        date: row.get(3)?,
        timestamp: row.get(4)?,
        values: json_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Storage {
    /// Most recently updated first, optionally filtered by the active flag.
    pub fn list_trackers(&self, user_id: &str, active: Option<bool>) -> SuiteResult<Vec<Tracker>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRACKER_COLUMNS} FROM trackers
             WHERE user_id = ?1 AND (?2 IS NULL OR is_active = ?2)
             ORDER BY updated_at DESC"
        ))?;
        let trackers = stmt
            .query_map(params![user_id, active], row_to_tracker)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trackers)
    }

    pub fn tracker_tags(&self, user_id: &str) -> SuiteResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT tags FROM trackers WHERE user_id = ?1")?;
        let tag_sets = stmt
            .query_map([user_id], |row| json_column::<Vec<String>>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(distinct_sorted(tag_sets.iter().flatten()))
    }

    pub fn get_tracker(&self, user_id: &str, id: Uuid) -> SuiteResult<Tracker> {
        self.conn()
            .query_row(
                &format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), user_id],
                row_to_tracker,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Tracker"))
    }

    pub fn insert_tracker(&self, tracker: &Tracker) -> SuiteResult<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO trackers ({TRACKER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                tracker.id.to_string(),
                tracker.user_id,
                id_text(tracker.folder_id),
                tracker.name,
                tracker.description,
                tracker.tracker_type.as_str(),
                to_json(&tracker.tags)?,
                to_json(&tracker.config)?,
                tracker.is_active,
                tracker.created_at,
                tracker.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_tracker(&self, tracker: &Tracker) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE trackers SET folder_id = ?1, name = ?2, description = ?3, tags = ?4, config = ?5,
                 is_active = ?6, updated_at = ?7
             WHERE id = ?8 AND user_id = ?9",
            params![
                id_text(tracker.folder_id),
                tracker.name,
                tracker.description,
                to_json(&tracker.tags)?,
                to_json(&tracker.config)?,
                tracker.is_active,
                tracker.updated_at,
                tracker.id.to_string(),
                tracker.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("Tracker"));
        }
        Ok(())
    }

    /// Deletes the tracker together with all of its entries.
    pub fn delete_tracker(&self, user_id: &str, id: Uuid) -> SuiteResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM trackers WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if deleted == 0 {
            return Err(SuiteError::NotFound("Tracker"));
        }
        tx.execute(
            "DELETE FROM tracker_entries WHERE tracker_id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Newest day first.
    pub fn list_entries(
        &self,
        user_id: &str,
        tracker_id: Uuid,
        query: &EntryQuery,
    ) -> SuiteResult<Vec<TrackerEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM tracker_entries
             WHERE tracker_id = ?1 AND user_id = ?2
               AND (?3 IS NULL OR date >= ?3)
               AND (?4 IS NULL OR date <= ?4)
             ORDER BY date DESC
             LIMIT ?5 OFFSET ?6"
        ))?;
        let entries = stmt
            .query_map(
                params![
                    tracker_id.to_string(),
                    user_id,
                    query.start,
                    query.end,
                    i64::from(query.limit),
                    i64::from(query.skip),
                ],
                row_to_entry,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Every entry of a tracker, oldest first.
    pub fn all_entries(&self, user_id: &str, tracker_id: Uuid) -> SuiteResult<Vec<TrackerEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM tracker_entries
             WHERE tracker_id = ?1 AND user_id = ?2 ORDER BY date ASC"
        ))?;
        let entries = stmt
            .query_map(params![tracker_id.to_string(), user_id], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn entry_on(
        &self,
        user_id: &str,
        tracker_id: Uuid,
        date: NaiveDate,
    ) -> SuiteResult<Option<TrackerEntry>> {
        let entry = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM tracker_entries
                     WHERE tracker_id = ?1 AND user_id = ?2 AND date = ?3"
                ),
                params![tracker_id.to_string(), user_id, date],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn get_entry(&self, user_id: &str, tracker_id: Uuid, entry_id: Uuid) -> SuiteResult<TrackerEntry> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM tracker_entries
                     WHERE id = ?1 AND tracker_id = ?2 AND user_id = ?3"
                ),
                params![entry_id.to_string(), tracker_id.to_string(), user_id],
                row_to_entry,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Entry"))
    }

    /// Create the day's entry or merge `values` into the existing one. The
    /// flag is true when a new entry was created.
    pub fn upsert_entry(
        &self,
        user_id: &str,
        tracker_id: Uuid,
        date: NaiveDate,
        values: EntryValues,
        now: DateTime<Utc>,
    ) -> SuiteResult<(TrackerEntry, bool)> {
        match self.entry_on(user_id, tracker_id, date)? {
            Some(mut entry) => {
                entry.update(values, now);
                self.update_entry(&entry)?;
                Ok((entry, false))
            }
            None => {
                let entry = TrackerEntry::new(tracker_id, user_id, date, values, now);
                self.conn().execute(
                    &format!(
                        "INSERT INTO tracker_entries ({ENTRY_COLUMNS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                    ),
                    params![
                        entry.id.to_string(),
                        entry.tracker_id.to_string(),
                        entry.user_id,
                        entry.date,
                        entry.timestamp,
                        to_json(&entry.values)?,
                        entry.created_at,
                        entry.updated_at,
                    ],
                )?;
                Ok((entry, true))
            }
        }
    }

    pub fn update_entry(&self, entry: &TrackerEntry) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE tracker_entries SET timestamp = ?1, entry_values = ?2, updated_at = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![
                entry.timestamp,
                to_json(&entry.values)?,
                entry.updated_at,
                entry.id.to_string(),
                entry.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("Entry"));
        }
        Ok(())
    }

    pub fn delete_entry(&self, user_id: &str, tracker_id: Uuid, entry_id: Uuid) -> SuiteResult<()> {
        let deleted = self.conn().execute(
            "DELETE FROM tracker_entries WHERE id = ?1 AND tracker_id = ?2 AND user_id = ?3",
            params![entry_id.to_string(), tracker_id.to_string(), user_id],
        )?;
        if deleted == 0 {
            return Err(SuiteError::NotFound("Entry"));
        }
        Ok(())
    }
}
