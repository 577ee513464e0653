use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::note::Note;
use crate::reminder::NoteReminder;
use crate::tags::distinct_sorted;

use super::{Storage, json_column, to_json, uuid_column};

const NOTE_COLUMNS: &str = "id, user_id, title, content, tags, reminders, created_at, updated_at";

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: uuid_column(row, 0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        tags: json_column(row, 4)?,
        reminders: json_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Storage {
    /// Newest first.
    pub fn list_notes(&self, user_id: &str) -> SuiteResult<Vec<Note>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ?1 ORDER BY updated_at DESC"
        ))?;
        let notes = stmt
            .query_map([user_id], row_to_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    pub fn note_tags(&self, user_id: &str) -> SuiteResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT tags FROM notes WHERE user_id = ?1")?;
        let tag_sets = stmt
            .query_map([user_id], |row| json_column::<Vec<String>>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(distinct_sorted(tag_sets.iter().flatten()))
    }

    pub fn get_note(&self, user_id: &str, id: Uuid) -> SuiteResult<Note> {
        self.conn()
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), user_id],
                row_to_note,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Note"))
    }

    pub fn insert_note(&self, note: &Note) -> SuiteResult<()> {
        self.conn().execute(
            &format!("INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                note.id.to_string(),
                note.user_id,
                note.title,
                note.content,
                to_json(&note.tags)?,
                to_json(&note.reminders)?,
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Write back every mutable field of an existing note.
    pub fn update_note(&self, note: &Note) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE notes SET title = ?1, content = ?2, tags = ?3, reminders = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                note.title,
                note.content,
                to_json(&note.tags)?,
                to_json(&note.reminders)?,
                note.updated_at,
                note.id.to_string(),
                note.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("Note"));
        }
        Ok(())
    }

    pub fn delete_note(&self, user_id: &str, id: Uuid) -> SuiteResult<()> {
        let deleted = self.conn().execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if deleted == 0 {
            return Err(SuiteError::NotFound("Note"));
        }
        Ok(())
    }

    /// Notes of every user holding at least one enabled reminder.
    pub fn notes_with_enabled_reminders(&self) -> SuiteResult<Vec<Note>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE EXISTS (
                 SELECT 1 FROM json_each(notes.reminders)
                 WHERE json_extract(json_each.value, '$.enabled') = 1
             )"
        ))?;
        let notes = stmt
            .query_map([], row_to_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Mark the `fired` occurrence as completed and append its successor, in
    /// one read-modify-write of the note's current reminders.
    ///
    /// Returns `false` without writing when the reminder was removed, disabled
    /// or rescheduled since `fired` was read. `updated_at` is left alone.
    pub fn complete_reminder(
        &self,
        note_id: Uuid,
        fired: &NoteReminder,
        now: DateTime<Utc>,
        successor: Option<&NoteReminder>,
    ) -> SuiteResult<bool> {
        let conn = self.conn();
        let mut reminders: Vec<NoteReminder> = conn
            .query_row(
                "SELECT reminders FROM notes WHERE id = ?1",
                [note_id.to_string()],
                |row| json_column(row, 0),
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Note"))?;

        let Some(current) = reminders
            .iter_mut()
            .find(|r| r.id == fired.id && r.enabled && r.date_time == fired.date_time)
        else {
            return Ok(false);
        };
        current.complete(now);
        reminders.extend(successor.cloned());

        conn.execute(
            "UPDATE notes SET reminders = ?1 WHERE id = ?2",
            params![to_json(&reminders)?, note_id.to_string()],
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::note::NewNote;
    use crate::reminder::{ReminderForm, create_reminder};

    fn note(user: &str, title: &str, tags: &[&str]) -> Note {
        Note::new(
            user,
            NewNote {
                title: title.into(),
                content: "content".into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn notes_are_listed_newest_first() {
        let storage = Storage::open_in_memory().unwrap();
        let older = note("u", "older", &[]);
        let mut newer = note("u", "newer", &[]);
        newer.updated_at = older.updated_at + Duration::hours(1);

        storage.insert_note(&older).unwrap();
        storage.insert_note(&newer).unwrap();
        storage.insert_note(&note("other", "foreign", &[])).unwrap();

        let titles: Vec<_> = storage
            .list_notes("u")
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[test]
    fn foreign_notes_are_not_found() {
        let storage = Storage::open_in_memory().unwrap();
        let n = note("u", "mine", &[]);
        storage.insert_note(&n).unwrap();

        assert!(storage.get_note("intruder", n.id).unwrap_err().is_not_found());
        assert!(storage.delete_note("intruder", n.id).unwrap_err().is_not_found());
        assert!(storage.get_note("u", n.id).is_ok());
    }

    #[test]
    fn tags_are_distinct_and_sorted() {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_note(&note("u", "a", &["work", "home"])).unwrap();
        storage.insert_note(&note("u", "b", &["home", "errands"])).unwrap();
        assert_eq!(storage.note_tags("u").unwrap(), vec!["errands", "home", "work"]);
    }

    #[test]
    fn finds_notes_with_enabled_reminders() {
        let storage = Storage::open_in_memory().unwrap();
        let now = Utc::now();
        let form = ReminderForm {
            date_time: Some(now + Duration::hours(1)),
            ..Default::default()
        };

        let mut with_reminder = note("u", "remind me", &[]);
        with_reminder.reminders.push(create_reminder(&form, now).unwrap());
        let mut with_done = note("u", "done", &[]);
        let mut done = create_reminder(&form, now).unwrap();
        done.complete(now);
        with_done.reminders.push(done);

        storage.insert_note(&with_reminder).unwrap();
        storage.insert_note(&with_done).unwrap();
        storage.insert_note(&note("u", "plain", &[])).unwrap();

        let due = storage.notes_with_enabled_reminders().unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, with_reminder.id);

        let fired = due[0].reminders[0].clone();
        assert!(storage.complete_reminder(with_reminder.id, &fired, now, None).unwrap());
        assert!(storage.notes_with_enabled_reminders().unwrap().is_empty());
    }

    #[test]
    fn completing_a_reminder_keeps_concurrent_edits() {
        let storage = Storage::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let form = ReminderForm {
            date_time: Some(now),
            ..Default::default()
        };

        let mut n = note("u", "remind me", &[]);
        let fired = create_reminder(&form, now - Duration::hours(1)).unwrap();
        n.reminders.push(fired.clone());
        storage.insert_note(&n).unwrap();

        // Another reminder is added after the scheduler read the note.
        let mut edited = storage.get_note("u", n.id).unwrap();
        let added = create_reminder(
            &ReminderForm {
                date_time: Some(now + Duration::days(1)),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        edited.reminders.push(added.clone());
        storage.update_note(&edited).unwrap();

        let mut successor = added.clone();
        successor.id = "successor".into();
        assert!(storage.complete_reminder(n.id, &fired, now, Some(&successor)).unwrap());

        let stored = storage.get_note("u", n.id).unwrap();
        let ids: Vec<_> = stored.reminders.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![fired.id.as_str(), added.id.as_str(), "successor"]);
        assert!(!stored.reminders[0].enabled);
        assert_eq!(stored.reminders[0].completed_at, Some(now));
        assert!(stored.reminders[1].enabled);
    }

    #[test]
    fn rescheduled_or_removed_reminders_are_not_completed() {
        let storage = Storage::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let form = ReminderForm {
            date_time: Some(now),
            ..Default::default()
        };

        let mut n = note("u", "remind me", &[]);
        let fired = create_reminder(&form, now - Duration::hours(1)).unwrap();
        n.reminders.push(fired.clone());
        storage.insert_note(&n).unwrap();

        let mut edited = storage.get_note("u", n.id).unwrap();
        edited.reminders[0].reactivate(now + Duration::days(2), now);
        storage.update_note(&edited).unwrap();
        assert!(!storage.complete_reminder(n.id, &fired, now, None).unwrap());
        assert!(storage.get_note("u", n.id).unwrap().reminders[0].enabled);

        edited.reminders.clear();
        storage.update_note(&edited).unwrap();
        assert!(!storage.complete_reminder(n.id, &fired, now, None).unwrap());

        storage.delete_note("u", n.id).unwrap();
        assert!(
            storage
                .complete_reminder(n.id, &fired, now, None)
                .unwrap_err()
                .is_not_found()
        );
    }
}
