use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::journal::Journal;

use super::{Storage, id_text, optional_uuid_column, uuid_column};

const JOURNAL_COLUMNS: &str =
    "id, user_id, folder_id, title, subtitle, content, created_at, updated_at";

fn row_to_journal(row: &Row<'_>) -> rusqlite::Result<Journal> {
    Ok(Journal {
        id: uuid_column(row, 0)?,
        user_id: row.get(1)?,
        folder_id: optional_uuid_column(row, 2)?,
        title: row.get(3)?,
        subtitle: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Storage {
    /// Newest first.
    pub fn list_journals(&self, user_id: &str) -> SuiteResult<Vec<Journal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journals WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;
        let journals = stmt
            .query_map([user_id], row_to_journal)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(journals)
    }

    pub fn get_journal(&self, user_id: &str, id: Uuid) -> SuiteResult<Journal> {
        self.conn()
            .query_row(
                &format!("SELECT {JOURNAL_COLUMNS} FROM journals WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), user_id],
                row_to_journal,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Journal"))
    }

    pub fn insert_journal(&self, journal: &Journal) -> SuiteResult<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO journals ({JOURNAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                journal.id.to_string(),
                journal.user_id,
                id_text(journal.folder_id),
                journal.title,
                journal.subtitle,
                journal.content,
                journal.created_at,
                journal.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_journal(&self, journal: &Journal) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE journals SET folder_id = ?1, title = ?2, subtitle = ?3, content = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                id_text(journal.folder_id),
                journal.title,
                journal.subtitle,
                journal.content,
                journal.updated_at,
                journal.id.to_string(),
                journal.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("Journal"));
        }
        Ok(())
    }

    pub fn delete_journal(&self, user_id: &str, id: Uuid) -> SuiteResult<()> {
        let deleted = self.conn().execute(
            "DELETE FROM journals WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if deleted == 0 {
            return Err(SuiteError::NotFound("Journal"));
        }
        Ok(())
    }
}
