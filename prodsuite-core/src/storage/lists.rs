use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::list::List;
use crate::tags::{DEFAULT_TAG, distinct_sorted};

use super::{Storage, id_text, json_column, optional_uuid_column, parsed_column, to_json, uuid_column};

const LIST_COLUMNS: &str =
    "id, user_id, folder_id, title, items, tags, share_id, share_mode, created_at, updated_at";

fn row_to_list(row: &Row<'_>) -> rusqlite::Result<List> {
    Ok(List {
        id: uuid_column(row, 0)?,
        user_id: row.get(1)?,
        folder_id: optional_uuid_column(row, 2)?,
        title: row.get(3)?,
        items: json_column(row, 4)?,
        tags: json_column(row, 5)?,
        share_id: row.get(6)?,
        share_mode: parsed_column(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Storage {
    pub fn list_lists(&self, user_id: &str) -> SuiteResult<Vec<List>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1 ORDER BY updated_at DESC"
        ))?;
        let lists = stmt
            .query_map([user_id], row_to_list)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    /// Distinct tags without the implicit default tag.
    pub fn list_tags(&self, user_id: &str) -> SuiteResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT tags FROM lists WHERE user_id = ?1")?;
        let tag_sets = stmt
            .query_map([user_id], |row| json_column::<Vec<String>>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(distinct_sorted(
            tag_sets.iter().flatten().filter(|t| t.as_str() != DEFAULT_TAG),
        ))
    }

    pub fn get_list(&self, user_id: &str, id: Uuid) -> SuiteResult<List> {
        self.conn()
            .query_row(
                &format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), user_id],
                row_to_list,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("List"))
    }

    /// A list reachable through its share link. Unshared lists are not found.
    pub fn get_shared_list(&self, share_id: &str) -> SuiteResult<List> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {LIST_COLUMNS} FROM lists WHERE share_id = ?1 AND share_mode != 'none'"
                ),
                [share_id],
                row_to_list,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Shared list"))
    }

    pub fn insert_list(&self, list: &List) -> SuiteResult<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO lists ({LIST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                list.id.to_string(),
                list.user_id,
                id_text(list.folder_id),
                list.title,
                to_json(&list.items)?,
                to_json(&list.tags)?,
                list.share_id,
                list.share_mode.as_str(),
                list.created_at,
                list.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_list(&self, list: &List) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE lists SET folder_id = ?1, title = ?2, items = ?3, tags = ?4, share_id = ?5,
                 share_mode = ?6, updated_at = ?7
             WHERE id = ?8 AND user_id = ?9",
            params![
                id_text(list.folder_id),
                list.title,
                to_json(&list.items)?,
                to_json(&list.tags)?,
                list.share_id,
                list.share_mode.as_str(),
                list.updated_at,
                list.id.to_string(),
                list.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("List"));
        }
        Ok(())
    }

    pub fn delete_list(&self, user_id: &str, id: Uuid) -> SuiteResult<()> {
        let deleted = self.conn().execute(
            "DELETE FROM lists WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if deleted == 0 {
            return Err(SuiteError::NotFound("List"));
        }
        Ok(())
    }
}
