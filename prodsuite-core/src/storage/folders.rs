use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::folder::{Folder, FolderKind};

use super::{Storage, uuid_column};

const FOLDER_COLUMNS: &str = "id, user_id, name, color, icon, created_at, updated_at";

fn content_table(kind: FolderKind) -> &'static str {
    match kind {
        FolderKind::List => "lists",
        FolderKind::Tracker => "trackers",
        FolderKind::Drawing => "drawings",
        FolderKind::Journal => "journals",
    }
}

fn row_to_folder(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: uuid_column(row, 0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Storage {
    /// Sorted by name.
    pub fn list_folders(&self, user_id: &str, kind: FolderKind) -> SuiteResult<Vec<Folder>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ?1 AND kind = ?2
             ORDER BY name COLLATE NOCASE"
        ))?;
        let folders = stmt
            .query_map(params![user_id, kind.as_str()], row_to_folder)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(folders)
    }

    pub fn get_folder(&self, user_id: &str, kind: FolderKind, id: Uuid) -> SuiteResult<Folder> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?1 AND user_id = ?2 AND kind = ?3"
                ),
                params![id.to_string(), user_id, kind.as_str()],
                row_to_folder,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Folder"))
    }

    /// Check that a referenced folder exists and belongs to the user.
    pub fn ensure_folder(&self, user_id: &str, kind: FolderKind, id: Option<Uuid>) -> SuiteResult<()> {
        match id {
            Some(id) => self.get_folder(user_id, kind, id).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn insert_folder(&self, kind: FolderKind, folder: &Folder) -> SuiteResult<()> {
        self.conn().execute(
            "INSERT INTO folders (id, user_id, kind, name, color, icon, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                folder.id.to_string(),
                folder.user_id,
                kind.as_str(),
                folder.name,
                folder.color,
                folder.icon,
                folder.created_at,
                folder.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_folder(&self, kind: FolderKind, folder: &Folder) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE folders SET name = ?1, color = ?2, icon = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6 AND kind = ?7",
            params![
                folder.name,
                folder.color,
                folder.icon,
                folder.updated_at,
                folder.id.to_string(),
                folder.user_id,
                kind.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("Folder"));
        }
        Ok(())
    }

    /// Refuses while any document still lives in the folder.
    pub fn delete_folder(&self, user_id: &str, kind: FolderKind, id: Uuid) -> SuiteResult<()> {
        self.get_folder(user_id, kind, id)?;

        let conn = self.conn();
        let contents: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE folder_id = ?1 AND user_id = ?2",
                content_table(kind)
            ),
            params![id.to_string(), user_id],
            |row| row.get(0),
        )?;
        if contents > 0 {
            return Err(kind.not_empty_error());
        }

        conn.execute(
            "DELETE FROM folders WHERE id = ?1 AND user_id = ?2 AND kind = ?3",
            params![id.to_string(), user_id, kind.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::folder::NewFolder;
    use crate::list::NewList;

    fn folder(user: &str, name: &str) -> Folder {
        NewFolder {
            name: name.into(),
            ..Default::default()
        }
        .into_folder(user, Utc::now())
        .unwrap()
    }

    #[test]
    fn folders_are_separated_by_kind() {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_folder(FolderKind::List, &folder("u", "Shopping")).unwrap();
        storage.insert_folder(FolderKind::Tracker, &folder("u", "Health")).unwrap();

        let lists = storage.list_folders("u", FolderKind::List).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Shopping");
        assert!(storage
            .get_folder("u", FolderKind::Tracker, lists[0].id)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn foreign_folder_fails_ownership_check() {
        let storage = Storage::open_in_memory().unwrap();
        let f = folder("owner", "Private");
        storage.insert_folder(FolderKind::List, &f).unwrap();

        assert!(storage.ensure_folder("owner", FolderKind::List, Some(f.id)).is_ok());
        assert!(storage.ensure_folder("other", FolderKind::List, Some(f.id)).is_err());
        assert!(storage.ensure_folder("other", FolderKind::List, None).is_ok());
    }

    #[test]
    fn non_empty_folder_cannot_be_deleted() {
        let storage = Storage::open_in_memory().unwrap();
        let f = folder("u", "Groceries");
        storage.insert_folder(FolderKind::List, &f).unwrap();

        let list = NewList {
            title: "Weekly".into(),
            ..Default::default()
        }
        .into_list("u", Some(f.id), Utc::now())
        .unwrap();
        storage.insert_list(&list).unwrap();

        let err = storage.delete_folder("u", FolderKind::List, f.id).unwrap_err();
        assert!(err.to_string().starts_with("Cannot delete folder with lists"));

        storage.delete_list("u", list.id).unwrap();
        storage.delete_folder("u", FolderKind::List, f.id).unwrap();
        assert!(storage.list_folders("u", FolderKind::List).unwrap().is_empty());
    }
}
