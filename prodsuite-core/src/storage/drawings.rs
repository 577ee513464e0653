use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::drawing::Drawing;
use crate::error::{SuiteError, SuiteResult};

use super::{Storage, id_text, json_column, optional_uuid_column, to_json, uuid_column};

const DRAWING_COLUMNS: &str =
    "id, user_id, folder_id, title, scene_data, thumbnail, collaborators, created_at, updated_at";

fn row_to_drawing(row: &Row<'_>) -> rusqlite::Result<Drawing> {
    Ok(Drawing {
        id: uuid_column(row, 0)?,
        user_id: row.get(1)?,
        folder_id: optional_uuid_column(row, 2)?,
        title: row.get(3)?,
        scene_data: json_column(row, 4)?,
        thumbnail: row.get(5)?,
        collaborators: json_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Storage {
    pub fn list_drawings(&self, user_id: &str) -> SuiteResult<Vec<Drawing>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DRAWING_COLUMNS} FROM drawings WHERE user_id = ?1 ORDER BY updated_at DESC"
        ))?;
        let drawings = stmt
            .query_map([user_id], row_to_drawing)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(drawings)
    }

    pub fn get_drawing(&self, user_id: &str, id: Uuid) -> SuiteResult<Drawing> {
        self.conn()
            .query_row(
                &format!("SELECT {DRAWING_COLUMNS} FROM drawings WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), user_id],
                row_to_drawing,
            )
            .optional()?
            .ok_or(SuiteError::NotFound("Drawing"))
    }

    /// Owner of a drawing regardless of who asks.
    pub fn drawing_owner(&self, id: Uuid) -> SuiteResult<Option<String>> {
        let owner = self
            .conn()
            .query_row(
                "SELECT user_id FROM drawings WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }

    pub fn insert_drawing(&self, drawing: &Drawing) -> SuiteResult<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO drawings ({DRAWING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                drawing.id.to_string(),
                drawing.user_id,
                id_text(drawing.folder_id),
                drawing.title,
                to_json(&drawing.scene_data)?,
                drawing.thumbnail,
                to_json(&drawing.collaborators)?,
                drawing.created_at,
                drawing.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_drawing(&self, drawing: &Drawing) -> SuiteResult<()> {
        let changed = self.conn().execute(
            "UPDATE drawings SET folder_id = ?1, title = ?2, scene_data = ?3, thumbnail = ?4,
                 updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                id_text(drawing.folder_id),
                drawing.title,
                to_json(&drawing.scene_data)?,
                drawing.thumbnail,
                drawing.updated_at,
                drawing.id.to_string(),
                drawing.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(SuiteError::NotFound("Drawing"));
        }
        Ok(())
    }

    pub fn delete_drawing(&self, user_id: &str, id: Uuid) -> SuiteResult<()> {
        let deleted = self.conn().execute(
            "DELETE FROM drawings WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;
        if deleted == 0 {
            return Err(SuiteError::NotFound("Drawing"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::drawing::{DrawingChanges, NewDrawing};

    #[test]
    fn scene_data_survives_storage() {
        let storage = Storage::open_in_memory().unwrap();
        let drawing = NewDrawing {
            title: "Floor plan".into(),
            scene_data: Some(json!({ "elements": [{ "type": "rectangle" }], "appState": {} })),
            folder_id: None,
        }
        .into_drawing("u", Utc::now())
        .unwrap();
        storage.insert_drawing(&drawing).unwrap();

        let loaded = storage.get_drawing("u", drawing.id).unwrap();
        assert_eq!(loaded.scene_data["elements"][0]["type"], "rectangle");
        assert_eq!(storage.drawing_owner(drawing.id).unwrap().as_deref(), Some("u"));
    }

    #[test]
    fn thumbnail_update_persists() {
        let storage = Storage::open_in_memory().unwrap();
        let mut drawing = NewDrawing {
            title: "Sketch".into(),
            ..Default::default()
        }
        .into_drawing("u", Utc::now())
        .unwrap();
        storage.insert_drawing(&drawing).unwrap();

        DrawingChanges {
            thumbnail: Some("data:image/png;base64,AAAA".into()),
            ..Default::default()
        }
        .apply(&mut drawing, Utc::now())
        .unwrap();
        storage.update_drawing(&drawing).unwrap();

        let loaded = storage.get_drawing("u", drawing.id).unwrap();
        assert!(loaded.thumbnail.unwrap().starts_with("data:image/png"));
        assert!(storage.list_drawings("other").unwrap().is_empty());
    }
}
