use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{SuiteError, SuiteResult};
use crate::settings::{ThemeSettings, ThemeValues, UserSettings};

use super::{Storage, conversion_error, to_json};

fn row_to_settings(row: &Row<'_>) -> rusqlite::Result<UserSettings> {
    let custom_theme: Option<String> = row.get(2)?;
    let custom_theme = custom_theme
        .map(|raw| serde_json::from_str(&raw).map_err(|e| conversion_error(2, e)))
        .transpose()?;

    Ok(UserSettings {
        user_id: row.get(0)?,
        theme_id: row.get(1)?,
        custom_theme,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Storage {
    pub fn get_settings(&self, user_id: &str) -> SuiteResult<Option<UserSettings>> {
        let settings = self
            .conn()
            .query_row(
                "SELECT user_id, theme_id, custom_theme, created_at, updated_at
                 FROM user_settings WHERE user_id = ?1",
                [user_id],
                row_to_settings,
            )
            .optional()?;
        Ok(settings)
    }

    /// Stored theme, or the default one.
    pub fn theme(&self, user_id: &str) -> SuiteResult<ThemeSettings> {
        Ok(self
            .get_settings(user_id)?
            .map(|s| s.theme())
            .unwrap_or_default())
    }

    /// Upsert the theme. A missing custom theme keeps the stored one.
    pub fn save_theme(
        &self,
        user_id: &str,
        theme_id: &str,
        custom_theme: Option<&ThemeValues>,
        now: DateTime<Utc>,
    ) -> SuiteResult<UserSettings> {
        let custom_theme = custom_theme.map(to_json).transpose()?;
        self.conn().execute(
            "INSERT INTO user_settings (user_id, theme_id, custom_theme, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                 theme_id = excluded.theme_id,
                 custom_theme = COALESCE(excluded.custom_theme, user_settings.custom_theme),
                 updated_at = excluded.updated_at",
            params![user_id, theme_id, custom_theme, now],
        )?;
        self.get_settings(user_id)?
            .ok_or(SuiteError::NotFound("Settings"))
    }
}
