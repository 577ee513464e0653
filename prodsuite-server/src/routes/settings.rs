//! User settings endpoints

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use chrono::Utc;
use prodsuite_core::settings::{ThemeSettings, ThemeUpdate, UserSettings};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings))
        .route("/theme", get(get_theme).put(update_theme))
}

/// Stored settings, or the defaults for users who never saved any.
#[derive(Serialize)]
#[serde(untagged)]
pub enum SettingsResponse {
    Stored(UserSettings),
    Defaults(ThemeSettings),
}

/// GET /settings
async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = match state.storage.get_settings(user.id())? {
        Some(stored) => SettingsResponse::Stored(stored),
        None => SettingsResponse::Defaults(ThemeSettings::default()),
    };
    Ok(Json(settings))
}

/// GET /settings/theme
async fn get_theme(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ThemeSettings>, AppError> {
    Ok(Json(state.storage.theme(user.id())?))
}

/// PUT /settings/theme
async fn update_theme(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ThemeUpdate>,
) -> Result<Json<ThemeSettings>, AppError> {
    let theme_id = update.theme_id()?;
    let saved = state.storage.save_theme(
        user.id(),
        theme_id,
        update.custom_theme.as_ref(),
        Utc::now(),
    )?;
    Ok(Json(saved.theme()))
}
