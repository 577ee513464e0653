//! Journal endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use prodsuite_core::folder::FolderKind;
use prodsuite_core::id::parse_id;
use prodsuite_core::journal::{Journal, JournalChanges, NewJournal};

use crate::auth::AuthUser;
use crate::routes::{AppError, MessageResponse, folders, message};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_journals).post(create_journal))
        .nest("/folders", folders::router(FolderKind::Journal))
        .route(
            "/{id}",
            get(get_journal).put(update_journal).delete(delete_journal),
        )
}

async fn list_journals(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Journal>>, AppError> {
    Ok(Json(state.storage.list_journals(user.id())?))
}

async fn get_journal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Journal>, AppError> {
    let id = parse_id(&id, "journal")?;
    Ok(Json(state.storage.get_journal(user.id(), id)?))
}

/// POST /journals - Subtitle defaults to today's long date
async fn create_journal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewJournal>,
) -> Result<(StatusCode, Json<Journal>), AppError> {
    let folder_id = input.folder()?;
    state.storage.ensure_folder(user.id(), FolderKind::Journal, folder_id)?;

    let journal = input.into_journal(user.id(), folder_id, state.today(), Utc::now())?;
    state.storage.insert_journal(&journal)?;
    Ok((StatusCode::CREATED, Json(journal)))
}

async fn update_journal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<JournalChanges>,
) -> Result<Json<Journal>, AppError> {
    let id = parse_id(&id, "journal")?;
    changes.validate()?;
    let folder = changes.folder()?;
    if let Some(folder_id) = folder {
        state.storage.ensure_folder(user.id(), FolderKind::Journal, folder_id)?;
    }

    let mut journal = state.storage.get_journal(user.id(), id)?;
    changes.apply(&mut journal, folder, Utc::now());
    state.storage.update_journal(&journal)?;
    Ok(Json(journal))
}

async fn delete_journal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "journal")?;
    state.storage.delete_journal(user.id(), id)?;
    Ok(message("Journal deleted successfully"))
}
