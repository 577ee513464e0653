//! Folder endpoints shared by lists, trackers, drawings and journals.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;
use prodsuite_core::folder::{Folder, FolderChanges, FolderKind, NewFolder};
use prodsuite_core::id::parse_id;

use crate::auth::AuthUser;
use crate::routes::{AppError, MessageResponse, message};
use crate::state::AppState;

/// Folder CRUD for one kind, meant to be nested at `/folders`.
pub fn router(kind: FolderKind) -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/{id}", put(update_folder).delete(delete_folder));
    if kind == FolderKind::Drawing {
        router = router.route("/all", get(list_folders));
    }
    router.layer(Extension(kind))
}

/// GET /folders
async fn list_folders(
    State(state): State<AppState>,
    Extension(kind): Extension<FolderKind>,
    user: AuthUser,
) -> Result<Json<Vec<Folder>>, AppError> {
    Ok(Json(state.storage.list_folders(user.id(), kind)?))
}

/// POST /folders
async fn create_folder(
    State(state): State<AppState>,
    Extension(kind): Extension<FolderKind>,
    user: AuthUser,
    Json(input): Json<NewFolder>,
) -> Result<(StatusCode, Json<Folder>), AppError> {
    let folder = input.into_folder(user.id(), Utc::now())?;
    state.storage.insert_folder(kind, &folder)?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// PUT /folders/{id}
async fn update_folder(
    State(state): State<AppState>,
    Extension(kind): Extension<FolderKind>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<FolderChanges>,
) -> Result<Json<Folder>, AppError> {
    let id = parse_id(&id, "folder")?;
    if changes.is_empty() {
        return Err(AppError::bad_request("Nothing to update"));
    }
    let changes = changes.validated()?;

    let mut folder = state.storage.get_folder(user.id(), kind, id)?;
    changes.apply(&mut folder, Utc::now());
    state.storage.update_folder(kind, &folder)?;
    Ok(Json(folder))
}

/// DELETE /folders/{id}
async fn delete_folder(
    State(state): State<AppState>,
    Extension(kind): Extension<FolderKind>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "folder")?;
    state.storage.delete_folder(user.id(), kind, id)?;
    Ok(message("Folder deleted successfully"))
}
