//! List endpoints, including share links

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use prodsuite_core::folder::FolderKind;
use prodsuite_core::id::parse_id;
use prodsuite_core::list::{List, ListChanges, NewList, ShareMode, SharedListChanges, requested_share_mode};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::routes::{AppError, MessageResponse, folders, message};
use crate::state::AppState;

/// Owner routes, behind the `lists` feature gate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lists).post(create_list))
        .route("/tags", get(list_tags))
        .nest("/folders", folders::router(FolderKind::List))
        .route("/{id}", get(get_list).put(update_list).delete(delete_list))
        .route(
            "/{id}/share",
            post(enable_sharing).put(change_share_mode).delete(disable_sharing),
        )
}

/// Share-link routes. No authentication.
pub fn shared_router() -> Router<AppState> {
    Router::new().route("/shared/{share_id}", get(get_shared_list).put(update_shared_list))
}

/// GET /lists
async fn list_lists(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<List>>, AppError> {
    Ok(Json(state.storage.list_lists(user.id())?))
}

/// GET /lists/tags
async fn list_tags(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.storage.list_tags(user.id())?))
}

/// GET /lists/{id}
async fn get_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id, "list")?;
    Ok(Json(state.storage.get_list(user.id(), id)?))
}

/// POST /lists
async fn create_list(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewList>,
) -> Result<(StatusCode, Json<List>), AppError> {
    let folder_id = input.folder()?;
    state.storage.ensure_folder(user.id(), FolderKind::List, folder_id)?;

    let list = input.into_list(user.id(), folder_id, Utc::now())?;
    state.storage.insert_list(&list)?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// PUT /lists/{id}
async fn update_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<ListChanges>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id, "list")?;
    changes.validate()?;
    let folder = changes.folder()?;
    if let Some(folder_id) = folder {
        state.storage.ensure_folder(user.id(), FolderKind::List, folder_id)?;
    }

    let mut list = state.storage.get_list(user.id(), id)?;
    changes.apply(&mut list, folder, Utc::now());
    state.storage.update_list(&list)?;
    Ok(Json(list))
}

/// DELETE /lists/{id}
async fn delete_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "list")?;
    state.storage.delete_list(user.id(), id)?;
    Ok(message("List deleted successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub share_mode: Option<String>,
}

/// POST /lists/{id}/share - Create a fresh share link
async fn enable_sharing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id, "list")?;
    let mode = requested_share_mode(req.share_mode.as_deref())?;

    let mut list = state.storage.get_list(user.id(), id)?;
    list.enable_sharing(mode, Utc::now());
    state.storage.update_list(&list)?;
    tracing::info!(list_id = %list.id, mode = %mode, "List shared");
    Ok(Json(list))
}

/// PUT /lists/{id}/share - Change the mode of an existing link
async fn change_share_mode(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id, "list")?;
    let mode = requested_share_mode(req.share_mode.as_deref())?;

    let mut list = state.storage.get_list(user.id(), id)?;
    if list.share_id.is_none() {
        list.enable_sharing(mode, Utc::now());
    } else {
        list.share_mode = mode;
        list.updated_at = Utc::now();
    }
    state.storage.update_list(&list)?;
    Ok(Json(list))
}

/// DELETE /lists/{id}/share
async fn disable_sharing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id, "list")?;
    let mut list = state.storage.get_list(user.id(), id)?;
    list.disable_sharing(Utc::now());
    state.storage.update_list(&list)?;
    Ok(Json(list))
}

/// GET /lists/shared/{share_id}
async fn get_shared_list(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<List>, AppError> {
    Ok(Json(state.storage.get_shared_list(&share_id)?))
}

/// PUT /lists/shared/{share_id} - Edit through a read-write link
async fn update_shared_list(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    Json(changes): Json<SharedListChanges>,
) -> Result<Json<List>, AppError> {
    let not_editable = || AppError::forbidden("List not found or does not allow editing");

    let mut list = match state.storage.get_shared_list(&share_id) {
        Ok(list) => list,
        Err(e) if e.is_not_found() => return Err(not_editable()),
        Err(e) => return Err(e.into()),
    };
    if list.share_mode != ShareMode::ReadWrite {
        return Err(not_editable());
    }

    changes.apply(&mut list, Utc::now());
    state.storage.update_list(&list)?;
    Ok(Json(list))
}
