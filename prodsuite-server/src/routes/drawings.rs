//! Drawing endpoints and their uploaded images

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use prodsuite_core::drawing::{Drawing, DrawingChanges, MAX_IMAGE_BYTES, NewDrawing, StoredImage};
use prodsuite_core::folder::FolderKind;
use prodsuite_core::id::parse_id;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::routes::{AppError, MessageResponse, folders, message};
use crate::state::AppState;

/// Room for multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drawings).post(create_drawing))
        .nest("/folders", folders::router(FolderKind::Drawing))
        .route(
            "/{id}",
            get(get_drawing).put(update_drawing).delete(delete_drawing),
        )
        .route(
            "/{id}/images",
            post(upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/{id}/images/{image_id}", get(get_image).delete(delete_image))
}

/// GET /drawings
async fn list_drawings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Drawing>>, AppError> {
    Ok(Json(state.storage.list_drawings(user.id())?))
}

/// GET /drawings/{id}
async fn get_drawing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Drawing>, AppError> {
    let id = parse_id(&id, "drawing")?;
    Ok(Json(state.storage.get_drawing(user.id(), id)?))
}

/// POST /drawings
async fn create_drawing(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewDrawing>,
) -> Result<(StatusCode, Json<Drawing>), AppError> {
    let drawing = input.into_drawing(user.id(), Utc::now())?;
    state
        .storage
        .ensure_folder(user.id(), FolderKind::Drawing, drawing.folder_id)?;
    state.storage.insert_drawing(&drawing)?;
    Ok((StatusCode::CREATED, Json(drawing)))
}

/// PUT /drawings/{id}
async fn update_drawing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<DrawingChanges>,
) -> Result<Json<Drawing>, AppError> {
    let id = parse_id(&id, "drawing")?;
    let mut drawing = state.storage.get_drawing(user.id(), id)?;
    let previous_folder = drawing.folder_id;

    changes.apply(&mut drawing, Utc::now())?;
    if drawing.folder_id != previous_folder {
        state
            .storage
            .ensure_folder(user.id(), FolderKind::Drawing, drawing.folder_id)?;
    }
    state.storage.update_drawing(&drawing)?;
    Ok(Json(drawing))
}

/// DELETE /drawings/{id} - Also removes the drawing's images
async fn delete_drawing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "drawing")?;
    state.storage.delete_drawing(user.id(), id)?;
    if let Err(e) = state.images.remove_drawing(user.id(), id) {
        tracing::warn!(drawing_id = %id, error = %e, "Could not remove drawing images");
    }
    Ok(message("Drawing deleted successfully"))
}

/// Images are only reachable through drawings the caller owns.
fn ensure_owner(state: &AppState, user: &AuthUser, id: Uuid) -> Result<(), AppError> {
    match state.storage.drawing_owner(id)? {
        Some(owner) if owner == user.id() => Ok(()),
        _ => Err(AppError::forbidden("Unauthorized")),
    }
}

/// POST /drawings/{id}/images - multipart field `image`
async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<StoredImage>, AppError> {
    let id = parse_id(&id, "drawing")?;

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), e.body_text()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::new(e.status(), e.body_text()))?;
            image = Some(bytes);
            break;
        }
    }
    let image = image.ok_or_else(|| AppError::bad_request("No image provided"))?;

    ensure_owner(&state, &user, id)?;
    let stored = state.images.save(user.id(), id, &image)?;
    Ok(Json(stored))
}

/// GET /drawings/{id}/images/{image_id}
async fn get_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "drawing")?;
    ensure_owner(&state, &user, id)?;
    let (bytes, mime_type) = state.images.read(user.id(), id, &image_id)?;
    Ok(([(header::CONTENT_TYPE, mime_type)], bytes))
}

/// DELETE /drawings/{id}/images/{image_id}
async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "drawing")?;
    ensure_owner(&state, &user, id)?;
    state.images.delete(user.id(), id, &image_id)?;
    Ok(message("Image deleted successfully"))
}
