//! Tracker, entry and statistics endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use prodsuite_core::folder::FolderKind;
use prodsuite_core::id::parse_id;
use prodsuite_core::tracker::{
    EntryQuery, EntryValues, NewTracker, Tracker, TrackerChanges, TrackerEntry, TrackerStats,
    compute_stats, parse_entry_date,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::routes::{AppError, MessageResponse, folders, message};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trackers).post(create_tracker))
        .route("/tags", get(list_tags))
        .nest("/folders", folders::router(FolderKind::Tracker))
        .route(
            "/{id}",
            get(get_tracker).put(update_tracker).delete(delete_tracker),
        )
        .route("/{id}/entries", get(list_entries).post(upsert_entry))
        // GET takes a date, PUT and DELETE take an entry id.
        .route(
            "/{id}/entries/{key}",
            get(entry_on_date).put(update_entry).delete(delete_entry),
        )
        .route("/{id}/stats", get(tracker_stats))
}

#[derive(Deserialize)]
pub struct TrackerFilter {
    pub active: Option<String>,
}

/// GET /trackers?active=true|false
async fn list_trackers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<TrackerFilter>,
) -> Result<Json<Vec<Tracker>>, AppError> {
    let active = filter.active.map(|a| a == "true");
    Ok(Json(state.storage.list_trackers(user.id(), active)?))
}

/// GET /trackers/tags
async fn list_tags(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.storage.tracker_tags(user.id())?))
}

/// GET /trackers/{id}
async fn get_tracker(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Tracker>, AppError> {
    let id = parse_id(&id, "tracker")?;
    Ok(Json(state.storage.get_tracker(user.id(), id)?))
}

/// POST /trackers
async fn create_tracker(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewTracker>,
) -> Result<(StatusCode, Json<Tracker>), AppError> {
    let folder_id = input.folder()?;
    state.storage.ensure_folder(user.id(), FolderKind::Tracker, folder_id)?;

    let tracker = input.into_tracker(user.id(), folder_id, Utc::now())?;
    state.storage.insert_tracker(&tracker)?;
    Ok((StatusCode::CREATED, Json(tracker)))
}

/// PUT /trackers/{id}
async fn update_tracker(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<TrackerChanges>,
) -> Result<Json<Tracker>, AppError> {
    let id = parse_id(&id, "tracker")?;
    changes.validate()?;
    let folder = changes.folder()?;
    if let Some(folder_id) = folder {
        state.storage.ensure_folder(user.id(), FolderKind::Tracker, folder_id)?;
    }

    let mut tracker = state.storage.get_tracker(user.id(), id)?;
    changes.apply(&mut tracker, folder, Utc::now());
    state.storage.update_tracker(&tracker)?;
    Ok(Json(tracker))
}

/// DELETE /trackers/{id} - Removes the tracker and all of its entries
async fn delete_tracker(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "tracker")?;
    state.storage.delete_tracker(user.id(), id)?;
    Ok(message("Tracker and all entries deleted successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl EntryParams {
    fn into_query(self) -> Result<EntryQuery, AppError> {
        let defaults = EntryQuery::default();
        Ok(EntryQuery {
            start: self.start_date.as_deref().map(parse_entry_date).transpose()?,
            end: self.end_date.as_deref().map(parse_entry_date).transpose()?,
            limit: self.limit.unwrap_or(defaults.limit),
            skip: self.skip.unwrap_or(defaults.skip),
        })
    }
}

/// GET /trackers/{id}/entries - Newest first
async fn list_entries(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<EntryParams>,
) -> Result<Json<Vec<TrackerEntry>>, AppError> {
    let id = parse_id(&id, "tracker")?;
    let query = params.into_query()?;
    state.storage.get_tracker(user.id(), id)?;
    Ok(Json(state.storage.list_entries(user.id(), id, &query)?))
}

/// GET /trackers/{id}/entries/{date}
async fn entry_on_date(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, date)): Path<(String, String)>,
) -> Result<Json<TrackerEntry>, AppError> {
    let id = parse_id(&id, "tracker")?;
    let date = parse_entry_date(&date)?;
    let entry = state
        .storage
        .entry_on(user.id(), id, date)?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, "Entry not found"))?;
    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct EntryInput {
    pub date: Option<String>,
    #[serde(flatten)]
    pub values: EntryValues,
}

/// POST /trackers/{id}/entries - Create or update the entry for a day
async fn upsert_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<EntryInput>,
) -> Result<(StatusCode, Json<TrackerEntry>), AppError> {
    let id = parse_id(&id, "tracker")?;
    let raw_date = input
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Date is required"))?;
    let date = parse_entry_date(&raw_date)?;

    state.storage.get_tracker(user.id(), id)?;
    let (entry, created) = state
        .storage
        .upsert_entry(user.id(), id, date, input.values, Utc::now())?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(entry)))
}

/// PUT /trackers/{id}/entries/{entry_id}
async fn update_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, entry_id)): Path<(String, String)>,
    Json(values): Json<EntryValues>,
) -> Result<Json<TrackerEntry>, AppError> {
    let id = parse_id(&id, "tracker")?;
    let entry_id = parse_id(&entry_id, "entry")?;

    let mut entry = state.storage.get_entry(user.id(), id, entry_id)?;
    entry.update(values, Utc::now());
    state.storage.update_entry(&entry)?;
    Ok(Json(entry))
}

/// DELETE /trackers/{id}/entries/{entry_id}
async fn delete_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, entry_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "tracker")?;
    let entry_id = parse_id(&entry_id, "entry")?;
    state.storage.delete_entry(user.id(), id, entry_id)?;
    Ok(message("Entry deleted successfully"))
}

/// GET /trackers/{id}/stats
async fn tracker_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TrackerStats>, AppError> {
    let id = parse_id(&id, "tracker")?;
    let tracker = state.storage.get_tracker(user.id(), id)?;
    let entries = state.storage.all_entries(user.id(), id)?;
    Ok(Json(compute_stats(
        tracker.id,
        tracker.tracker_type,
        &entries,
        state.today(),
    )))
}
