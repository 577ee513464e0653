//! Note and reminder endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use prodsuite_core::SuiteError;
use prodsuite_core::id::parse_id;
use prodsuite_core::note::{NewNote, Note, NoteChanges};
use prodsuite_core::reminder::{
    ReminderError, ReminderForm, can_reactivate_reminder, count_recurring_reminders,
    create_reminder, format_reminder_display, occurrences, validate_reminder_form,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::routes::{AppError, MessageResponse, message};
use crate::state::AppState;

/// Occurrences listed in a reminder preview.
const PREVIEW_OCCURRENCES: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/tags", get(list_tags))
        .route("/reminders/preview", post(preview_reminder))
        .route("/{id}", get(get_note).put(update_note).delete(delete_note))
        .route("/{id}/reminders", post(add_reminder))
        .route("/{id}/reminders/{reminder_id}", delete(delete_reminder))
        .route(
            "/{id}/reminders/{reminder_id}/reactivate",
            post(reactivate_reminder),
        )
}

/// GET /notes
async fn list_notes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.storage.list_notes(user.id())?))
}

/// GET /notes/tags
async fn list_tags(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.storage.note_tags(user.id())?))
}

/// GET /notes/{id}
async fn get_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Note>, AppError> {
    let id = parse_id(&id, "note")?;
    Ok(Json(state.storage.get_note(user.id(), id)?))
}

/// POST /notes
async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewNote>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    input.validate()?;
    let note = Note::new(user.id(), input, Utc::now());
    state.storage.insert_note(&note)?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /notes/{id}
async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(changes): Json<NoteChanges>,
) -> Result<Json<Note>, AppError> {
    let id = parse_id(&id, "note")?;
    let changes = changes.validated()?;

    let mut note = state.storage.get_note(user.id(), id)?;
    changes.apply(&mut note, Utc::now());
    state.storage.update_note(&note)?;
    Ok(Json(note))
}

/// DELETE /notes/{id}
async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "note")?;
    state.storage.delete_note(user.id(), id)?;
    Ok(message("Note deleted successfully"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPreview {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    pub occurrences: Vec<DateTime<Utc>>,
}

/// POST /notes/reminders/preview - Validate a reminder form and describe it
async fn preview_reminder(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(form): Json<ReminderForm>,
) -> Json<ReminderPreview> {
    let tz = state.timezone();
    let now = Utc::now();
    let count = count_recurring_reminders(&form, &tz);

    if let Err(e) = validate_reminder_form(&form, now) {
        return Json(ReminderPreview {
            valid: false,
            error: Some(e.to_string()),
            count,
            display: None,
            occurrences: Vec::new(),
        });
    }

    let reminder = create_reminder(&form, now);
    let display = reminder
        .as_ref()
        .map(|r| format_reminder_display(r, &tz));
    let upcoming = match (&reminder, form.pattern()) {
        (Some(r), Some(pattern)) => occurrences(&pattern, r.date_time, PREVIEW_OCCURRENCES, &tz),
        (Some(r), None) => vec![r.date_time],
        (None, _) => Vec::new(),
    };

    Json(ReminderPreview {
        valid: true,
        error: None,
        count,
        display,
        occurrences: upcoming,
    })
}

/// POST /notes/{id}/reminders
async fn add_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(form): Json<ReminderForm>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let id = parse_id(&id, "note")?;
    let now = Utc::now();
    validate_reminder_form(&form, now).map_err(SuiteError::from)?;

    let mut note = state.storage.get_note(user.id(), id)?;
    let reminder =
        create_reminder(&form, now).ok_or(SuiteError::from(ReminderError::MissingDateTime))?;
    tracing::debug!(note_id = %note.id, reminder_id = %reminder.id, "Adding reminder");
    note.reminders.push(reminder);
    note.updated_at = now;
    state.storage.update_note(&note)?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /notes/{id}/reminders/{reminder_id}
async fn delete_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, reminder_id)): Path<(String, String)>,
) -> Result<Json<Note>, AppError> {
    let id = parse_id(&id, "note")?;
    let mut note = state.storage.get_note(user.id(), id)?;

    let before = note.reminders.len();
    note.reminders.retain(|r| r.id != reminder_id);
    if note.reminders.len() == before {
        return Err(SuiteError::NotFound("Reminder").into());
    }

    note.updated_at = Utc::now();
    state.storage.update_note(&note)?;
    Ok(Json(note))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactivateRequest {
    pub date_time: Option<DateTime<Utc>>,
}

/// POST /notes/{id}/reminders/{reminder_id}/reactivate
async fn reactivate_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, reminder_id)): Path<(String, String)>,
    Json(req): Json<ReactivateRequest>,
) -> Result<Json<Note>, AppError> {
    let id = parse_id(&id, "note")?;
    let now = Utc::now();

    let date_time = req.date_time.ok_or(SuiteError::from(ReminderError::MissingDateTime))?;
    if date_time <= now {
        return Err(SuiteError::from(ReminderError::NotInFuture).into());
    }

    let mut note = state.storage.get_note(user.id(), id)?;
    let reminder = note
        .reminder_mut(&reminder_id)
        .ok_or(SuiteError::NotFound("Reminder"))?;
    if !can_reactivate_reminder(reminder) {
        return Err(AppError::bad_request("Only completed reminders can be reactivated"));
    }
    reminder.reactivate(date_time, now);

    note.updated_at = now;
    state.storage.update_note(&note)?;
    Ok(Json(note))
}
