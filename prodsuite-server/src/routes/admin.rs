//! Permission administration endpoints
//!
//! `/me` is open to every authenticated user; everything else requires the
//! caller to be an administrator.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use prodsuite_core::SuiteError;
use prodsuite_core::permissions::{
    DefaultPermissions, EffectivePermissions, Feature, PermissionsUpdate, UserListItem,
    UserPermissions, parse_denied_features,
};
use prodsuite_core::storage::UserQuery;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/defaults", get(get_defaults).put(update_defaults))
        .route("/apply-defaults", post(apply_defaults))
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user).put(update_user))
}

/// GET /admin/me - The caller's effective permissions
async fn me(user: AuthUser) -> Json<EffectivePermissions> {
    Json(user.permissions)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsResponse {
    pub denied_features: Vec<Feature>,
    pub all_features: [Feature; 8],
    pub always_allowed: [Feature; 1],
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// GET /admin/defaults
async fn get_defaults(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DefaultsResponse>, AppError> {
    user.require_admin()?;
    let defaults = state.storage.default_permissions()?;
    Ok(Json(DefaultsResponse {
        denied_features: defaults.denied_features,
        all_features: Feature::ALL,
        always_allowed: Feature::ALWAYS_ALLOWED,
        updated_at: defaults.updated_at,
        updated_by: defaults.updated_by,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsUpdate {
    pub denied_features: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsUpdated {
    pub message: &'static str,
    pub denied_features: Vec<Feature>,
}

/// PUT /admin/defaults
async fn update_defaults(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<DefaultsUpdate>,
) -> Result<Json<DefaultsUpdated>, AppError> {
    user.require_admin()?;
    let raw = update
        .denied_features
        .ok_or_else(|| AppError::bad_request("deniedFeatures must be an array"))?;
    let denied_features = parse_denied_features(&raw)?;

    state.storage.save_default_permissions(&DefaultPermissions {
        denied_features: denied_features.clone(),
        updated_at: Utc::now(),
        updated_by: user.id().to_string(),
    })?;
    tracing::info!(admin = user.id(), denied = ?denied_features, "Default permissions updated");

    Ok(Json(DefaultsUpdated {
        message: "Default permissions updated",
        denied_features,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsApplied {
    pub message: &'static str,
    pub modified_count: usize,
}

/// POST /admin/apply-defaults - Put every non-admin back on the defaults
async fn apply_defaults(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DefaultsApplied>, AppError> {
    user.require_admin()?;
    let modified_count = state.storage.apply_defaults_to_all(user.id(), Utc::now())?;
    tracing::info!(admin = user.id(), modified_count, "Defaults applied to all users");
    Ok(Json(DefaultsApplied {
        message: "Defaults applied to all non-admin users",
        modified_count,
    }))
}

/// Query strings are parsed leniently: a bad number falls back to the default.
#[derive(Deserialize)]
pub struct UserListParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl UserListParams {
    fn into_query(self) -> UserQuery {
        let defaults = UserQuery::default();
        let number = |raw: Option<String>, fallback: u32| {
            raw.and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(fallback)
        };
        UserQuery {
            search: self.search,
            page: number(self.page, defaults.page),
            limit: number(self.limit, defaults.limit),
        }
        .normalized()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize)]
pub struct UserList {
    pub users: Vec<UserListItem>,
    pub pagination: Pagination,
}

/// GET /admin/users?search&page&limit
async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<UserList>, AppError> {
    user.require_admin()?;
    let query = params.into_query();
    let (records, total) = state.storage.list_users(&query)?;
    let defaults = state.storage.default_permissions()?;

    Ok(Json(UserList {
        users: records
            .into_iter()
            .map(|r| UserListItem::new(r, &defaults))
            .collect(),
        pagination: Pagination {
            page: query.page,
            limit: query.limit,
            total,
            total_pages: total.div_ceil(u64::from(query.limit)),
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserPermissions,
    pub effective_permissions: EffectivePermissions,
    pub all_features: [Feature; 8],
    pub always_allowed: [Feature; 1],
}

fn find_user(state: &AppState, user_id: &str) -> Result<UserPermissions, AppError> {
    state
        .storage
        .get_user_permissions(user_id)?
        .ok_or_else(|| SuiteError::NotFound("User").into())
}

/// GET /admin/users/{user_id}
async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserDetail>, AppError> {
    user.require_admin()?;
    let record = find_user(&state, &user_id)?;
    let effective_permissions = state.storage.effective_permissions(&user_id)?;

    Ok(Json(UserDetail {
        user: record,
        effective_permissions,
        all_features: Feature::ALL,
        always_allowed: Feature::ALWAYS_ALLOWED,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdated {
    pub message: &'static str,
    pub user: UserPermissions,
    pub effective_permissions: EffectivePermissions,
}

/// PUT /admin/users/{user_id}
async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
    Json(update): Json<PermissionsUpdate>,
) -> Result<Json<UserUpdated>, AppError> {
    user.require_admin()?;
    let mut record = find_user(&state, &user_id)?;

    update.apply(user.id(), &mut record, Utc::now())?;
    state.storage.save_user_permissions(&record)?;
    tracing::info!(admin = user.id(), target = %user_id, "User permissions updated");

    let effective_permissions = state.storage.effective_permissions(&user_id)?;
    Ok(Json(UserUpdated {
        message: "User permissions updated",
        user: record,
        effective_permissions,
    }))
}
