//! Push subscription endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use prodsuite_core::push::{NotificationPayload, SubscriptionInput};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::push::{PushSender, notify_user};
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vapid-public-key", get(vapid_public_key))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/test", post(send_test))
}

#[derive(Serialize)]
pub struct Acknowledged {
    pub success: bool,
    pub message: &'static str,
}

fn acknowledged(message: &'static str) -> Json<Acknowledged> {
    Json(Acknowledged {
        success: true,
        message,
    })
}

fn sender(state: &AppState) -> Result<Arc<dyn PushSender>, AppError> {
    state.push.clone().ok_or_else(AppError::push_not_configured)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    pub public_key: String,
    pub configured: bool,
}

/// GET /push/vapid-public-key
async fn vapid_public_key(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<PublicKey>, AppError> {
    let public_key = state
        .config
        .push
        .vapid_public_key
        .clone()
        .filter(|_| state.push.is_some())
        .ok_or_else(AppError::push_not_configured)?;
    Ok(Json(PublicKey {
        public_key,
        configured: true,
    }))
}

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub subscription: Option<SubscriptionInput>,
}

/// POST /push/subscribe
async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<Acknowledged>, AppError> {
    let subscription = req
        .subscription
        .ok_or_else(|| AppError::bad_request("Invalid subscription object"))?
        .into_subscription(user.id(), Utc::now())?;
    sender(&state)?;

    state.storage.upsert_subscription(&subscription)?;
    tracing::info!(user_id = user.id(), "Push subscription stored");
    Ok(acknowledged("Subscribed to push notifications"))
}

#[derive(Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: Option<String>,
}

/// POST /push/unsubscribe
async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<Acknowledged>, AppError> {
    let endpoint = req
        .endpoint
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::bad_request("Endpoint is required"))?;
    state.storage.delete_subscription(user.id(), &endpoint)?;
    Ok(acknowledged("Unsubscribed from push notifications"))
}

/// POST /push/test - Send a test notification to all of the caller's devices
async fn send_test(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Acknowledged>, AppError> {
    let sender = sender(&state)?;
    let payload = NotificationPayload::test().to_json();
    let delivered = notify_user(&state.storage, sender.as_ref(), user.id(), &payload).await?;
    tracing::debug!(user_id = user.id(), delivered, "Test notification sent");
    Ok(acknowledged("Test notification sent"))
}
