//! Bearer-token authentication and feature gates.
//!
//! Clients send a Google ID token as `Authorization: Bearer <token>`. The
//! token is checked by a [`TokenVerifier`], the user's permissions record is
//! created or refreshed, and the resulting [`AuthUser`] is handed to handlers.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use chrono::Utc;
use prodsuite_core::permissions::{EffectivePermissions, Feature};
use serde::Deserialize;

use crate::routes::AppError;
use crate::state::AppState;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Who a verified token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity>;
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

/// Verifies ID tokens against Google's token-info endpoint.
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        GoogleTokenVerifier {
            client: reqwest::Client::new(),
            client_id,
        }
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let client_id = self
            .client_id
            .as_deref()
            .context("auth.google_client_id is not configured")?;

        let info: TokenInfo = self
            .client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .context("token-info request failed")?
            .error_for_status()
            .context("token rejected by Google")?
            .json()
            .await
            .context("unreadable token-info response")?;

        if info.aud != client_id {
            return Err(anyhow!("token issued for another audience"));
        }

        let user_id = info
            .sub
            .filter(|s| !s.is_empty())
            .context("token has no subject")?;

        Ok(Identity {
            user_id,
            email: info.email,
            name: info.name,
        })
    }
}

/// Fixed token table, for tests and local development.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, identity: Identity) -> Self {
        self.tokens.insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| anyhow!("unknown token"))
    }
}

/// An authenticated caller with their effective permissions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
    pub permissions: EffectivePermissions,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn require(&self, feature: Feature) -> Result<(), AppError> {
        if self.permissions.allows(feature) {
            Ok(())
        } else {
            Err(AppError::access_denied(feature))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.permissions.is_admin {
            Ok(())
        } else {
            Err(AppError::admin_required())
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (_scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by a feature gate.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(parts).ok_or_else(|| AppError::unauthorized("Access token required"))?;

        let identity = state.verifier.verify(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            AppError::forbidden("Invalid or expired token")
        })?;

        state.storage.ensure_user(
            &identity.user_id,
            identity.email.as_deref(),
            identity.name.as_deref(),
            Utc::now(),
        )?;
        let permissions = state.storage.effective_permissions(&identity.user_id)?;

        let user = AuthUser {
            identity,
            permissions,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

async fn check_feature(
    feature: Feature,
    state: AppState,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &state).await?;
    user.require(feature)?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Require authentication and `feature` for every route of `router`.
pub fn gated(router: Router<AppState>, state: &AppState, feature: Feature) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        state.clone(),
        move |State(state): State<AppState>, request: Request, next: Next| {
            check_feature(feature, state, request, next)
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(header_value: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/api/notes");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_is_taken_from_the_second_word() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(Some("abc"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[tokio::test]
    async fn static_verifier_knows_only_its_tokens() {
        let verifier = StaticTokenVerifier::new().with(
            "t1",
            Identity {
                user_id: "u1".into(),
                email: Some("u1@example.com".into()),
                name: None,
            },
        );
        assert_eq!(verifier.verify("t1").await.unwrap().user_id, "u1");
        assert!(verifier.verify("t2").await.is_err());
    }

    #[tokio::test]
    async fn google_verifier_needs_a_client_id() {
        let verifier = GoogleTokenVerifier::new(None);
        let err = verifier.verify("token").await.unwrap_err();
        assert!(err.to_string().contains("google_client_id"));
    }
}
