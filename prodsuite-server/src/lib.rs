//! HTTP API for prodsuite.
//!
//! Every route lives under `/api`. Feature-gated sections (notes, journals,
//! lists, trackers) check the caller's effective permissions before any
//! handler runs; shared list links are public.

pub mod auth;
pub mod logging;
pub mod push;
pub mod routes;
pub mod scheduler;
pub mod singleton;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use prodsuite_core::permissions::Feature;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::gated;
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(value) if origin != "*" => layer.allow_origin(value).allow_credentials(true),
        _ => layer.allow_origin(Any),
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/notes", gated(routes::notes::router(), &state, Feature::Notes))
        .nest(
            "/journals",
            gated(routes::journals::router(), &state, Feature::Journal),
        )
        .nest(
            "/lists",
            routes::lists::shared_router()
                .merge(gated(routes::lists::router(), &state, Feature::Lists)),
        )
        .nest(
            "/trackers",
            gated(routes::trackers::router(), &state, Feature::Tracker),
        )
        .nest("/drawings", routes::drawings::router())
        .nest("/settings", routes::settings::router())
        .nest("/push", routes::push::router())
        .nest("/admin", routes::admin::router());

    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
