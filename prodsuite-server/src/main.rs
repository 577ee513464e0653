use std::sync::Arc;

use anyhow::{Context, Result};
use prodsuite_core::{Storage, SuiteConfig};
use prodsuite_server::auth::GoogleTokenVerifier;
use prodsuite_server::push::{PushSender, WebPushSender};
use prodsuite_server::state::AppState;
use prodsuite_server::{app, logging, scheduler, singleton};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SuiteConfig::load()?;
    logging::init_logging(&config.log_level);

    let database_path = config.database_path();
    // Ensure only one instance serves this database
    let _lock = singleton::acquire_lock(&database_path)?;

    let storage = Storage::open(&database_path)
        .with_context(|| format!("Failed to open database at {}", database_path.display()))?;

    if config.auth.google_client_id.is_none() {
        tracing::warn!("auth.google_client_id is not set; every request will be rejected");
    }
    let verifier = Arc::new(GoogleTokenVerifier::new(config.auth.google_client_id.clone()));

    let push: Option<Arc<dyn PushSender>> = match WebPushSender::from_config(&config)? {
        Some(sender) => Some(Arc::new(sender)),
        None => {
            tracing::warn!("VAPID keys are not configured; push notifications are disabled");
            None
        }
    };

    let state = AppState::new(config, storage, verifier, push);

    match (&state.push, state.config.scheduler.enabled) {
        (Some(sender), true) => {
            let every = humantime::parse_duration(&state.config.scheduler.interval)
                .context("Invalid scheduler.interval")?;
            tokio::spawn(scheduler::run(
                state.storage.clone(),
                sender.clone(),
                state.timezone(),
                every,
            ));
        }
        (None, true) => tracing::info!("Reminder scheduler idle without push configuration"),
        (_, false) => tracing::info!("Reminder scheduler disabled"),
    }

    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("prodsuite-server listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
