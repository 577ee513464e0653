use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use prodsuite_core::drawing::ImageStore;
use prodsuite_core::{Storage, SuiteConfig};

use crate::auth::TokenVerifier;
use crate::push::PushSender;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SuiteConfig>,
    pub storage: Arc<Storage>,
    pub images: Arc<ImageStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// `None` when VAPID keys are not configured.
    pub push: Option<Arc<dyn PushSender>>,
}

impl AppState {
    pub fn new(
        config: SuiteConfig,
        storage: Storage,
        verifier: Arc<dyn TokenVerifier>,
        push: Option<Arc<dyn PushSender>>,
    ) -> Self {
        let images = ImageStore::new(config.images_dir());
        AppState {
            config: Arc::new(config),
            storage: Arc::new(storage),
            images: Arc::new(images),
            verifier,
            push,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    /// Current calendar day in the configured zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }
}
