pub mod config;
pub mod defaults;
pub mod reminder;
pub mod users;

use anyhow::{Context, Result};
use prodsuite_core::{Storage, SuiteConfig};

/// Open the database the server uses.
pub fn open_storage(config: &SuiteConfig) -> Result<Storage> {
    let path = config.database_path();
    if !path.exists() {
        anyhow::bail!(
            "No database found at {}.\n\n\
            Start prodsuite-server once to create it, or set storage.database_path in:\n  {}",
            path.display(),
            SuiteConfig::config_path()?.display()
        );
    }
    Storage::open(&path).with_context(|| format!("Failed to open {}", path.display()))
}
