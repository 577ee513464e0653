use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use prodsuite_core::{Storage, SuiteError};
use prodsuite_core::permissions::{DefaultPermissions, Feature, parse_denied_features};

use crate::render::Render;
use crate::utils::tui;

/// Actor recorded for changes made from the command line.
const CLI_ACTOR: &str = "cli";

pub fn show(storage: &Storage) -> Result<()> {
    let defaults = storage.default_permissions()?;
    println!("{}", "Default permissions".bold());
    println!("  Denied:          {}", defaults.denied_features.render());
    println!("  Always allowed:  {}", Feature::ALWAYS_ALLOWED.render());
    println!(
        "  {}",
        format!(
            "Updated {} by {}",
            defaults.updated_at.format("%Y-%m-%d %H:%M UTC"),
            defaults.updated_by
        )
        .dimmed()
    );
    Ok(())
}

pub fn set(storage: &Storage, features: &[String]) -> Result<()> {
    let denied_features = parse_denied_features(features).map_err(|e| match e {
        SuiteError::InvalidFeatures(invalid) => {
            let valid: Vec<&str> = Feature::ALL.iter().map(|f| f.as_str()).collect();
            anyhow::anyhow!(
                "Invalid features: {}\nValid features: {}",
                invalid.join(", "),
                valid.join(", ")
            )
        }
        other => other.into(),
    })?;

    storage.save_default_permissions(&DefaultPermissions {
        denied_features: denied_features.clone(),
        updated_at: Utc::now(),
        updated_by: CLI_ACTOR.to_string(),
    })?;

    println!("{} {}", "Denied by default:".green(), denied_features.render());
    Ok(())
}

pub fn apply(storage: &Storage, assume_yes: bool) -> Result<()> {
    if !tui::confirm(
        "Put every non-admin user back on the default permissions?".to_string(),
        assume_yes,
    )? {
        return Ok(());
    }

    let changed = storage.apply_defaults_to_all(CLI_ACTOR, Utc::now())?;
    println!(
        "{} {} {}",
        "Applied defaults to".green(),
        changed,
        if changed == 1 { "user" } else { "users" }
    );
    Ok(())
}
