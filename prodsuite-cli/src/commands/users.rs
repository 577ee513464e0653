use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use prodsuite_core::Storage;
use prodsuite_core::permissions::UserListItem;
use prodsuite_core::storage::UserQuery;

use crate::render::Render;
use crate::utils::tui;

pub fn list(storage: &Storage, search: Option<String>, page: u32, limit: u32) -> Result<()> {
    let query = UserQuery {
        search,
        page,
        limit,
    }
    .normalized();
    let (records, total) = storage.list_users(&query)?;
    let defaults = storage.default_permissions()?;

    if records.is_empty() {
        println!("{}", "No users found".dimmed());
        return Ok(());
    }

    for record in records {
        println!("{}", UserListItem::new(record, &defaults).render());
    }

    let pages = total.div_ceil(u64::from(query.limit));
    println!();
    println!(
        "{}",
        format!("Page {} of {} ({} users)", query.page, pages, total).dimmed()
    );
    Ok(())
}

pub fn show(storage: &Storage, user_id: &str) -> Result<()> {
    let Some(record) = storage.get_user_permissions(user_id)? else {
        anyhow::bail!("User '{}' not found", user_id);
    };
    let effective = storage.effective_permissions(user_id)?;

    println!("{}", record.render());
    println!("  Allowed:   {}", effective.allowed_features.render());
    println!("  Denied:    {}", effective.denied_features.render());
    Ok(())
}

pub fn set_admin(storage: &Storage, user_id: &str, is_admin: bool, assume_yes: bool) -> Result<()> {
    if !is_admin && !tui::confirm(format!("Revoke admin from {user_id}?"), assume_yes)? {
        return Ok(());
    }

    let record = storage.set_admin(user_id, is_admin, Utc::now())?;
    let verb = if is_admin { "Granted admin to" } else { "Revoked admin from" };
    println!("{} {}", verb.green(), record.user_id);
    Ok(())
}
