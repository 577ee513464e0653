//! Colored terminal rendering for prodsuite-core types.

use owo_colors::OwoColorize;
use prodsuite_core::permissions::{Feature, UserListItem, UserPermissions};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for [Feature] {
    fn render(&self) -> String {
        if self.is_empty() {
            return "(none)".dimmed().to_string();
        }
        self.iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn badge(is_admin: bool, use_defaults: bool) -> String {
    if is_admin {
        "admin".yellow().to_string()
    } else if use_defaults {
        "defaults".dimmed().to_string()
    } else {
        "custom".cyan().to_string()
    }
}

fn label(user_id: &str, name: Option<&str>, email: Option<&str>) -> String {
    let mut parts = vec![user_id.bold().to_string()];
    if let Some(name) = name {
        parts.push(name.to_string());
    }
    if let Some(email) = email {
        parts.push(format!("<{email}>").dimmed().to_string());
    }
    parts.join(" ")
}

impl Render for UserListItem {
    fn render(&self) -> String {
        let line = format!(
            "{} [{}]",
            label(&self.user_id, self.name.as_deref(), self.email.as_deref()),
            badge(self.is_admin, self.use_defaults)
        );
        if self.effective_denied_features.is_empty() {
            line
        } else {
            format!(
                "{}\n   {} {}",
                line,
                "denied:".red(),
                self.effective_denied_features.render()
            )
        }
    }
}

impl Render for UserPermissions {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} [{}]",
            label(&self.user_id, self.name.as_deref(), self.email.as_deref()),
            badge(self.is_admin, self.use_defaults)
        )];
        lines.push(format!("  Own denied: {}", self.denied_features.render()));
        lines.push(format!(
            "  {}",
            format!(
                "Created {}, updated {} by {}",
                self.created_at.format("%Y-%m-%d"),
                self.updated_at.format("%Y-%m-%d %H:%M"),
                self.granted_by.as_deref().unwrap_or("unknown")
            )
            .dimmed()
        ));
        lines.join("\n")
    }
}
