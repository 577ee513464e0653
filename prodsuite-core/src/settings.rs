//! Per-user preferences. Currently only the UI theme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SuiteError, SuiteResult};

pub const DEFAULT_THEME_ID: &str = "default-dark";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeText {
    pub color: String,
    pub font_size: String,
    pub font_weight_semi_bold: String,
}

/// Colors of a user-defined theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeValues {
    pub background_darker: String,
    pub background_darkest: String,
    pub border: String,
    pub text: ThemeText,
    pub accent: String,
    pub accent_dark: String,
    pub panel_border: String,
    pub accent_green: String,
    pub accent_orange: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    pub theme_id: String,
    pub custom_theme: Option<ThemeValues>,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        ThemeSettings {
            theme_id: DEFAULT_THEME_ID.to_string(),
            custom_theme: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub theme_id: String,
    pub custom_theme: Option<ThemeValues>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn theme(&self) -> ThemeSettings {
        ThemeSettings {
            theme_id: self.theme_id.clone(),
            custom_theme: self.custom_theme.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeUpdate {
    pub theme_id: Option<String>,
    /// Left untouched when absent.
    pub custom_theme: Option<ThemeValues>,
}

impl ThemeUpdate {
    pub fn theme_id(&self) -> SuiteResult<&str> {
        self.theme_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SuiteError::validation("themeId is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_dark() {
        let json = serde_json::to_value(ThemeSettings::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "themeId": "default-dark", "customTheme": null }));
    }

    #[test]
    fn theme_id_is_required() {
        let update: ThemeUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(update.theme_id().unwrap_err().to_string(), "themeId is required");

        let update: ThemeUpdate = serde_json::from_str(r#"{"themeId":"ocean"}"#).unwrap();
        assert_eq!(update.theme_id().unwrap(), "ocean");
    }

    #[test]
    fn custom_theme_parses_nested_text() {
        let update: ThemeUpdate = serde_json::from_value(serde_json::json!({
            "themeId": "custom",
            "customTheme": {
                "backgroundDarker": "#111",
                "backgroundDarkest": "#000",
                "border": "#333",
                "text": { "color": "#eee", "fontSize": "14px", "fontWeightSemiBold": "600" },
                "accent": "#0af",
                "accentDark": "#08c",
                "panelBorder": "#222",
                "accentGreen": "#0f0",
                "accentOrange": "#f80"
            }
        }))
        .unwrap();
        assert_eq!(update.custom_theme.unwrap().text.font_size, "14px");
    }
}
