//! Feature permissions.
//!
//! Every user has a record. Users on defaults inherit the stored default
//! denied list; admins are never denied anything; `settings` is always
//! reachable so users can sign out.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SuiteError, SuiteResult};

/// How long stored defaults are reused before being read again.
pub const DEFAULTS_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Notes,
    Journal,
    Lists,
    Tracker,
    Agent,
    Terminal,
    Server,
    Settings,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Notes,
        Feature::Journal,
        Feature::Lists,
        Feature::Tracker,
        Feature::Agent,
        Feature::Terminal,
        Feature::Server,
        Feature::Settings,
    ];

    pub const DEFAULT_DENIED: [Feature; 3] = [Feature::Agent, Feature::Terminal, Feature::Server];

    pub const ALWAYS_ALLOWED: [Feature; 1] = [Feature::Settings];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Notes => "notes",
            Feature::Journal => "journal",
            Feature::Lists => "lists",
            Feature::Tracker => "tracker",
            Feature::Agent => "agent",
            Feature::Terminal => "terminal",
            Feature::Server => "server",
            Feature::Settings => "settings",
        }
    }

    pub fn is_always_allowed(self) -> bool {
        Self::ALWAYS_ALLOWED.contains(&self)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| SuiteError::InvalidFeatures(vec![s.to_string()]))
    }
}

/// Parse requested denied features. Unknown names fail together; always-allowed
/// features are dropped.
pub fn parse_denied_features(raw: &[String]) -> SuiteResult<Vec<Feature>> {
    let invalid: Vec<String> = raw
        .iter()
        .filter(|name| name.parse::<Feature>().is_err())
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(SuiteError::InvalidFeatures(invalid));
    }

    let mut features: Vec<Feature> = Vec::new();
    for feature in raw.iter().filter_map(|name| name.parse::<Feature>().ok()) {
        if !feature.is_always_allowed() && !features.contains(&feature) {
            features.push(feature);
        }
    }
    Ok(features)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissions {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_admin: bool,
    pub denied_features: Vec<Feature>,
    /// Inherit the stored defaults instead of `denied_features`.
    pub use_defaults: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<String>,
}

impl UserPermissions {
    pub fn new(user_id: &str, email: Option<String>, name: Option<String>, now: DateTime<Utc>) -> Self {
        UserPermissions {
            user_id: user_id.to_string(),
            email,
            name,
            is_admin: false,
            denied_features: Feature::DEFAULT_DENIED.to_vec(),
            use_defaults: true,
            created_at: now,
            updated_at: now,
            granted_by: Some("system".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultPermissions {
    pub denied_features: Vec<Feature>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl DefaultPermissions {
    /// Defaults used before an admin stores any.
    pub fn builtin(now: DateTime<Utc>) -> Self {
        DefaultPermissions {
            denied_features: Feature::DEFAULT_DENIED.to_vec(),
            updated_at: now,
            updated_by: "system".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissions {
    pub user_id: String,
    pub is_admin: bool,
    pub denied_features: Vec<Feature>,
    pub allowed_features: Vec<Feature>,
    pub use_defaults: bool,
}

impl EffectivePermissions {
    pub fn allows(&self, feature: Feature) -> bool {
        !self.denied_features.contains(&feature)
    }
}

/// Denied features that actually apply to `record`.
pub fn effective_denied(record: Option<&UserPermissions>, defaults: &DefaultPermissions) -> Vec<Feature> {
    let denied = match record {
        Some(r) if r.is_admin => return Vec::new(),
        Some(r) if !r.use_defaults => &r.denied_features,
        _ => &defaults.denied_features,
    };
    denied
        .iter()
        .copied()
        .filter(|f| !f.is_always_allowed())
        .collect()
}

pub fn effective_permissions(
    user_id: &str,
    record: Option<&UserPermissions>,
    defaults: &DefaultPermissions,
) -> EffectivePermissions {
    let is_admin = record.is_some_and(|r| r.is_admin);
    let use_defaults = !is_admin && record.is_none_or(|r| r.use_defaults);
    let denied_features = effective_denied(record, defaults);
    let allowed_features = Feature::ALL
        .into_iter()
        .filter(|f| !denied_features.contains(f))
        .collect();

    EffectivePermissions {
        user_id: user_id.to_string(),
        is_admin,
        denied_features,
        allowed_features,
        use_defaults,
    }
}

/// Admin edit of one user's record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsUpdate {
    pub is_admin: Option<bool>,
    pub denied_features: Option<Vec<String>>,
    pub use_defaults: Option<bool>,
}

impl PermissionsUpdate {
    /// Apply the edit on behalf of `actor_id`.
    ///
    /// Admins may not touch other admins, and may not drop their own flag.
    pub fn apply(self, actor_id: &str, target: &mut UserPermissions, now: DateTime<Utc>) -> SuiteResult<()> {
        let is_self = target.user_id == actor_id;

        if target.is_admin && !is_self {
            return Err(SuiteError::Forbidden(
                "Cannot modify other administrators".to_string(),
            ));
        }
        if is_self && self.is_admin == Some(false) {
            return Err(SuiteError::validation("Cannot remove own admin status"));
        }

        let denied = self
            .denied_features
            .as_deref()
            .map(parse_denied_features)
            .transpose()?;

        if let Some(is_admin) = self.is_admin {
            target.is_admin = is_admin;
        }
        if let Some(use_defaults) = self.use_defaults {
            target.use_defaults = use_defaults;
        }
        if let Some(denied) = denied {
            target.denied_features = denied;
        }
        target.granted_by = Some(actor_id.to_string());
        target.updated_at = now;
        Ok(())
    }
}

/// Row in the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_admin: bool,
    pub use_defaults: bool,
    pub denied_features: Vec<Feature>,
    pub effective_denied_features: Vec<Feature>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserListItem {
    pub fn new(record: UserPermissions, defaults: &DefaultPermissions) -> Self {
        let effective_denied_features = effective_denied(Some(&record), defaults);
        UserListItem {
            user_id: record.user_id,
            email: record.email,
            name: record.name,
            is_admin: record.is_admin,
            use_defaults: record.use_defaults,
            denied_features: record.denied_features,
            effective_denied_features,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Short-lived cache of the stored defaults.
#[derive(Debug)]
pub struct DefaultsCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, DefaultPermissions)>>,
}

impl Default for DefaultsCache {
    fn default() -> Self {
        DefaultsCache::new(DEFAULTS_CACHE_TTL)
    }
}

impl DefaultsCache {
    pub fn new(ttl: Duration) -> Self {
        DefaultsCache {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return cached defaults, or call `load`. Built-in defaults are used
    /// (and not cached) when nothing is stored.
    pub fn get_or_load<F>(&self, load: F) -> SuiteResult<DefaultPermissions>
    where
        F: FnOnce() -> SuiteResult<Option<DefaultPermissions>>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some((loaded_at, defaults)) = slot.as_ref() {
            if loaded_at.elapsed() < self.ttl {
                return Ok(defaults.clone());
            }
        }

        match load()? {
            Some(defaults) => {
                *slot = Some((Instant::now(), defaults.clone()));
                Ok(defaults)
            }
            None => Ok(DefaultPermissions::builtin(Utc::now())),
        }
    }

    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn record(user_id: &str) -> UserPermissions {
        UserPermissions::new(user_id, None, None, Utc::now())
    }

    fn defaults(denied: &[Feature]) -> DefaultPermissions {
        DefaultPermissions {
            denied_features: denied.to_vec(),
            updated_at: Utc::now(),
            updated_by: "admin".into(),
        }
    }

    #[test]
    fn feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>().unwrap(), feature);
        }
        assert_eq!(serde_json::to_value(Feature::Tracker).unwrap(), "tracker");
    }

    #[test]
    fn parse_reports_all_invalid_names() {
        let raw = vec!["notes".to_string(), "games".to_string(), "chat".to_string()];
        match parse_denied_features(&raw) {
            Err(SuiteError::InvalidFeatures(invalid)) => assert_eq!(invalid, vec!["games", "chat"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parse_drops_always_allowed_and_duplicates() {
        let raw = vec!["settings".to_string(), "agent".to_string(), "agent".to_string()];
        assert_eq!(parse_denied_features(&raw).unwrap(), vec![Feature::Agent]);
    }

    #[test]
    fn new_users_inherit_defaults() {
        let user = record("u1");
        let effective = effective_permissions("u1", Some(&user), &defaults(&[Feature::Lists]));
        assert!(effective.use_defaults);
        assert_eq!(effective.denied_features, vec![Feature::Lists]);
        assert!(effective.allows(Feature::Notes));
        assert!(!effective.allows(Feature::Lists));
    }

    #[test]
    fn missing_record_uses_defaults() {
        let effective = effective_permissions("u1", None, &DefaultPermissions::builtin(Utc::now()));
        assert_eq!(effective.denied_features, Feature::DEFAULT_DENIED.to_vec());
        assert_eq!(effective.allowed_features.len(), 5);
    }

    #[test]
    fn custom_denied_list_applies_without_defaults() {
        let mut user = record("u1");
        user.use_defaults = false;
        user.denied_features = vec![Feature::Journal, Feature::Settings];

        let effective = effective_permissions("u1", Some(&user), &defaults(&[Feature::Lists]));
        assert!(!effective.use_defaults);
        assert_eq!(effective.denied_features, vec![Feature::Journal]);
        assert!(effective.allows(Feature::Settings));
    }

    #[test]
    fn admins_are_never_denied() {
        let mut admin = record("a");
        admin.is_admin = true;
        let effective = effective_permissions("a", Some(&admin), &defaults(&Feature::ALL));
        assert!(effective.is_admin);
        assert!(effective.denied_features.is_empty());
        assert_eq!(effective.allowed_features, Feature::ALL.to_vec());
    }

    #[test]
    fn admins_cannot_edit_other_admins() {
        let mut other = record("b");
        other.is_admin = true;
        let err = PermissionsUpdate {
            use_defaults: Some(false),
            ..Default::default()
        }
        .apply("a", &mut other, Utc::now())
        .unwrap_err();
        assert!(matches!(err, SuiteError::Forbidden(_)));
    }

    #[test]
    fn admins_cannot_demote_themselves() {
        let mut me = record("a");
        me.is_admin = true;
        let err = PermissionsUpdate {
            is_admin: Some(false),
            ..Default::default()
        }
        .apply("a", &mut me, Utc::now())
        .unwrap_err();
        assert_eq!(err.to_string(), "Cannot remove own admin status");
    }

    #[test]
    fn update_records_who_granted() {
        let mut user = record("u1");
        PermissionsUpdate {
            is_admin: Some(true),
            denied_features: Some(vec!["terminal".into()]),
            use_defaults: Some(false),
        }
        .apply("a", &mut user, Utc::now())
        .unwrap();

        assert!(user.is_admin);
        assert!(!user.use_defaults);
        assert_eq!(user.denied_features, vec![Feature::Terminal]);
        assert_eq!(user.granted_by.as_deref(), Some("a"));
    }

    #[test]
    fn cache_reuses_loaded_defaults_until_invalidated() {
        let cache = DefaultsCache::default();
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(Some(defaults(&[Feature::Agent])))
        };

        cache.get_or_load(load).unwrap();
        cache.get_or_load(load).unwrap();
        assert_eq!(loads.get(), 1);

        cache.invalidate();
        cache.get_or_load(load).unwrap();
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn cache_expires() {
        let cache = DefaultsCache::new(Duration::ZERO);
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(Some(defaults(&[])))
        };
        cache.get_or_load(load).unwrap();
        cache.get_or_load(load).unwrap();
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn builtin_defaults_are_not_cached() {
        let cache = DefaultsCache::default();
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(None)
        };
        let d = cache.get_or_load(load).unwrap();
        assert_eq!(d.updated_by, "system");
        cache.get_or_load(load).unwrap();
        assert_eq!(loads.get(), 2);
    }
}
