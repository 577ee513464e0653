use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{SuiteError, SuiteResult};
use crate::permissions::{
    DefaultPermissions, EffectivePermissions, UserPermissions, effective_permissions,
};

use super::{Storage, json_column, to_json};

const USER_COLUMNS: &str = "user_id, email, name, is_admin, denied_features, use_defaults, \
                            granted_by, created_at, updated_at";

/// Admin user listing filters. `page` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        UserQuery {
            search: None,
            page: 1,
            limit: 50,
        }
    }
}

impl UserQuery {
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp page and limit to usable values.
    pub fn normalized(self) -> Self {
        UserQuery {
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            page: self.page.max(1),
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserPermissions> {
    Ok(UserPermissions {
        user_id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        is_admin: row.get(3)?,
        denied_features: json_column(row, 4)?,
        use_defaults: row.get(5)?,
        granted_by: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Storage {
    pub fn get_user_permissions(&self, user_id: &str) -> SuiteResult<Option<UserPermissions>> {
        let record = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user_permissions WHERE user_id = ?1"),
                [user_id],
                row_to_user,
            )
            .optional()?;
        Ok(record)
    }

    /// Fetch the user's record, creating it with defaults on first sight and
    /// refreshing email and name from the identity provider.
    pub fn ensure_user(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> SuiteResult<UserPermissions> {
        match self.get_user_permissions(user_id)? {
            None => {
                let record = UserPermissions::new(
                    user_id,
                    email.map(str::to_string),
                    name.map(str::to_string),
                    now,
                );
                self.save_user_permissions(&record)?;
                tracing::info!(user_id, "Created permissions record");
                Ok(record)
            }
            Some(mut record) => {
                let email_changed = email.is_some_and(|e| record.email.as_deref() != Some(e));
                let name_changed = name.is_some_and(|n| record.name.as_deref() != Some(n));
                if email_changed || name_changed {
                    if email_changed {
                        record.email = email.map(str::to_string);
                    }
                    if name_changed {
                        record.name = name.map(str::to_string);
                    }
                    record.updated_at = now;
                    self.save_user_permissions(&record)?;
                }
                Ok(record)
            }
        }
    }

    pub fn save_user_permissions(&self, record: &UserPermissions) -> SuiteResult<()> {
        self.conn().execute(
            &format!(
                "INSERT OR REPLACE INTO user_permissions ({USER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                record.user_id,
                record.email,
                record.name,
                record.is_admin,
                to_json(&record.denied_features)?,
                record.use_defaults,
                record.granted_by,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    /// One page of users plus the total match count. Admins first, then by
    /// name and email.
    pub fn list_users(&self, query: &UserQuery) -> SuiteResult<(Vec<UserPermissions>, u64)> {
        let conn = self.conn();
        let filter = "(?1 IS NULL
                       OR instr(lower(user_id), lower(?1)) > 0
                       OR instr(lower(coalesce(email, '')), lower(?1)) > 0
                       OR instr(lower(coalesce(name, '')), lower(?1)) > 0)";

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM user_permissions WHERE {filter}"),
            params![query.search],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user_permissions WHERE {filter}
             ORDER BY is_admin DESC, name COLLATE NOCASE, email COLLATE NOCASE
             LIMIT ?2 OFFSET ?3"
        ))?;
        let users = stmt
            .query_map(
                params![query.search, i64::from(query.limit), query.offset()],
                row_to_user,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, u64::try_from(total).unwrap_or_default()))
    }

    /// Stored defaults, bypassing the cache.
    pub fn stored_default_permissions(&self) -> SuiteResult<Option<DefaultPermissions>> {
        let defaults = self
            .conn()
            .query_row(
                "SELECT denied_features, updated_at, updated_by FROM default_permissions WHERE id = 1",
                [],
                |row| {
                    Ok(DefaultPermissions {
                        denied_features: json_column(row, 0)?,
                        updated_at: row.get(1)?,
                        updated_by: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(defaults)
    }

    /// Current defaults, served from a short-lived cache.
    pub fn default_permissions(&self) -> SuiteResult<DefaultPermissions> {
        self.defaults.get_or_load(|| self.stored_default_permissions())
    }

    pub fn save_default_permissions(&self, defaults: &DefaultPermissions) -> SuiteResult<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO default_permissions (id, denied_features, updated_at, updated_by)
             VALUES (1, ?1, ?2, ?3)",
            params![
                to_json(&defaults.denied_features)?,
                defaults.updated_at,
                defaults.updated_by,
            ],
        )?;
        self.defaults.invalidate();
        Ok(())
    }

    /// Put every non-admin back on the defaults. Their own denied lists are
    /// kept for when they leave defaults again. Returns how many records changed.
    pub fn apply_defaults_to_all(&self, actor_id: &str, now: DateTime<Utc>) -> SuiteResult<usize> {
        let changed = self.conn().execute(
            "UPDATE user_permissions
             SET use_defaults = 1, granted_by = ?1, updated_at = ?2
             WHERE is_admin = 0",
            params![actor_id, now],
        )?;
        Ok(changed)
    }

    pub fn effective_permissions(&self, user_id: &str) -> SuiteResult<EffectivePermissions> {
        let record = self.get_user_permissions(user_id)?;
        let defaults = self.default_permissions()?;
        Ok(effective_permissions(user_id, record.as_ref(), &defaults))
    }

    /// Grant or revoke admin outside the admin API (maintenance CLI).
    pub fn set_admin(&self, user_id: &str, is_admin: bool, now: DateTime<Utc>) -> SuiteResult<UserPermissions> {
        let mut record = self
            .get_user_permissions(user_id)?
            .ok_or(SuiteError::NotFound("User"))?;
        record.is_admin = is_admin;
        record.granted_by = Some("cli".to_string());
        record.updated_at = now;
        self.save_user_permissions(&record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Feature;

    fn storage_with_users(users: &[(&str, &str, bool)]) -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        for (id, name, admin) in users {
            let email = format!("{id}@example.com");
            let mut record = storage
                .ensure_user(id, Some(email.as_str()), Some(*name), Utc::now())
                .unwrap();
            record.is_admin = *admin;
            storage.save_user_permissions(&record).unwrap();
        }
        storage
    }

    #[test]
    fn ensure_user_creates_then_refreshes() {
        let storage = Storage::open_in_memory().unwrap();
        let created = storage.ensure_user("u", Some("a@x.io"), None, Utc::now()).unwrap();
        assert!(created.use_defaults);
        assert_eq!(created.granted_by.as_deref(), Some("system"));

        let refreshed = storage
            .ensure_user("u", Some("b@x.io"), Some("Bee"), Utc::now())
            .unwrap();
        assert_eq!(refreshed.email.as_deref(), Some("b@x.io"));
        assert_eq!(refreshed.name.as_deref(), Some("Bee"));
        assert_eq!(refreshed.created_at, created.created_at);
    }

    #[test]
    fn builtin_defaults_until_saved() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(
            storage.default_permissions().unwrap().denied_features,
            Feature::DEFAULT_DENIED.to_vec()
        );

        storage
            .save_default_permissions(&DefaultPermissions {
                denied_features: vec![Feature::Lists],
                updated_at: Utc::now(),
                updated_by: "admin".into(),
            })
            .unwrap();
        assert_eq!(
            storage.default_permissions().unwrap().denied_features,
            vec![Feature::Lists]
        );

        storage.ensure_user("u", None, None, Utc::now()).unwrap();
        let effective = storage.effective_permissions("u").unwrap();
        assert!(!effective.allows(Feature::Lists));
        assert!(effective.allows(Feature::Agent));
    }

    #[test]
    fn listing_puts_admins_first_and_paginates() {
        let storage = storage_with_users(&[
            ("u1", "Carol", false),
            ("u2", "alice", false),
            ("u3", "Zed", true),
            ("u4", "Bob", false),
        ]);

        let (users, total) = storage.list_users(&UserQuery::default()).unwrap();
        assert_eq!(total, 4);
        let names: Vec<_> = users.iter().filter_map(|u| u.name.as_deref()).collect();
        assert_eq!(names, vec!["Zed", "alice", "Bob", "Carol"]);

        let page_two = UserQuery {
            page: 2,
            limit: 3,
            ..Default::default()
        };
        let (users, total) = storage.list_users(&page_two).unwrap();
        assert_eq!(total, 4);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name.as_deref(), Some("Carol"));
    }

    #[test]
    fn search_matches_email_name_and_id() {
        let storage = storage_with_users(&[("u1", "Carol", false), ("u2", "Alice", false)]);
        let query = UserQuery {
            search: Some("ALI".into()),
            ..Default::default()
        };
        let (users, total) = storage.list_users(&query).unwrap();
        assert_eq!(total, 1);
        assert_eq!(users[0].user_id, "u2");

        let by_email = UserQuery {
            search: Some("u1@example".into()),
            ..Default::default()
        };
        assert_eq!(storage.list_users(&by_email).unwrap().1, 1);
    }

    #[test]
    fn apply_defaults_skips_admins() {
        let storage = storage_with_users(&[("u1", "A", false), ("u2", "B", true)]);
        let mut custom = storage.get_user_permissions("u1").unwrap().unwrap();
        custom.use_defaults = false;
        custom.denied_features = vec![];
        storage.save_user_permissions(&custom).unwrap();

        assert_eq!(storage.apply_defaults_to_all("u2", Utc::now()).unwrap(), 1);
        let reset = storage.get_user_permissions("u1").unwrap().unwrap();
        assert!(reset.use_defaults);
        assert_eq!(reset.granted_by.as_deref(), Some("u2"));
        assert_eq!(
            storage.effective_permissions("u1").unwrap().denied_features,
            Feature::DEFAULT_DENIED.to_vec()
        );
    }

    #[test]
    fn query_normalization_clamps() {
        let q = UserQuery {
            search: Some("  ".into()),
            page: 0,
            limit: 500,
        }
        .normalized();
        assert_eq!(q.search, None);
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, UserQuery::MAX_LIMIT);
    }

    #[test]
    fn set_admin_requires_known_user() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(storage.set_admin("ghost", true, Utc::now()).unwrap_err().is_not_found());
        storage.ensure_user("u", None, None, Utc::now()).unwrap();
        assert!(storage.set_admin("u", true, Utc::now()).unwrap().is_admin);
    }
}
