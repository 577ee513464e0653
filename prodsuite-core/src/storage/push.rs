use rusqlite::{Row, params};

use crate::error::SuiteResult;
use crate::push::PushSubscription;

use super::Storage;

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<PushSubscription> {
    Ok(PushSubscription {
        user_id: row.get(0)?,
        endpoint: row.get(1)?,
        p256dh: row.get(2)?,
        auth: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Storage {
    /// Insert, or refresh the keys of an endpoint the user already registered.
    pub fn upsert_subscription(&self, subscription: &PushSubscription) -> SuiteResult<()> {
        self.conn().execute(
            "INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, endpoint) DO UPDATE SET
                 p256dh = excluded.p256dh,
                 auth = excluded.auth",
            params![
                subscription.user_id,
                subscription.endpoint,
                subscription.p256dh,
                subscription.auth,
                subscription.created_at,
            ],
        )?;
        Ok(())
    }

    /// Returns whether anything was removed.
    pub fn delete_subscription(&self, user_id: &str, endpoint: &str) -> SuiteResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM push_subscriptions WHERE user_id = ?1 AND endpoint = ?2",
            params![user_id, endpoint],
        )?;
        Ok(deleted > 0)
    }

    /// Drop an endpoint the push service reported as gone.
    pub fn remove_endpoint(&self, endpoint: &str) -> SuiteResult<()> {
        self.conn()
            .execute("DELETE FROM push_subscriptions WHERE endpoint = ?1", [endpoint])?;
        Ok(())
    }

    pub fn subscriptions_for(&self, user_id: &str) -> SuiteResult<Vec<PushSubscription>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, endpoint, p256dh, auth, created_at
             FROM push_subscriptions WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let subscriptions = stmt
            .query_map([user_id], row_to_subscription)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subscriptions)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn subscription(user: &str, endpoint: &str, auth: &str) -> PushSubscription {
        PushSubscription {
            user_id: user.into(),
            endpoint: endpoint.into(),
            p256dh: "pk".into(),
            auth: auth.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resubscribing_refreshes_keys() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .upsert_subscription(&subscription("u", "https://push/1", "old"))
            .unwrap();
        storage
            .upsert_subscription(&subscription("u", "https://push/1", "new"))
            .unwrap();

        let subs = storage.subscriptions_for("u").unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].auth, "new");
    }

    #[test]
    fn unsubscribe_and_gone_endpoints() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_subscription(&subscription("u", "https://push/1", "a")).unwrap();
        storage.upsert_subscription(&subscription("u", "https://push/2", "b")).unwrap();

        assert!(storage.delete_subscription("u", "https://push/1").unwrap());
        assert!(!storage.delete_subscription("u", "https://push/1").unwrap());

        storage.remove_endpoint("https://push/2").unwrap();
        assert!(storage.subscriptions_for("u").unwrap().is_empty());
    }
}
