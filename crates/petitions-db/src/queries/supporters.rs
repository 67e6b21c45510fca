use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::SupporterRow;
use crate::{Database, format_timestamp};

impl Database {
    /// Supporters of a petition, newest first.
    pub fn list_supporters(&self, petition_id: i64) -> Result<Vec<SupporterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.support_tier_id, s.message, s.user_id, u.first_name, u.last_name, s.timestamp
                 FROM supporters s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.petition_id = ?1
                 ORDER BY s.timestamp DESC, s.id DESC",
            )?;
            let rows = stmt
                .query_map([petition_id], |row| {
                    Ok(SupporterRow {
                        id: row.get(0)?,
                        support_tier_id: row.get(1)?,
                        message: row.get(2)?,
                        user_id: row.get(3)?,
                        first_name: row.get(4)?,
                        last_name: row.get(5)?,
                        timestamp: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn has_supported_tier(&self, tier_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM supporters WHERE support_tier_id = ?1 AND user_id = ?2)",
                [tier_id, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn create_supporter(
        &self,
        petition_id: i64,
        tier_id: i64,
        user_id: i64,
        message: Option<&str>,
        at: &DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO supporters (petition_id, support_tier_id, user_id, message, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![petition_id, tier_id, user_id, message, format_timestamp(at)],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::is_unique_violation;
    use crate::queries::test_support::{petition, user};

    #[test]
    fn supporters_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner@example.com");
        let early = user(&db, "early@example.com");
        let late = user(&db, "late@example.com");
        let id = petition(&db, owner, "Night market", &[5]);
        let tier = db.list_support_tiers(id).unwrap()[0].id;

        let now = Utc::now();
        db.create_supporter(id, tier, early, Some("first!"), &(now - Duration::minutes(5)))
            .unwrap();
        db.create_supporter(id, tier, late, None, &now).unwrap();

        let rows = db.list_supporters(id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, late);
        assert_eq!(rows[1].message.as_deref(), Some("first!"));
    }

    #[test]
    fn double_support_at_same_tier_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner@example.com");
        let fan = user(&db, "fan@example.com");
        let id = petition(&db, owner, "Night market", &[5]);
        let tier = db.list_support_tiers(id).unwrap()[0].id;

        db.create_supporter(id, tier, fan, None, &Utc::now()).unwrap();
        assert!(db.has_supported_tier(tier, fan).unwrap());

        let err = db.create_supporter(id, tier, fan, None, &Utc::now()).unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
