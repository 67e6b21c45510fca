use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::{NewSupportTier, SupportTierRow};

impl Database {
    pub fn list_support_tiers(&self, petition_id: i64) -> Result<Vec<SupportTierRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, petition_id, title, description, cost
                 FROM support_tiers WHERE petition_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map([petition_id], map_tier)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Looks a tier up by id, scoped to the petition it must belong to.
    pub fn get_support_tier(&self, petition_id: i64, tier_id: i64) -> Result<Option<SupportTierRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, petition_id, title, description, cost
                 FROM support_tiers WHERE petition_id = ?1 AND id = ?2",
                [petition_id, tier_id],
                map_tier,
            )
            .optional()
        })
    }

    pub fn create_support_tier(&self, petition_id: i64, tier: &NewSupportTier<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO support_tiers (petition_id, title, description, cost) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![petition_id, tier.title, tier.description, tier.cost],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn update_support_tier(&self, tier_id: i64, tier: &NewSupportTier<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE support_tiers SET title = ?1, description = ?2, cost = ?3 WHERE id = ?4",
                rusqlite::params![tier.title, tier.description, tier.cost, tier_id],
            )?;
            Ok(())
        })
    }

    pub fn delete_support_tier(&self, tier_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM support_tiers WHERE id = ?1", [tier_id])?;
            Ok(())
        })
    }

    pub fn count_tier_supporters(&self, tier_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM supporters WHERE support_tier_id = ?1",
                [tier_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn map_tier(row: &Row<'_>) -> rusqlite::Result<SupportTierRow> {
    Ok(SupportTierRow {
        id: row.get(0)?,
        petition_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        cost: row.get(4)?,
    })
}
