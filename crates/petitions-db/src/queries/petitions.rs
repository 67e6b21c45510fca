use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use petitions_types::api::SortBy;

use super::OptionalExt;
use crate::models::{
    NewPetition, NewSupportTier, PetitionDetailRow, PetitionFilter, PetitionRow,
    PetitionSummaryRow,
};
use crate::{Database, format_timestamp};

/// Per-petition aggregates shared by the search and detail views.
const SUMMARY_SELECT: &str = "
    SELECT p.id,
           p.title,
           p.category_id,
           p.owner_id,
           u.first_name,
           u.last_name,
           (SELECT COUNT(*) FROM supporters s WHERE s.petition_id = p.id) AS number_of_supporters,
           p.creation_date,
           (SELECT COALESCE(MIN(t.cost), 0) FROM support_tiers t WHERE t.petition_id = p.id) AS supporting_cost,
           p.description,
           (SELECT COALESCE(SUM(t.cost), 0)
              FROM supporters s
              JOIN support_tiers t ON t.id = s.support_tier_id
             WHERE s.petition_id = p.id) AS money_raised
      FROM petitions p
      JOIN users u ON u.id = p.owner_id";

impl Database {
    /// Inserts a petition and its tiers in one transaction.
    pub fn create_petition(&self, petition: &NewPetition<'_>, tiers: &[NewSupportTier<'_>]) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO petitions (title, description, creation_date, owner_id, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    petition.title,
                    petition.description,
                    format_timestamp(&petition.created_at),
                    petition.owner_id,
                    petition.category_id,
                ],
            )?;
            let petition_id = tx.last_insert_rowid();

            for tier in tiers {
                tx.execute(
                    "INSERT INTO support_tiers (petition_id, title, description, cost) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![petition_id, tier.title, tier.description, tier.cost],
                )?;
            }

            tx.commit()?;
            Ok(petition_id)
        })
    }

    pub fn get_petition(&self, id: i64) -> Result<Option<PetitionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, description, category_id, owner_id, creation_date, image_filename
                 FROM petitions WHERE id = ?1",
                [id],
                |row| {
                    Ok(PetitionRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        category_id: row.get(3)?,
                        owner_id: row.get(4)?,
                        creation_date: row.get(5)?,
                        image_filename: row.get(6)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn get_petition_detail(&self, id: i64) -> Result<Option<PetitionDetailRow>> {
        self.with_conn(|conn| {
            let sql = format!("{SUMMARY_SELECT} WHERE p.id = ?1");
            conn.query_row(&sql, [id], |row| {
                Ok(PetitionDetailRow {
                    summary: map_summary(row)?,
                    description: row.get(9)?,
                    money_raised: row.get(10)?,
                })
            })
            .optional()
        })
    }

    /// True when another petition already uses `title`. `excluding` skips the
    /// petition being edited so it can keep its own title.
    pub fn petition_title_taken(&self, title: &str, excluding: Option<i64>) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM petitions WHERE title = ?1 AND id IS NOT ?2)",
                rusqlite::params![title, excluding],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn update_petition(&self, id: i64, title: &str, description: &str, category_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE petitions SET title = ?1, description = ?2, category_id = ?3 WHERE id = ?4",
                rusqlite::params![title, description, category_id, id],
            )?;
            Ok(())
        })
    }

    /// Removes the petition; its tiers and supporters go with it.
    pub fn delete_petition(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM petitions WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn set_petition_image(&self, id: i64, filename: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE petitions SET image_filename = ?1 WHERE id = ?2",
                rusqlite::params![filename, id],
            )?;
            Ok(())
        })
    }

    pub fn count_petition_supporters(&self, petition_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM supporters WHERE petition_id = ?1",
                [petition_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// All petitions matching `filter`, sorted. Paging is left to the caller
    /// since the response reports the total match count.
    pub fn search_petitions(&self, filter: &PetitionFilter<'_>) -> Result<Vec<PetitionSummaryRow>> {
        self.with_conn(|conn| query_search(conn, filter))
    }
}

fn query_search(conn: &Connection, filter: &PetitionFilter<'_>) -> Result<Vec<PetitionSummaryRow>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(q) = filter.q {
        params.push(Value::Text(q.to_lowercase()));
        let n = params.len();
        clauses.push(format!(
            "(instr(casefold(title), ?{n}) > 0 OR instr(casefold(description), ?{n}) > 0)"
        ));
    }

    if !filter.category_ids.is_empty() {
        let placeholders: Vec<String> = filter
            .category_ids
            .iter()
            .map(|id| {
                params.push(Value::Integer(*id));
                format!("?{}", params.len())
            })
            .collect();
        clauses.push(format!("category_id IN ({})", placeholders.join(", ")));
    }

    if let Some(cost) = filter.max_supporting_cost {
        params.push(Value::Integer(cost));
        clauses.push(format!("supporting_cost <= ?{}", params.len()));
    }

    if let Some(owner_id) = filter.owner_id {
        params.push(Value::Integer(owner_id));
        clauses.push(format!("owner_id = ?{}", params.len()));
    }

    if let Some(supporter_id) = filter.supporter_id {
        params.push(Value::Integer(supporter_id));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM supporters s WHERE s.petition_id = ps.id AND s.user_id = ?{})",
            params.len()
        ));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let sql = format!(
        "SELECT * FROM ({SUMMARY_SELECT}) AS ps {where_clause} ORDER BY {}",
        order_by(filter.sort_by)
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), map_summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn order_by(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::AlphabeticalAsc => "casefold(title) ASC, id ASC",
        SortBy::AlphabeticalDesc => "casefold(title) DESC, id ASC",
        SortBy::CostAsc => "supporting_cost ASC, id ASC",
        SortBy::CostDesc => "supporting_cost DESC, id ASC",
        SortBy::CreatedAsc => "creation_date ASC, id ASC",
        SortBy::CreatedDesc => "creation_date DESC, id DESC",
    }
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<PetitionSummaryRow> {
    Ok(PetitionSummaryRow {
        id: row.get(0)?,
        title: row.get(1)?,
        category_id: row.get(2)?,
        owner_id: row.get(3)?,
        owner_first_name: row.get(4)?,
        owner_last_name: row.get(5)?,
        number_of_supporters: row.get(6)?,
        creation_date: row.get(7)?,
        supporting_cost: row.get(8)?,
    })
}
