use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::models::{UserChanges, UserRow};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password, image_filename";

impl Database {
    pub fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, first_name, last_name, password) VALUES (?1, ?2, ?3, ?4)",
                (email, first_name, last_name, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_token(&self, token: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "auth_token = ?1", token))
    }

    /// Stores a fresh login token, or clears it on logout.
    pub fn set_auth_token(&self, user_id: i64, token: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET auth_token = ?1 WHERE id = ?2",
                rusqlite::params![token, user_id],
            )?;
            Ok(())
        })
    }

    /// Applies every provided change in a single statement; `None` keeps the
    /// stored value.
    pub fn update_user(&self, user_id: i64, changes: &UserChanges<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users
                    SET email = COALESCE(?1, email),
                        first_name = COALESCE(?2, first_name),
                        last_name = COALESCE(?3, last_name),
                        password = COALESCE(?4, password)
                  WHERE id = ?5",
                rusqlite::params![
                    changes.email,
                    changes.first_name,
                    changes.last_name,
                    changes.password_hash,
                    user_id,
                ],
            )?;
            Ok(())
        })
    }

    pub fn set_user_image(&self, user_id: i64, filename: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET image_filename = ?1 WHERE id = ?2",
                rusqlite::params![filename, user_id],
            )?;
            Ok(())
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, predicate: &str, value: P) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password: row.get(4)?,
        image_filename: row.get(5)?,
    })
}
