use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                email           TEXT NOT NULL UNIQUE,
                first_name      TEXT NOT NULL,
                last_name       TEXT NOT NULL,
                password        TEXT NOT NULL,
                auth_token      TEXT UNIQUE,
                image_filename  TEXT
            );

            CREATE TABLE categories (
                id      INTEGER PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE petitions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL UNIQUE,
                description     TEXT NOT NULL,
                creation_date   TEXT NOT NULL,
                image_filename  TEXT,
                owner_id        INTEGER NOT NULL REFERENCES users(id),
                category_id     INTEGER NOT NULL REFERENCES categories(id)
            );

            CREATE INDEX idx_petitions_owner ON petitions(owner_id);

            CREATE TABLE support_tiers (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                petition_id     INTEGER NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                cost            INTEGER NOT NULL CHECK (cost >= 0),
                UNIQUE(petition_id, title)
            );

            CREATE TABLE supporters (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                petition_id         INTEGER NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
                support_tier_id     INTEGER NOT NULL REFERENCES support_tiers(id) ON DELETE CASCADE,
                user_id             INTEGER NOT NULL REFERENCES users(id),
                message             TEXT,
                timestamp           TEXT NOT NULL,
                UNIQUE(support_tier_id, user_id)
            );

            CREATE INDEX idx_supporters_petition ON supporters(petition_id, timestamp);

            INSERT INTO categories (id, name) VALUES
                (1, 'Wildlife'),
                (2, 'Environmental Causes'),
                (3, 'Animal Rights'),
                (4, 'Health and Wellness'),
                (5, 'Education'),
                (6, 'Human Rights'),
                (7, 'Technology and Innovation'),
                (8, 'Arts and Culture'),
                (9, 'Community Development'),
                (10, 'Economic Empowerment'),
                (11, 'Science and Research'),
                (12, 'Sports and Recreation');

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
