//! Schema versioning.

use rusqlite::Connection;

use crate::error::{SuiteError, SuiteResult};

use super::schema::SCHEMA_STATEMENTS;

pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Create all tables and indexes, then run pending migrations.
pub fn initialize_schema(conn: &Connection) -> SuiteResult<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = get_schema_version(conn)?;
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(())
}

/// 0 on a fresh database.
fn get_schema_version(conn: &Connection) -> SuiteResult<i32> {
    let result: Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value
            .parse()
            .map_err(|_| SuiteError::Migration(format!("invalid schema version: {value}"))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SuiteResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> SuiteResult<()> {
    let mut current = from_version;
    while current < CURRENT_VERSION {
        current += 1;
        run_migration(conn, current)?;
    }
    set_schema_version(conn, CURRENT_VERSION)
}

fn run_migration(conn: &Connection, version: i32) -> SuiteResult<()> {
    match version {
        1 => set_schema_version(conn, 1),
        _ => Err(SuiteError::Migration(format!(
            "unknown migration version: {version}"
        ))),
    }
}
