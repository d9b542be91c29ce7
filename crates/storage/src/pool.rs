// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pool setup: WAL journal mode, foreign keys on, migrations
//! embedded at compile time and applied at startup.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Open (creating if necessary) a SQLite database at `path` and apply any
/// pending migrations.
///
/// `path` may be `:memory:`, in which case the pool is capped at a single
/// connection so every caller shares the same in-memory database.
pub async fn connect(path: &str) -> anyhow::Result<SqlitePool> {
    let in_memory = path == ":memory:";
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 8 })
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
