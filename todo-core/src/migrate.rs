//! Ordered, idempotent schema migrations tracked in a `schema_version` table.
//!
//! Every step is safe to run against a store written by an earlier
//! generation of the app: tables are created with `IF NOT EXISTS` and column
//! additions are skipped when the column is already there.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::Result;

enum Step {
    Sql(&'static str),
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

struct Migration {
    version: i64,
    description: &'static str,
    steps: &'static [Step],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create todos",
        steps: &[Step::Sql(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                completed BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )],
    },
    Migration {
        version: 2,
        description: "add todos.order_index",
        steps: &[Step::AddColumn {
            table: "todos",
            column: "order_index",
            definition: "INTEGER NOT NULL DEFAULT 0",
        }],
    },
    Migration {
        version: 3,
        description: "add todos.priority",
        steps: &[Step::AddColumn {
            table: "todos",
            column: "priority",
            definition: "TEXT NOT NULL DEFAULT 'none'",
        }],
    },
    Migration {
        version: 4,
        description: "add todos.due_date",
        steps: &[Step::AddColumn {
            table: "todos",
            column: "due_date",
            definition: "TEXT",
        }],
    },
    Migration {
        version: 5,
        description: "index todos.order_index",
        steps: &[Step::Sql(
            "CREATE INDEX IF NOT EXISTS idx_todos_order_index ON todos (order_index)",
        )],
    },
    Migration {
        version: 6,
        description: "normalize legacy todo values",
        // Older servers stored request values unchecked.
        steps: &[
            Step::Sql("UPDATE todos SET completed = 0 WHERE completed IS NULL"),
            Step::Sql("UPDATE todos SET order_index = 0 WHERE order_index IS NULL"),
            Step::Sql(
                "UPDATE todos SET priority = 'none'
                 WHERE priority IS NULL OR priority NOT IN ('none', 'low', 'mid', 'high')",
            ),
            // date() yields NULL for '' and anything unparseable.
            Step::Sql(
                "UPDATE todos SET due_date = date(due_date)
                 WHERE due_date IS NOT NULL AND due_date IS NOT date(due_date)",
            ),
        ],
    },
];

/// Highest version this build knows how to apply.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

pub async fn current_version(pool: &SqlitePool) -> Result<i64> {
    ensure_version_table(pool).await?;

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

pub async fn run(pool: &SqlitePool) -> Result<()> {
    let current = current_version(pool).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let mut tx = pool.begin().await?;

        for step in migration.steps {
            apply(&mut tx, step).await?;
        }

        sqlx::query("INSERT INTO schema_version (version, description, applied_at) VALUES (?, ?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

async fn ensure_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn apply(tx: &mut Transaction<'_, Sqlite>, step: &Step) -> Result<()> {
    match step {
        Step::Sql(sql) => {
            sqlx::query(*sql).execute(&mut **tx).await?;
        }
        Step::AddColumn {
            table,
            column,
            definition,
        } => {
            let present: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                    .bind(*table)
                    .bind(*column)
                    .fetch_one(&mut **tx)
                    .await?;

            if present > 0 {
                tracing::debug!(table, column, "column already exists, skipping");
                return Ok(());
            }

            sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(())
}
