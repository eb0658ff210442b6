use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::QueryBuilder;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};

use crate::models::{NewTask, SortMode, Task, TaskPatch};
use crate::{Error, Result, migrate};

const TASK_COLUMNS: &str =
    "id, text, completed, order_index, priority, due_date, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Location used when no explicit path is configured.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::state_dir()
            .or_else(dirs::config_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
            .ok_or(Error::NoDataDir)?;

        Ok(config_dir.join("todo").join("data").join("todo.db"))
    }

    pub async fn connect() -> Result<Self> {
        Self::open(&Self::default_path()?).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&database_url).await?;

        Self::from_pool(pool).await
    }

    /// A private in-memory store. The pool is pinned to one connection that
    /// never expires, since each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        migrate::run(&pool).await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn schema_version(&self) -> Result<i64> {
        migrate::current_version(&self.pool).await
    }

    pub async fn list_tasks(&self, sort: SortMode) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM todos {}", sort.order_clause());
        let rows = sqlx::query_as::<_, Task>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get_task(&self, task_id: i64) -> Result<Task> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = ?");
        sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound(task_id))
    }

    /// Inserts a task at the end of the manual order. Reading the current
    /// maximum and inserting happen in one statement.
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task> {
        if new_task.text.trim().is_empty() {
            return Err(Error::Validation("Text is required".to_string()));
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO todos (text, completed, order_index, priority, due_date, created_at, updated_at)
             VALUES (?, 0, (SELECT COALESCE(MAX(order_index), 0) + 1 FROM todos), ?, ?, ?, ?)
             RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(&new_task.text)
            .bind(new_task.priority)
            .bind(new_task.due_date)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(id = task.id, order_index = task.order_index, "created task");
        Ok(task)
    }

    pub async fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task> {
        if patch.text.as_deref().is_some_and(|text| text.trim().is_empty()) {
            return Err(Error::Validation("Text must not be empty".to_string()));
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE todos SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(text) = patch.text {
            query.push(", text = ").push_bind(text);
        }
        if let Some(completed) = patch.completed {
            query.push(", completed = ").push_bind(completed);
        }
        if let Some(priority) = patch.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = patch.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(order_index) = patch.order_index {
            query.push(", order_index = ").push_bind(order_index);
        }

        query.push(" WHERE id = ").push_bind(task_id);
        query.push(" RETURNING ").push(TASK_COLUMNS);

        query
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound(task_id))
    }

    /// Gives each listed task its position in `task_ids` as its order_index.
    /// Unknown ids are skipped. The whole batch commits or none of it does.
    pub async fn reorder_tasks(&self, task_ids: &[i64]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (position, &task_id) in task_ids.iter().enumerate() {
            let position = position as i64;
            sqlx::query(
                "UPDATE todos SET order_index = ?, updated_at = ?
                 WHERE id = ? AND order_index IS NOT ?",
            )
            .bind(position)
            .bind(now)
            .bind(task_id)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = task_ids.len(), "reordered tasks");
        Ok(())
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(task_id));
        }

        Ok(())
    }
}
