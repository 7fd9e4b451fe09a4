use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::TaskRepository,
    task::{NewTask, Task, TaskId, TaskUpdate},
};

const SELECT_COLUMNS: &str = "SELECT id, title, note, icon, completed, start_date, end_date FROM tasks";

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTaskRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // Every connection to `sqlite::memory:` is its own database, so keep exactly one alive.
        let options = if is_memory_url(database_url) {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }

    async fn write(&self, task: &Task) -> Result<()> {
        sqlx::query(
            "UPDATE tasks SET title = ?2, note = ?3, icon = ?4, completed = ?5, start_date = ?6, end_date = ?7
             WHERE id = ?1",
        )
        .bind(task.id.0)
        .bind(&task.title)
        .bind(&task.note)
        .bind(&task.icon)
        .bind(task.completed)
        .bind(task.start_date.map(|d| d.to_rfc3339()))
        .bind(task.end_date.map(|d| d.to_rfc3339()))
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn init(&self) -> Result<()> {
        // AUTOINCREMENT keeps ids of deleted rows from being handed out again.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                note TEXT,
                icon TEXT NOT NULL DEFAULT '✏️',
                completed INTEGER NOT NULL DEFAULT 0,
                start_date TEXT,
                end_date TEXT
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn create(&self, input: NewTask) -> Result<Task> {
        let result = sqlx::query(
            "INSERT INTO tasks (title, note, icon, completed, start_date, end_date)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
        )
        .bind(&input.title)
        .bind(&input.note)
        .bind(&input.icon)
        .bind(input.start_date.map(|d| d.to_rfc3339()))
        .bind(input.end_date.map(|d| d.to_rfc3339()))
        .execute(&*self.pool)
        .await?;
        Ok(input.into_task(TaskId(result.last_insert_rowid())))
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_task).transpose()
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id DESC"))
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    async fn update(&self, id: TaskId, input: TaskUpdate) -> Result<Option<Task>> {
        // Read-modify-write without a version check; concurrent updates to one id may lose a write.
        let Some(mut task) = self.get(id).await? else { return Ok(None) };
        input.apply_to(&mut task);
        self.write(&task).await?;
        Ok(Some(task))
    }

    async fn toggle(&self, id: TaskId) -> Result<Option<Task>> {
        let Some(mut task) = self.get(id).await? else { return Ok(None) };
        task.completed = !task.completed;
        self.write(&task).await?;
        Ok(Some(task))
    }

    async fn delete(&self, id: TaskId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id.0)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_task(row: SqliteRow) -> Result<Task> {
    let start_date: Option<String> = row.try_get("start_date")?;
    let end_date: Option<String> = row.try_get("end_date")?;
    Ok(Task {
        id: TaskId(row.try_get("id")?),
        title: row.try_get("title")?,
        note: row.try_get("note")?,
        icon: row.try_get("icon")?,
        completed: row.try_get("completed")?,
        start_date: start_date.as_deref().map(parse_stored_date).transpose()?,
        end_date: end_date.as_deref().map(parse_stored_date).transpose()?,
    })
}

fn parse_stored_date(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw).with_context(|| format!("corrupt timestamp {raw:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

/// Filesystem path behind a `sqlite://` URL, without its query string.
/// `None` for in-memory databases and other schemes.
fn sqlite_file_path(database_url: &str) -> Option<&str> {
    if is_memory_url(database_url) {
        return None;
    }
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    // `/C:/data/tasks.db` on Windows
    let path = match path.as_bytes() {
        [b'/', drive, b':', ..] if cfg!(windows) && drive.is_ascii_alphabetic() => &path[1..],
        _ => path,
    };
    Some(path).filter(|p| !p.is_empty())
}

/// Makes sure a file-backed database can be opened: creates missing parent
/// directories and an empty database file. No-op for in-memory URLs.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_file_path(database_url).map(Path::new) else { return Ok(()) };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(())
}
