use crate::domain::icon::normalize_icon;
use crate::domain::repository::TaskRepository;
use crate::domain::task::{CreateTask, NewTask, Task, TaskId, TaskPatch, TaskUpdate};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("storage unavailable: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait TaskService: Send + Sync + 'static {
    async fn create(&self, input: CreateTask) -> Result<Task>;
    async fn get(&self, id: TaskId) -> Result<Task>;
    async fn list(&self) -> Result<Vec<Task>>;
    async fn toggle(&self, id: TaskId) -> Result<Task>;
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task>;
    async fn remove(&self, id: TaskId) -> Result<u64>;
}

#[derive(Clone)]
pub struct TaskServiceImpl<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TaskRepository> TaskService for TaskServiceImpl<R> {
    async fn create(&self, input: CreateTask) -> Result<Task> {
        let new_task = validate_create(input)?;
        let task = self.repo.create(new_task).await?;
        tracing::info!(id = %task.id, "task created");
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        self.repo.get(id).await?.ok_or(ServiceError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Task>> {
        Ok(self.repo.list().await?)
    }

    async fn toggle(&self, id: TaskId) -> Result<Task> {
        let task = self.repo.toggle(id).await?.ok_or(ServiceError::NotFound(id))?;
        tracing::info!(%id, completed = task.completed, "task toggled");
        Ok(task)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let update = validate_patch(patch)?;
        let task = self.repo.update(id, update).await?.ok_or(ServiceError::NotFound(id))?;
        tracing::info!(%id, "task updated");
        Ok(task)
    }

    async fn remove(&self, id: TaskId) -> Result<u64> {
        let affected = self.repo.delete(id).await?;
        if affected == 0 {
            tracing::debug!(%id, "delete of unknown task ignored");
        } else {
            tracing::info!(%id, "task deleted");
        }
        Ok(affected)
    }
}

fn validate_title(title: String) -> Result<String> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".into()));
    }
    Ok(title)
}

fn validate_create(input: CreateTask) -> Result<NewTask> {
    Ok(NewTask {
        title: validate_title(input.title)?,
        note: input.note,
        icon: normalize_icon(input.icon.as_deref()),
        start_date: parse_date("startDate", input.start_date.as_deref())?,
        end_date: parse_date("endDate", input.end_date.as_deref())?,
    })
}

fn validate_patch(patch: TaskPatch) -> Result<TaskUpdate> {
    let title = match patch.title {
        None => None,
        Some(None) => return Err(ServiceError::Validation("title must not be null".into())),
        Some(Some(title)) => Some(validate_title(title)?),
    };
    let start_date = match patch.start_date {
        Some(raw) => Some(parse_date("startDate", raw.as_deref())?),
        None => None,
    };
    let end_date = match patch.end_date {
        Some(raw) => Some(parse_date("endDate", raw.as_deref())?),
        None => None,
    };
    Ok(TaskUpdate {
        title,
        note: patch.note,
        icon: patch.icon.map(|icon| normalize_icon(icon.as_deref())),
        start_date,
        end_date,
    })
}

/// Parses a date-like input into an instant. Missing or blank input means "unset".
///
/// Accepts RFC 3339 with any offset, a naive `YYYY-MM-DDTHH:MM[:SS]` read as UTC,
/// or a bare `YYYY-MM-DD` read as UTC midnight.
pub fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else { return Ok(None) };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Some(naive.and_utc()));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)) {
        return Ok(Some(naive.and_utc()));
    }
    Err(ServiceError::Validation(format!("{field} is not a valid date: {raw:?}")))
}
