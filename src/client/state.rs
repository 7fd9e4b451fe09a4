//! The client's view of the world: the task list, the selected task and the
//! draft being edited. Every transition here is synchronous and does no I/O;
//! [`super::controller::TaskController`] sequences them around store calls.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    icon::DEFAULT_ICON,
    progress::progress,
    task::{CreateTask, Task, TaskId, TaskPatch},
};

use super::datetime_local::{self, DateInputError};

/// Unsaved form contents. Dates are local `YYYY-MM-DDTHH:MM` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub note: String,
    pub icon: String,
    pub start: String,
    pub end: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self { title: String::new(), note: String::new(), icon: DEFAULT_ICON.to_string(), start: String::new(), end: String::new() }
    }
}

impl Draft {
    pub fn from_task<Tz: TimeZone>(task: &Task, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            title: task.title.clone(),
            note: task.note.clone().unwrap_or_default(),
            icon: if task.icon.is_empty() { DEFAULT_ICON.to_string() } else { task.icon.clone() },
            start: datetime_local::to_input(task.start_date, tz),
            end: datetime_local::to_input(task.end_date, tz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    Create(CreateTask),
    Update(TaskId, TaskPatch),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error(transparent)]
    Date(#[from] DateInputError),
}

#[derive(Debug, Clone, Default)]
pub struct ClientState {
    tasks: Vec<Task>,
    selected: Option<Task>,
    draft: Draft,
}

impl ClientState {
    pub fn tasks(&self) -> &[Task] { &self.tasks }
    pub fn selected(&self) -> Option<&Task> { self.selected.as_ref() }
    pub fn draft(&self) -> &Draft { &self.draft }
    pub fn draft_mut(&mut self) -> &mut Draft { &mut self.draft }
    pub fn is_editing(&self) -> bool { self.selected.is_some() }

    /// Opens `task` in the detail view. The task itself is left as it is.
    pub fn select<Tz: TimeZone>(&mut self, task: Task, tz: &Tz)
    where
        Tz::Offset: std::fmt::Display,
    {
        self.draft = Draft::from_task(&task, tz);
        self.selected = Some(task);
    }

    /// Starts a fresh draft for a new task.
    pub fn start_add(&mut self) {
        self.reset();
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Replaces the list with a fresh copy from the store. The selection follows
    /// its id into the new list and the draft is kept as typed. If the selected
    /// task is gone, selection and draft are both dropped so an edit can never
    /// turn into a create.
    pub fn refreshed(&mut self, tasks: Vec<Task>) {
        if let Some(current) = &self.selected {
            match tasks.iter().find(|t| t.id == current.id) {
                Some(fresh) => self.selected = Some(fresh.clone()),
                None => self.reset(),
            }
        }
        self.tasks = tasks;
    }

    /// A task was deleted. If it was the one open, close it.
    pub fn removed(&mut self, id: TaskId) {
        if self.selected.as_ref().is_some_and(|t| t.id == id) {
            self.reset();
        }
    }

    /// Builds what a save should send: a create without a selection, otherwise an
    /// update carrying every editable field.
    pub fn save_request<Tz: TimeZone>(&self, tz: &Tz) -> Result<SaveRequest, DraftError> {
        let draft = &self.draft;
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        let note = Some(draft.note.clone()).filter(|n| !n.is_empty());
        let start = datetime_local::to_wire(datetime_local::from_input(&draft.start, tz)?);
        let end = datetime_local::to_wire(datetime_local::from_input(&draft.end, tz)?);
        Ok(match &self.selected {
            None => SaveRequest::Create(CreateTask {
                title: title.to_string(),
                note,
                icon: Some(draft.icon.clone()),
                start_date: start,
                end_date: end,
            }),
            Some(task) => SaveRequest::Update(task.id, TaskPatch {
                title: Some(Some(title.to_string())),
                note: Some(note),
                icon: Some(Some(draft.icon.clone())),
                start_date: Some(start),
                end_date: Some(end),
            }),
        })
    }

    /// State effect of a save that the store accepted.
    pub fn saved(&mut self, request: &SaveRequest) {
        if let SaveRequest::Create(_) = request {
            self.reset();
        }
    }

    /// Progress of the open task at `now`, when it has both dates.
    pub fn selected_progress(&self, now: DateTime<Utc>) -> Option<u8> {
        let task = self.selected.as_ref()?;
        match (task.start_date, task.end_date) {
            (Some(_), Some(_)) => Some(progress(task.start_date, task.end_date, now)),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.draft = Draft::default();
        self.selected = None;
    }
}
