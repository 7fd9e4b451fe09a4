use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};

use crate::domain::{icon::icon_color, task::{Task, TaskId}};

use super::{
    api::TaskApi,
    state::{ClientState, SaveRequest},
};

/// Drives [`ClientState`] against a [`TaskApi`].
///
/// Every mutation is followed by a full re-fetch of the list; nothing is
/// patched locally. A failed call is logged and leaves the state as it was.
///
/// Mutations report only their own outcome. When the store accepted the
/// change but the re-fetch after it failed, the call still succeeds and the
/// list is flagged stale until the next successful refresh.
pub struct TaskController<A: TaskApi, Tz: TimeZone = Local> {
    api: A,
    tz: Tz,
    state: ClientState,
    stale: bool,
}

impl<A: TaskApi> TaskController<A, Local> {
    pub fn new(api: A) -> Self {
        Self::with_time_zone(api, Local)
    }
}

impl<A: TaskApi, Tz: TimeZone> TaskController<A, Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn with_time_zone(api: A, tz: Tz) -> Self {
        Self { api, tz, state: ClientState::default(), stale: false }
    }

    pub fn state(&self) -> &ClientState { &self.state }
    pub fn state_mut(&mut self) -> &mut ClientState { &mut self.state }
    /// True while the last refresh failed, so the list may lag the store.
    pub fn is_stale(&self) -> bool { self.stale }

    pub async fn refresh(&mut self) -> Result<()> {
        match self.api.list().await {
            Ok(tasks) => {
                self.state.refreshed(tasks);
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch tasks");
                self.stale = true;
                Err(e)
            }
        }
    }

    /// Re-fetch after a mutation the store already accepted. A failure is
    /// logged by `refresh` and kept in `stale`, not returned.
    async fn resync(&mut self) {
        let _ = self.refresh().await;
    }

    pub fn select(&mut self, task: Task) {
        self.state.select(task, &self.tz);
    }

    pub fn start_add(&mut self) {
        self.state.start_add();
    }

    pub fn cancel(&mut self) {
        self.state.cancel();
    }

    pub async fn save(&mut self) -> Result<()> {
        let request = self.state.save_request(&self.tz)?;
        let sent = match &request {
            SaveRequest::Create(input) => self.api.create(input.clone()).await.map(|_| ()),
            SaveRequest::Update(id, patch) => self.api.update(*id, patch.clone()).await.map(|updated| {
                if updated.is_none() {
                    tracing::info!(%id, "saved task no longer exists");
                }
            }),
        };
        if let Err(e) = sent {
            tracing::warn!(error = %e, "failed to save task");
            return Err(e);
        }
        self.state.saved(&request);
        self.resync().await;
        Ok(())
    }

    pub async fn toggle(&mut self, id: TaskId) -> Result<()> {
        if let Err(e) = self.api.toggle(id).await {
            tracing::warn!(%id, error = %e, "failed to toggle task");
            return Err(e);
        }
        self.resync().await;
        Ok(())
    }

    pub async fn remove(&mut self, id: TaskId) -> Result<()> {
        if let Err(e) = self.api.remove(id).await {
            tracing::warn!(%id, error = %e, "failed to delete task");
            return Err(e);
        }
        self.state.removed(id);
        self.resync().await;
        Ok(())
    }

    pub fn color_of(task: &Task) -> &'static str {
        icon_color(&task.icon)
    }

    pub fn selected_progress(&self, now: DateTime<Utc>) -> Option<u8> {
        self.state.selected_progress(now)
    }
}
