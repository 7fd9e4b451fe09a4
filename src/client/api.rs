use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::{
    application::task_service::{ServiceError, TaskService},
    domain::task::{CreateTask, Task, TaskId, TaskPatch},
    http::types::{ApiError, DeleteResult},
};

/// The store as the client sees it. Mutations on an unknown id yield `None`.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>>;
    async fn create(&self, input: CreateTask) -> Result<Task>;
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>>;
    async fn toggle(&self, id: TaskId) -> Result<Option<Task>>;
    async fn remove(&self, id: TaskId) -> Result<u64>;
}

/// Talks to the `/todo` HTTP surface.
#[derive(Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: reqwest::Client::new(), base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body).map(|e| e.message).unwrap_or(body);
    Err(anyhow!("server answered {status}: {message}"))
}

/// A 200 with an empty body means the id was unknown.
async fn optional_task(response: reqwest::Response) -> Result<Option<Task>> {
    let bytes = check(response).await?.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes).context("decoding task")?))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>> {
        let response = self.client.get(self.url("/todo")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn create(&self, input: CreateTask) -> Result<Task> {
        let response = self.client.post(self.url("/todo")).json(&input).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>> {
        let response = self.client.patch(self.url(&format!("/todo/{id}"))).json(&patch).send().await?;
        optional_task(response).await
    }

    async fn toggle(&self, id: TaskId) -> Result<Option<Task>> {
        let response = self.client.patch(self.url(&format!("/todo/{id}/toggle"))).send().await?;
        optional_task(response).await
    }

    async fn remove(&self, id: TaskId) -> Result<u64> {
        let response = self.client.delete(self.url(&format!("/todo/{id}"))).send().await?;
        let result: DeleteResult = check(response).await?.json().await?;
        Ok(result.affected)
    }
}

/// Calls a [`TaskService`] in process, for running the client without a server.
#[derive(Clone)]
pub struct LocalTaskApi<S: TaskService> {
    service: S,
}

impl<S: TaskService> LocalTaskApi<S> {
    pub fn new(service: S) -> Self { Self { service } }
}

fn found(result: Result<Task, ServiceError>) -> Result<Option<Task>> {
    match result {
        Ok(task) => Ok(Some(task)),
        Err(ServiceError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl<S: TaskService> TaskApi for LocalTaskApi<S> {
    async fn list(&self) -> Result<Vec<Task>> { Ok(self.service.list().await?) }
    async fn create(&self, input: CreateTask) -> Result<Task> { Ok(self.service.create(input).await?) }
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>> { found(self.service.update(id, patch).await) }
    async fn toggle(&self, id: TaskId) -> Result<Option<Task>> { found(self.service.toggle(id).await) }
    async fn remove(&self, id: TaskId) -> Result<u64> { Ok(self.service.remove(id).await?) }
}
