use async_trait::async_trait;
use super::task::{NewTask, Task, TaskId, TaskUpdate};

#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn create(&self, input: NewTask) -> anyhow::Result<Task>;
    async fn get(&self, id: TaskId) -> anyhow::Result<Option<Task>>;
    /// All tasks, newest id first.
    async fn list(&self) -> anyhow::Result<Vec<Task>>;
    async fn update(&self, id: TaskId, input: TaskUpdate) -> anyhow::Result<Option<Task>>;
    async fn toggle(&self, id: TaskId) -> anyhow::Result<Option<Task>>;
    /// Number of rows removed, 0 when the id was unknown.
    async fn delete(&self, id: TaskId) -> anyhow::Result<u64>;
}
