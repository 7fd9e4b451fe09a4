#[cfg(test)]
mod tests {
    use super::super::task_service::{parse_date, ServiceError, TaskService, TaskServiceImpl};
    use crate::http::types::ApiError;
    use crate::domain::{
        icon::DEFAULT_ICON,
        repository::TaskRepository,
        task::{CreateTask, NewTask, Task, TaskId, TaskPatch, TaskUpdate},
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use http::StatusCode;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Inner {
        next_id: i64,
        items: BTreeMap<i64, Task>,
    }

    #[derive(Clone, Default)]
    struct InMemoryRepo {
        inner: Arc<Mutex<Inner>>,
    }

    #[async_trait]
    impl TaskRepository for InMemoryRepo {
        async fn init(&self) -> Result<()> { Ok(()) }
        async fn create(&self, input: NewTask) -> Result<Task> {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let task = input.into_task(TaskId(inner.next_id));
            inner.items.insert(task.id.0, task.clone());
            Ok(task)
        }
        async fn get(&self, id: TaskId) -> Result<Option<Task>> { Ok(self.inner.lock().unwrap().items.get(&id.0).cloned()) }
        async fn list(&self) -> Result<Vec<Task>> { Ok(self.inner.lock().unwrap().items.values().rev().cloned().collect()) }
        async fn update(&self, id: TaskId, input: TaskUpdate) -> Result<Option<Task>> {
            let mut inner = self.inner.lock().unwrap();
            let Some(task) = inner.items.get_mut(&id.0) else { return Ok(None) };
            input.apply_to(task);
            Ok(Some(task.clone()))
        }
        async fn toggle(&self, id: TaskId) -> Result<Option<Task>> {
            let mut inner = self.inner.lock().unwrap();
            let Some(task) = inner.items.get_mut(&id.0) else { return Ok(None) };
            task.completed = !task.completed;
            Ok(Some(task.clone()))
        }
        async fn delete(&self, id: TaskId) -> Result<u64> { Ok(self.inner.lock().unwrap().items.remove(&id.0).map_or(0, |_| 1)) }
    }

    fn service() -> TaskServiceImpl<InMemoryRepo> {
        TaskServiceImpl::new(InMemoryRepo::default())
    }

    fn titled(title: &str) -> CreateTask {
        CreateTask { title: title.into(), ..CreateTask::default() }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let service = service();
        let created = service.create(titled("X")).await.unwrap();
        assert_eq!(created.title, "X");
        assert!(!created.completed);
        assert_eq!(created.icon, DEFAULT_ICON);
        assert_eq!(created.note, None);
        assert_eq!(created.start_date, None);

        let with_icon = service.create(CreateTask { icon: Some("💰".into()), ..titled("Y") }).await.unwrap();
        assert_eq!(with_icon.icon, "💰");
        let empty_icon = service.create(CreateTask { icon: Some(String::new()), ..titled("Z") }).await.unwrap();
        assert_eq!(empty_icon.icon, DEFAULT_ICON);

        let got = service.get(created.id).await.unwrap();
        assert_eq!(got, created);
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_bad_dates() {
        let service = service();
        assert!(matches!(service.create(titled("   ")).await, Err(ServiceError::Validation(_))));
        let bad = CreateTask { start_date: Some("next tuesday".into()), ..titled("X") };
        assert!(matches!(service.create(bad).await, Err(ServiceError::Validation(_))));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_parses_dates_and_treats_empty_as_unset() {
        let service = service();
        let input = CreateTask {
            start_date: Some("2024-05-01T10:00:00+02:00".into()),
            end_date: Some(String::new()),
            ..titled("Trip")
        };
        let created = service.create(input).await.unwrap();
        assert_eq!(created.start_date, Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()));
        assert_eq!(created.end_date, None);
    }

    #[tokio::test]
    async fn list_is_id_descending() {
        let service = service();
        let a = service.create(titled("A")).await.unwrap();
        let b = service.create(titled("B")).await.unwrap();
        let c = service.create(titled("C")).await.unwrap();
        let ids: Vec<TaskId> = service.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn update_changes_only_present_fields() {
        let service = service();
        let created = service
            .create(CreateTask { note: Some("keep me".into()), start_date: Some("2024-05-01".into()), ..titled("Old") })
            .await
            .unwrap();

        let patch: TaskPatch = serde_json::from_value(serde_json::json!({ "title": "X" })).unwrap();
        let updated = service.update(created.id, patch).await.unwrap();
        assert_eq!(updated.title, "X");
        assert_eq!(updated.note.as_deref(), Some("keep me"));
        assert_eq!(updated.start_date, created.start_date);

        let patch: TaskPatch = serde_json::from_value(serde_json::json!({ "startDate": "" })).unwrap();
        let updated = service.update(created.id, patch).await.unwrap();
        assert_eq!(updated.start_date, None);
        assert_eq!(updated.title, "X");

        let patch: TaskPatch = serde_json::from_value(serde_json::json!({ "note": null, "icon": null })).unwrap();
        let updated = service.update(created.id, patch).await.unwrap();
        assert_eq!(updated.note, None);
        assert_eq!(updated.icon, DEFAULT_ICON);
    }

    #[tokio::test]
    async fn update_keeps_empty_note_as_given() {
        let service = service();
        let created = service.create(CreateTask { note: Some("n".into()), ..titled("T") }).await.unwrap();
        let patch = TaskPatch { note: Some(Some(String::new())), ..TaskPatch::default() };
        let updated = service.update(created.id, patch).await.unwrap();
        assert_eq!(updated.note.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn update_rejects_blank_or_null_title() {
        let service = service();
        let created = service.create(titled("T")).await.unwrap();
        let blank = TaskPatch { title: Some(Some(" ".into())), ..TaskPatch::default() };
        assert!(matches!(service.update(created.id, blank).await, Err(ServiceError::Validation(_))));
        let null = TaskPatch { title: Some(None), ..TaskPatch::default() };
        assert!(matches!(service.update(created.id, null).await, Err(ServiceError::Validation(_))));
        assert_eq!(service.get(created.id).await.unwrap().title, "T");
    }

    #[tokio::test]
    async fn missing_ids_are_observable() {
        let service = service();
        assert!(matches!(service.toggle(TaskId(42)).await, Err(ServiceError::NotFound(TaskId(42)))));
        assert!(matches!(service.update(TaskId(42), TaskPatch::default()).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(service.get(TaskId(42)).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn toggle_twice_restores() {
        let service = service();
        let created = service.create(titled("T")).await.unwrap();
        assert!(service.toggle(created.id).await.unwrap().completed);
        assert!(!service.toggle(created.id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn remove_missing_is_a_noop() {
        let service = service();
        service.create(titled("T")).await.unwrap();
        assert_eq!(service.remove(TaskId(99)).await.unwrap(), 0);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn buy_milk_pay_rent_scenario() {
        let service = service();
        let a = service.create(titled("Buy milk")).await.unwrap();
        let b = service.create(titled("Pay rent")).await.unwrap();
        let titles: Vec<String> = service.list().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Pay rent", "Buy milk"]);

        let toggled = service.toggle(a.id).await.unwrap();
        assert!(toggled.completed);
        assert!(!service.get(b.id).await.unwrap().completed);

        assert_eq!(service.remove(b.id).await.unwrap(), 1);
        let remaining = service.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, a.id);
    }

    /// Repository whose backing database is unreachable.
    #[derive(Clone)]
    struct DownRepo;

    #[async_trait]
    impl TaskRepository for DownRepo {
        async fn init(&self) -> Result<()> { Err(anyhow::anyhow!("unable to open database file")) }
        async fn create(&self, _: NewTask) -> Result<Task> { Err(anyhow::anyhow!("unable to open database file")) }
        async fn get(&self, _: TaskId) -> Result<Option<Task>> { Err(anyhow::anyhow!("unable to open database file")) }
        async fn list(&self) -> Result<Vec<Task>> { Err(anyhow::anyhow!("unable to open database file")) }
        async fn update(&self, _: TaskId, _: TaskUpdate) -> Result<Option<Task>> { Err(anyhow::anyhow!("unable to open database file")) }
        async fn toggle(&self, _: TaskId) -> Result<Option<Task>> { Err(anyhow::anyhow!("unable to open database file")) }
        async fn delete(&self, _: TaskId) -> Result<u64> { Err(anyhow::anyhow!("unable to open database file")) }
    }

    #[tokio::test]
    async fn storage_failures_surface_as_storage_errors() {
        let service = TaskServiceImpl::new(DownRepo);
        assert!(matches!(service.list().await, Err(ServiceError::Storage(_))));
        assert!(matches!(service.create(titled("T")).await, Err(ServiceError::Storage(_))));
        assert!(matches!(service.toggle(TaskId(1)).await, Err(ServiceError::Storage(_))));
        assert!(matches!(service.update(TaskId(1), TaskPatch::default()).await, Err(ServiceError::Storage(_))));
        assert!(matches!(service.remove(TaskId(1)).await, Err(ServiceError::Storage(_))));

        let err = service.list().await.unwrap_err();
        let api_error = ApiError::from(err);
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api_error.message.contains("unable to open database file"));
    }

    #[tokio::test]
    async fn validation_runs_before_storage() {
        let service = TaskServiceImpl::new(DownRepo);
        let err = service.create(titled("")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(ApiError::from(err).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn date_inputs() {
        let noon = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_date("d", Some("2024-05-01T12:00:00Z")).unwrap(), Some(noon));
        assert_eq!(parse_date("d", Some("2024-05-01T12:00:00.000Z")).unwrap(), Some(noon));
        assert_eq!(parse_date("d", Some("2024-05-01T12:00")).unwrap(), Some(noon));
        assert_eq!(
            parse_date("d", Some("2024-05-01")).unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("d", None).unwrap(), None);
        assert_eq!(parse_date("d", Some("  ")).unwrap(), None);
        assert!(parse_date("d", Some("2024-13-01")).is_err());
    }
}
