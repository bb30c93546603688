//! HTTP client for the remote task service.
//!
//! One request per call. No retry, no explicit timeout: a failed call is
//! reported to the caller, which decides whether local state must be reverted.

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::TransportError;
use crate::task::{NewTask, StatusUpdate, Task, TaskId, TaskStatus};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    tasks_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let raw = format!("{}/tasks", base_url.trim().trim_end_matches('/'));
        let tasks_url = Url::parse(&raw)
            .map_err(|e| TransportError::invalid_url(&raw, e.to_string()))?;
        if tasks_url.cannot_be_a_base() {
            return Err(TransportError::invalid_url(&raw, "not a base URL".to_string()));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| TransportError::from_reqwest(e, "BUILD", &raw))?;
        Ok(Self { http, tasks_url })
    }

    pub fn from_config(cfg: &ApiConfig) -> Result<Self, TransportError> {
        Self::new(&cfg.base_url)
    }

    pub fn tasks_url(&self) -> &str {
        self.tasks_url.as_str()
    }

    /// `{tasks_url}/{id}` with the id percent-encoded as one path segment.
    fn task_url(&self, id: &TaskId) -> String {
        let mut url = self.tasks_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id.as_str());
        }
        url.into()
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        let url = self.tasks_url.as_str();
        tracing::debug!(target: "kanban.api", stage = "list.in", url = %url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, "GET", url))?;
        let tasks: Vec<Task> = parse_json("GET", resp).await?;
        tracing::debug!(target: "kanban.api", stage = "list.out", count = tasks.len());
        Ok(tasks)
    }

    pub async fn create_task(&self, new_task: &NewTask) -> Result<Task, TransportError> {
        let url = self.tasks_url.as_str();
        tracing::debug!(
            target: "kanban.api",
            stage = "create.in",
            url = %url,
            status = %new_task.status,
            title_len = new_task.title.len()
        );
        let resp = self
            .http
            .post(url)
            .json(new_task)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, "POST", url))?;
        let task: Task = parse_json("POST", resp).await?;
        tracing::debug!(target: "kanban.api", stage = "create.out", id = %task.id);
        Ok(task)
    }

    pub async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, TransportError> {
        let url = self.task_url(id);
        tracing::debug!(target: "kanban.api", stage = "update.in", url = %url, status = %status);
        let resp = self
            .http
            .put(&url)
            .json(&StatusUpdate { status })
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, "PUT", &url))?;
        let task: Task = parse_json("PUT", resp).await?;
        tracing::debug!(target: "kanban.api", stage = "update.out", id = %task.id, status = %task.status);
        Ok(task)
    }

    pub async fn delete_task(&self, id: &TaskId) -> Result<(), TransportError> {
        let url = self.task_url(id);
        tracing::debug!(target: "kanban.api", stage = "delete.in", url = %url);
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, "DELETE", &url))?;
        ensure_success("DELETE", resp).await?;
        tracing::debug!(target: "kanban.api", stage = "delete.out", id = %id);
        Ok(())
    }
}

async fn parse_json<T: DeserializeOwned>(
    method: &'static str,
    resp: Response,
) -> Result<T, TransportError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|e| TransportError::from_reqwest(e, method, &url))?;

    if !status.is_success() {
        return Err(TransportError::status_error(
            method,
            &url,
            status.as_u16(),
            &body,
        ));
    }

    serde_json::from_str::<T>(&body)
        .map_err(|e| TransportError::decode_error(method, &url, status.as_u16(), e, &body))
}

async fn ensure_success(method: &'static str, resp: Response) -> Result<(), TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|e| TransportError::from_reqwest(e, method, &url))?;
    Err(TransportError::status_error(
        method,
        &url,
        status.as_u16(),
        &body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.tasks_url(), "http://localhost:5000/tasks");
        assert_eq!(
            client.task_url(&TaskId::new("abc")),
            "http://localhost:5000/tasks/abc"
        );
    }

    #[tokio::test]
    async fn list_decodes_tasks() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"_id":"1","title":"T","description":"D","status":"ToDo"},
                    {"_id":"2","title":"U","description":"E","status":"Done"}]"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let tasks = client.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn create_posts_body() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/tasks")
            .match_body(Matcher::Json(
                json!({"title": "T", "description": "D", "status": "InProgress"}),
            ))
            .with_status(201)
            .with_body(r#"{"_id":"new","title":"T","description":"D","status":"InProgress"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let created = client
            .create_task(&NewTask {
                title: "T".into(),
                description: "D".into(),
                status: TaskStatus::InProgress,
            })
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(created.id, TaskId::new("new"));
    }

    #[tokio::test]
    async fn update_puts_status_only() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PUT", "/tasks/42")
            .match_body(Matcher::Json(json!({"status": "Done"})))
            .with_status(200)
            .with_body(r#"{"_id":"42","title":"T","description":"D","status":"Done"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let task = client
            .update_status(&TaskId::new("42"), TaskStatus::Done)
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/9")
            .with_status(204)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        client.delete_task(&TaskId::new("9")).await.unwrap();
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:someone").is_err());
    }

    #[tokio::test]
    async fn reserved_characters_in_id_stay_in_one_segment() {
        let mut server = Server::new_async().await;
        let wrong = server
            .mock("DELETE", "/tasks/a")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let right = server
            .mock("DELETE", "/tasks/a%3Fb%2Fc%23d")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        client.delete_task(&TaskId::new("a?b/c#d")).await.unwrap();

        right.assert_async().await;
        wrong.assert_async().await;
        assert_eq!(
            client.task_url(&TaskId::new("a?b")),
            format!("{}/tasks/a%3Fb", server.url())
        );
    }

    #[tokio::test]
    async fn non_2xx_is_transport_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/9")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.delete_task(&TaskId::new("9")).await.unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Status);
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.list_tasks().await.unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Decode);
    }

    #[tokio::test]
    async fn unreachable_host_is_connect_error() {
        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let err = client.list_tasks().await.unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Connect);
        assert_eq!(err.status(), None);
    }
}
