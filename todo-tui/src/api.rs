use anyhow::{Result, bail};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use todo_core::{Confirmation, ErrorBody, NewTask, ReorderRequest, SortMode, Task, TaskPatch};

/// Thin client for the `/api/todos` endpoints.
#[derive(Clone)]
pub struct TodoClient {
    http: Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(server: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: format!("{}/api/todos", server.trim_end_matches('/')),
        }
    }

    pub async fn list(&self, sort: SortMode) -> Result<Vec<Task>> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("sortBy", sort.as_param())])
            .send()
            .await?;

        decode(response).await
    }

    pub async fn create(&self, new_task: &NewTask) -> Result<Task> {
        let response = self.http.post(&self.base_url).json(new_task).send().await?;

        decode(response).await
    }

    pub async fn update(&self, task_id: i64, patch: &TaskPatch) -> Result<Task> {
        let response = self
            .http
            .put(format!("{}/{task_id}", self.base_url))
            .json(patch)
            .send()
            .await?;

        decode(response).await
    }

    pub async fn reorder(&self, task_ids: &[i64]) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/reorder", self.base_url))
            .json(&ReorderRequest::from_ids(task_ids))
            .send()
            .await?;

        decode::<Confirmation>(response).await?;
        Ok(())
    }

    pub async fn delete(&self, task_id: i64) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/{task_id}", self.base_url))
            .send()
            .await?;

        decode::<Confirmation>(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    bail!("{status}: {message}")
}
