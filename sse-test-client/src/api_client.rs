use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// POST /send and return the status code the server answered with.
    pub async fn send(&self, client_id: &str, message: &str) -> Result<StatusCode> {
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&json!({ "id": client_id, "message": message }))
            .send()
            .await
            .context("Failed to call /send")?;

        Ok(response.status())
    }

    /// GET /health and return the number of live connections it reports.
    pub async fn connection_count(&self) -> Result<u64> {
        let body: Value = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to call /health")?
            .error_for_status()?
            .json()
            .await?;

        body["data"]["connections"]
            .as_u64()
            .context("No connection count in health response")
    }
}
