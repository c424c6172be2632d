//! CLI command implementations.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::time::Duration;
use webqueue_core::{Job, JobId, JobStatus, Payload};

/// Thin HTTP client for the webqueue server.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"].as_str().unwrap_or("no error message");
            bail!("server returned {}: {}", status, message);
        }
        response
            .json()
            .await
            .context("Failed to decode server response")
    }

    pub async fn submit(&self, payload: &Payload) -> Result<Job> {
        let response = self
            .http
            .post(self.url("/monitor"))
            .json(payload)
            .send()
            .await
            .context("Failed to reach server")?;
        Self::read(response).await
    }

    pub async fn queue(&self) -> Result<Vec<Job>> {
        let response = self
            .http
            .get(self.url("/queue"))
            .send()
            .await
            .context("Failed to reach server")?;
        Self::read(response).await
    }

    pub async fn result(&self, id: &JobId) -> Result<Job> {
        let response = self
            .http
            .post(self.url("/results"))
            .json(&serde_json::json!({ "id": id }))
            .send()
            .await
            .context("Failed to reach server")?;
        Self::read(response).await
    }
}

fn parse_payload(text: &str) -> Result<Payload> {
    let value: Value = serde_json::from_str(text).context("Payload is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("Payload must be a JSON object"),
    }
}

fn parse_id(text: &str) -> Result<JobId> {
    text.parse()
        .with_context(|| format!("Invalid job id: {}", text))
}

fn job_line(job: &Job) -> String {
    let payload = Value::Object(job.payload.clone());
    format!("{}  {:<7}  {}", job.id, job.status, payload)
}

pub async fn submit(client: &Client, payload: &str) -> Result<()> {
    let payload = parse_payload(payload)?;
    let job = client.submit(&payload).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

pub async fn queue(client: &Client) -> Result<()> {
    let jobs = client.queue().await?;
    if jobs.is_empty() {
        println!("Queue is empty");
    }
    for job in &jobs {
        println!("{}", job_line(job));
    }
    Ok(())
}

pub async fn result(client: &Client, id: &str) -> Result<()> {
    let job = client.result(&parse_id(id)?).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

pub async fn wait(client: &Client, id: &str, interval_ms: u64) -> Result<()> {
    let id = parse_id(id)?;
    loop {
        let job = client.result(&id).await?;
        if job.status.is_terminal() {
            println!("{}", serde_json::to_string_pretty(&job)?);
            if job.status == JobStatus::Failed {
                bail!("Job {} failed", id);
            }
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    }
}
