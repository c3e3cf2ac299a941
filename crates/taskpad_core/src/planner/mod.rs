use crate::settings::{Settings, normalize_endpoint};
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

const API_VERSION: &str = "2024-02-15-preview";
const MAX_SUBTASKS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a task breakdown assistant. Your job is to break down tasks into specific, actionable subtasks. Respond with a numbered list of subtasks, one per line. Keep each subtask concise and clear.";
const PROBE_SYSTEM_PROMPT: &str = "You are a helpful task planner.";
const PROBE_USER_PROMPT: &str = "Test connection";

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("planner settings are incomplete")]
    Configuration,
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response format")]
    Format,
    #[error("a plan request for this task is already in flight")]
    InFlight,
}

/// Client for the chat-completions deployment that suggests subtasks.
///
/// The client never touches the task store; callers receive the suggested
/// titles and append them themselves.
#[derive(Debug)]
pub struct PlannerClient {
    endpoint: String,
    deployment: String,
    key: String,
    http: Client,
}

impl PlannerClient {
    /// Trusts the endpoint as given. Use [`PlannerClient::from_settings`]
    /// for user-entered values.
    pub fn new(endpoint: &str, deployment: &str, key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment: deployment.to_string(),
            key: key.to_string(),
            http: Client::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, PlanError> {
        if !settings.is_complete() {
            return Err(PlanError::Configuration);
        }
        Ok(Self::new(
            &normalize_endpoint(&settings.endpoint),
            &settings.deployment_name,
            &settings.key,
        ))
    }

    /// Asks the deployment to decompose `title` into actionable steps and
    /// returns at most ten suggested subtask titles, in response order.
    pub async fn plan_subtasks(&self, title: &str) -> Result<Vec<String>, PlanError> {
        let body = json!({
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": plan_prompt(title) },
            ],
            "temperature": 0.7,
            "max_tokens": 300,
        });

        let response = self.send(&body).await?;
        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or(PlanError::Format)?;

        Ok(parse_subtask_lines(content))
    }

    /// Minimal probe exchange against the same deployment endpoint.
    pub async fn test_connection(&self) -> Result<(), PlanError> {
        let body = json!({
            "messages": [
                { "role": "system", "content": PROBE_SYSTEM_PROMPT },
                { "role": "user", "content": PROBE_USER_PROMPT },
            ],
            "max_tokens": 50,
        });

        self.send(&body).await?;
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, API_VERSION
        )
    }

    async fn send(&self, body: &Value) -> Result<Value, PlanError> {
        let response = self
            .http
            .post(self.completions_url())
            .header("api-key", &self.key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "planner request failed: status={} body={}",
                status.as_u16(),
                body
            );
            return Err(PlanError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|err| {
            log::error!("planner response is not JSON: {err}");
            PlanError::Format
        })
    }
}

fn plan_prompt(title: &str) -> String {
    format!(
        "Please break down this task into smaller subtasks: {title}. Provide 3-7 specific, actionable steps."
    )
}

/// Splits response text into trimmed, non-empty lines, strips a leading
/// `N. ` ordinal marker per line, and keeps at most ten, in order.
pub fn parse_subtask_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_ordinal(line).to_string())
        .take(MAX_SUBTASKS)
        .collect()
}

fn strip_ordinal(line: &str) -> &str {
    let digits = line
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(line.len());
    if digits > 0 && line[digits..].starts_with('.') {
        line[digits + 1..].trim_start()
    } else {
        line
    }
}

/// Tracks task ids with an outstanding plan request so a second request for
/// the same task is rejected instead of racing the first one's appends.
#[derive(Debug, Default)]
pub struct PlanTracker {
    in_flight: Mutex<HashSet<String>>,
}

impl PlanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, task_id: &str) -> Result<PlanTicket<'_>, PlanError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(task_id.to_string()) {
            return Err(PlanError::InFlight);
        }
        Ok(PlanTicket {
            tracker: self,
            task_id: task_id.to_string(),
        })
    }
}

/// Releases the tracked task id on drop.
#[derive(Debug)]
pub struct PlanTicket<'a> {
    tracker: &'a PlanTracker,
    task_id: String,
}

impl Drop for PlanTicket<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .tracker
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.task_id);
    }
}
