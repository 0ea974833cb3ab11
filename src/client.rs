/// HTTP client for the hosted Agents REST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::agent::{AgentService, CreateThreadAndRun, MessageList, ThreadMessage, ThreadRun};
use crate::config::AgentEndpointConfig;
use crate::credential::TokenProvider;
use crate::error::{PlannerError, Result};

const API_VERSION: &str = "v1";
const MESSAGE_PAGE_LIMIT: &str = "100";

/// Agent service client; build once per process and share it
pub struct FoundryAgentClient {
    http: Client,
    project_url: String,
    tokens: TokenProvider,
}

impl FoundryAgentClient {
    pub fn new(endpoint: &AgentEndpointConfig, http: Client, tokens: TokenProvider) -> Result<Self> {
        let project_url = project_url(&endpoint.endpoint, endpoint.project_name.as_deref())?;
        tracing::info!(%project_url, "agent client initialized");
        Ok(Self {
            http,
            project_url,
            tokens,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.tokens.token().await?;
        let response = request
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "agent service error response");
            return Err(PlannerError::Service {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AgentService for FoundryAgentClient {
    async fn create_thread_and_run(&self, agent_id: &str, prompt: &str) -> Result<ThreadRun> {
        let url = format!("{}/threads/runs", self.project_url);
        let body = CreateThreadAndRun::with_prompt(agent_id, prompt);
        self.send(self.http.post(&url).json(&body)).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun> {
        let url = format!(
            "{}/threads/{}/runs/{}",
            self.project_url,
            urlencoding::encode(thread_id),
            urlencoding::encode(run_id)
        );
        self.send(self.http.get(&url)).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let url = format!(
            "{}/threads/{}/messages",
            self.project_url,
            urlencoding::encode(thread_id)
        );

        let mut messages = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("order", "desc"), ("limit", MESSAGE_PAGE_LIMIT)]);
            if let Some(cursor) = after.as_deref() {
                request = request.query(&[("after", cursor)]);
            }

            let page: MessageList = self.send(request).await?;
            let cursor = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|m| m.id.clone()));
            messages.extend(page.data);

            match cursor {
                Some(cursor) if page.has_more => {
                    tracing::debug!(thread_id, after = %cursor, "fetching next message page");
                    after = Some(cursor);
                }
                _ => break,
            }
        }
        Ok(messages)
    }
}

/// Resolve the project-scoped base URL.
/// Endpoints that already name a project are used as-is.
fn project_url(endpoint: &str, project_name: Option<&str>) -> Result<String> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(PlannerError::Config("agent endpoint is empty".to_string()));
    }
    if endpoint.contains("/api/projects/") {
        return Ok(endpoint.to_string());
    }
    match project_name.map(str::trim).filter(|p| !p.is_empty()) {
        Some(project) => Ok(format!(
            "{}/api/projects/{}",
            endpoint,
            urlencoding::encode(project)
        )),
        None => Err(PlannerError::Config(
            "endpoint has no project path and AZURE_AI_PROJECT_NAME is not set".to_string(),
        )),
    }
}
