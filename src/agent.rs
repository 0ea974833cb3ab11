/// Hosted agent wire model and the service seam the planner talks to
///
/// The JSON shapes mirror the Agents REST API (threads, runs, messages).
/// Only the fields the planner reads are modelled; everything else is ignored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Run object returned by create-thread-and-run and get-run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRun {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Only queued and in_progress keep the poll loop going
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
}

impl MessageContent {
    pub fn text_value(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(&text.value),
            MessageContent::Other => None,
        }
    }
}

/// Paged list envelope used by the messages endpoint
#[derive(Debug, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

/// Request body for create-thread-and-run
#[derive(Debug, Serialize)]
pub struct CreateThreadAndRun {
    pub assistant_id: String,
    pub thread: ThreadSeed,
}

#[derive(Debug, Serialize)]
pub struct ThreadSeed {
    pub messages: Vec<SeedMessage>,
}

#[derive(Debug, Serialize)]
pub struct SeedMessage {
    pub role: MessageRole,
    pub content: String,
}

impl CreateThreadAndRun {
    pub fn with_prompt(agent_id: &str, prompt: &str) -> Self {
        Self {
            assistant_id: agent_id.to_string(),
            thread: ThreadSeed {
                messages: vec![SeedMessage {
                    role: MessageRole::User,
                    content: prompt.to_string(),
                }],
            },
        }
    }
}

/// Operations the planner needs from the hosted agent service
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Create a fresh thread seeded with one user message and start a run on it
    async fn create_thread_and_run(&self, agent_id: &str, prompt: &str) -> Result<ThreadRun>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun>;

    /// All messages on the thread, in the order the service returns them
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
