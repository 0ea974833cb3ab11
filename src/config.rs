/// Planner configuration, read from the environment (and `.env` via dotenv in the binaries)

use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::credential::CredentialConfig;
use crate::planner::PollPolicy;

pub const DEFAULT_HTTP_PORT: u16 = 8501;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 600;

/// Where the hosted agent lives and which agent to run
#[derive(Debug, Clone)]
pub struct AgentEndpointConfig {
    pub endpoint: String,
    pub project_name: Option<String>,
    pub agent_id: String,
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub agent: AgentEndpointConfig,
    pub credential: CredentialConfig,
    pub poll: PollPolicy,
    pub http_port: u16,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let endpoint = get("AZURE_AI_PROJECT_ENDPOINT")
            .ok_or_else(|| anyhow!("AZURE_AI_PROJECT_ENDPOINT environment variable not set"))?;
        let agent_id = get("AZURE_AI_AGENT_ID")
            .ok_or_else(|| anyhow!("AZURE_AI_AGENT_ID environment variable not set"))?;
        let project_name = get("AZURE_AI_PROJECT_NAME");

        let credential = match (
            get("AZURE_TENANT_ID"),
            get("AZURE_CLIENT_ID"),
            get("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                CredentialConfig::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                }
            }
            _ => CredentialConfig::AzureCli,
        };

        let interval = parse_secs(
            get("TRAVEL_PLANNER_POLL_INTERVAL_SECS"),
            "TRAVEL_PLANNER_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let max_wait = parse_secs(
            get("TRAVEL_PLANNER_MAX_WAIT_SECS"),
            "TRAVEL_PLANNER_MAX_WAIT_SECS",
            DEFAULT_MAX_WAIT_SECS,
        )?;
        if interval.is_zero() {
            return Err(anyhow!("TRAVEL_PLANNER_POLL_INTERVAL_SECS must be at least 1"));
        }

        let http_port = match get("TRAVEL_PLANNER_HTTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid TRAVEL_PLANNER_HTTP_PORT: {}", raw))?,
            None => DEFAULT_HTTP_PORT,
        };

        Ok(Self {
            agent: AgentEndpointConfig {
                endpoint,
                project_name,
                agent_id,
            },
            credential,
            poll: PollPolicy { interval, max_wait },
            http_port,
        })
    }
}

fn parse_secs(raw: Option<String>, key: &str, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid {}: {}", key, raw))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
