/// AI Travel Planner library
/// Core flow shared by the CLI and the HTTP server:
/// trip form -> prompt -> hosted agent thread+run -> poll -> itinerary text

pub mod agent;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod planner;
pub mod trip;
pub mod web;

use std::sync::Arc;
use std::time::Duration;

pub use agent::{AgentService, MessageRole, RunStatus, ThreadMessage, ThreadRun};
pub use client::FoundryAgentClient;
pub use config::{AgentEndpointConfig, PlannerConfig};
pub use credential::{CredentialConfig, TokenProvider};
pub use error::PlannerError;
pub use planner::{extract_itinerary, ItineraryPlanner, PollPolicy};
pub use trip::{TripField, TripRequest, ValidTrip};

/// Upper bound for any single HTTP exchange with the agent or identity service
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the process-wide planner: one HTTP client, one token cache, one agent client
pub fn build_planner(config: &PlannerConfig) -> anyhow::Result<ItineraryPlanner> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("travel-planner/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let tokens = TokenProvider::new(config.credential.clone(), http.clone());
    let client = FoundryAgentClient::new(&config.agent, http, tokens)?;

    tracing::info!(
        agent_id = %config.agent.agent_id,
        credential = config.credential.kind(),
        poll_interval_secs = config.poll.interval.as_secs(),
        max_wait_secs = config.poll.max_wait.as_secs(),
        "planner ready"
    );

    Ok(ItineraryPlanner::new(
        Arc::new(client),
        config.agent.agent_id.clone(),
        config.poll,
    ))
}

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
