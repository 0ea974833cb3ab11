/// Bearer token acquisition for the agent service
///
/// Two sources, picked at startup from the environment:
/// - service principal (tenant id, client id, client secret) via the OAuth2 client-credentials flow
/// - ambient Azure CLI login when no service principal is configured
///
/// Tokens are cached until shortly before they expire.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{PlannerError, Result};

pub const TOKEN_SCOPE: &str = "https://ai.azure.com/.default";
const TOKEN_RESOURCE: &str = "https://ai.azure.com";
const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
const CLI_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub enum CredentialConfig {
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    AzureCli,
}

impl CredentialConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialConfig::ClientSecret { .. } => "client_secret",
            CredentialConfig::AzureCli => "azure_cli",
        }
    }
}

// Hand-written so the secret never reaches a log line
impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialConfig::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            CredentialConfig::AzureCli => f.write_str("AzureCli"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default)]
    expires_on: Option<i64>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Hands out bearer tokens, fetching a new one only when the cached one is stale
pub struct TokenProvider {
    config: CredentialConfig,
    http: reqwest::Client,
    authority_host: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(config: CredentialConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            authority_host: AUTHORITY_HOST.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Point the client-secret flow at a different identity host
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let (value, lifetime) = match &self.config {
            CredentialConfig::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => {
                self.fetch_client_secret(tenant_id, client_id, client_secret)
                    .await?
            }
            CredentialConfig::AzureCli => fetch_cli_token().await?,
        };

        tracing::debug!(
            credential = self.config.kind(),
            lifetime_secs = lifetime.as_secs(),
            "acquired access token"
        );

        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        });
        Ok(value)
    }

    async fn fetch_client_secret(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(String, Duration)> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host,
            urlencoding::encode(tenant_id)
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlannerError::Auth(format!(
                "token endpoint returned {}: {}",
                status, error_text
            )));
        }

        let token: OAuthTokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        Ok((token.access_token, lifetime))
    }
}

async fn fetch_cli_token() -> Result<(String, Duration)> {
    let mut command = tokio::process::Command::new("az");
    command.args([
        "account",
        "get-access-token",
        "--resource",
        TOKEN_RESOURCE,
        "-o",
        "json",
    ]);
    run_token_command(command, CLI_TIMEOUT).await
}

/// Run a token-printing command; a hung process is killed once `limit` passes
async fn run_token_command(
    mut command: tokio::process::Command,
    limit: Duration,
) -> Result<(String, Duration)> {
    command.kill_on_drop(true);
    let output = match tokio::time::timeout(limit, command.output()).await {
        Ok(output) => {
            output.map_err(|e| PlannerError::Auth(format!("failed to run Azure CLI: {}", e)))?
        }
        Err(_) => {
            return Err(PlannerError::Auth(format!(
                "Azure CLI did not return a token within {}s",
                limit.as_secs()
            )))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PlannerError::Auth(format!(
            "Azure CLI login unavailable: {}",
            stderr.trim()
        )));
    }

    parse_cli_token(&output.stdout, chrono::Utc::now().timestamp())
}

fn parse_cli_token(stdout: &[u8], now_unix: i64) -> Result<(String, Duration)> {
    let token: CliTokenResponse = serde_json::from_slice(stdout)?;
    let lifetime = token
        .expires_on
        .map(|at| Duration::from_secs(at.saturating_sub(now_unix).max(0) as u64))
        .unwrap_or(Duration::from_secs(300));
    Ok((token.access_token, lifetime))
}
