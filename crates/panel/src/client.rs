//! HTTP client for the admin panel.
//!
//! One shared `reqwest::Client` (with a bounded request timeout, see
//! `PanelClient::new`) serves all sessions; per-session credentials travel
//! as `sessionId`/`serverId` cookies on each request.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::types::{AdminEntity, GameServer, LoginRequest, Profile, ReportStats};
use crate::{AuthSession, PanelApi, PanelError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Envelope wrapping every panel response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ServersResult {
    #[serde(default)]
    servers: Vec<GameServer>,
}

pub struct PanelClient {
    http: reqwest::Client,
    base_url: String,
}

impl PanelClient {
    /// Build a client against `base_url` with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, PanelError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit request timeout. Every outbound call
    /// is bounded by it, so a hung call cannot block task cancellation.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PanelError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn cookie_header(auth: &AuthSession) -> String {
        format!("sessionId={}; serverId={}", auth.session_id, auth.server_id)
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        auth: &AuthSession,
        endpoint: &str,
    ) -> Result<T, PanelError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::COOKIE, Self::cookie_header(auth))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let envelope: Envelope<T> = response.json().await.map_err(map_reqwest_error)?;
        if !envelope.status {
            debug!(
                component = "panel_client",
                event = "panel.bad_status",
                endpoint,
                "Panel returned status=false"
            );
            return Err(PanelError::BadStatus);
        }
        envelope
            .result
            .ok_or_else(|| PanelError::Malformed(format!("{}: missing result", endpoint)))
    }

    async fn fetch_me(&self, auth: &AuthSession) -> Result<Profile, PanelError> {
        self.get_result(auth, "/admin/users/me").await
    }
}

#[async_trait]
impl PanelApi for PanelClient {
    /// Exchange credentials for a panel session, then fetch the account's
    /// attributes. A rejected exchange surfaces the panel's own message.
    async fn login(&self, request: &LoginRequest) -> Result<(AuthSession, Profile), PanelError> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let envelope: Envelope<Value> = response.json().await.map_err(map_reqwest_error)?;
        let result = envelope.result.unwrap_or(Value::Null);

        if !envelope.status || result.get("sessionId").is_none() {
            let message = match &result {
                Value::String(s) => s.clone(),
                Value::Null => "Unknown error".to_string(),
                other => other.to_string(),
            };
            return Err(PanelError::AuthRejected(message));
        }

        let session_id = string_field(&result, "sessionId")?;
        let server_id = string_field(&result, "serverId")?;
        let account_login = result
            .get("account")
            .and_then(|a| a.get("login"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| request.login.clone());

        let auth = AuthSession {
            session_id,
            server_id,
            account_login,
        };
        let profile = self.fetch_me(&auth).await?;
        Ok((auth, profile))
    }

    async fn fetch_admins(&self, auth: &AuthSession) -> Result<Vec<AdminEntity>, PanelError> {
        self.get_result(auth, "/admin/admins").await
    }

    async fn fetch_report_stats(&self, auth: &AuthSession) -> Result<ReportStats, PanelError> {
        self.get_result(auth, "/admin/reports/statistics").await
    }

    async fn fetch_servers(&self, auth: &AuthSession) -> Result<Vec<GameServer>, PanelError> {
        let result: ServersResult = self.get_result(auth, "/meta/servers").await?;
        Ok(result.servers)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> PanelError {
    if err.is_timeout() {
        PanelError::Timeout
    } else if err.is_decode() {
        PanelError::Malformed(err.to_string())
    } else {
        PanelError::Http(err)
    }
}

fn string_field(value: &Value, key: &str) -> Result<String, PanelError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PanelError::Malformed(format!("login response missing {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_false_status_still_parses() {
        let envelope: Envelope<Vec<AdminEntity>> =
            serde_json::from_str(r#"{"status": false}"#).unwrap();
        assert!(!envelope.status);
        assert!(envelope.result.is_none());
    }

    #[test]
    fn servers_result_unwraps_nested_list() {
        let envelope: Envelope<ServersResult> = serde_json::from_str(
            r#"{"status": true, "result": {"servers": [{"id": "ru1", "players": 777}]}}"#,
        )
        .unwrap();
        let servers = envelope.result.unwrap().servers;
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].players, 777);
    }

    #[test]
    fn cookie_header_carries_both_credentials() {
        let auth = AuthSession {
            session_id: "s-1".into(),
            server_id: "RU5".into(),
            account_login: "aria".into(),
        };
        assert_eq!(
            PanelClient::cookie_header(&auth),
            "sessionId=s-1; serverId=RU5"
        );
    }
}
