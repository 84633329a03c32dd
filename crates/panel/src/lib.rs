//! StaffWatch Panel Client
//!
//! Read-only client for the game-server admin panel API. Every endpoint
//! returns an envelope of `{ status: bool, result: ... }`; consumers must
//! tolerate absent fields (they default to zero/empty) and treat
//! `status = false` or a malformed payload as a poll failure, never a crash.

pub mod client;
pub mod types;

pub use client::PanelClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the panel client.
///
/// Everything except `AuthRejected` is transient from the monitor loop's
/// point of view: the cycle is discarded and the loop continues.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("panel returned status=false")]
    BadStatus,

    #[error("malformed panel response: {0}")]
    Malformed(String),

    #[error("{0}")]
    AuthRejected(String),
}

impl PanelError {
    /// True for failures a poll loop retries quietly; rejected credentials
    /// warrant a louder signal.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::AuthRejected(_))
    }
}

/// Credentials obtained from a successful login exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub session_id: String,
    pub server_id: String,
    pub account_login: String,
}

/// The panel endpoints the engine consumes.
///
/// `PanelClient` is the production implementation; tests substitute mocks.
#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Exchange credentials for a panel session plus account attributes.
    async fn login(&self, request: &LoginRequest) -> Result<(AuthSession, Profile), PanelError>;

    /// Full admin roster with per-admin online durations and report counts.
    async fn fetch_admins(&self, auth: &AuthSession) -> Result<Vec<AdminEntity>, PanelError>;

    /// Aggregate report counters.
    async fn fetch_report_stats(&self, auth: &AuthSession) -> Result<ReportStats, PanelError>;

    /// Game-server population list.
    async fn fetch_servers(&self, auth: &AuthSession) -> Result<Vec<GameServer>, PanelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rejected_credentials_are_non_transient() {
        assert!(PanelError::Timeout.is_transient());
        assert!(PanelError::BadStatus.is_transient());
        assert!(PanelError::Malformed("truncated".into()).is_transient());
        assert!(!PanelError::AuthRejected("bad password".into()).is_transient());
    }
}
