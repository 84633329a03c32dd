//! Shared test fixtures: a scripted panel API and record builders.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use staffwatch_panel::{
    AdminEntity, AdminReports, AuthSession, GameServer, LoginRequest, PanelApi, PanelError,
    Profile, ReportStats,
};

pub fn auth_session() -> AuthSession {
    AuthSession {
        session_id: "test-session".into(),
        server_id: "RU1".into(),
        account_login: "operator".into(),
    }
}

pub fn admin(login: &str, level: u8, online: bool, reports: u32) -> AdminEntity {
    AdminEntity {
        login: login.to_string(),
        admin: level,
        online: if online { 300 } else { 0 },
        day_online: 3600,
        reports: AdminReports {
            default: reports,
            moderation: 0,
        },
        ..Default::default()
    }
}

type ScriptedCycle = Result<(Vec<AdminEntity>, ReportStats), PanelError>;

/// Panel mock that replays a scripted sequence of poll cycles. Once the
/// script is exhausted it reports `BadStatus`, which parks the monitor loop
/// without generating spurious diffs.
#[derive(Default)]
pub struct ScriptedPanel {
    cycles: Mutex<VecDeque<ScriptedCycle>>,
    pending_stats: Mutex<Option<ReportStats>>,
    consumed: AtomicUsize,
    fallback_admins: Mutex<Option<Vec<AdminEntity>>>,
    pub servers: Mutex<Vec<GameServer>>,
    pub profile: Mutex<Profile>,
}

impl ScriptedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, admins: Vec<AdminEntity>, stats: ReportStats) {
        self.cycles.lock().unwrap().push_back(Ok((admins, stats)));
    }

    pub fn push_err(&self, err: PanelError) {
        self.cycles.lock().unwrap().push_back(Err(err));
    }

    /// After the script runs out, serve this fixed roster instead of failing.
    pub fn set_fallback_admins(&self, admins: Vec<AdminEntity>) {
        *self.fallback_admins.lock().unwrap() = Some(admins);
    }

    pub fn polls_consumed(&self) -> usize {
        self.consumed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PanelApi for ScriptedPanel {
    async fn login(&self, request: &LoginRequest) -> Result<(AuthSession, Profile), PanelError> {
        if request.password == "wrong" {
            return Err(PanelError::AuthRejected("Invalid credentials".into()));
        }
        let mut auth = auth_session();
        auth.account_login = request.login.clone();
        auth.server_id = request.server_id.clone();
        Ok((auth, self.profile.lock().unwrap().clone()))
    }

    async fn fetch_admins(&self, _auth: &AuthSession) -> Result<Vec<AdminEntity>, PanelError> {
        match self.cycles.lock().unwrap().pop_front() {
            Some(Ok((admins, stats))) => {
                self.consumed.fetch_add(1, Ordering::Relaxed);
                *self.pending_stats.lock().unwrap() = Some(stats);
                Ok(admins)
            }
            Some(Err(err)) => {
                self.consumed.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
            None => match self.fallback_admins.lock().unwrap().clone() {
                Some(admins) => Ok(admins),
                None => Err(PanelError::BadStatus),
            },
        }
    }

    async fn fetch_report_stats(&self, _auth: &AuthSession) -> Result<ReportStats, PanelError> {
        Ok(self
            .pending_stats
            .lock()
            .unwrap()
            .take()
            .unwrap_or_default())
    }

    async fn fetch_servers(&self, _auth: &AuthSession) -> Result<Vec<GameServer>, PanelError> {
        Ok(self.servers.lock().unwrap().clone())
    }
}
