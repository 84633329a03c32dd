//! Session store
//!
//! Owns the per-user session records. Exactly one session per user id at a
//! time; all mutation goes through the store so background tasks only ever
//! observe consistent records.

use dashmap::DashMap;
use staffwatch_panel::AuthSession;
use staffwatch_protocol::UserId;

/// A logged-in user's state, process-lifetime only.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserId,
    /// Chat channel where this user's notifications are delivered.
    pub channel: i64,
    pub auth: AuthSession,
    pub admin_level: u8,
    pub rights: Vec<String>,
    pub notifications: bool,
    pub auto_refresh: bool,
    pub tracked_admin: Option<String>,
}

impl Session {
    pub fn new(
        user: UserId,
        channel: i64,
        auth: AuthSession,
        admin_level: u8,
        rights: Vec<String>,
    ) -> Self {
        Self {
            user,
            channel,
            auth,
            admin_level,
            rights,
            notifications: true,
            auto_refresh: true,
            tracked_admin: None,
        }
    }
}

/// Concurrent map of active sessions, keyed by user id.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any prior one for the same user.
    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.user, session);
    }

    /// Cloned view of a session; background loops read through this so they
    /// never hold a map guard across an await point.
    pub fn get(&self, user: UserId) -> Option<Session> {
        self.sessions.get(&user).map(|s| s.value().clone())
    }

    pub fn remove(&self, user: UserId) -> Option<Session> {
        self.sessions.remove(&user).map(|(_, s)| s)
    }

    /// Mutate a session in place. Returns false when no session exists.
    pub fn with_mut(&self, user: UserId, f: impl FnOnce(&mut Session)) -> bool {
        match self.sessions.get_mut(&user) {
            Some(mut entry) => {
                f(&mut entry);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
