//! Engine facade
//!
//! Ties the session store, view bindings, task supervisor, panel client,
//! and delivery adapter together and exposes the user-triggered operations:
//! login/logout, view navigation, setting toggles, tracking, and on-demand
//! refresh. Background loops are started and replaced only through here.

use std::sync::Arc;
use std::time::Duration;

use staffwatch_panel::{LoginRequest, PanelApi, PanelError};
use staffwatch_protocol::{UserId, ViewKind, ViewParams};
use thiserror::Error;
use tracing::info;

use crate::delivery::{Delivery, DeliveryError};
use crate::monitor::{run_monitor, MonitorCtx};
use crate::refresher::{run_refresher, RefresherCtx};
use crate::session::{Session, SessionStore};
use crate::supervisor::{TaskKind, TaskSupervisor};
use crate::view::{ViewBindings, ViewRenderer};

#[derive(Debug, Error)]
pub enum EngineError {
    /// No session is registered for the user; they must log in again.
    #[error("no active session, please log in")]
    SessionMissing,

    /// The credential exchange was rejected; the panel's message verbatim.
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("panel request failed: {0}")]
    Panel(#[from] PanelError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// An on-demand refresh was requested with no view open.
    #[error("no live view is open")]
    NoViewOpen,
}

/// Outcome of an on-demand refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    /// Content was already up to date; nothing changed.
    Unchanged,
}

/// Intervals and limits for the background loops.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub monitor_interval: Duration,
    pub refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(15),
        }
    }
}

pub struct Engine {
    store: Arc<SessionStore>,
    bindings: Arc<ViewBindings>,
    supervisor: Arc<TaskSupervisor>,
    panel: Arc<dyn PanelApi>,
    delivery: Arc<dyn Delivery>,
    renderer: Arc<dyn ViewRenderer>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        panel: Arc<dyn PanelApi>,
        delivery: Arc<dyn Delivery>,
        renderer: Arc<dyn ViewRenderer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            bindings: Arc::new(ViewBindings::new()),
            supervisor: TaskSupervisor::new(),
            panel,
            delivery,
            renderer,
            config,
        }
    }

    /// Exchange credentials, create the session, and start its monitor.
    /// Replaces any existing session for the same user.
    pub async fn login(
        &self,
        user: UserId,
        channel: i64,
        request: LoginRequest,
    ) -> Result<Session, EngineError> {
        let (auth, profile) = self.panel.login(&request).await.map_err(|err| match err {
            PanelError::AuthRejected(message) => EngineError::Auth(message),
            other => EngineError::Panel(other),
        })?;

        let session = Session::new(user, channel, auth, profile.admin_level, profile.rights);
        info!(
            component = "engine",
            event = "session.created",
            user = %user,
            account = %session.auth.account_login,
            server = %session.auth.server_id,
            level = session.admin_level,
            "Session created"
        );

        self.store.insert(session.clone());
        self.start_monitor(user);
        Ok(session)
    }

    /// Tear down both tasks, the binding, and the session record.
    pub fn logout(&self, user: UserId) {
        self.stop_refresh(user);
        self.supervisor.stop(user, TaskKind::Monitor);
        if self.store.remove(user).is_some() {
            info!(
                component = "engine",
                event = "session.removed",
                user = %user,
                "Session removed"
            );
        }
    }

    pub fn session(&self, user: UserId) -> Option<Session> {
        self.store.get(user)
    }

    /// Render the requested view, send it as a fresh message, bind it, and
    /// (re)start the refresher on it.
    pub async fn open_view(
        &self,
        user: UserId,
        channel: i64,
        kind: ViewKind,
        params: ViewParams,
    ) -> Result<(), EngineError> {
        let session = self.store.get(user).ok_or(EngineError::SessionMissing)?;
        let text = self.renderer.render(&session, kind, &params).await?;
        let target = self.delivery.send(channel, &text).await?;
        self.bindings.bind(user, target, kind, params);
        self.start_refresh(user);
        Ok(())
    }

    /// Navigate the existing live message to a different view: edit it in
    /// place and rebind. The refresher is replaced, never duplicated.
    pub async fn navigate(
        &self,
        user: UserId,
        kind: ViewKind,
        params: ViewParams,
    ) -> Result<(), EngineError> {
        let session = self.store.get(user).ok_or(EngineError::SessionMissing)?;
        let binding = self.bindings.get(user).ok_or(EngineError::NoViewOpen)?;

        let text = self.renderer.render(&session, kind, &params).await?;
        match self.delivery.edit(binding.target, &text).await {
            Ok(()) | Err(DeliveryError::Unmodified) => {}
            Err(err @ DeliveryError::Unreachable(_)) => {
                self.stop_refresh(user);
                return Err(err.into());
            }
        }
        self.bindings.bind(user, binding.target, kind, params);
        self.start_refresh(user);
        Ok(())
    }

    /// Close the live view without logging out.
    pub fn close_view(&self, user: UserId) {
        self.stop_refresh(user);
    }

    /// On-demand re-render of the current view, outside the refresh cadence.
    pub async fn refresh_now(&self, user: UserId) -> Result<RefreshOutcome, EngineError> {
        let session = self.store.get(user).ok_or(EngineError::SessionMissing)?;
        let binding = self.bindings.get(user).ok_or(EngineError::NoViewOpen)?;

        let text = self
            .renderer
            .render(&session, binding.kind, &binding.params)
            .await?;
        match self.delivery.edit(binding.target, &text).await {
            Ok(()) => Ok(RefreshOutcome::Updated),
            Err(DeliveryError::Unmodified) => Ok(RefreshOutcome::Unchanged),
            Err(err @ DeliveryError::Unreachable(_)) => {
                self.stop_refresh(user);
                Err(err.into())
            }
        }
    }

    /// Flip the notification flag. The monitor stays registered either way;
    /// a disabled flag just parks its loop.
    pub fn toggle_notifications(&self, user: UserId) -> Result<bool, EngineError> {
        self.toggle(user, |s| {
            s.notifications = !s.notifications;
            s.notifications
        })
    }

    /// Flip the auto-refresh flag. The refresher stays bound and parked, so
    /// re-enabling resumes on the same message.
    pub fn toggle_auto_refresh(&self, user: UserId) -> Result<bool, EngineError> {
        self.toggle(user, |s| {
            s.auto_refresh = !s.auto_refresh;
            s.auto_refresh
        })
    }

    /// Track one admin; per-admin report notifications for everyone else
    /// are suppressed from now on.
    pub fn track_admin(&self, user: UserId, login: impl Into<String>) -> Result<(), EngineError> {
        let login = login.into();
        if self.store.with_mut(user, |s| s.tracked_admin = Some(login)) {
            Ok(())
        } else {
            Err(EngineError::SessionMissing)
        }
    }

    pub fn untrack_admin(&self, user: UserId) -> Result<(), EngineError> {
        if self.store.with_mut(user, |s| s.tracked_admin = None) {
            Ok(())
        } else {
            Err(EngineError::SessionMissing)
        }
    }

    /// Cancel every background task and wait for them to exit.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }

    fn toggle(
        &self,
        user: UserId,
        f: impl FnOnce(&mut Session) -> bool,
    ) -> Result<bool, EngineError> {
        let mut value = false;
        if self.store.with_mut(user, |s| value = f(s)) {
            Ok(value)
        } else {
            Err(EngineError::SessionMissing)
        }
    }

    fn start_monitor(&self, user: UserId) {
        let ctx = MonitorCtx {
            store: Arc::clone(&self.store),
            panel: Arc::clone(&self.panel),
            delivery: Arc::clone(&self.delivery),
            interval: self.config.monitor_interval,
        };
        self.supervisor
            .start(user, TaskKind::Monitor, move |claim| run_monitor(ctx, claim));
    }

    fn start_refresh(&self, user: UserId) {
        let ctx = RefresherCtx {
            store: Arc::clone(&self.store),
            bindings: Arc::clone(&self.bindings),
            renderer: Arc::clone(&self.renderer),
            delivery: Arc::clone(&self.delivery),
            interval: self.config.refresh_interval,
        };
        self.supervisor
            .start(user, TaskKind::Refresh, move |claim| {
                run_refresher(ctx, claim)
            });
    }

    /// Stop the refresher and clear the binding (logout/close semantics).
    fn stop_refresh(&self, user: UserId) {
        self.supervisor.stop(user, TaskKind::Refresh);
        self.bindings.clear(user);
    }

    #[cfg(test)]
    pub(crate) fn supervisor(&self) -> &Arc<TaskSupervisor> {
        &self.supervisor
    }

    #[cfg(test)]
    pub(crate) fn bindings(&self) -> &Arc<ViewBindings> {
        &self.bindings
    }
}
