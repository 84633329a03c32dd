//! Monitor task
//!
//! One loop per logged-in user: poll the panel, diff against the cached
//! snapshot, deliver the cycle's notifications as a single message. The
//! snapshot lives on this task's stack, so it exists exactly as long as the
//! loop does and only this task ever writes it.

use std::sync::Arc;
use std::time::Duration;

use staffwatch_panel::{AuthSession, PanelApi, PanelError};
use staffwatch_protocol::events::render_notification;
use tracing::{debug, info, warn};

use crate::delivery::Delivery;
use crate::session::SessionStore;
use crate::snapshot::{PanelPoll, Snapshot};
use crate::supervisor::TaskClaim;

/// Everything a monitor loop needs, bundled for `TaskSupervisor::start`.
#[derive(Clone)]
pub struct MonitorCtx {
    pub store: Arc<SessionStore>,
    pub panel: Arc<dyn PanelApi>,
    pub delivery: Arc<dyn Delivery>,
    pub interval: Duration,
}

pub async fn run_monitor(ctx: MonitorCtx, claim: TaskClaim) {
    let user = claim.user();
    info!(
        component = "monitor",
        event = "monitor.started",
        user = %user,
        "Monitor loop started"
    );

    let mut snapshot: Option<Snapshot> = None;

    loop {
        if !claim.is_current() {
            break;
        }
        let Some(session) = ctx.store.get(user) else {
            break;
        };

        // Disabled notifications park the loop: no polling, snapshot kept.
        if session.notifications {
            match poll_panel(ctx.panel.as_ref(), &session.auth).await {
                Ok(poll) => match snapshot.as_mut() {
                    None => {
                        // Baseline cycle: seed state, emit nothing.
                        snapshot = Some(Snapshot::baseline(&poll));
                        debug!(
                            component = "monitor",
                            event = "monitor.baseline",
                            user = %user,
                            admins = poll.admins.len(),
                            "Baseline snapshot created"
                        );
                    }
                    Some(snapshot) => {
                        let events =
                            snapshot.diff_and_advance(&poll, session.tracked_admin.as_deref());
                        if let Some(text) = render_notification(&events) {
                            if let Err(err) = ctx.delivery.send(session.channel, &text).await {
                                // Best-effort delivery: log and move on.
                                warn!(
                                    component = "monitor",
                                    event = "monitor.delivery_failed",
                                    user = %user,
                                    error = %err,
                                    "Notification delivery failed"
                                );
                            }
                        }
                    }
                },
                Err(err) if err.is_transient() => {
                    // Discard the cycle, keep the snapshot.
                    debug!(
                        component = "monitor",
                        event = "monitor.poll_failed",
                        user = %user,
                        error = %err,
                        "Poll cycle discarded"
                    );
                }
                Err(err) => {
                    // Credential-class failure: worth a warning, but the
                    // next cycle retries against the same snapshot.
                    warn!(
                        component = "monitor",
                        event = "monitor.poll_rejected",
                        user = %user,
                        error = %err,
                        "Poll rejected by the panel"
                    );
                }
            }
        }

        tokio::time::sleep(ctx.interval).await;
    }

    info!(
        component = "monitor",
        event = "monitor.stopped",
        user = %user,
        "Monitor loop exited"
    );
}

async fn poll_panel(panel: &dyn PanelApi, auth: &AuthSession) -> Result<PanelPoll, PanelError> {
    let admins = panel.fetch_admins(auth).await?;
    let stats = panel.fetch_report_stats(auth).await?;
    Ok(PanelPoll { admins, stats })
}
