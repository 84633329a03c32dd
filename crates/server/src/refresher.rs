//! Refresher task
//!
//! One loop per session with an open live view: regenerate the view's
//! content each interval and edit the bound message in place. A disabled
//! auto-refresh flag parks the loop without unbinding, so re-enabling
//! resumes on the same message. An unreachable edit target ends the task
//! and clears the binding; there are no retries against a dead message.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::delivery::{Delivery, DeliveryError};
use crate::session::SessionStore;
use crate::supervisor::TaskClaim;
use crate::view::{ViewBindings, ViewRenderer};

/// Everything a refresher loop needs, bundled for `TaskSupervisor::start`.
#[derive(Clone)]
pub struct RefresherCtx {
    pub store: Arc<SessionStore>,
    pub bindings: Arc<ViewBindings>,
    pub renderer: Arc<dyn ViewRenderer>,
    pub delivery: Arc<dyn Delivery>,
    pub interval: Duration,
}

pub async fn run_refresher(ctx: RefresherCtx, claim: TaskClaim) {
    let user = claim.user();
    info!(
        component = "refresher",
        event = "refresher.started",
        user = %user,
        "Refresher loop started"
    );

    loop {
        if !claim.is_current() {
            break;
        }
        let Some(session) = ctx.store.get(user) else {
            break;
        };
        let Some(binding) = ctx.bindings.get(user) else {
            break;
        };

        // Parked but bound: the flag only pauses regeneration.
        if session.auto_refresh {
            match ctx
                .renderer
                .render(&session, binding.kind, &binding.params)
                .await
            {
                Ok(text) => match ctx.delivery.edit(binding.target, &text).await {
                    Ok(()) => {}
                    Err(DeliveryError::Unmodified) => {
                        // Content identical to what is already shown.
                    }
                    Err(DeliveryError::Unreachable(reason)) => {
                        warn!(
                            component = "refresher",
                            event = "refresher.target_lost",
                            user = %user,
                            reason = %reason,
                            "Live view target unreachable, unbinding"
                        );
                        ctx.bindings.clear(user);
                        claim.release();
                        return;
                    }
                },
                Err(err) => {
                    // Render sources are the same panel endpoints the
                    // monitor polls; failures are equally transient here.
                    debug!(
                        component = "refresher",
                        event = "refresher.render_failed",
                        user = %user,
                        error = %err,
                        "Refresh cycle discarded"
                    );
                }
            }
        }

        tokio::time::sleep(ctx.interval).await;
    }

    info!(
        component = "refresher",
        event = "refresher.stopped",
        user = %user,
        "Refresher loop exited"
    );
}
