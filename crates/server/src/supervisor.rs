//! Task supervisor
//!
//! Owns every background task in the process, keyed by (user, kind).
//! Starting a task is idempotent-by-replacement: any existing task for the
//! same slot is cancelled before the fresh one is registered, which is what
//! upholds the single-writer invariant on snapshots and the single-binding
//! invariant on live views across rapid re-login or view navigation.
//!
//! Cancellation is cooperative: each loop holds a `TaskClaim` and checks
//! `is_current()` at every wake-up, exiting quietly once superseded. The
//! registry additionally aborts the old join handle so a stale task cannot
//! outlive its replacement by more than one suspension point.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use staffwatch_protocol::UserId;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The two per-session concerns the supervisor manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Monitor,
    Refresh,
}

impl TaskKind {
    fn name(self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Refresh => "refresh",
        }
    }
}

struct TaskEntry {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Ownership token held by a running task loop.
#[derive(Clone)]
pub struct TaskClaim {
    supervisor: Arc<TaskSupervisor>,
    user: UserId,
    kind: TaskKind,
    generation: u64,
}

impl TaskClaim {
    /// True while this claim is still the registered owner of its slot.
    pub fn is_current(&self) -> bool {
        self.supervisor
            .registry
            .get(&(self.user, self.kind))
            .is_some_and(|entry| entry.generation == self.generation)
    }

    /// Remove our own registry entry (used when a task ends itself, e.g. the
    /// refresher after a fatal delivery failure). No-op if already replaced.
    pub fn release(&self) {
        self.supervisor
            .registry
            .remove_if(&(self.user, self.kind), |_, entry| {
                entry.generation == self.generation
            });
    }

    pub fn user(&self) -> UserId {
        self.user
    }
}

#[derive(Default)]
pub struct TaskSupervisor {
    registry: DashMap<(UserId, TaskKind), TaskEntry>,
    next_generation: AtomicU64,
}

impl TaskSupervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start (or replace) the task for `(user, kind)`. The previous task, if
    /// any, is cancelled before the new one is registered.
    pub fn start<F, Fut>(self: &Arc<Self>, user: UserId, kind: TaskKind, task: F)
    where
        F: FnOnce(TaskClaim) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        if let Some(previous) = self.registry.insert(
            (user, kind),
            TaskEntry {
                generation,
                handle: None,
            },
        ) {
            if let Some(handle) = previous.handle {
                handle.abort();
            }
            debug!(
                component = "supervisor",
                event = "task.replaced",
                user = %user,
                kind = kind.name(),
                "Replaced existing task"
            );
        }

        let claim = TaskClaim {
            supervisor: Arc::clone(self),
            user,
            kind,
            generation,
        };
        let handle = tokio::spawn(task(claim));

        // Attach the join handle unless another start already superseded us,
        // in which case our task is the stale one and gets aborted here.
        match self.registry.get_mut(&(user, kind)) {
            Some(mut entry) if entry.generation == generation => {
                entry.handle = Some(handle);
            }
            _ => handle.abort(),
        }
    }

    /// Cancel and deregister the task for `(user, kind)`. Silent no-op when
    /// no task is registered.
    pub fn stop(&self, user: UserId, kind: TaskKind) {
        if let Some((_, entry)) = self.registry.remove(&(user, kind)) {
            if let Some(handle) = entry.handle {
                handle.abort();
            }
            debug!(
                component = "supervisor",
                event = "task.stopped",
                user = %user,
                kind = kind.name(),
                "Stopped task"
            );
        }
    }

    pub fn is_running(&self, user: UserId, kind: TaskKind) -> bool {
        self.registry.contains_key(&(user, kind))
    }

    pub fn task_count(&self) -> usize {
        self.registry.len()
    }

    /// Cancel every task and await their exit. Called once at process
    /// shutdown so no in-flight call outlives the HTTP client.
    pub async fn shutdown(&self) {
        let mut handles = Vec::new();
        let keys: Vec<_> = self.registry.iter().map(|e| *e.key()).collect();
        for key in keys {
            if let Some((_, entry)) = self.registry.remove(&key) {
                if let Some(handle) = entry.handle {
                    handle.abort();
                    handles.push(handle);
                }
            }
        }
        let count = handles.len();
        // Aborted tasks resolve with a JoinError; that is the expected exit.
        let _ = futures::future::join_all(handles).await;
        info!(
            component = "supervisor",
            event = "supervisor.shutdown",
            tasks = count,
            "All background tasks stopped"
        );
    }
}
