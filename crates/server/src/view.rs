//! Live-view bindings
//!
//! Tracks which rendered message is currently "live" for each session. At
//! most one binding per user; navigation replaces it wholesale, logout and
//! unrecoverable delivery failures clear it.

use async_trait::async_trait;
use dashmap::DashMap;
use staffwatch_panel::PanelError;
use staffwatch_protocol::{MessageRef, UserId, ViewBinding, ViewKind, ViewParams};

use crate::session::Session;

/// Contract for producing fresh view content. The refresher and the
/// request-path refresh both go through this seam; rendering itself is a
/// collaborator concern.
#[async_trait]
pub trait ViewRenderer: Send + Sync {
    async fn render(
        &self,
        session: &Session,
        kind: ViewKind,
        params: &ViewParams,
    ) -> Result<String, PanelError>;
}

/// Concurrent map of each user's single live view.
#[derive(Default)]
pub struct ViewBindings {
    bindings: DashMap<UserId, ViewBinding>,
}

impl ViewBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the user's binding wholesale.
    pub fn bind(&self, user: UserId, target: MessageRef, kind: ViewKind, params: ViewParams) {
        self.bindings.insert(
            user,
            ViewBinding {
                target,
                kind,
                params,
            },
        );
    }

    pub fn get(&self, user: UserId) -> Option<ViewBinding> {
        self.bindings.get(&user).map(|b| b.value().clone())
    }

    pub fn clear(&self, user: UserId) -> Option<ViewBinding> {
        self.bindings.remove(&user).map(|(_, b)| b)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_replaces_previous_binding_wholesale() {
        let bindings = ViewBindings::new();
        let user = UserId(1);
        bindings.bind(
            user,
            MessageRef {
                channel: 1,
                message: 10,
            },
            ViewKind::Summary,
            ViewParams::default(),
        );
        bindings.bind(
            user,
            MessageRef {
                channel: 1,
                message: 11,
            },
            ViewKind::AdminList,
            ViewParams::paged(2, 3),
        );

        assert_eq!(bindings.len(), 1);
        let binding = bindings.get(user).unwrap();
        assert_eq!(binding.kind, ViewKind::AdminList);
        assert_eq!(binding.target.message, 11);
        assert_eq!(binding.params.page, 2);
    }

    #[test]
    fn clear_returns_the_removed_binding() {
        let bindings = ViewBindings::new();
        let user = UserId(1);
        assert!(bindings.clear(user).is_none());

        bindings.bind(
            user,
            MessageRef {
                channel: 5,
                message: 1,
            },
            ViewKind::Online,
            ViewParams::default(),
        );
        let removed = bindings.clear(user).unwrap();
        assert_eq!(removed.kind, ViewKind::Online);
        assert!(bindings.get(user).is_none());
    }
}
