//! Core types shared across the engine

use serde::{Deserialize, Serialize};

/// Opaque chat-user identity. One session, one monitor, one refresher per id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable handle to a delivered chat message (channel + message id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel: i64,
    pub message: i64,
}

/// The kind of live view a user can have open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Summary,
    Online,
    Reports,
    Servers,
    AdminList,
    AdminProfile,
}

/// Parameters refining a view. Only the fields relevant to the kind are read:
/// `page` and `level_filter` for the admin list, `admin_login` for profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub level_filter: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_login: Option<String>,
}

impl ViewParams {
    pub fn paged(page: usize, level_filter: u8) -> Self {
        Self {
            page,
            level_filter,
            admin_login: None,
        }
    }

    pub fn profile(admin_login: impl Into<String>) -> Self {
        Self {
            page: 0,
            level_filter: 0,
            admin_login: Some(admin_login.into()),
        }
    }
}

/// The single live, auto-refreshing message associated with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewBinding {
    pub target: MessageRef,
    pub kind: ViewKind,
    pub params: ViewParams,
}
