//! Wire types for the admin-panel API.
//!
//! Every field carries `#[serde(default)]` so a sparse payload deserializes
//! to zeros/empties instead of failing the whole poll.

use serde::{Deserialize, Serialize};

/// Per-admin report counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminReports {
    #[serde(default)]
    pub default: u32,
    #[serde(default)]
    pub moderation: u32,
}

impl AdminReports {
    pub fn total(&self) -> u32 {
        self.default + self.moderation
    }
}

/// Online time accrued on the admin's other accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherAccountsOnline {
    #[serde(default)]
    pub week_online: u64,
    #[serde(default)]
    pub month_online: u64,
}

impl OtherAccountsOnline {
    pub fn is_empty(&self) -> bool {
        self.week_online == 0 && self.month_online == 0
    }
}

/// One staff member as reported by `/admin/admins`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEntity {
    pub login: String,
    /// Privilege level (1..=4; 0 means unknown).
    #[serde(default)]
    pub admin: u8,
    /// Seconds online in the current sitting; > 0 means currently online.
    #[serde(default)]
    pub online: u64,
    #[serde(default)]
    pub day_online: u64,
    #[serde(default)]
    pub week_online: u64,
    #[serde(default)]
    pub month_online: u64,
    #[serde(default)]
    pub reports: AdminReports,
    #[serde(default)]
    pub other_accounts_online: OtherAccountsOnline,
}

impl AdminEntity {
    pub fn is_online(&self) -> bool {
        self.online > 0
    }
}

/// Aggregate report counters from `/admin/reports/statistics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    #[serde(default)]
    pub moderation: i64,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub unresolved: i64,
}

/// One game server from `/meta/servers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameServer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub queued_players: u32,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub tech_works: bool,
}

/// Account attributes from `/admin/users/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub admin_level: u8,
    #[serde(default)]
    pub rights: Vec<String>,
}

/// Body of the login exchange.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
    pub server_id: String,
    /// Second-factor code.
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_entity_tolerates_sparse_payload() {
        let admin: AdminEntity = serde_json::from_str(r#"{"login": "aria"}"#).unwrap();
        assert_eq!(admin.login, "aria");
        assert_eq!(admin.admin, 0);
        assert!(!admin.is_online());
        assert_eq!(admin.reports.total(), 0);
        assert!(admin.other_accounts_online.is_empty());
    }

    #[test]
    fn admin_entity_reads_camel_case_fields() {
        let admin: AdminEntity = serde_json::from_str(
            r#"{
                "login": "brux",
                "admin": 3,
                "online": 120,
                "dayOnline": 7200,
                "weekOnline": 36000,
                "reports": {"default": 2, "moderation": 1},
                "otherAccountsOnline": {"weekOnline": 60}
            }"#,
        )
        .unwrap();
        assert!(admin.is_online());
        assert_eq!(admin.day_online, 7200);
        assert_eq!(admin.reports.total(), 3);
        assert_eq!(admin.other_accounts_online.week_online, 60);
        assert_eq!(admin.month_online, 0);
    }

    #[test]
    fn report_stats_default_missing_counters() {
        let stats: ReportStats = serde_json::from_str(r#"{"moderation": 5}"#).unwrap();
        assert_eq!(stats.moderation, 5);
        assert_eq!(stats.progress, 0);
        assert_eq!(stats.unresolved, 0);
    }
}
