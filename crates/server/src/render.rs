//! Panel-backed view renderer
//!
//! Produces the text for every live view kind from fresh panel data. The
//! engine and refresher only see the `ViewRenderer` trait; the formatting
//! helpers are pure so they can be tested without a panel.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use staffwatch_panel::{AdminEntity, GameServer, PanelApi, PanelError, ReportStats};
use staffwatch_protocol::{format_duration, ViewKind, ViewParams};

use crate::session::Session;
use crate::view::ViewRenderer;

const ADMINS_PER_PAGE: usize = 10;
const REPORT_ROWS: usize = 12;
const RULE: &str = "====================";

pub struct PanelRenderer {
    panel: Arc<dyn PanelApi>,
}

impl PanelRenderer {
    pub fn new(panel: Arc<dyn PanelApi>) -> Self {
        Self { panel }
    }
}

#[async_trait]
impl ViewRenderer for PanelRenderer {
    async fn render(
        &self,
        session: &Session,
        kind: ViewKind,
        params: &ViewParams,
    ) -> Result<String, PanelError> {
        let stamp = Local::now().format("%H:%M:%S").to_string();
        let text = match kind {
            ViewKind::Summary => {
                let stats = self.panel.fetch_report_stats(&session.auth).await?;
                let admins = self.panel.fetch_admins(&session.auth).await?;
                let servers = self.panel.fetch_servers(&session.auth).await?;
                summary_text(&stats, &admins, &servers, &session.auth.server_id, &stamp)
            }
            ViewKind::Online => {
                let admins = self.panel.fetch_admins(&session.auth).await?;
                online_text(&admins, &stamp)
            }
            ViewKind::Reports => {
                let stats = self.panel.fetch_report_stats(&session.auth).await?;
                let admins = self.panel.fetch_admins(&session.auth).await?;
                reports_text(&stats, &admins, &stamp)
            }
            ViewKind::Servers => {
                let servers = self.panel.fetch_servers(&session.auth).await?;
                servers_text(&servers, &stamp)
            }
            ViewKind::AdminList => {
                let admins = self.panel.fetch_admins(&session.auth).await?;
                admin_list_text(
                    &admins,
                    params.page,
                    params.level_filter,
                    session.tracked_admin.as_deref(),
                    &stamp,
                )
            }
            ViewKind::AdminProfile => {
                let login = params.admin_login.as_deref().unwrap_or_default();
                let admins = self.panel.fetch_admins(&session.auth).await?;
                admin_profile_text(&admins, login, &stamp)
            }
        };
        Ok(text)
    }
}

fn summary_text(
    stats: &ReportStats,
    admins: &[AdminEntity],
    servers: &[GameServer],
    my_server_id: &str,
    stamp: &str,
) -> String {
    let online = admins.iter().filter(|a| a.is_online()).count();
    let at_admins: u32 = admins.iter().map(|a| a.reports.total()).sum();
    let total_players: u32 = servers.iter().map(|s| s.players).sum();

    let mut text = format!(
        "Summary\n{RULE}\n\n\
         Reports:\n  Moderation: {}\n  In progress: {}\n  Unresolved: {}\n  At admins: {}\n\n\
         Admins: {}/{} online\nPlayers: {}",
        stats.moderation,
        stats.progress,
        stats.unresolved,
        at_admins,
        online,
        admins.len(),
        total_players,
    );

    if let Some(mine) = servers
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(my_server_id))
    {
        let status = if mine.status { "ON" } else { "OFF" };
        let queue = if mine.queued_players > 0 {
            format!(" (+{})", mine.queued_players)
        } else {
            String::new()
        };
        text.push_str(&format!(
            "\nYour server ({}): {} {}{}",
            mine.name, status, mine.players, queue
        ));
    }

    text.push_str(&format!("\n\nUpdated: {stamp}"));
    text
}

fn online_text(admins: &[AdminEntity], stamp: &str) -> String {
    let online: Vec<&AdminEntity> = admins.iter().filter(|a| a.is_online()).collect();

    let mut text = format!(
        "Admins Online\n{RULE}\nOnline: {} / {}\n\n",
        online.len(),
        admins.len()
    );

    if online.is_empty() {
        text.push_str("No one online\n");
    } else {
        // Group by level (highest first), each group sorted by today's time.
        let mut by_level: BTreeMap<u8, Vec<&AdminEntity>> = BTreeMap::new();
        for admin in &online {
            by_level.entry(admin.admin).or_default().push(admin);
        }
        for (level, mut group) in by_level.into_iter().rev() {
            group.sort_by(|a, b| b.day_online.cmp(&a.day_online));
            text.push_str(&format!("Level {}\n", level));
            for admin in group {
                let reports = admin.reports.total();
                let rep = if reports > 0 {
                    format!(" [R:{}]", reports)
                } else {
                    String::new()
                };
                text.push_str(&format!(
                    "  * {} ({}){}\n",
                    admin.login,
                    format_duration(admin.day_online),
                    rep
                ));
            }
            text.push('\n');
        }
    }

    text.push_str(&format!("Updated: {stamp}"));
    text
}

fn reports_text(stats: &ReportStats, admins: &[AdminEntity], stamp: &str) -> String {
    let mut with_reports: Vec<&AdminEntity> = admins
        .iter()
        .filter(|a| a.reports.total() > 0)
        .collect();
    with_reports.sort_by(|a, b| b.reports.total().cmp(&a.reports.total()));
    let total: u32 = with_reports.iter().map(|a| a.reports.total()).sum();

    let mut text = format!(
        "Reports\n{RULE}\n\n\
         Statistics:\n  Moderation: {}\n  In progress: {}\n  Unresolved: {}\n\n",
        stats.moderation, stats.progress, stats.unresolved
    );

    if !with_reports.is_empty() {
        text.push_str(&format!("At admins ({}):\n", total));
        for admin in with_reports.iter().take(REPORT_ROWS) {
            let status = if admin.is_online() { "*" } else { " " };
            text.push_str(&format!(
                "  {} [{}] {}: {}\n",
                status,
                admin.admin,
                admin.login,
                admin.reports.total()
            ));
        }
        if with_reports.len() > REPORT_ROWS {
            text.push_str(&format!(
                "  ... and {} more\n",
                with_reports.len() - REPORT_ROWS
            ));
        }
    }

    text.push_str(&format!("\nUpdated: {stamp}"));
    text
}

fn servers_text(servers: &[GameServer], stamp: &str) -> String {
    let total: u32 = servers.iter().map(|s| s.players).sum();
    let queue: u32 = servers.iter().map(|s| s.queued_players).sum();

    let mut text = format!("Servers\n{RULE}\nTotal: {}", total);
    if queue > 0 {
        text.push_str(&format!(" (+{} in queue)", queue));
    }
    text.push_str("\n\n");

    for server in servers {
        let status = if server.status { "+" } else { "-" };
        let tech = if server.tech_works { " [TECH]" } else { "" };
        let queue = if server.queued_players > 0 {
            format!(" (+{})", server.queued_players)
        } else {
            String::new()
        };
        text.push_str(&format!(
            "{} {}: {}{}{}\n",
            status, server.name, server.players, queue, tech
        ));
    }

    text.push_str(&format!("\nUpdated: {stamp}"));
    text
}

fn admin_list_text(
    admins: &[AdminEntity],
    page: usize,
    level_filter: u8,
    tracked: Option<&str>,
    stamp: &str,
) -> String {
    let mut filtered: Vec<&AdminEntity> = admins
        .iter()
        .filter(|a| level_filter == 0 || a.admin == level_filter)
        .collect();
    filtered.sort_by(|a, b| b.week_online.cmp(&a.week_online));

    let total_pages = filtered.len().div_ceil(ADMINS_PER_PAGE).max(1);
    let page = page.min(total_pages - 1);
    let page_rows = filtered
        .iter()
        .skip(page * ADMINS_PER_PAGE)
        .take(ADMINS_PER_PAGE);

    let filter_label = if level_filter > 0 {
        format!("Level {}", level_filter)
    } else {
        "All levels".to_string()
    };

    let mut text = format!(
        "Admins ({})\n{RULE}\nFilter: {}\n",
        filtered.len(),
        filter_label
    );

    if let Some(tracked) = tracked {
        if let Some(admin) = admins.iter().find(|a| a.login == tracked) {
            let status = if admin.is_online() { "*" } else { " " };
            text.push_str(&format!(
                "Tracking: {} {} (R:{})\n",
                status,
                tracked,
                admin.reports.total()
            ));
        }
    }

    text.push('\n');
    for admin in page_rows {
        let status = if admin.is_online() { "*" } else { " " };
        text.push_str(&format!(
            "  {} {} (week: {})\n",
            status,
            admin.login,
            format_duration(admin.week_online)
        ));
    }
    text.push_str(&format!("\nPage {}/{}\n", page + 1, total_pages));
    text.push_str(&format!("Updated: {stamp}"));
    text
}

fn admin_profile_text(admins: &[AdminEntity], login: &str, stamp: &str) -> String {
    let Some(admin) = admins.iter().find(|a| a.login == login) else {
        return format!("Admin {} not found", login);
    };

    let mut text = format!("{}\n{RULE}\n\nLevel {}\nStatus: ", admin.login, admin.admin);
    if admin.is_online() {
        text.push_str(&format!("ONLINE ({})", format_duration(admin.online)));
    } else {
        text.push_str("OFFLINE");
    }

    text.push_str(&format!(
        "\n\nOnline time:\n  Today: {}\n  Week: {}\n  Month: {}\n\n\
         Reports: {}\n  Default: {}\n  Moderation: {}\n",
        format_duration(admin.day_online),
        format_duration(admin.week_online),
        format_duration(admin.month_online),
        admin.reports.total(),
        admin.reports.default,
        admin.reports.moderation,
    ));

    let other = &admin.other_accounts_online;
    if !other.is_empty() {
        text.push_str(&format!(
            "\nOther accounts:\n  Week: {}\n  Month: {}\n",
            format_duration(other.week_online),
            format_duration(other.month_online),
        ));
    }

    text.push_str(&format!("\nUpdated: {stamp}"));
    text
}
