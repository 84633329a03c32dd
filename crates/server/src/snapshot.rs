//! Snapshot cache and diff pass
//!
//! A `Snapshot` is the previous poll result for one session, owned by that
//! session's monitor loop (single writer by construction). `diff_and_advance`
//! compares a fresh poll against it, produces the cycle's change events, and
//! advances the cache to the new values.

use std::collections::{HashMap, HashSet};

use staffwatch_panel::{AdminEntity, ReportStats};
use staffwatch_protocol::{ChangeEvent, CounterDelta};

/// One successful poll cycle's worth of data.
#[derive(Debug, Clone, Default)]
pub struct PanelPoll {
    pub admins: Vec<AdminEntity>,
    pub stats: ReportStats,
}

/// Cached previous poll result used as the diff baseline.
#[derive(Debug, Clone)]
pub struct Snapshot {
    online: HashSet<String>,
    stats: ReportStats,
    admin_reports: HashMap<String, u32>,
}

impl Snapshot {
    /// Seed the baseline from the session's first successful poll.
    /// The baseline cycle never emits events.
    pub fn baseline(poll: &PanelPoll) -> Self {
        Self {
            online: online_set(&poll.admins),
            stats: poll.stats,
            admin_reports: poll
                .admins
                .iter()
                .map(|a| (a.login.clone(), a.reports.total()))
                .collect(),
        }
    }

    /// Diff a fresh poll against the cache and advance the cache.
    ///
    /// Event order: tracked-admin transition (if any) first, then presence
    /// changes, aggregate counter changes, per-admin report deltas. With a
    /// tracked admin configured, other admins' report deltas are suppressed
    /// but their stored counts still advance, so a later un-tracking cannot
    /// replay a stale accumulated delta.
    pub fn diff_and_advance(
        &mut self,
        poll: &PanelPoll,
        tracked: Option<&str>,
    ) -> Vec<ChangeEvent> {
        let current_online = online_set(&poll.admins);

        let mut joined: Vec<&str> = current_online
            .iter()
            .filter(|login| !self.online.contains(*login))
            .map(String::as_str)
            .collect();
        let mut left: Vec<&str> = self
            .online
            .iter()
            .filter(|login| !current_online.contains(*login))
            .map(String::as_str)
            .collect();
        joined.sort_unstable();
        left.sort_unstable();

        let mut events = Vec::new();

        for login in &joined {
            let level = poll
                .admins
                .iter()
                .find(|a| a.login == *login)
                .map(|a| a.admin)
                .unwrap_or(0);
            events.push(ChangeEvent::Joined {
                login: (*login).to_string(),
                level,
            });
        }
        for login in &left {
            events.push(ChangeEvent::Left {
                login: (*login).to_string(),
            });
        }

        let changes = stat_deltas(&self.stats, &poll.stats);
        if !changes.is_empty() {
            events.push(ChangeEvent::StatsChanged { changes });
        }

        for admin in &poll.admins {
            let current = admin.reports.total();
            let previous = self
                .admin_reports
                .get(&admin.login)
                .copied()
                .unwrap_or(0);

            if current != previous {
                let suppressed = tracked.is_some_and(|t| t != admin.login);
                if !suppressed {
                    events.push(if current > previous {
                        ChangeEvent::ReportsGained {
                            login: admin.login.clone(),
                            delta: current - previous,
                            total: current,
                        }
                    } else {
                        ChangeEvent::ReportsClosed {
                            login: admin.login.clone(),
                            delta: previous - current,
                            total: current,
                        }
                    });
                }
            }
            // Stored count advances whether or not an event was emitted.
            self.admin_reports.insert(admin.login.clone(), current);
        }

        if let Some(tracked) = tracked {
            if joined.contains(&tracked) {
                events.insert(
                    0,
                    ChangeEvent::TrackedJoined {
                        login: tracked.to_string(),
                    },
                );
            } else if left.contains(&tracked) {
                events.insert(
                    0,
                    ChangeEvent::TrackedLeft {
                        login: tracked.to_string(),
                    },
                );
            }
        }

        self.online = current_online;
        self.stats = poll.stats;
        events
    }

    #[cfg(test)]
    pub fn stored_reports(&self, login: &str) -> Option<u32> {
        self.admin_reports.get(login).copied()
    }
}

fn online_set(admins: &[AdminEntity]) -> HashSet<String> {
    admins
        .iter()
        .filter(|a| a.is_online())
        .map(|a| a.login.clone())
        .collect()
}

fn stat_deltas(previous: &ReportStats, current: &ReportStats) -> Vec<CounterDelta> {
    let pairs = [
        ("Moderation", previous.moderation, current.moderation),
        ("In progress", previous.progress, current.progress),
        ("Unresolved", previous.unresolved, current.unresolved),
    ];
    pairs
        .into_iter()
        .filter(|(_, prev, cur)| prev != cur)
        .map(|(name, prev, cur)| CounterDelta {
            name: name.to_string(),
            previous: prev,
            current: cur,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffwatch_panel::AdminReports;

    fn admin(login: &str, level: u8, online: bool, reports: u32) -> AdminEntity {
        AdminEntity {
            login: login.to_string(),
            admin: level,
            online: if online { 60 } else { 0 },
            reports: AdminReports {
                default: reports,
                moderation: 0,
            },
            ..Default::default()
        }
    }

    fn poll(admins: Vec<AdminEntity>, stats: ReportStats) -> PanelPoll {
        PanelPoll { admins, stats }
    }

    #[test]
    fn baseline_emits_no_events_for_any_content() {
        let first = poll(
            vec![admin("aria", 4, true, 7), admin("brux", 2, false, 3)],
            ReportStats {
                moderation: 5,
                progress: 2,
                unresolved: 9,
            },
        );
        // Building the baseline is the whole first cycle; there is nothing
        // to diff against and therefore nothing to emit.
        let snapshot = Snapshot::baseline(&first);
        assert!(snapshot.online.contains("aria"));
        assert_eq!(snapshot.stored_reports("brux"), Some(3));
    }

    #[test]
    fn presence_diff_reports_exact_joins_and_leaves() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("a", 1, true, 0), admin("b", 2, true, 0)],
            ReportStats::default(),
        ));
        let events = snapshot.diff_and_advance(
            &poll(
                vec![
                    admin("a", 1, false, 0),
                    admin("b", 2, true, 0),
                    admin("c", 3, true, 0),
                ],
                ReportStats::default(),
            ),
            None,
        );

        assert_eq!(
            events,
            vec![
                ChangeEvent::Joined {
                    login: "c".into(),
                    level: 3
                },
                ChangeEvent::Left { login: "a".into() },
            ]
        );
    }

    #[test]
    fn second_diff_uses_advanced_online_set() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("a", 1, true, 0)],
            ReportStats::default(),
        ));
        snapshot.diff_and_advance(
            &poll(vec![admin("a", 1, false, 0)], ReportStats::default()),
            None,
        );
        // "a" already observed offline; no repeat leave event.
        let events = snapshot.diff_and_advance(
            &poll(vec![admin("a", 1, false, 0)], ReportStats::default()),
            None,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn aggregate_diff_is_one_block_with_only_changed_counters() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![],
            ReportStats {
                moderation: 5,
                progress: 1,
                unresolved: 3,
            },
        ));
        let events = snapshot.diff_and_advance(
            &poll(
                vec![],
                ReportStats {
                    moderation: 8,
                    progress: 1,
                    unresolved: 3,
                },
            ),
            None,
        );

        assert_eq!(events.len(), 1);
        match &events[0] {
            ChangeEvent::StatsChanged { changes } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].name, "Moderation");
                assert_eq!(changes[0].delta(), 3);
            }
            other => panic!("expected stats block, got {:?}", other),
        }
    }

    #[test]
    fn unchanged_stats_emit_nothing() {
        let stats = ReportStats {
            moderation: 5,
            progress: 2,
            unresolved: 0,
        };
        let mut snapshot = Snapshot::baseline(&poll(vec![], stats));
        let events = snapshot.diff_and_advance(&poll(vec![], stats), None);
        assert!(events.is_empty());
    }

    #[test]
    fn report_delta_emits_signed_change() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("a", 2, true, 2)],
            ReportStats::default(),
        ));
        let events = snapshot.diff_and_advance(
            &poll(vec![admin("a", 2, true, 5)], ReportStats::default()),
            None,
        );
        assert_eq!(
            events,
            vec![ChangeEvent::ReportsGained {
                login: "a".into(),
                delta: 3,
                total: 5
            }]
        );

        let events = snapshot.diff_and_advance(
            &poll(vec![admin("a", 2, true, 1)], ReportStats::default()),
            None,
        );
        assert_eq!(
            events,
            vec![ChangeEvent::ReportsClosed {
                login: "a".into(),
                delta: 4,
                total: 1
            }]
        );
    }

    #[test]
    fn tracked_admin_suppresses_others_but_still_advances_store() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("a", 4, true, 2), admin("b", 2, true, 2)],
            ReportStats::default(),
        ));

        // B changes 2 -> 5 while A is tracked: no event, stored value moves.
        let events = snapshot.diff_and_advance(
            &poll(
                vec![admin("a", 4, true, 2), admin("b", 2, true, 5)],
                ReportStats::default(),
            ),
            Some("a"),
        );
        assert!(events.is_empty());
        assert_eq!(snapshot.stored_reports("b"), Some(5));

        // A changes 2 -> 5: emitted with delta +3.
        let events = snapshot.diff_and_advance(
            &poll(
                vec![admin("a", 4, true, 5), admin("b", 2, true, 5)],
                ReportStats::default(),
            ),
            Some("a"),
        );
        assert_eq!(
            events,
            vec![ChangeEvent::ReportsGained {
                login: "a".into(),
                delta: 3,
                total: 5
            }]
        );
    }

    #[test]
    fn untracking_after_suppressed_change_replays_nothing() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("b", 2, true, 2)],
            ReportStats::default(),
        ));
        snapshot.diff_and_advance(
            &poll(vec![admin("b", 2, true, 5)], ReportStats::default()),
            Some("a"),
        );
        // Tracking removed; b's count unchanged since the suppressed cycle.
        let events = snapshot.diff_and_advance(
            &poll(vec![admin("b", 2, true, 5)], ReportStats::default()),
            None,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn unseen_admin_defaults_to_zero_baseline() {
        let mut snapshot = Snapshot::baseline(&poll(vec![], ReportStats::default()));
        let events = snapshot.diff_and_advance(
            &poll(vec![admin("new", 1, false, 4)], ReportStats::default()),
            None,
        );
        assert_eq!(
            events,
            vec![ChangeEvent::ReportsGained {
                login: "new".into(),
                delta: 4,
                total: 4
            }]
        );
    }

    #[test]
    fn tracked_transition_is_prepended_before_all_other_events() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("a", 4, false, 0), admin("b", 2, true, 2)],
            ReportStats {
                moderation: 1,
                ..Default::default()
            },
        ));
        let events = snapshot.diff_and_advance(
            &poll(
                vec![admin("a", 4, true, 0), admin("b", 2, true, 4)],
                ReportStats {
                    moderation: 2,
                    ..Default::default()
                },
            ),
            Some("a"),
        );

        assert_eq!(
            events[0],
            ChangeEvent::TrackedJoined { login: "a".into() }
        );
        // The regular join line for the tracked admin is still present.
        assert!(events.contains(&ChangeEvent::Joined {
            login: "a".into(),
            level: 4
        }));
    }

    #[test]
    fn tracked_leave_transition_prepends_priority_event() {
        let mut snapshot = Snapshot::baseline(&poll(
            vec![admin("a", 4, true, 0)],
            ReportStats::default(),
        ));
        let events = snapshot.diff_and_advance(
            &poll(vec![admin("a", 4, false, 0)], ReportStats::default()),
            Some("a"),
        );
        assert_eq!(
            events,
            vec![
                ChangeEvent::TrackedLeft { login: "a".into() },
                ChangeEvent::Left { login: "a".into() },
            ]
        );
    }
}
