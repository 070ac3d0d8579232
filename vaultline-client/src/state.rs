//! Dashboard read-model state and derived groupings.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use vaultline_core::{
    ActiveConsent, AuditLogEntry, PendingConsentRequest, SessionInfo, Timestamp,
};

/// The three data panels of the consent dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Pending,
    Active,
    Audit,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Pending => "Pending requests",
            Tab::Active => "Active consents",
            Tab::Audit => "Audit log",
        }
    }

    pub fn all() -> &'static [Tab] {
        &[Tab::Pending, Tab::Active, Tab::Audit]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> Tab {
        let all = Self::all();
        let idx = self.index();
        all[if idx == 0 { all.len() - 1 } else { idx - 1 }]
    }
}

/// Ephemeral, possibly-stale read replica of the backend's consent state.
///
/// Collections are replaced wholesale by the fetch functions; entries are
/// never mutated in place. `in_flight` holds per-item action keys so that
/// concurrent actions on different items stay independent.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub tab: Tab,
    pub pending: Vec<PendingConsentRequest>,
    pub active: Vec<ActiveConsent>,
    pub audit: Vec<AuditLogEntry>,
    pub session: SessionInfo,
    pub stream_connected: bool,
    /// Count of stream events seen; forces downstream re-evaluation even
    /// when two events are structurally identical.
    pub events_seen: u64,
    pub last_synced: Option<Timestamp>,
    in_flight: HashSet<String>,
}

impl DashboardState {
    pub fn new(session: SessionInfo) -> Self {
        Self {
            tab: Tab::Pending,
            pending: Vec::new(),
            active: Vec::new(),
            audit: Vec::new(),
            session,
            stream_connected: false,
            events_seen: 0,
            last_synced: None,
            in_flight: HashSet::new(),
        }
    }

    pub fn set_pending(&mut self, rows: Vec<PendingConsentRequest>) {
        self.pending = rows;
        self.touch();
    }

    pub fn set_active(&mut self, rows: Vec<ActiveConsent>) {
        self.active = rows;
        self.touch();
    }

    pub fn set_audit(&mut self, rows: Vec<AuditLogEntry>) {
        self.audit = rows;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_synced = Some(Utc::now());
    }

    pub fn record_stream_event(&mut self) {
        self.events_seen += 1;
    }

    /// Claim the in-flight flag for an action key. Returns false when the
    /// key is already claimed; callers must then reject the submission.
    pub fn begin_action(&mut self, key: &str) -> bool {
        self.in_flight.insert(key.to_string())
    }

    pub fn finish_action(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    /// Audit entries grouped by originating agent, each agent's entries
    /// further grouped into per-request trails, everything newest-first.
    pub fn agent_activity(&self) -> Vec<AgentActivity> {
        let mut by_agent: HashMap<&str, HashMap<&str, Vec<&AuditLogEntry>>> = HashMap::new();
        for entry in &self.audit {
            by_agent
                .entry(entry.agent_id.as_str())
                .or_default()
                // An entry without a request id forms a singleton trail
                // under its own id.
                .entry(if entry.request_id.is_empty() {
                    entry.id.as_str()
                } else {
                    entry.request_id.as_str()
                })
                .or_default()
                .push(entry);
        }

        let mut agents: Vec<AgentActivity> = by_agent
            .into_iter()
            .map(|(agent_id, trails)| {
                let mut trails: Vec<ConsentTrail> = trails
                    .into_iter()
                    .map(|(request_id, mut entries)| {
                        entries.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
                        ConsentTrail {
                            request_id: request_id.to_string(),
                            entries: entries.into_iter().cloned().collect(),
                        }
                    })
                    .collect();
                trails.sort_by(|a, b| b.newest().cmp(&a.newest()));
                AgentActivity {
                    agent_id: agent_id.to_string(),
                    trails,
                }
            })
            .collect();
        agents.sort_by(|a, b| b.newest().cmp(&a.newest()));
        agents
    }
}

/// All of one agent's audit activity, newest trail first.
#[derive(Debug, Clone)]
pub struct AgentActivity {
    pub agent_id: String,
    pub trails: Vec<ConsentTrail>,
}

impl AgentActivity {
    fn newest(&self) -> Option<Timestamp> {
        self.trails.first().and_then(|t| t.newest())
    }
}

/// The lifecycle events of one consent request, newest first.
#[derive(Debug, Clone)]
pub struct ConsentTrail {
    pub request_id: String,
    pub entries: Vec<AuditLogEntry>,
}

impl ConsentTrail {
    fn newest(&self) -> Option<Timestamp> {
        self.entries.first().map(|e| e.issued_at)
    }
}
