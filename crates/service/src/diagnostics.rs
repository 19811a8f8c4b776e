//! Process-wide client diagnostics: visitor events and client-side errors.
//!
//! Both buffers live behind one lock and keep only the most recent entries.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use common::types::LabelCount;
use configs::DiagnosticsConfig;

use crate::errors::ServiceError;
use crate::metrics;

const TOP_N: usize = 10;
const RECENT_ERRORS: usize = 20;
const PREVIEW_CHARS: usize = 100;
const DEFAULT_ERROR_TYPE: &str = "UnknownError";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VisitorInput {
    pub session_id: Option<String>,
    #[serde(default)]
    pub page: String,
    pub action: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorInput {
    pub session_id: Option<String>,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub message: String,
    pub stack_trace: Option<String>,
    pub error_type: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VisitorEvent {
    pub id: Uuid,
    pub session_id: String,
    pub page: String,
    pub action: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorEvent {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub page: String,
    pub message: String,
    pub stack_trace: Option<String>,
    pub error_type: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecentError {
    pub id: Uuid,
    pub page: String,
    pub error: String,
    pub error_type: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VisitorAnalytics {
    pub total: usize,
    pub unique_sessions: usize,
    pub top_pages: Vec<LabelCount>,
    pub top_actions: Vec<LabelCount>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorAnalytics {
    pub total: usize,
    pub by_type: Vec<LabelCount>,
    pub top_pages: Vec<LabelCount>,
    pub recent: Vec<RecentError>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Analytics {
    pub period_hours: i64,
    pub generated_at: DateTime<Utc>,
    pub visitors: VisitorAnalytics,
    pub errors: ErrorAnalytics,
}

#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticsHealth {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub visitor_count: usize,
    pub error_count: usize,
    pub oldest_visitor: Option<DateTime<Utc>>,
    pub newest_visitor: Option<DateTime<Utc>>,
    pub oldest_error: Option<DateTime<Utc>>,
    pub newest_error: Option<DateTime<Utc>>,
}

struct Buffers {
    visitors: VecDeque<VisitorEvent>,
    errors: VecDeque<ErrorEvent>,
}

pub struct DiagnosticsLog {
    cfg: DiagnosticsConfig,
    inner: Mutex<Buffers>,
}

impl DiagnosticsLog {
    pub fn new(cfg: DiagnosticsConfig) -> Self {
        Self { cfg, inner: Mutex::new(Buffers { visitors: VecDeque::new(), errors: VecDeque::new() }) }
    }

    pub fn record_visitor(&self, input: VisitorInput) -> Uuid {
        let event = VisitorEvent {
            id: Uuid::new_v4(),
            session_id: input.session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            page: input.page,
            action: input.action,
            user_agent: input.user_agent,
            ip_address: input.ip_address,
            referrer: input.referrer,
            metadata: input.metadata,
            timestamp: Utc::now(),
        };
        let id = event.id;
        info!(page = %event.page, action = ?event.action, ip = ?event.ip_address, "visitor_event");
        {
            let mut buf = self.inner.lock();
            buf.visitors.push_back(event);
            while buf.visitors.len() > self.cfg.visitor_capacity {
                buf.visitors.pop_front();
            }
        }
        metrics::record_diagnostic("visitor");
        id
    }

    pub fn record_error(&self, input: ErrorInput) -> Uuid {
        let event = ErrorEvent {
            id: Uuid::new_v4(),
            session_id: input.session_id,
            page: input.page,
            message: input.message,
            stack_trace: input.stack_trace,
            error_type: input
                .error_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ERROR_TYPE.to_string()),
            user_agent: input.user_agent,
            ip_address: input.ip_address,
            metadata: input.metadata,
            timestamp: Utc::now(),
        };
        let id = event.id;
        warn!(page = %event.page, error_type = %event.error_type, message = %event.message, "client_error");
        {
            let mut buf = self.inner.lock();
            buf.errors.push_back(event);
            while buf.errors.len() > self.cfg.error_capacity {
                buf.errors.pop_front();
            }
        }
        metrics::record_diagnostic("error");
        id
    }

    pub fn analytics(&self, hours: i64) -> Analytics {
        let now = Utc::now();
        let since = now - Duration::hours(hours.max(0));
        let buf = self.inner.lock();

        let visitors: Vec<&VisitorEvent> = buf.visitors.iter().filter(|v| v.timestamp >= since).collect();
        let errors: Vec<&ErrorEvent> = buf.errors.iter().filter(|e| e.timestamp >= since).collect();

        let unique_sessions = visitors.iter().map(|v| v.session_id.as_str()).collect::<HashSet<_>>().len();
        let top_pages = ranked(visitors.iter().map(|v| v.page.as_str()), Some(TOP_N));
        let top_actions = ranked(visitors.iter().filter_map(|v| v.action.as_deref()), Some(TOP_N));

        let by_type = ranked(errors.iter().map(|e| e.error_type.as_str()), None);
        let error_pages = ranked(errors.iter().map(|e| e.page.as_str()), Some(TOP_N));
        let mut recent: Vec<&ErrorEvent> = errors.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let recent = recent
            .into_iter()
            .take(RECENT_ERRORS)
            .map(|e| RecentError {
                id: e.id,
                page: e.page.clone(),
                error: e.message.chars().take(PREVIEW_CHARS).collect(),
                error_type: e.error_type.clone(),
                timestamp: e.timestamp,
            })
            .collect();

        Analytics {
            period_hours: hours,
            generated_at: now,
            visitors: VisitorAnalytics { total: visitors.len(), unique_sessions, top_pages, top_actions },
            errors: ErrorAnalytics { total: errors.len(), by_type, top_pages: error_pages, recent },
        }
    }

    pub fn get_error(&self, id: Uuid) -> Result<ErrorEvent, ServiceError> {
        self.inner
            .lock()
            .errors
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("error log"))
    }

    /// Errors from the last `hours`, newest first.
    pub fn export_errors(&self, hours: i64) -> Vec<ErrorEvent> {
        let since = Utc::now() - Duration::hours(hours.max(0));
        let buf = self.inner.lock();
        let mut out: Vec<ErrorEvent> = buf.errors.iter().filter(|e| e.timestamp >= since).cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    pub fn health(&self) -> DiagnosticsHealth {
        let buf = self.inner.lock();
        DiagnosticsHealth {
            status: "Healthy",
            timestamp: Utc::now(),
            visitor_count: buf.visitors.len(),
            error_count: buf.errors.len(),
            oldest_visitor: buf.visitors.front().map(|v| v.timestamp),
            newest_visitor: buf.visitors.back().map(|v| v.timestamp),
            oldest_error: buf.errors.front().map(|e| e.timestamp),
            newest_error: buf.errors.back().map(|e| e.timestamp),
        }
    }
}

/// Count occurrences, most frequent first; ties keep label order for stable output.
fn ranked<'a>(labels: impl Iterator<Item = &'a str>, limit: Option<usize>) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for l in labels {
        *counts.entry(l).or_default() += 1;
    }
    let mut out: Vec<LabelCount> = counts.into_iter().map(|(l, c)| LabelCount::new(l, c)).collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    if let Some(n) = limit {
        out.truncate(n);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(visitors: usize, errors: usize) -> DiagnosticsLog {
        DiagnosticsLog::new(DiagnosticsConfig { visitor_capacity: visitors, error_capacity: errors })
    }

    fn visit(page: &str, session: Option<&str>, action: Option<&str>) -> VisitorInput {
        VisitorInput {
            session_id: session.map(str::to_string),
            page: page.into(),
            action: action.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn visitor_buffer_keeps_most_recent() {
        let d = log(3, 3);
        for i in 0..5 {
            d.record_visitor(visit(&format!("/p{i}"), Some("s"), None));
        }
        let h = d.health();
        assert_eq!(h.visitor_count, 3);
        let a = d.analytics(24);
        let pages: Vec<_> = a.visitors.top_pages.iter().map(|p| p.label.clone()).collect();
        assert!(pages.contains(&"/p4".to_string()));
        assert!(!pages.contains(&"/p0".to_string()));
    }

    #[test]
    fn missing_session_gets_fresh_id() {
        let d = log(10, 10);
        d.record_visitor(visit("/", None, None));
        d.record_visitor(visit("/", None, None));
        assert_eq!(d.analytics(1).visitors.unique_sessions, 2);
    }

    #[test]
    fn error_type_defaults_and_preview_truncates() {
        let d = log(10, 10);
        let id = d.record_error(ErrorInput { page: "/risks".into(), message: "x".repeat(250), ..Default::default() });
        let e = d.get_error(id).unwrap();
        assert_eq!(e.error_type, "UnknownError");
        let a = d.analytics(24);
        assert_eq!(a.errors.recent[0].error.chars().count(), 100);
        assert_eq!(a.errors.by_type[0].label, "UnknownError");
    }

    #[test]
    fn analytics_ranks_pages_and_actions() {
        let d = log(100, 10);
        for _ in 0..3 {
            d.record_visitor(visit("/dashboard", Some("a"), Some("click")));
        }
        d.record_visitor(visit("/risks", Some("b"), None));
        let a = d.analytics(24);
        assert_eq!(a.visitors.total, 4);
        assert_eq!(a.visitors.unique_sessions, 2);
        assert_eq!(a.visitors.top_pages[0], LabelCount::new("/dashboard", 3));
        assert_eq!(a.visitors.top_actions, vec![LabelCount::new("click", 3)]);
    }

    #[test]
    fn unknown_error_id_is_not_found() {
        let d = log(1, 1);
        assert!(matches!(d.get_error(Uuid::new_v4()), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn export_is_newest_first_and_error_buffer_bounded() {
        let d = log(1, 2);
        for m in ["a", "b", "c"] {
            d.record_error(ErrorInput { page: "/".into(), message: m.into(), ..Default::default() });
        }
        let out = d.export_errors(24);
        assert_eq!(out.len(), 2);
        assert!(out[0].timestamp >= out[1].timestamp);
        assert!(out.iter().all(|e| e.message != "a"));
    }
}
