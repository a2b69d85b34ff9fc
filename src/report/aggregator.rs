//! Read-only aggregation over the access log.
//!
//! One counting pass feeds both consumers: the weekly report (7-day window,
//! top 5) and the interactive analytics view (whole live log, top 10).

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::access_log::entry::{AccessLogEntry, RuleKind};

pub const REPORT_WINDOW_DAYS: i64 = 7;
pub const REPORT_TOP_N: usize = 5;
pub const ANALYTICS_TOP_N: usize = 10;
pub const ANALYTICS_RECENT: usize = 50;
const USER_AGENT_MAX_CHARS: usize = 50;

/// Hit count for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counted<K> {
    pub key: K,
    pub count: usize,
}

/// Per-hostname hit count with the rule type it was first seen with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostnameStat {
    pub hostname: String,
    pub count: usize,
    pub rule_type: RuleKind,
    pub last_access: DateTime<Utc>,
}

/// Ranked statistics over a set of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_hits: usize,
    pub unique_hostnames: usize,
    pub top_hostnames: Vec<HostnameStat>,
    pub top_user_agents: Vec<Counted<String>>,
    pub top_paths: Vec<Counted<String>>,
    pub top_status_codes: Vec<Counted<u16>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Weekly digest handed to the report mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyReport {
    pub period: ReportPeriod,
    pub stats: Summary,
}

/// Interactive analytics view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    #[serde(flatten)]
    pub summary: Summary,
    /// Newest first.
    pub recent_logs: Vec<AccessLogEntry>,
}

/// Truncate long user agents to 50 characters plus an ellipsis.
pub fn shorten_user_agent(agent: &str) -> String {
    if agent.chars().count() > USER_AGENT_MAX_CHARS {
        let mut short: String = agent.chars().take(USER_AGENT_MAX_CHARS).collect();
        short.push_str("...");
        short
    } else {
        agent.to_string()
    }
}

/// Count and rank `entries`, keeping the `top_n` of each dimension.
pub fn summarize<'a, I>(entries: I, top_n: usize) -> Summary
where
    I: IntoIterator<Item = &'a AccessLogEntry>,
{
    let mut total_hits = 0;
    let mut hostnames: HashMap<&str, HostnameStat> = HashMap::new();
    let mut user_agents: HashMap<String, usize> = HashMap::new();
    let mut paths: HashMap<&str, usize> = HashMap::new();
    let mut status_codes: HashMap<u16, usize> = HashMap::new();

    for entry in entries {
        total_hits += 1;

        hostnames
            .entry(entry.hostname.as_str())
            .and_modify(|stat| {
                stat.count += 1;
                if entry.timestamp > stat.last_access {
                    stat.last_access = entry.timestamp;
                }
            })
            .or_insert_with(|| HostnameStat {
                hostname: entry.hostname.clone(),
                count: 1,
                rule_type: entry.rule_type,
                last_access: entry.timestamp,
            });

        *user_agents.entry(shorten_user_agent(&entry.user_agent)).or_default() += 1;
        *paths.entry(entry.path.as_str()).or_default() += 1;
        *status_codes.entry(entry.status_code).or_default() += 1;
    }

    let unique_hostnames = hostnames.len();
    let mut top_hostnames: Vec<HostnameStat> = hostnames.into_values().collect();
    top_hostnames.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.hostname.cmp(&b.hostname)));
    top_hostnames.truncate(top_n);

    Summary {
        total_hits,
        unique_hostnames,
        top_hostnames,
        top_user_agents: rank(user_agents, top_n),
        top_paths: rank(paths.into_iter().map(|(k, v)| (k.to_string(), v)), top_n),
        top_status_codes: rank(status_codes, top_n),
    }
}

/// Descending by count, ties broken by key so output is deterministic.
fn rank<K: Ord, I: IntoIterator<Item = (K, usize)>>(counts: I, top_n: usize) -> Vec<Counted<K>> {
    let mut ranked: Vec<Counted<K>> = counts
        .into_iter()
        .map(|(key, count)| Counted { key, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(top_n);
    ranked
}

/// Entries whose timestamp falls in `[now - 7 days, now]`.
pub fn weekly_entries(entries: &[AccessLogEntry], now: DateTime<Utc>) -> Vec<AccessLogEntry> {
    let since = now - Duration::days(REPORT_WINDOW_DAYS);
    entries
        .iter()
        .filter(|e| e.timestamp >= since && e.timestamp <= now)
        .cloned()
        .collect()
}

/// Weekly report anchored at `now`; `None` when the window holds no entries.
pub fn weekly_report(entries: &[AccessLogEntry], now: DateTime<Utc>) -> Option<WeeklyReport> {
    let since = now - Duration::days(REPORT_WINDOW_DAYS);
    let window: Vec<&AccessLogEntry> = entries
        .iter()
        .filter(|e| e.timestamp >= since && e.timestamp <= now)
        .collect();
    if window.is_empty() {
        return None;
    }

    Some(WeeklyReport {
        period: ReportPeriod {
            from: since.date_naive(),
            to: now.date_naive(),
        },
        stats: summarize(window, REPORT_TOP_N),
    })
}

/// Whole-log analytics with the most recent entries.
pub fn analytics(entries: &[AccessLogEntry]) -> Analytics {
    Analytics {
        summary: summarize(entries, ANALYTICS_TOP_N),
        recent_logs: entries.iter().rev().take(ANALYTICS_RECENT).cloned().collect(),
    }
}
