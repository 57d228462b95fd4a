//! Aggregate statistics: portfolio totals, top examiners for a date window,
//! and per-type rankings for a date window.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::{Backend, BackendError, ExaminerStatsRequest, RangeStatsRequest, TotalStats};
use crate::dispatch::{self, DispatchError};
use crate::session::{LastQueryKind, Session, Ticket, Workflow};
use crate::utils;

pub const DEFAULT_STATS_LIMIT: u32 = 10;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kinds accepted by `/stats/by-date-range`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsType {
    Examiner,
    Prosecutor,
    LawFirm,
    Gau,
    Assignee,
    Usc,
    Entity,
    Action,
}

struct StatsTypeInfo {
    key: &'static str,
    list_key: &'static str,
    label: &'static str,
}

impl StatsType {
    pub const ALL: [StatsType; 8] = [
        StatsType::Examiner,
        StatsType::Prosecutor,
        StatsType::LawFirm,
        StatsType::Gau,
        StatsType::Assignee,
        StatsType::Usc,
        StatsType::Entity,
        StatsType::Action,
    ];

    fn info(self) -> StatsTypeInfo {
        let (key, list_key, label) = match self {
            Self::Examiner => ("examiner", "examiners", "Examiner Stats"),
            Self::Prosecutor => ("prosecutor", "prosecutors", "Prosecutor Stats"),
            Self::LawFirm => ("lawfirm", "lawfirms", "Law Firm Stats"),
            Self::Gau => ("gau", "gaus", "GAU Stats"),
            Self::Assignee => ("assignee", "assignees", "Assignee Stats"),
            Self::Usc => ("usc", "uscs", "USC Class Stats"),
            Self::Entity => ("entity", "entitys", "Entity Type Stats"),
            Self::Action => ("action", "actions", "Action Code Stats"),
        };
        StatsTypeInfo {
            key,
            list_key,
            label,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.key() == v)
            .or(match v.as_str() {
                "law-firm" | "law_firm" => Some(Self::LawFirm),
                _ => None,
            })
    }

    /// Wire name; also the field holding each entry's name.
    pub fn key(self) -> &'static str {
        self.info().key
    }

    /// Response field holding the entry list.
    pub fn list_key(self) -> &'static str {
        self.info().list_key
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// `[today - 1 year, today]`.
    pub fn default_for(today: NaiveDate) -> Self {
        let from = today.checked_sub_months(Months::new(12)).unwrap_or(today);
        Self { from, to: today }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{}' (expected YYYY-MM-DD)", raw.trim()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A classification code with its application count (GAU or CPC).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassificationCount {
    pub code: String,
    pub application_count: Option<i64>,
}

/// One ranked row of a statistics response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsEntry {
    pub name: String,
    pub application_count: Option<i64>,
    pub unique_gau_count: Option<i64>,
    pub gaus: Vec<ClassificationCount>,
    pub unique_cpc_count: Option<i64>,
    pub cpcs: Vec<ClassificationCount>,
}

impl StatsEntry {
    fn from_value(value: &Value, name_key: &str) -> Self {
        Self {
            name: value
                .get(name_key)
                .filter(|v| !v.is_null())
                .map(utils::scalar_text)
                .unwrap_or_default(),
            application_count: value.get("application_count").and_then(Value::as_i64),
            unique_gau_count: value.get("unique_gau_count").and_then(Value::as_i64),
            gaus: classification_list(value.get("gaus"), "gau"),
            unique_cpc_count: value.get("unique_cpc_count").and_then(Value::as_i64),
            cpcs: classification_list(value.get("cpcs"), "cpc"),
        }
    }
}

fn classification_list(value: Option<&Value>, code_key: &str) -> Vec<ClassificationCount> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let code = item.get(code_key).filter(|v| !v.is_null())?;
            Some(ClassificationCount {
                code: utils::scalar_text(code),
                application_count: item.get("application_count").and_then(Value::as_i64),
            })
        })
        .collect()
}

fn entries(payload: &Value, list_key: &str, name_key: &str) -> Vec<StatsEntry> {
    match payload.get(list_key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| StatsEntry::from_value(item, name_key))
            .collect(),
        Some(other) => {
            warn!(list_key, kind = ?other, "statistics list has unexpected shape");
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExaminerStats {
    pub entries: Vec<StatsEntry>,
}

impl ExaminerStats {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            entries: entries(payload, "examiners", "examiner"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeStats {
    pub stats_type: StatsType,
    pub sort_order: SortOrder,
    pub entries: Vec<StatsEntry>,
}

impl RangeStats {
    pub fn from_payload(payload: &Value, stats_type: StatsType, sort_order: SortOrder) -> Self {
        Self {
            stats_type,
            sort_order,
            entries: entries(payload, stats_type.list_key(), stats_type.key()),
        }
    }
}

/// Both bounds must be given and well formed.
pub fn validate_range(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate), DispatchError> {
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(DispatchError::validation(
            "Please select both From and To dates",
        ));
    }
    let from = parse_date(from).map_err(DispatchError::Validation)?;
    let to = parse_date(to).map_err(DispatchError::Validation)?;
    Ok((from, to))
}

fn check_ticket(session: &Session, ticket: Ticket) -> Result<(), DispatchError> {
    if session.is_current(ticket) {
        Ok(())
    } else {
        Err(DispatchError::Superseded {
            workflow: Workflow::Stats,
        })
    }
}

pub fn apply_totals(
    session: &mut Session,
    ticket: Ticket,
    response: Result<TotalStats, BackendError>,
) -> Result<TotalStats, DispatchError> {
    check_ticket(session, ticket)?;
    let totals = response.map_err(|e| DispatchError::backend("Failed to load stats", e))?;
    info!(total = totals.total_patents, "totals loaded");
    Ok(totals)
}

pub async fn load_totals(
    session: &mut Session,
    backend: &dyn Backend,
) -> Result<TotalStats, DispatchError> {
    session.clear_error();
    let ticket = session.begin(Workflow::Stats);
    let response = backend.total_stats().await;
    apply_totals(session, ticket, response).map_err(|e| dispatch::surface(session, e))
}

pub fn apply_examiner_stats(
    session: &mut Session,
    ticket: Ticket,
    response: Result<Value, BackendError>,
) -> Result<ExaminerStats, DispatchError> {
    check_ticket(session, ticket)?;
    let payload = response.map_err(|e| DispatchError::backend("Failed to fetch examiner stats", e))?;
    let stats = ExaminerStats::from_payload(&payload);
    info!(entries = stats.entries.len(), "examiner statistics loaded");
    session.set_last_kind(LastQueryKind::ExaminerStats);
    session.hide_locator();
    session.show_statistics_view();
    Ok(stats)
}

pub async fn examiner_stats_by_date(
    session: &mut Session,
    backend: &dyn Backend,
    from: &str,
    to: &str,
    limit: u32,
) -> Result<ExaminerStats, DispatchError> {
    session.clear_error();
    let (from, to) = validate_range(from, to).map_err(|e| dispatch::surface(session, e))?;
    let request = ExaminerStatsRequest {
        from_date: format_date(from),
        to_date: format_date(to),
        limit,
    };
    let ticket = session.begin(Workflow::Stats);
    let response = backend.examiner_stats(&request).await;
    apply_examiner_stats(session, ticket, response).map_err(|e| dispatch::surface(session, e))
}

pub fn apply_range_stats(
    session: &mut Session,
    ticket: Ticket,
    request: &RangeStatsRequest,
    response: Result<Value, BackendError>,
) -> Result<RangeStats, DispatchError> {
    check_ticket(session, ticket)?;
    let payload = response.map_err(|e| DispatchError::backend("Failed to fetch stats", e))?;
    let stats = RangeStats::from_payload(&payload, request.stats_type, request.sort_order);
    info!(
        stats_type = request.stats_type.key(),
        entries = stats.entries.len(),
        "range statistics loaded"
    );
    session.set_last_kind(LastQueryKind::RangeStats(request.stats_type));
    session.hide_locator();
    session.show_statistics_view();
    Ok(stats)
}

pub async fn stats_by_date_range(
    session: &mut Session,
    backend: &dyn Backend,
    stats_type: StatsType,
    from: &str,
    to: &str,
    limit: u32,
    sort_order: SortOrder,
) -> Result<RangeStats, DispatchError> {
    session.clear_error();
    let (from, to) = validate_range(from, to).map_err(|e| dispatch::surface(session, e))?;
    let request = RangeStatsRequest {
        stats_type,
        from_date: format_date(from),
        to_date: format_date(to),
        limit,
        sort_order,
    };
    let ticket = session.begin(Workflow::Stats);
    let response = backend.range_stats(&request).await;
    apply_range_stats(session, ticket, &request, response)
        .map_err(|e| dispatch::surface(session, e))
}
