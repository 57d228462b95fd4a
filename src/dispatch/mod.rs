//! Turns collected filters into one `/build/*-query` call, keeps the returned
//! locator as the session's current query, and executes it on request.

mod opener;

pub use opener::{SystemOpener, UrlOpener};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, BackendError, BuildRequest, ResultSet};
use crate::context;
use crate::session::{LastQueryKind, Session, Ticket, Workflow};
use crate::tags::TagKind;
use crate::utils;

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Patent,
    Examiner,
    LawFirm,
    Prosecutor,
    Attorney,
    Gau,
    Advanced,
}

impl QueryKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "patent" | "patents" | "id" => Some(Self::Patent),
            "examiner" | "examiners" => Some(Self::Examiner),
            "lawfirm" | "law-firm" | "law_firm" | "firm" => Some(Self::LawFirm),
            "prosecutor" | "prosecutors" => Some(Self::Prosecutor),
            "attorney" | "attorneys" => Some(Self::Attorney),
            "gau" | "gaus" => Some(Self::Gau),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// The tag list a search of this kind reads from, if any.
    pub fn tag_kind(self) -> Option<TagKind> {
        match self {
            Self::Patent => Some(TagKind::PatentId),
            Self::Examiner => Some(TagKind::Examiner),
            Self::LawFirm => Some(TagKind::LawFirm),
            Self::Prosecutor => Some(TagKind::Prosecutor),
            Self::Attorney | Self::Gau | Self::Advanced => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Patent => "patent",
            Self::Examiner => "examiner",
            Self::LawFirm => "law firm",
            Self::Prosecutor => "prosecutor",
            Self::Attorney => "attorney",
            Self::Gau => "GAU",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SearchMode {
    #[default]
    #[serde(rename = "latest_filed")]
    LatestFiled,
    #[serde(rename = "latest_approved")]
    LatestApproved,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "last_10_years")]
    LastTenYears,
    #[serde(rename = "latest_10_approved")]
    LatestTenApproved,
}

impl SearchMode {
    pub const ALL: [SearchMode; 5] = [
        SearchMode::LatestFiled,
        SearchMode::LatestApproved,
        SearchMode::Count,
        SearchMode::LastTenYears,
        SearchMode::LatestTenApproved,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|m| m.as_str() == v)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LatestFiled => "latest_filed",
            Self::LatestApproved => "latest_approved",
            Self::Count => "count",
            Self::LastTenYears => "last_10_years",
            Self::LatestTenApproved => "latest_10_approved",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub limit: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::LatestFiled,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// The backend's fully formed search-engine URL. `raw` is what gets executed;
/// `display` is the percent-decoded text shown for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryLocator {
    raw: String,
    display: String,
}

impl QueryLocator {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let display = match utils::percent_decode(&raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(locator = %raw, "could not decode query locator: {e}");
                raw.clone()
            }
        };
        Self { raw, display }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Whether a dispatch came from the user or from a Patent Context follow-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    User,
    FollowUp,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Caught before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("{action}: {source}")]
    Backend {
        action: String,
        #[source]
        source: BackendError,
    },

    #[error("discarded a superseded {workflow:?} response")]
    Superseded { workflow: Workflow },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open URL: {0}")]
    Launch(String),
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn backend(action: impl Into<String>, source: BackendError) -> Self {
        Self::Backend {
            action: action.into(),
            source,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

/// Records a failed action on the session: banner for everything the user
/// should see, an error log line for transport/backend failures.
pub(crate) fn surface(session: &mut Session, err: DispatchError) -> DispatchError {
    match &err {
        DispatchError::Superseded { workflow } => {
            debug!(?workflow, "ignoring superseded response");
            return err;
        }
        DispatchError::Validation(_) => {}
        other => error!("{other}"),
    }
    session.show_error(err.to_string());
    err
}

/// Builds the request body for a tag-driven search from the session's lists.
pub fn request_from_tags(
    session: &Session,
    kind: QueryKind,
    options: SearchOptions,
) -> Result<BuildRequest, DispatchError> {
    let tag_kind = kind.tag_kind().ok_or_else(|| {
        DispatchError::validation(format!("{} searches are not driven by a tag list", kind.label()))
    })?;
    let list = session.tags.get(tag_kind);
    if list.is_empty() {
        return Err(DispatchError::validation(format!(
            "Please add at least one {}",
            tag_kind.noun()
        )));
    }
    let values = list.entries().to_vec();
    let SearchOptions { mode, limit } = options;
    Ok(match kind {
        QueryKind::Patent => BuildRequest::Patent { patent_ids: values },
        QueryKind::Examiner => BuildRequest::Examiner {
            examiners: values,
            search_type: mode,
            limit,
        },
        QueryKind::LawFirm => BuildRequest::LawFirm {
            lawfirms: values,
            search_type: mode,
            limit,
        },
        QueryKind::Prosecutor => BuildRequest::Prosecutor {
            prosecutors: values,
            search_type: mode,
            limit,
        },
        QueryKind::Attorney | QueryKind::Gau | QueryKind::Advanced => {
            return Err(DispatchError::validation(format!(
                "{} searches are not driven by a tag list",
                kind.label()
            )))
        }
    })
}

/// A build request that has claimed its ticket and may be sent.
#[derive(Clone, Debug)]
pub struct PreparedBuild {
    pub ticket: Ticket,
    pub origin: Origin,
    pub request: BuildRequest,
}

pub fn prepare_build(session: &mut Session, request: BuildRequest, origin: Origin) -> PreparedBuild {
    session.clear_error();
    PreparedBuild {
        ticket: session.begin(Workflow::Build),
        origin,
        request,
    }
}

/// Applies a build response. Stores and returns the locator unless a newer
/// build was issued meanwhile.
pub fn apply_build(
    session: &mut Session,
    prepared: &PreparedBuild,
    response: Result<String, BackendError>,
) -> Result<QueryLocator, DispatchError> {
    if !session.is_current(prepared.ticket) {
        return Err(DispatchError::Superseded {
            workflow: Workflow::Build,
        });
    }
    let kind = prepared.request.kind();
    let url = response.map_err(|e| {
        DispatchError::backend(format!("Failed to build {} query", kind.label()), e)
    })?;
    session.set_last_kind(LastQueryKind::Query(kind));
    if prepared.origin == Origin::User && kind != QueryKind::Patent {
        session.set_context(None);
    }
    let locator = QueryLocator::new(url);
    info!(kind = ?kind, locator = %locator.raw(), "query built");
    session.set_locator(locator.clone());
    Ok(locator)
}

/// Sends a prepared build request and applies the outcome.
pub async fn dispatch(
    session: &mut Session,
    backend: &dyn Backend,
    request: BuildRequest,
    origin: Origin,
) -> Result<QueryLocator, DispatchError> {
    let prepared = prepare_build(session, request, origin);
    let response = backend.build_query(&prepared.request).await;
    apply_build(session, &prepared, response).map_err(|e| surface(session, e))
}

/// Tag-driven search: validates the relevant list, then dispatches.
pub async fn build_query(
    session: &mut Session,
    backend: &dyn Backend,
    kind: QueryKind,
    options: SearchOptions,
) -> Result<QueryLocator, DispatchError> {
    session.clear_error();
    let request = request_from_tags(session, kind, options).map_err(|e| surface(session, e))?;
    dispatch(session, backend, request, Origin::User).await
}

/// GAU search for explicit codes (quick filters and statistics drill-downs).
pub async fn search_gau(
    session: &mut Session,
    backend: &dyn Backend,
    codes: Vec<String>,
    limit: u32,
    origin: Origin,
) -> Result<QueryLocator, DispatchError> {
    let codes: Vec<String> = codes
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if codes.is_empty() {
        session.clear_error();
        return Err(surface(
            session,
            DispatchError::validation("Please add at least one GAU"),
        ));
    }
    dispatch(session, backend, BuildRequest::Gau { gaus: codes, limit }, origin).await
}

#[derive(Clone, Debug)]
pub struct PreparedExecute {
    pub ticket: Ticket,
    pub locator: String,
}

pub fn prepare_execute(session: &mut Session) -> Result<PreparedExecute, DispatchError> {
    session.clear_error();
    let locator = session
        .locator()
        .map(|l| l.raw().to_string())
        .ok_or_else(|| DispatchError::validation("No query to execute"))?;
    Ok(PreparedExecute {
        ticket: session.begin(Workflow::Execute),
        locator,
    })
}

/// Replaces the current result set and re-derives Patent Context. On failure
/// the previous result set stays untouched.
pub fn apply_execute(
    session: &mut Session,
    prepared: &PreparedExecute,
    response: Result<ResultSet, BackendError>,
) -> Result<(), DispatchError> {
    if !session.is_current(prepared.ticket) {
        return Err(DispatchError::Superseded {
            workflow: Workflow::Execute,
        });
    }
    let results = response.map_err(|e| DispatchError::backend("Failed to execute Solr query", e))?;
    info!(
        total_found = results.total_found,
        returned = results.results.len(),
        "query executed"
    );
    if session.last_kind() == Some(LastQueryKind::Query(QueryKind::Patent)) {
        session.set_context(context::derive(&results));
    }
    session.set_results(results);
    Ok(())
}

pub async fn execute_query(
    session: &mut Session,
    backend: &dyn Backend,
) -> Result<(), DispatchError> {
    let prepared = prepare_execute(session).map_err(|e| surface(session, e))?;
    let response = backend.execute_query(&prepared.locator).await;
    apply_execute(session, &prepared, response).map_err(|e| surface(session, e))
}

/// Hands the displayed locator text to the system opener instead of the backend.
pub fn execute_query_manually(
    session: &mut Session,
    opener: &dyn UrlOpener,
) -> Result<String, DispatchError> {
    let url = match session.locator() {
        Some(locator) if !locator.display().is_empty() => locator.display().to_string(),
        _ => return Err(surface(session, DispatchError::validation("No URL to open"))),
    };
    opener
        .open(&url)
        .map_err(|e| surface(session, DispatchError::Launch(e)))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session() -> Session {
        Session::new(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap())
    }

    #[test]
    fn locator_keeps_raw_and_decodes_display() {
        let l = QueryLocator::new("http://x/q?a=%20b");
        assert_eq!(l.raw(), "http://x/q?a=%20b");
        assert_eq!(l.display(), "http://x/q?a= b");
    }

    #[test]
    fn undecodable_locator_is_displayed_verbatim() {
        let l = QueryLocator::new("http://x/q?a=100%");
        assert_eq!(l.display(), "http://x/q?a=100%");
    }

    #[test]
    fn search_mode_round_trips_names() {
        for mode in SearchMode::ALL {
            assert_eq!(SearchMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(SearchMode::parse("last-10-years"), Some(SearchMode::LastTenYears));
        assert_eq!(SearchMode::parse("oldest"), None);
    }

    #[test]
    fn empty_tag_list_is_a_validation_error() {
        let s = session();
        let err = request_from_tags(&s, QueryKind::LawFirm, SearchOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Please add at least one law firm");
    }

    #[test]
    fn patent_request_carries_ids_only() {
        let mut s = session();
        s.add_tag(TagKind::PatentId, "US123");
        s.add_tag(TagKind::PatentId, "US456");
        let req = request_from_tags(&s, QueryKind::Patent, SearchOptions::default()).unwrap();
        assert_eq!(
            req,
            BuildRequest::Patent {
                patent_ids: vec!["US123".to_string(), "US456".to_string()]
            }
        );
    }

    #[test]
    fn stale_build_response_is_discarded() {
        let mut s = session();
        let slow = prepare_build(
            &mut s,
            BuildRequest::Gau {
                gaus: vec!["1".into()],
                limit: 20,
            },
            Origin::User,
        );
        let fast = prepare_build(
            &mut s,
            BuildRequest::Gau {
                gaus: vec!["2".into()],
                limit: 20,
            },
            Origin::User,
        );
        apply_build(&mut s, &fast, Ok("http://solr/q2".to_string())).unwrap();
        let err = apply_build(&mut s, &slow, Ok("http://solr/q1".to_string())).unwrap_err();
        assert!(err.is_superseded());
        assert_eq!(s.locator().unwrap().raw(), "http://solr/q2");
    }

    #[test]
    fn failed_execute_keeps_previous_results() {
        let mut s = session();
        s.set_locator(QueryLocator::new("http://solr/q"));
        let ok = prepare_execute(&mut s).unwrap();
        let first = ResultSet {
            total_found: 3,
            ..ResultSet::default()
        };
        apply_execute(&mut s, &ok, Ok(first.clone())).unwrap();

        let failing = prepare_execute(&mut s).unwrap();
        let err = apply_execute(
            &mut s,
            &failing,
            Err(BackendError::Status {
                endpoint: "/execute-query".to_string(),
                status: 500,
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Backend { .. }));
        assert_eq!(s.results(), Some(&first));
    }

    #[test]
    fn execute_without_locator_is_rejected() {
        let mut s = session();
        let err = prepare_execute(&mut s).unwrap_err();
        assert_eq!(err.to_string(), "No query to execute");
    }
}
