use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::app::{Console, ConsoleSettings};
use crate::backend::{
    Backend, BackendError, BuildRequest, ExaminerStatsRequest, RangeStatsRequest, ResultSet,
    TotalStats,
};
use crate::context::FollowUp;
use crate::dispatch::{self, QueryKind, SearchOptions, UrlOpener};
use crate::export::ExportFormat;
use crate::session::{LastQueryKind, Session, Workflow};
use crate::stats::{self, SortOrder, StatsType};
use crate::tags::TagKind;

/// In-memory backend that records every call it receives.
#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<&'static str>>,
    builds: Mutex<Vec<BuildRequest>>,
    range_requests: Mutex<Vec<RangeStatsRequest>>,
    locator: Mutex<String>,
    /// `None` makes `/execute-query` answer 500.
    results: Mutex<Option<ResultSet>>,
    stats_payload: Mutex<Value>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        let fake = Self::default();
        *fake.locator.lock().unwrap() = "http://solr/select?q=%2A%3A%2A".to_string();
        Arc::new(fake)
    }

    fn set_locator(&self, locator: &str) {
        *self.locator.lock().unwrap() = locator.to_string();
    }

    fn set_results(&self, results: Option<ResultSet>) {
        *self.results.lock().unwrap() = results;
    }

    fn set_stats(&self, payload: Value) {
        *self.stats_payload.lock().unwrap() = payload;
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn last_build(&self) -> Option<BuildRequest> {
        self.builds.lock().unwrap().last().cloned()
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }
}

fn server_error(endpoint: &str) -> BackendError {
    BackendError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn build_query(&self, request: &BuildRequest) -> Result<String, BackendError> {
        self.record(request.endpoint());
        self.builds.lock().unwrap().push(request.clone());
        Ok(self.locator.lock().unwrap().clone())
    }

    async fn execute_query(&self, _locator: &str) -> Result<ResultSet, BackendError> {
        self.record("/execute-query");
        self.results
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| server_error("/execute-query"))
    }

    async fn total_stats(&self) -> Result<TotalStats, BackendError> {
        self.record("/stats/total");
        Ok(TotalStats {
            total_patents: 1_500_000,
            total_approved: 900_000,
            total_pending: 400_000,
            total_abandoned: 200_000,
        })
    }

    async fn examiner_stats(&self, _request: &ExaminerStatsRequest) -> Result<Value, BackendError> {
        self.record("/stats/examiners-by-date");
        Ok(self.stats_payload.lock().unwrap().clone())
    }

    async fn range_stats(&self, request: &RangeStatsRequest) -> Result<Value, BackendError> {
        self.record("/stats/by-date-range");
        self.range_requests.lock().unwrap().push(request.clone());
        Ok(self.stats_payload.lock().unwrap().clone())
    }

    async fn download(
        &self,
        format: ExportFormat,
        results: &ResultSet,
    ) -> Result<Vec<u8>, BackendError> {
        self.record(format.endpoint());
        match format {
            ExportFormat::Json => serde_json::to_vec(results).map_err(|e| BackendError::Decode {
                endpoint: format.endpoint().to_string(),
                source: e,
            }),
            ExportFormat::Excel => Err(server_error(format.endpoint())),
        }
    }
}

#[derive(Clone, Default)]
struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

fn result_set(records: Value) -> ResultSet {
    let results: Vec<crate::backend::Record> = serde_json::from_value(records).unwrap();
    ResultSet {
        total_found: results.len() as u64,
        results,
        ..ResultSet::default()
    }
}

fn console(backend: &Arc<FakeBackend>, settings: ConsoleSettings) -> (Console, RecordingOpener) {
    colored::control::set_override(false);
    let opener = RecordingOpener::default();
    let console = Console::new(
        backend.clone(),
        Box::new(opener.clone()),
        settings,
        Session::new(today()),
    );
    (console, opener)
}

#[tokio::test]
async fn empty_list_dispatch_never_reaches_backend() {
    let backend = FakeBackend::new();
    let mut session = Session::new(today());
    let err = dispatch::build_query(
        &mut session,
        backend.as_ref(),
        QueryKind::Examiner,
        SearchOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Please add at least one examiner");
    assert_eq!(session.error(), Some("Please add at least one examiner"));
    assert!(backend.calls().is_empty());
    assert!(session.locator().is_none());
}

#[tokio::test]
async fn locator_is_displayed_decoded_and_stored_encoded() {
    let backend = FakeBackend::new();
    backend.set_locator("http://x/q?a=%20b");
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add patent US123").await;
    let step = console.handle_line("search patent").await;
    assert!(step.output.contains("http://x/q?a= b"), "{}", step.output);
    assert_eq!(console.session().locator().unwrap().raw(), "http://x/q?a=%20b");
    assert_eq!(
        backend.last_build(),
        Some(BuildRequest::Patent {
            patent_ids: vec!["US123".to_string()]
        })
    );
}

#[tokio::test]
async fn singleton_patent_result_sets_context_and_enables_follow_ups() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{
        "id": "US123",
        "examiner": "DOE, JANE",
        "law_firm": ["Foo LLP"],
        "all_attorney_names": ["Smith"],
        "gau": ["3682"]
    }]))));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add patent US123").await;
    console.handle_line("search patent").await;
    let step = console.handle_line("execute").await;
    assert!(step.output.contains("Results – Patent Search"));
    assert!(step.output.contains("Total 1 result(s)"));
    assert!(step.output.contains("Patent context:"));

    let ctx = console.session().context().unwrap();
    assert_eq!(ctx.lawfirm.as_deref(), Some("Foo LLP"));
    assert!(ctx.enabled(FollowUp::LawFirm));
    assert_eq!(ctx.enabled_actions().len(), 4);
}

#[tokio::test]
async fn two_record_patent_result_clears_context() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{"law_firm": ["Foo LLP"]}]))));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add patent US1").await;
    console.handle_line("search patent").await;
    console.handle_line("execute").await;
    assert!(console.session().context().is_some());

    backend.set_results(Some(result_set(json!([{"id": "US1"}, {"id": "US2"}]))));
    console.handle_line("add patent US2").await;
    console.handle_line("search patent").await;
    let step = console.handle_line("execute").await;
    assert!(console.session().context().is_none());
    assert!(!step.output.contains("Patent context:"));
}

#[tokio::test]
async fn follow_up_keeps_context_for_the_title() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{
        "examiner": "DOE, JANE",
        "law_firm": ["Foo LLP"]
    }]))));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add patent US123").await;
    console.handle_line("search patent").await;
    console.handle_line("execute").await;

    console.handle_line("explore lawfirm").await;
    assert_eq!(
        backend.last_build(),
        Some(BuildRequest::LawFirm {
            lawfirms: vec!["foo llp".to_string()],
            search_type: dispatch::SearchMode::LatestFiled,
            limit: 10,
        })
    );

    backend.set_results(Some(result_set(json!([{"id": "US9"}, {"id": "US10"}]))));
    let step = console.handle_line("execute").await;
    assert!(step.output.contains("Results – Law Firm: Foo LLP"), "{}", step.output);
    assert_eq!(
        console.session().last_kind(),
        Some(LastQueryKind::Query(QueryKind::LawFirm))
    );

    // a user-initiated search drops the context
    console.handle_line("add examiner Roe").await;
    console.handle_line("search examiner").await;
    assert!(console.session().context().is_none());
}

#[tokio::test]
async fn explore_without_context_is_rejected() {
    let backend = FakeBackend::new();
    let (mut console, _) = console(&backend, ConsoleSettings::default());
    let step = console.handle_line("explore examiner").await;
    assert!(step.output.contains("No patent context available"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn zero_results_render_message_and_no_cards() {
    let backend = FakeBackend::new();
    backend.set_results(Some(ResultSet::default()));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add examiner Doe").await;
    console.handle_line("search examiner").await;
    let step = console.handle_line("execute").await;
    assert!(step.output.contains("Total 0 result(s)"));
    assert!(step.output.contains("No results found."));
    assert!(!step.output.contains("Result #"));
}

#[tokio::test]
async fn examiner_results_offer_gau_quick_filters() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([
        {"id": "US1", "gau": ["3682", "1611"]},
        {"id": "US2", "gau": ["3682"]}
    ]))));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add examiner Doe").await;
    console.handle_line("search examiner --mode latest_approved -n 5").await;
    assert_eq!(
        backend.last_build(),
        Some(BuildRequest::Examiner {
            examiners: vec!["Doe".to_string()],
            search_type: dispatch::SearchMode::LatestApproved,
            limit: 5,
        })
    );
    let step = console.handle_line("execute").await;
    assert!(step.output.contains("GAU 3682 (2)"), "{}", step.output);
    assert!(step.output.contains("GAU 1611 (1)"));
    assert!(step.output.contains("Result #2"));

    console.handle_line("gau 3682").await;
    assert_eq!(
        backend.last_build(),
        Some(BuildRequest::Gau {
            gaus: vec!["3682".to_string()],
            limit: 20,
        })
    );
}

#[tokio::test]
async fn failed_execution_keeps_prior_results() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{"id": "US1"}]))));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add prosecutor Smith").await;
    console.handle_line("search prosecutor").await;
    console.handle_line("execute").await;

    backend.set_results(None);
    let step = console.handle_line("execute").await;
    assert!(step.output.contains("Failed to execute Solr query"));
    assert_eq!(console.session().results().unwrap().total_found, 1);

    let step = console.handle_line("show").await;
    assert!(step.output.contains("Results – Attorney Search"));
}

#[tokio::test]
async fn execute_and_open_need_a_locator() {
    let backend = FakeBackend::new();
    let (mut console, opener) = console(&backend, ConsoleSettings::default());

    let step = console.handle_line("execute").await;
    assert!(step.output.contains("No query to execute"));
    let step = console.handle_line("open").await;
    assert!(step.output.contains("No URL to open"));
    assert!(backend.calls().is_empty());

    backend.set_locator("http://solr/select?q=examiner%3A%22doe%22");
    console.handle_line("add examiner doe").await;
    console.handle_line("search examiner").await;
    console.handle_line("open").await;
    assert_eq!(
        opener.opened.lock().unwrap().as_slice(),
        ["http://solr/select?q=examiner:\"doe\"".to_string()]
    );
    assert!(!backend.calls().contains(&"/execute-query"));
}

#[tokio::test]
async fn tag_mutation_clears_error_banner() {
    let backend = FakeBackend::new();
    let (mut console, _) = console(&backend, ConsoleSettings::default());
    console.handle_line("search lawfirm").await;
    assert_eq!(
        console.session().error(),
        Some("Please add at least one law firm")
    );
    let step = console.handle_line("add lawfirm Foo LLP").await;
    assert!(console.session().error().is_none());
    assert!(step.output.contains("Foo LLP"));
    assert_eq!(console.session().tags.get(TagKind::LawFirm).entries(), ["Foo LLP"]);
}

#[tokio::test]
async fn statistics_view_hides_locator_and_blocks_export() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{"id": "US1"}]))));
    backend.set_stats(json!({
        "examiners": [{"examiner": "Doe", "application_count": 12, "unique_gau_count": 1,
                       "gaus": [{"gau": "3682", "application_count": 12}]}]
    }));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add patent US1").await;
    console.handle_line("search patent").await;
    console.handle_line("execute").await;

    let step = console
        .handle_line("stats examiners --from 2025-01-01 --to 2025-12-31")
        .await;
    assert!(step.output.contains("Top Examiners (By Date Range)"));
    assert!(step.output.contains("1 examiner(s)"));
    assert!(console.session().locator().is_none());

    let step = console.handle_line("download json").await;
    assert!(step.output.contains("No results to download"));
    assert!(!backend.calls().contains(&"/download/json"));
}

#[tokio::test]
async fn range_stats_use_session_dates_and_sort_order() {
    let backend = FakeBackend::new();
    backend.set_stats(json!({"lawfirms": [{"lawfirm": "Foo LLP", "application_count": 3}]}));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    let step = console.handle_line("stats range lawfirm --sort asc -n 3").await;
    assert!(step.output.contains("Least lawfirms (By Date Range)"), "{}", step.output);
    assert!(step.output.contains("Foo LLP"));

    let req = backend.range_requests.lock().unwrap()[0].clone();
    assert_eq!(req.stats_type, StatsType::LawFirm);
    assert_eq!(req.sort_order, SortOrder::Asc);
    assert_eq!(req.limit, 3);
    assert_eq!(req.from_date, "2025-05-01");
    assert_eq!(req.to_date, "2026-05-01");
}

#[tokio::test]
async fn missing_dates_block_stats_requests() {
    let backend = FakeBackend::new();
    let (mut console, _) = console(&backend, ConsoleSettings::default());
    let step = console.handle_line("stats examiners --from \"\"").await;
    assert!(step.output.contains("Please select both From and To dates"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn totals_are_formatted_with_separators() {
    let backend = FakeBackend::new();
    let (mut console, _) = console(&backend, ConsoleSettings::default());
    let step = console.handle_line("stats total").await;
    assert!(step.output.contains("1,500,000"));
    assert!(step.output.contains("Abandoned"));
    assert_eq!(console.session().last_kind(), None);
}

#[tokio::test]
async fn totals_between_search_and_execute_keep_patent_context() {
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{
        "id": "US123",
        "examiner": "DOE, JANE",
        "law_firm": ["Foo LLP"]
    }]))));
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    console.handle_line("add patent US123").await;
    console.handle_line("search patent").await;
    console.handle_line("stats total").await;
    assert!(console.session().locator().is_some());
    assert_eq!(
        console.session().last_kind(),
        Some(LastQueryKind::Query(QueryKind::Patent))
    );

    let step = console.handle_line("execute").await;
    assert!(step.output.contains("Results – Patent Search"), "{}", step.output);
    assert!(step.output.contains("Patent context:"));
    let ctx = console.session().context().unwrap();
    assert_eq!(ctx.examiner.as_deref(), Some("DOE, JANE"));
}

#[tokio::test]
async fn superseded_stats_response_is_dropped() {
    let backend = FakeBackend::new();
    let mut session = Session::new(today());
    let stale = session.begin(Workflow::Stats);
    let fresh = session.begin(Workflow::Stats);

    let totals = backend.total_stats().await;
    stats::apply_totals(&mut session, fresh, totals).unwrap();

    let request = ExaminerStatsRequest {
        from_date: "2025-01-01".into(),
        to_date: "2025-12-31".into(),
        limit: 10,
    };
    let late = backend.examiner_stats(&request).await;
    let err = stats::apply_examiner_stats(&mut session, stale, late).unwrap_err();
    assert!(err.is_superseded());
    assert_eq!(session.last_kind(), None);
}

#[tokio::test]
async fn json_export_writes_payload_to_download_dir() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    backend.set_results(Some(result_set(json!([{"id": "US1", "title": "Widget"}]))));
    let settings = ConsoleSettings {
        download_dir: dir.path().to_path_buf(),
        ..ConsoleSettings::default()
    };
    let (mut console, _) = console(&backend, settings);

    console.handle_line("add patent US1").await;
    console.handle_line("search patent").await;
    console.handle_line("execute").await;
    let step = console.handle_line("download json").await;
    assert!(step.output.contains("patent_results.json"), "{}", step.output);

    let written = std::fs::read(dir.path().join("patent_results.json")).unwrap();
    let round: ResultSet = serde_json::from_slice(&written).unwrap();
    assert_eq!(round.results[0]["title"], "Widget");

    let step = console.handle_line("download excel").await;
    assert!(step.output.contains("Failed to convert to Excel"));
    assert!(!dir.path().join("patent_results.xlsx").exists());
}

#[tokio::test]
async fn advanced_filters_build_with_sort() {
    let backend = FakeBackend::new();
    let (mut console, _) = console(&backend, ConsoleSettings::default());

    let step = console.handle_line("advanced").await;
    assert!(step.output.contains("Please add at least one filter"));

    let step = console.handle_line("filter add app_date_year range 2019").await;
    assert!(step.output.contains("start-end"));

    console.handle_line("filter add law_firm contains Foo LLP").await;
    console.handle_line("filter add app_date_year range 2019-2023").await;
    console.handle_line("advanced -n 15 --sort app_date:asc").await;

    let body = serde_json::to_value(backend.last_build().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({
            "filters": [
                {"field": "law_firm", "operator": "contains", "value": "Foo LLP"},
                {"field": "app_date_year", "operator": "range", "value": "2019-2023"}
            ],
            "limit": 15,
            "sort": {"field": "app_date", "order": "asc"}
        })
    );
}

#[tokio::test]
async fn parse_errors_and_quit() {
    let backend = FakeBackend::new();
    let (mut console, _) = console(&backend, ConsoleSettings::default());
    let step = console.handle_line("frobnicate").await;
    assert!(step.output.contains("ERR"));
    assert!(!step.quit);
    assert!(console.handle_line("quit").await.quit);
    assert!(console.handle_line("   ").await.output.is_empty());
}
