//! Per-session state owned by the console controller and passed by reference
//! to the dispatch, context and rendering routines.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::advanced::FilterList;
use crate::backend::ResultSet;
use crate::context::PatentContext;
use crate::dispatch::{QueryKind, QueryLocator};
use crate::stats::{DateRange, StatsType};
use crate::tags::{DisplayFragment, TagKind, TagLists};

/// Which workflow produced the current locator / view. Selects rendering only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LastQueryKind {
    Query(QueryKind),
    ExaminerStats,
    RangeStats(StatsType),
}

/// Independent request streams; each allows one live request at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Workflow {
    Build,
    Execute,
    Stats,
    Export,
}

/// Issued when a request starts. A response is applied only while its ticket
/// is still the newest one for the workflow (last issued wins).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub workflow: Workflow,
    seq: u64,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub tags: TagLists,
    pub filters: FilterList,
    pub date_range: DateRange,
    locator: Option<QueryLocator>,
    results: Option<ResultSet>,
    results_visible: bool,
    context: Option<PatentContext>,
    last_kind: Option<LastQueryKind>,
    error: Option<String>,
    next_seq: u64,
    live: HashMap<Workflow, u64>,
}

impl Session {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            tags: TagLists::default(),
            filters: FilterList::default(),
            date_range: DateRange::default_for(today),
            locator: None,
            results: None,
            results_visible: false,
            context: None,
            last_kind: None,
            error: None,
            next_seq: 0,
            live: HashMap::new(),
        }
    }

    /// Adds to a tag list, clears the error banner and returns the re-rendered list.
    pub fn add_tag(&mut self, kind: TagKind, value: &str) -> DisplayFragment {
        self.tags.get_mut(kind).add(value);
        self.clear_error();
        self.tags.get(kind).render()
    }

    pub fn remove_tag(&mut self, kind: TagKind, index: usize) -> DisplayFragment {
        self.tags.get_mut(kind).remove(index);
        self.clear_error();
        self.tags.get(kind).render()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn locator(&self) -> Option<&QueryLocator> {
        self.locator.as_ref()
    }

    pub(crate) fn set_locator(&mut self, locator: QueryLocator) {
        self.locator = Some(locator);
    }

    pub(crate) fn hide_locator(&mut self) {
        self.locator = None;
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    /// The current result set, if the result view (not a statistics view) is showing.
    pub fn exportable_results(&self) -> Option<&ResultSet> {
        if self.results_visible {
            self.results.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn set_results(&mut self, results: ResultSet) {
        self.results = Some(results);
        self.results_visible = true;
    }

    pub(crate) fn show_statistics_view(&mut self) {
        self.results_visible = false;
    }

    pub fn context(&self) -> Option<&PatentContext> {
        self.context.as_ref()
    }

    pub(crate) fn set_context(&mut self, context: Option<PatentContext>) {
        self.context = context;
    }

    pub fn last_kind(&self) -> Option<LastQueryKind> {
        self.last_kind
    }

    pub(crate) fn set_last_kind(&mut self, kind: LastQueryKind) {
        self.last_kind = Some(kind);
    }

    /// Starts a request for `workflow`, superseding any still outstanding.
    pub fn begin(&mut self, workflow: Workflow) -> Ticket {
        self.next_seq += 1;
        self.live.insert(workflow, self.next_seq);
        Ticket {
            workflow,
            seq: self.next_seq,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.live.get(&ticket.workflow) == Some(&ticket.seq)
    }
}
