//! Turns result sets and statistics payloads into display records. Nothing
//! here prints; `crate::output` styles these for the terminal.

pub mod stats;

pub use stats::{render_examiner_stats, render_stats_results, render_totals, StatsView, TotalsView};

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;

use crate::backend::{Record, ResultSet};
use crate::context::PatentContext;
use crate::dispatch::QueryKind;
use crate::session::LastQueryKind;
use crate::utils;

/// Fields shown on a result card, in display order.
pub const RESULT_FIELDS: [&str; 14] = [
    "id",
    "title",
    "app_date",
    "disposal_type",
    "application_status",
    "first_named_inventor",
    "law_firm",
    "all_attorney_names",
    "examiner",
    "small_entity_indicator",
    "lawfirm",
    "law_firm_address",
    "gau",
    "app_date_year",
];

pub const NO_RESULTS: &str = "No results found.";

/// Limit used when a quick filter is selected.
pub const QUICK_FILTER_LIMIT: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardField {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultCard {
    /// 1-based.
    pub number: usize,
    pub fields: Vec<CardField>,
}

/// A selectable classification code with its occurrence count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickFilter {
    pub code: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsView {
    pub title: String,
    pub count_line: String,
    pub quick_filters: Vec<QuickFilter>,
    pub cards: Vec<ResultCard>,
    /// Set instead of cards when the result set is empty.
    pub empty_message: Option<&'static str>,
}

/// `small_entity_indicator` -> `Small Entity Indicator`.
pub fn humanize_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .join(" ")
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(utils::scalar_text)
            .join(", "),
        other => utils::scalar_text(other),
    }
}

pub fn result_card(record: &Record, number: usize) -> ResultCard {
    let fields = RESULT_FIELDS
        .iter()
        .filter_map(|field| {
            let value = record.get(*field).filter(|v| !v.is_null())?;
            Some(CardField {
                label: humanize_label(field),
                value: field_text(value),
            })
        })
        .collect();
    ResultCard { number, fields }
}

pub fn results_title(kind: Option<LastQueryKind>, context: Option<&PatentContext>) -> String {
    let query = match kind {
        Some(LastQueryKind::Query(q)) => q,
        _ => return "Results".to_string(),
    };
    match query {
        QueryKind::Patent => "Results – Patent Search".to_string(),
        QueryKind::Examiner => match context.and_then(|c| c.examiner.as_deref()) {
            Some(examiner) => format!("Results – Examiner: {examiner}"),
            None => "Results – Examiner Search".to_string(),
        },
        QueryKind::LawFirm => match context.and_then(|c| c.lawfirm.as_deref()) {
            Some(firm) => format!("Results – Law Firm: {firm}"),
            None => "Results – Law Firm Search".to_string(),
        },
        QueryKind::Prosecutor | QueryKind::Attorney => "Results – Attorney Search".to_string(),
        QueryKind::Gau => "Results – GAU Search".to_string(),
        QueryKind::Advanced => "Results".to_string(),
    }
}

/// Occurrences of each `gau` code across records, in first-seen order.
/// Codes are counted as received. Non-array `gau` values and empty, zero or
/// null codes are skipped.
pub fn group_counts(results: &[Record]) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in results {
        let Some(codes) = record.get("gau").and_then(Value::as_array) else {
            continue;
        };
        for code in codes {
            let code = match code {
                Value::String(s) if !s.is_empty() => s.clone(),
                Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
                _ => continue,
            };
            *counts.entry(code).or_insert(0) += 1;
        }
    }
    counts
}

pub fn render_results(
    results: &ResultSet,
    kind: Option<LastQueryKind>,
    context: Option<&PatentContext>,
) -> ResultsView {
    let title = results_title(kind, context);
    let count_line = format!("Total {} result(s)", results.total_found);

    if results.results.is_empty() {
        return ResultsView {
            title,
            count_line,
            quick_filters: Vec::new(),
            cards: Vec::new(),
            empty_message: Some(NO_RESULTS),
        };
    }

    let quick_filters = if kind == Some(LastQueryKind::Query(QueryKind::Examiner)) {
        group_counts(&results.results)
            .into_iter()
            .map(|(code, count)| QuickFilter { code, count })
            .collect()
    } else {
        Vec::new()
    };

    let cards = results
        .results
        .iter()
        .enumerate()
        .map(|(i, record)| result_card(record, i + 1))
        .collect();

    ResultsView {
        title,
        count_line,
        quick_filters,
        cards,
        empty_message: None,
    }
}
